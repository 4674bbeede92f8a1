//! Repository tests against a real PostgreSQL server
//!
//! Run with: DATABASE_URL=postgres://... cargo test --test postgres_tests -- --ignored

use chrono::{TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;

use library_server::{
    models::{author::CreateAuthor, book::CreateBook, subscriber::SubscriberInput},
    repository::Repository,
    AppError,
};

async fn repository() -> (sqlx::PgPool, Repository) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations").run(&pool).await.expect("Failed to run migrations");
    (pool.clone(), Repository::postgres(pool))
}

async fn seed(repo: &Repository) -> (i32, i32) {
    let author_id = repo
        .authors
        .create(&CreateAuthor { firstname: "Stanisław".into(), lastname: "Lem".into() })
        .await
        .unwrap();
    let book_id = repo
        .books
        .create(&CreateBook { title: "Solaris".into(), author_id, details: "Ocean".into() })
        .await
        .unwrap();
    let subscriber_id = repo
        .subscribers
        .create(&SubscriberInput {
            firstname: "Kris".into(),
            lastname: "Kelvin".into(),
            email: "kelvin@solaris.station".into(),
        })
        .await
        .unwrap();
    (subscriber_id, book_id)
}

/// is_borrowed must be true iff an open ledger record exists
async fn assert_flag_matches_ledger(pool: &sqlx::PgPool, book_id: i32) {
    let (is_borrowed, open): (bool, i64) = sqlx::query_as(
        r#"
        SELECT b.is_borrowed,
               (SELECT COUNT(*) FROM borrowed_books bb WHERE bb.book_id = b.id AND bb.return_date IS NULL)
        FROM books b WHERE b.id = $1
        "#,
    )
    .bind(book_id)
    .fetch_one(pool)
    .await
    .unwrap();
    assert!(open <= 1);
    assert_eq!(is_borrowed, open == 1);
}

#[tokio::test]
#[ignore]
async fn test_borrow_return_cycle() {
    let (pool, repo) = repository().await;
    let (subscriber_id, book_id) = seed(&repo).await;
    let at = Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap();

    let opened = repo.borrows.borrow(subscriber_id, book_id, at).await.unwrap();
    assert_eq!(at, opened.date_of_borrow);
    assert_flag_matches_ledger(&pool, book_id).await;

    let err = repo.borrows.borrow(subscriber_id, book_id, at).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let closed = repo.borrows.return_book(subscriber_id, book_id, at).await.unwrap();
    assert_eq!(opened.id, closed.id);
    assert_flag_matches_ledger(&pool, book_id).await;

    let err = repo.borrows.return_book(subscriber_id, book_id, at).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
#[ignore]
async fn test_failed_borrow_rolls_back() {
    let (pool, repo) = repository().await;
    let (_, book_id) = seed(&repo).await;

    let err = repo.borrows.borrow(-1, book_id, Utc::now()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(!repo.books.get(book_id).await.unwrap().is_borrowed);
    assert_flag_matches_ledger(&pool, book_id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_borrows_have_one_winner() {
    let (pool, repo) = repository().await;
    let (subscriber_id, book_id) = seed(&repo).await;

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.borrows.borrow(subscriber_id, book_id, Utc::now()).await })
        })
        .collect();

    let mut won = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(e) => assert!(matches!(e, AppError::Conflict(_)), "unexpected error {:?}", e),
        }
    }
    assert_eq!(1, won);
    assert_eq!(1, repo.borrows.list_for_book(book_id).await.unwrap().len());
    assert_flag_matches_ledger(&pool, book_id).await;
}

#[tokio::test]
#[ignore]
async fn test_search_escapes_wildcards() {
    let (_, repo) = repository().await;
    seed(&repo).await;

    let hits = repo.books.search("solar").await.unwrap();
    assert!(hits.iter().any(|b| b.book_title == "Solaris"));
    assert!(repo.books.search("%_%_%_%_%_%_%_%_%_%_%").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_borrow_racing_subscriber_delete() {
    let (pool, repo) = repository().await;

    for _ in 0..10 {
        let (subscriber_id, book_id) = seed(&repo).await;

        let borrowing = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.borrows.borrow(subscriber_id, book_id, Utc::now()).await })
        };
        let deleting = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.subscribers.delete(subscriber_id).await })
        };

        match (borrowing.await.unwrap(), deleting.await.unwrap()) {
            (Ok(_), Err(AppError::Conflict(_))) => {
                assert!(repo.books.get(book_id).await.unwrap().is_borrowed);
            }
            (Err(AppError::NotFound(_)), Ok(())) => {
                assert!(!repo.books.get(book_id).await.unwrap().is_borrowed);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_flag_matches_ledger(&pool, book_id).await;
    }
}
