//! Borrow ledger repository
//!
//! Borrowing and returning touch two tables: the `is_borrowed` flag on `books`
//! and the `borrowed_books` ledger. Both writes happen in one transaction, and
//! the flag flip is a conditional update so that two concurrent requests for
//! the same book cannot both observe it as available.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::borrow::BorrowRecord,
};

#[async_trait]
pub trait BorrowsRepository: Send + Sync {
    /// Mark the book as borrowed and open a ledger record dated `at`.
    ///
    /// Fails with `NotFound` when the book or subscriber does not exist and
    /// with `Conflict` when the book is already out. Nothing is written on failure.
    async fn borrow(&self, subscriber_id: i32, book_id: i32, at: DateTime<Utc>) -> AppResult<BorrowRecord>;

    /// Close the subscriber's open record for the book at `at` and mark the book available.
    ///
    /// Fails with `NotFound` when the book does not exist and with `Validation`
    /// when it is not borrowed, or not borrowed by this subscriber.
    async fn return_book(&self, subscriber_id: i32, book_id: i32, at: DateTime<Utc>) -> AppResult<BorrowRecord>;

    /// Full ledger of a book, oldest first
    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BorrowRecord>>;
}

const RECORD_COLUMNS: &str = "id, subscriber_id, book_id, date_of_borrow, return_date";

#[derive(Clone)]
pub struct PgBorrowsRepository {
    pool: Pool<Postgres>,
}

impl PgBorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Tells a missing book apart from one whose flag was not in the expected state
    async fn book_exists(tx: &mut Transaction<'_, Postgres>, book_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&mut **tx)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl BorrowsRepository for PgBorrowsRepository {
    async fn borrow(&self, subscriber_id: i32, book_id: i32, at: DateTime<Utc>) -> AppResult<BorrowRecord> {
        let mut tx = self.pool.begin().await?;

        // Check-and-set in one statement: the row lock serializes concurrent
        // borrowers and the loser re-reads is_borrowed = TRUE.
        let claimed = sqlx::query("UPDATE books SET is_borrowed = TRUE WHERE id = $1 AND is_borrowed = FALSE")
            .bind(book_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if claimed == 0 {
            return Err(if Self::book_exists(&mut tx, book_id).await? {
                AppError::Conflict("Book is already borrowed".to_string())
            } else {
                AppError::NotFound("Book not found".to_string())
            });
        }

        // Held until commit so a concurrent subscriber delete waits and then sees the open record
        sqlx::query_scalar::<_, i32>("SELECT id FROM subscribers WHERE id = $1 FOR KEY SHARE")
            .bind(subscriber_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscriber not found".to_string()))?;

        let record = sqlx::query_as::<_, BorrowRecord>(&format!(
            r#"
            INSERT INTO borrowed_books (subscriber_id, book_id, date_of_borrow, return_date)
            VALUES ($1, $2, $3, NULL)
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(subscriber_id)
        .bind(book_id)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn return_book(&self, subscriber_id: i32, book_id: i32, at: DateTime<Utc>) -> AppResult<BorrowRecord> {
        let mut tx = self.pool.begin().await?;

        let released = sqlx::query("UPDATE books SET is_borrowed = FALSE WHERE id = $1 AND is_borrowed = TRUE")
            .bind(book_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if released == 0 {
            return Err(if Self::book_exists(&mut tx, book_id).await? {
                AppError::Validation("Book is not borrowed".to_string())
            } else {
                AppError::NotFound("Book not found".to_string())
            });
        }

        let record = sqlx::query_as::<_, BorrowRecord>(&format!(
            r#"
            UPDATE borrowed_books
            SET return_date = $3
            WHERE subscriber_id = $1 AND book_id = $2 AND return_date IS NULL
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(subscriber_id)
        .bind(book_id)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Validation("Book is not borrowed by this subscriber".to_string()))?;

        tx.commit().await?;
        Ok(record)
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(&format!(
            "SELECT {} FROM borrowed_books WHERE book_id = $1 ORDER BY date_of_borrow, id",
            RECORD_COLUMNS
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
