//! Subscribers repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::subscriber::{Subscriber, SubscriberInput},
};

#[async_trait]
pub trait SubscribersRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<Subscriber>>;

    async fn create(&self, subscriber: &SubscriberInput) -> AppResult<i32>;

    async fn update(&self, id: i32, subscriber: &SubscriberInput) -> AppResult<()>;

    /// Delete a subscriber and their closed borrow history; refused while
    /// they still hold a book
    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Subscribers who ever borrowed the given book
    async fn list_by_book(&self, book_id: i32) -> AppResult<Vec<Subscriber>>;
}

#[derive(Clone)]
pub struct PgSubscribersRepository {
    pool: Pool<Postgres>,
}

impl PgSubscribersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscribersRepository for PgSubscribersRepository {
    async fn list(&self) -> AppResult<Vec<Subscriber>> {
        let subscribers = sqlx::query_as::<_, Subscriber>(
            "SELECT id, firstname, lastname, email FROM subscribers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(subscribers)
    }

    async fn create(&self, subscriber: &SubscriberInput) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO subscribers (firstname, lastname, email) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&subscriber.firstname)
        .bind(&subscriber.lastname)
        .bind(&subscriber.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update(&self, id: i32, subscriber: &SubscriberInput) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE subscribers SET firstname = $1, lastname = $2, email = $3 WHERE id = $4",
        )
        .bind(&subscriber.firstname)
        .bind(&subscriber.lastname)
        .bind(&subscriber.email)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Subscriber not found".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        // Blocks behind any in-flight borrow by this subscriber
        sqlx::query_scalar::<_, i32>("SELECT id FROM subscribers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscriber not found".to_string()))?;

        let holds_books: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrowed_books WHERE subscriber_id = $1 AND return_date IS NULL)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if holds_books {
            return Err(AppError::Conflict("Subscriber has borrowed books".to_string()));
        }

        sqlx::query("DELETE FROM borrowed_books WHERE subscriber_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM subscribers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_by_book(&self, book_id: i32) -> AppResult<Vec<Subscriber>> {
        let subscribers = sqlx::query_as::<_, Subscriber>(
            r#"
            SELECT DISTINCT s.id, s.firstname, s.lastname, s.email
            FROM subscribers s
            JOIN borrowed_books bb ON s.id = bb.subscriber_id
            WHERE bb.book_id = $1
            ORDER BY s.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subscribers)
    }
}
