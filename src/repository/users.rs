//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::User,
};

#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Look up an account by its (normalized) email
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert an account; `Conflict` when the email is taken
    async fn create(&self, email: &str, password_hash: &str) -> AppResult<i32>;
}

#[derive(Clone)]
pub struct PgUsersRepository {
    pool: Pool<Postgres>,
}

impl PgUsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, email: &str, password_hash: &str) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent signup for the same address
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Email already in use".to_string())
            }
            other => AppError::Database(other),
        })
    }
}
