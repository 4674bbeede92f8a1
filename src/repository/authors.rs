//! Authors repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, AuthorBook, AuthorBookEntry, AuthorWithBooks, CreateAuthor, UpdateAuthor},
};

use super::like_pattern;

#[async_trait]
pub trait AuthorsRepository: Send + Sync {
    /// All authors
    async fn list(&self) -> AppResult<Vec<Author>>;

    /// Every (author, book) pair
    async fn list_with_books(&self) -> AppResult<Vec<AuthorBook>>;

    /// One author and their books
    async fn get_with_books(&self, id: i32) -> AppResult<AuthorWithBooks>;

    /// Insert an author and return its ID
    async fn create(&self, author: &CreateAuthor) -> AppResult<i32>;

    async fn update(&self, id: i32, author: &UpdateAuthor) -> AppResult<()>;

    /// Delete an author; refused while they still have books
    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn set_photo(&self, id: i32, path: &str) -> AppResult<()>;

    /// Case-insensitive substring search on first and last name
    async fn search(&self, query: &str) -> AppResult<Vec<Author>>;
}

#[derive(Clone)]
pub struct PgAuthorsRepository {
    pool: Pool<Postgres>,
}

impl PgAuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorsRepository for PgAuthorsRepository {
    async fn list(&self) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT id, firstname, lastname, photo FROM authors ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    async fn list_with_books(&self) -> AppResult<Vec<AuthorBook>> {
        let rows = sqlx::query_as::<_, AuthorBook>(
            r#"
            SELECT a.firstname AS author_firstname, a.lastname AS author_lastname,
                   b.title AS book_title, b.photo AS book_photo
            FROM books b
            JOIN authors a ON b.author_id = a.id
            ORDER BY a.id, b.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_with_books(&self, id: i32) -> AppResult<AuthorWithBooks> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, firstname, lastname, photo FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Author not found".to_string()))?;

        let books = sqlx::query_as::<_, AuthorBookEntry>(
            r#"
            SELECT id AS book_id, title AS book_title, photo AS book_photo
            FROM books
            WHERE author_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(AuthorWithBooks {
            author_id: author.id,
            author_firstname: author.firstname,
            author_lastname: author.lastname,
            author_photo: author.photo,
            books,
        })
    }

    async fn create(&self, author: &CreateAuthor) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO authors (firstname, lastname, photo) VALUES ($1, $2, '') RETURNING id",
        )
        .bind(&author.firstname)
        .bind(&author.lastname)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update(&self, id: i32, author: &UpdateAuthor) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE authors
            SET firstname = $1, lastname = $2, photo = COALESCE($3, photo)
            WHERE id = $4
            "#,
        )
        .bind(&author.firstname)
        .bind(&author.lastname)
        .bind(&author.photo)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Author not found".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let nb_books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if nb_books > 0 {
            return Err(AppError::Validation(
                "Author has associated books, delete books first".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Author not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_photo(&self, id: i32, path: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE authors SET photo = $1 WHERE id = $2")
            .bind(path)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Author not found".to_string()));
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Author>> {
        let pattern = like_pattern(query);
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT id, firstname, lastname, photo
            FROM authors
            WHERE firstname ILIKE $1 OR lastname ILIKE $1
            ORDER BY id
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }
}
