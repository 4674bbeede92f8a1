//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::book::{BookDetails, CreateBook, UpdateBook},
};

use super::like_pattern;

#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// All books with their author's names
    async fn list(&self) -> AppResult<Vec<BookDetails>>;

    async fn get(&self, id: i32) -> AppResult<BookDetails>;

    /// Insert a book (not borrowed) and return its ID
    async fn create(&self, book: &CreateBook) -> AppResult<i32>;

    async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<()>;

    /// Delete a book and its borrow history. The author goes too when this
    /// was their last book. Refused while the book is borrowed.
    async fn delete(&self, id: i32) -> AppResult<()>;

    async fn set_photo(&self, id: i32, path: &str) -> AppResult<()>;

    /// Case-insensitive substring search on title and author names
    async fn search(&self, query: &str) -> AppResult<Vec<BookDetails>>;
}

const BOOK_DETAILS_SELECT: &str = r#"
    SELECT b.id AS book_id, b.title AS book_title, b.author_id,
           b.photo AS book_photo, b.is_borrowed, b.details AS book_details,
           a.lastname AS author_lastname, a.firstname AS author_firstname
    FROM books b
    JOIN authors a ON b.author_id = a.id
"#;

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn ensure_author_exists(&self, author_id: i32) -> AppResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE id = $1)")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("Author with id {} not found", author_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn list(&self) -> AppResult<Vec<BookDetails>> {
        let books = sqlx::query_as::<_, BookDetails>(&format!("{} ORDER BY b.id", BOOK_DETAILS_SELECT))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get(&self, id: i32) -> AppResult<BookDetails> {
        sqlx::query_as::<_, BookDetails>(&format!("{} WHERE b.id = $1", BOOK_DETAILS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    async fn create(&self, book: &CreateBook) -> AppResult<i32> {
        self.ensure_author_exists(book.author_id).await?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (title, photo, details, author_id, is_borrowed)
            VALUES ($1, '', $2, $3, FALSE)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.details)
        .bind(book.author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update(&self, id: i32, book: &UpdateBook) -> AppResult<()> {
        self.ensure_author_exists(book.author_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $1, author_id = $2,
                photo = COALESCE($3, photo), details = COALESCE($4, details)
            WHERE id = $5
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.photo)
        .bind(&book.details)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT author_id, is_borrowed FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        let author_id: i32 = row.get("author_id");
        let is_borrowed: bool = row.get("is_borrowed");
        if is_borrowed {
            return Err(AppError::Conflict("Book is currently borrowed".to_string()));
        }

        sqlx::query("DELETE FROM borrowed_books WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let nb_other_books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&mut *tx)
            .await?;
        if nb_other_books == 0 {
            sqlx::query("DELETE FROM authors WHERE id = $1")
                .bind(author_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_photo(&self, id: i32, path: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE books SET photo = $1 WHERE id = $2")
            .bind(path)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> AppResult<Vec<BookDetails>> {
        let pattern = like_pattern(query);
        let books = sqlx::query_as::<_, BookDetails>(&format!(
            "{} WHERE b.title ILIKE $1 OR a.firstname ILIKE $1 OR a.lastname ILIKE $1 ORDER BY b.id",
            BOOK_DETAILS_SELECT
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}
