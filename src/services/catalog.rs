//! Catalog management service: authors, books, subscribers and search

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorBook, AuthorWithBooks, CreateAuthor, UpdateAuthor},
        book::{BookDetails, CreateBook, UpdateBook},
        subscriber::{Subscriber, SubscriberInput},
    },
    repository::Repository,
};

use super::photos::{PhotoKind, PhotoStorage};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    photos: PhotoStorage,
}

impl CatalogService {
    pub fn new(repository: Repository, photos: PhotoStorage) -> Self {
        Self { repository, photos }
    }

    // Books

    pub async fn list_books(&self) -> AppResult<Vec<BookDetails>> {
        self.repository.books.list().await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        self.repository.books.get(id).await
    }

    pub async fn create_book(&self, book: CreateBook) -> AppResult<i32> {
        book.validate()?;
        let id = self.repository.books.create(&book).await?;
        tracing::info!(book_id = id, author_id = book.author_id, "Book created");
        Ok(id)
    }

    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<()> {
        book.validate()?;
        self.repository.books.update(id, &book).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Store a cover image and point the book at it
    pub async fn set_book_photo(&self, id: i32, file_name: Option<&str>, bytes: &[u8]) -> AppResult<String> {
        self.repository.books.get(id).await?;
        let path = self.photos.store(PhotoKind::Book, id, file_name, bytes).await?;
        self.repository.books.set_photo(id, &path).await?;
        Ok(path)
    }

    /// Everyone who ever borrowed the book
    pub async fn book_subscribers(&self, book_id: i32) -> AppResult<Vec<Subscriber>> {
        let subscribers = self.repository.subscribers.list_by_book(book_id).await?;
        if subscribers.is_empty() {
            return Err(AppError::NotFound("No subscribers found".to_string()));
        }
        Ok(subscribers)
    }

    // Authors

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn list_authors_with_books(&self) -> AppResult<Vec<AuthorBook>> {
        self.repository.authors.list_with_books().await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorWithBooks> {
        self.repository.authors.get_with_books(id).await
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<i32> {
        author.validate()?;
        self.repository.authors.create(&author).await
    }

    pub async fn update_author(&self, id: i32, author: UpdateAuthor) -> AppResult<()> {
        author.validate()?;
        self.repository.authors.update(id, &author).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }

    pub async fn set_author_photo(&self, id: i32, file_name: Option<&str>, bytes: &[u8]) -> AppResult<String> {
        self.repository.authors.get_with_books(id).await?;
        let path = self.photos.store(PhotoKind::Author, id, file_name, bytes).await?;
        self.repository.authors.set_photo(id, &path).await?;
        Ok(path)
    }

    // Subscribers

    pub async fn list_subscribers(&self) -> AppResult<Vec<Subscriber>> {
        self.repository.subscribers.list().await
    }

    pub async fn create_subscriber(&self, subscriber: SubscriberInput) -> AppResult<i32> {
        subscriber.validate()?;
        self.repository.subscribers.create(&subscriber).await
    }

    pub async fn update_subscriber(&self, id: i32, subscriber: SubscriberInput) -> AppResult<()> {
        subscriber.validate()?;
        self.repository.subscribers.update(id, &subscriber).await
    }

    pub async fn delete_subscriber(&self, id: i32) -> AppResult<()> {
        self.repository.subscribers.delete(id).await?;
        tracing::info!(subscriber_id = id, "Subscriber deleted");
        Ok(())
    }

    // Search

    pub async fn search_books(&self, query: Option<&str>) -> AppResult<Vec<BookDetails>> {
        let query = non_empty(query).ok_or_else(|| AppError::Validation("Query parameter is missing".to_string()))?;
        self.repository.books.search(query).await
    }

    pub async fn search_authors(&self, query: Option<&str>) -> AppResult<Vec<Author>> {
        let query = non_empty(query).ok_or_else(|| AppError::Validation("Query parameter is required".to_string()))?;
        self.repository.authors.search(query).await
    }
}

fn non_empty(query: Option<&str>) -> Option<&str> {
    query.map(str::trim).filter(|q| !q.is_empty())
}
