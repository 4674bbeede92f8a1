//! In-process implementation of every repository trait
//!
//! All state sits behind one mutex and every operation completes while holding
//! it, so multi-step operations (borrow, return, cascading deletes) are atomic
//! in the same way the PostgreSQL transactions are.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorBook, AuthorBookEntry, AuthorWithBooks, CreateAuthor, UpdateAuthor},
        book::{Book, BookDetails, CreateBook, UpdateBook},
        borrow::BorrowRecord,
        subscriber::{Subscriber, SubscriberInput},
        user::User,
    },
};

use super::{AuthorsRepository, BooksRepository, BorrowsRepository, SubscribersRepository, UsersRepository};

#[derive(Default)]
struct MemoryState {
    authors: BTreeMap<i32, Author>,
    books: BTreeMap<i32, Book>,
    subscribers: BTreeMap<i32, Subscriber>,
    borrows: Vec<BorrowRecord>,
    users: BTreeMap<i32, User>,
    last_id: i32,
}

impl MemoryState {
    /// IDs are shared across tables; they only need to be unique per table.
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn book_details(&self, book: &Book) -> BookDetails {
        let (firstname, lastname) = self
            .authors
            .get(&book.author_id)
            .map(|a| (a.firstname.clone(), a.lastname.clone()))
            .unwrap_or_default();
        BookDetails {
            book_id: book.id,
            book_title: book.title.clone(),
            author_id: book.author_id,
            book_photo: book.photo.clone(),
            is_borrowed: book.is_borrowed,
            book_details: book.details.clone(),
            author_lastname: lastname,
            author_firstname: firstname,
        }
    }

    fn ensure_author_exists(&self, author_id: i32) -> AppResult<()> {
        if !self.authors.contains_key(&author_id) {
            return Err(AppError::NotFound(format!("Author with id {} not found", author_id)));
        }
        Ok(())
    }
}

/// Repository keeping all data in process memory
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    fn state(&self) -> AppResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("memory repository lock poisoned".to_string()))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[async_trait]
impl AuthorsRepository for MemoryRepository {
    async fn list(&self) -> AppResult<Vec<Author>> {
        Ok(self.state()?.authors.values().cloned().collect())
    }

    async fn list_with_books(&self) -> AppResult<Vec<AuthorBook>> {
        let state = self.state()?;
        let mut rows = Vec::new();
        for author in state.authors.values() {
            for book in state.books.values().filter(|b| b.author_id == author.id) {
                rows.push(AuthorBook {
                    author_firstname: author.firstname.clone(),
                    author_lastname: author.lastname.clone(),
                    book_title: book.title.clone(),
                    book_photo: book.photo.clone(),
                });
            }
        }
        Ok(rows)
    }

    async fn get_with_books(&self, id: i32) -> AppResult<AuthorWithBooks> {
        let state = self.state()?;
        let author = state
            .authors
            .get(&id)
            .ok_or_else(|| AppError::NotFound("Author not found".to_string()))?;
        let books = state
            .books
            .values()
            .filter(|b| b.author_id == id)
            .map(|b| AuthorBookEntry {
                book_id: b.id,
                book_title: b.title.clone(),
                book_photo: b.photo.clone(),
            })
            .collect();
        Ok(AuthorWithBooks {
            author_id: author.id,
            author_firstname: author.firstname.clone(),
            author_lastname: author.lastname.clone(),
            author_photo: author.photo.clone(),
            books,
        })
    }

    async fn create(&self, author: &CreateAuthor) -> AppResult<i32> {
        let mut state = self.state()?;
        let id = state.next_id();
        state.authors.insert(
            id,
            Author {
                id,
                firstname: author.firstname.clone(),
                lastname: author.lastname.clone(),
                photo: String::new(),
            },
        );
        Ok(id)
    }

    async fn update(&self, id: i32, update: &UpdateAuthor) -> AppResult<()> {
        let mut state = self.state()?;
        let author = state
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Author not found".to_string()))?;
        author.firstname = update.firstname.clone();
        author.lastname = update.lastname.clone();
        if let Some(ref photo) = update.photo {
            author.photo = photo.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut state = self.state()?;
        if state.books.values().any(|b| b.author_id == id) {
            return Err(AppError::Validation(
                "Author has associated books, delete books first".to_string(),
            ));
        }
        state
            .authors
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Author not found".to_string()))
    }

    async fn set_photo(&self, id: i32, path: &str) -> AppResult<()> {
        let mut state = self.state()?;
        let author = state
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Author not found".to_string()))?;
        author.photo = path.to_string();
        Ok(())
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Author>> {
        let needle = query.to_lowercase();
        Ok(self
            .state()?
            .authors
            .values()
            .filter(|a| contains_ignore_case(&a.firstname, &needle) || contains_ignore_case(&a.lastname, &needle))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BooksRepository for MemoryRepository {
    async fn list(&self) -> AppResult<Vec<BookDetails>> {
        let state = self.state()?;
        Ok(state.books.values().map(|b| state.book_details(b)).collect())
    }

    async fn get(&self, id: i32) -> AppResult<BookDetails> {
        let state = self.state()?;
        state
            .books
            .get(&id)
            .map(|b| state.book_details(b))
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    async fn create(&self, book: &CreateBook) -> AppResult<i32> {
        let mut state = self.state()?;
        state.ensure_author_exists(book.author_id)?;
        let id = state.next_id();
        state.books.insert(
            id,
            Book {
                id,
                title: book.title.clone(),
                details: book.details.clone(),
                photo: String::new(),
                author_id: book.author_id,
                is_borrowed: false,
            },
        );
        Ok(id)
    }

    async fn update(&self, id: i32, update: &UpdateBook) -> AppResult<()> {
        let mut state = self.state()?;
        state.ensure_author_exists(update.author_id)?;
        let book = state
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
        book.title = update.title.clone();
        book.author_id = update.author_id;
        if let Some(ref photo) = update.photo {
            book.photo = photo.clone();
        }
        if let Some(ref details) = update.details {
            book.details = details.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut state = self.state()?;
        let book = state
            .books
            .get(&id)
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
        if book.is_borrowed {
            return Err(AppError::Conflict("Book is currently borrowed".to_string()));
        }
        let author_id = book.author_id;

        state.books.remove(&id);
        state.borrows.retain(|r| r.book_id != id);
        if !state.books.values().any(|b| b.author_id == author_id) {
            state.authors.remove(&author_id);
        }
        Ok(())
    }

    async fn set_photo(&self, id: i32, path: &str) -> AppResult<()> {
        let mut state = self.state()?;
        let book = state
            .books
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
        book.photo = path.to_string();
        Ok(())
    }

    async fn search(&self, query: &str) -> AppResult<Vec<BookDetails>> {
        let needle = query.to_lowercase();
        let state = self.state()?;
        Ok(state
            .books
            .values()
            .map(|b| state.book_details(b))
            .filter(|d| {
                contains_ignore_case(&d.book_title, &needle)
                    || contains_ignore_case(&d.author_firstname, &needle)
                    || contains_ignore_case(&d.author_lastname, &needle)
            })
            .collect())
    }
}

#[async_trait]
impl SubscribersRepository for MemoryRepository {
    async fn list(&self) -> AppResult<Vec<Subscriber>> {
        Ok(self.state()?.subscribers.values().cloned().collect())
    }

    async fn create(&self, subscriber: &SubscriberInput) -> AppResult<i32> {
        let mut state = self.state()?;
        let id = state.next_id();
        state.subscribers.insert(
            id,
            Subscriber {
                id,
                firstname: subscriber.firstname.clone(),
                lastname: subscriber.lastname.clone(),
                email: subscriber.email.clone(),
            },
        );
        Ok(id)
    }

    async fn update(&self, id: i32, update: &SubscriberInput) -> AppResult<()> {
        let mut state = self.state()?;
        let subscriber = state
            .subscribers
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Subscriber not found".to_string()))?;
        subscriber.firstname = update.firstname.clone();
        subscriber.lastname = update.lastname.clone();
        subscriber.email = update.email.clone();
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut state = self.state()?;
        if !state.subscribers.contains_key(&id) {
            return Err(AppError::NotFound("Subscriber not found".to_string()));
        }
        if state.borrows.iter().any(|r| r.subscriber_id == id && r.is_open()) {
            return Err(AppError::Conflict("Subscriber has borrowed books".to_string()));
        }
        state.borrows.retain(|r| r.subscriber_id != id);
        state.subscribers.remove(&id);
        Ok(())
    }

    async fn list_by_book(&self, book_id: i32) -> AppResult<Vec<Subscriber>> {
        let state = self.state()?;
        let mut ids: Vec<i32> = state
            .borrows
            .iter()
            .filter(|r| r.book_id == book_id)
            .map(|r| r.subscriber_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .into_iter()
            .filter_map(|id| state.subscribers.get(&id).cloned())
            .collect())
    }
}

#[async_trait]
impl BorrowsRepository for MemoryRepository {
    async fn borrow(&self, subscriber_id: i32, book_id: i32, at: DateTime<Utc>) -> AppResult<BorrowRecord> {
        let mut state = self.state()?;

        match state.books.get(&book_id) {
            None => return Err(AppError::NotFound("Book not found".to_string())),
            Some(book) if book.is_borrowed => {
                return Err(AppError::Conflict("Book is already borrowed".to_string()))
            }
            Some(_) => {}
        }
        if !state.subscribers.contains_key(&subscriber_id) {
            return Err(AppError::NotFound("Subscriber not found".to_string()));
        }

        let record = BorrowRecord {
            id: state.next_id(),
            subscriber_id,
            book_id,
            date_of_borrow: at,
            return_date: None,
        };
        state.borrows.push(record.clone());
        if let Some(book) = state.books.get_mut(&book_id) {
            book.is_borrowed = true;
        }
        Ok(record)
    }

    async fn return_book(&self, subscriber_id: i32, book_id: i32, at: DateTime<Utc>) -> AppResult<BorrowRecord> {
        let mut state = self.state()?;

        match state.books.get(&book_id) {
            None => return Err(AppError::NotFound("Book not found".to_string())),
            Some(book) if !book.is_borrowed => {
                return Err(AppError::Validation("Book is not borrowed".to_string()))
            }
            Some(_) => {}
        }

        let record = state
            .borrows
            .iter_mut()
            .find(|r| r.subscriber_id == subscriber_id && r.book_id == book_id && r.is_open())
            .ok_or_else(|| AppError::Validation("Book is not borrowed by this subscriber".to_string()))?;
        record.return_date = Some(at);
        let record = record.clone();

        if let Some(book) = state.books.get_mut(&book_id) {
            book.is_borrowed = false;
        }
        Ok(record)
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BorrowRecord>> {
        Ok(self
            .state()?
            .borrows
            .iter()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UsersRepository for MemoryRepository {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.state()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> AppResult<i32> {
        let mut state = self.state()?;
        if state.users.values().any(|u| u.email == email) {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        let id = state.next_id();
        state.users.insert(
            id,
            User {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(id)
    }
}
