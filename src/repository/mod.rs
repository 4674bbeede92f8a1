//! Repository layer for database operations
//!
//! Each entity has a trait describing its persistence contract. The PostgreSQL
//! implementations back production deployments; [`memory::MemoryRepository`]
//! implements every trait in-process for development and tests.

pub mod authors;
pub mod books;
pub mod borrows;
pub mod memory;
pub mod subscribers;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use authors::AuthorsRepository;
pub use books::BooksRepository;
pub use borrows::BorrowsRepository;
pub use subscribers::SubscribersRepository;
pub use users::UsersRepository;

/// Main repository struct holding one handle per entity store
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn AuthorsRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub subscribers: Arc<dyn SubscribersRepository>,
    pub borrows: Arc<dyn BorrowsRepository>,
    pub users: Arc<dyn UsersRepository>,
}

impl Repository {
    /// Create a repository backed by the given PostgreSQL pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(authors::PgAuthorsRepository::new(pool.clone())),
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            subscribers: Arc::new(subscribers::PgSubscribersRepository::new(pool.clone())),
            borrows: Arc::new(borrows::PgBorrowsRepository::new(pool.clone())),
            users: Arc::new(users::PgUsersRepository::new(pool)),
        }
    }

    /// Create a repository whose data lives in process memory
    pub fn memory() -> Self {
        let store = Arc::new(memory::MemoryRepository::default());
        Self {
            authors: store.clone(),
            books: store.clone(),
            subscribers: store.clone(),
            borrows: store.clone(),
            users: store,
        }
    }
}

/// Wraps a search term for a `LIKE` substring match
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
