//! Data models for the library server

pub mod author;
pub mod book;
pub mod borrow;
pub mod subscriber;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorBook, AuthorWithBooks};
pub use book::{Book, BookDetails};
pub use borrow::{BorrowRecord, BorrowRequest};
pub use subscriber::Subscriber;
pub use user::{Credentials, User};
