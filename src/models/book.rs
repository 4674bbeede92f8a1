//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book row as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub details: String,
    pub photo: String,
    pub author_id: i32,
    /// True iff an open borrow record exists for this book
    pub is_borrowed: bool,
}

/// Book joined with its author's names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookDetails {
    pub book_id: i32,
    pub book_title: String,
    pub author_id: i32,
    pub book_photo: String,
    pub is_borrowed: bool,
    pub book_details: String,
    pub author_lastname: String,
    pub author_firstname: String,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title and AuthorID are required fields"))]
    pub title: String,
    #[serde(default)]
    #[validate(range(min = 1, message = "Title and AuthorID are required fields"))]
    pub author_id: i32,
    #[serde(default)]
    pub details: String,
}

/// Update book request.
///
/// The borrowed flag is deliberately absent: only the borrow workflow may change it.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title and AuthorID are required fields"))]
    pub title: String,
    #[serde(default)]
    #[validate(range(min = 1, message = "Title and AuthorID are required fields"))]
    pub author_id: i32,
    pub photo: Option<String>,
    pub details: Option<String>,
}
