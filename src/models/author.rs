//! Author model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub firstname: String,
    pub lastname: String,
    /// Path of the uploaded portrait, empty when none
    pub photo: String,
}

/// One (author, book) pair as listed by `/authorsbooks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuthorBook {
    pub author_firstname: String,
    pub author_lastname: String,
    pub book_title: String,
    pub book_photo: String,
}

/// Book entry nested under an author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuthorBookEntry {
    pub book_id: i32,
    pub book_title: String,
    pub book_photo: String,
}

/// Author with the books they wrote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthorWithBooks {
    pub author_id: i32,
    pub author_firstname: String,
    pub author_lastname: String,
    pub author_photo: String,
    pub books: Vec<AuthorBookEntry>,
}

/// Create author request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[serde(default)]
    #[validate(length(min = 1, message = "Firstname and Lastname are required fields"))]
    pub firstname: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Firstname and Lastname are required fields"))]
    pub lastname: String,
}

/// Update author request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[serde(default)]
    #[validate(length(min = 1, message = "Firstname and Lastname are required fields"))]
    pub firstname: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Firstname and Lastname are required fields"))]
    pub lastname: String,
    /// Replaces the stored photo path when present
    pub photo: Option<String>,
}
