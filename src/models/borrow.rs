//! Borrow ledger model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// One borrow cycle of a book by a subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: i32,
    pub subscriber_id: i32,
    pub book_id: i32,
    pub date_of_borrow: DateTime<Utc>,
    /// Unset while the book is still out
    pub return_date: Option<DateTime<Utc>>,
}

impl BorrowRecord {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Body of both `/book/borrow` and `/book/return`
#[derive(Debug, Clone, Copy, Deserialize, Validate, ToSchema)]
pub struct BorrowRequest {
    #[serde(default)]
    #[validate(range(min = 1, message = "Missing required fields"))]
    pub subscriber_id: i32,
    #[serde(default)]
    #[validate(range(min = 1, message = "Missing required fields"))]
    pub book_id: i32,
}
