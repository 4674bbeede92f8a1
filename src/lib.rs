//! Library management server
//!
//! REST JSON API over a catalog of authors and books, the subscribers who
//! borrow them, and the borrow/return ledger, with email/password accounts and
//! session tokens guarding every mutation.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
