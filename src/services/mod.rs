//! Business logic services

pub mod auth;
pub mod borrows;
pub mod catalog;
pub mod clock;
pub mod photos;
pub mod redis;
pub mod sessions;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

use self::{clock::Clock, photos::PhotoStorage, sessions::SessionStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub borrows: borrows::BorrowsService,
    pub catalog: catalog::CatalogService,
}

impl Services {
    /// Create all services over the given repository and session store
    pub fn new(
        repository: Repository,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), sessions, config.auth.clone()),
            borrows: borrows::BorrowsService::new(repository.clone(), clock),
            catalog: catalog::CatalogService::new(repository, PhotoStorage::new(&config.uploads.dir)),
        }
    }
}
