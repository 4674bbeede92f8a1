//! Login sessions
//!
//! A session is an opaque random token mapped to the user who logged in and an
//! absolute expiry. [`SessionStore`] abstracts where that mapping lives so the
//! in-process map can be swapped for Redis when several server instances share
//! one user base.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};

use super::clock::Clock;

/// Number of random bytes in a session token
pub const TOKEN_BYTES: usize = 32;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a session for `user_id` and return its token
    async fn issue(&self, user_id: i32) -> AppResult<String>;

    /// Resolve a token to its user; `Unauthorized` when unknown or expired
    async fn validate(&self, token: &str) -> AppResult<i32>;

    /// Forget a token. Unknown tokens are ignored.
    async fn expire(&self, token: &str) -> AppResult<()>;

    /// Drop every expired session and return how many went
    async fn reap_expired(&self) -> AppResult<usize>;
}

/// Generate a fresh URL-safe session token from the OS random source
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: i32,
    expires_at: DateTime<Utc>,
}

/// Sessions held in process memory; lost on restart
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    fn sessions(&self) -> AppResult<MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("session store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn issue(&self, user_id: i32) -> AppResult<String> {
        let token = generate_token();
        let expires_at = self.clock.now() + self.ttl;
        self.sessions()?
            .insert(token.clone(), Session { user_id, expires_at });
        Ok(token)
    }

    async fn validate(&self, token: &str) -> AppResult<i32> {
        let now = self.clock.now();
        let mut sessions = self.sessions()?;
        let session = *sessions
            .get(token)
            .ok_or_else(|| AppError::Unauthorized("Invalid session token".to_string()))?;

        if session.expires_at <= now {
            sessions.remove(token);
            return Err(AppError::Unauthorized("Session expired".to_string()));
        }
        Ok(session.user_id)
    }

    async fn expire(&self, token: &str) -> AppResult<()> {
        self.sessions()?.remove(token);
        Ok(())
    }

    async fn reap_expired(&self) -> AppResult<usize> {
        let now = self.clock.now();
        let mut sessions = self.sessions()?;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        Ok(before - sessions.len())
    }
}

/// Periodically sweep expired sessions.
///
/// Returns `None` when `every` is zero, which disables sweeping.
pub fn spawn_reaper(store: Arc<dyn SessionStore>, every: std::time::Duration) -> Option<JoinHandle<()>> {
    if every.is_zero() {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.reap_expired().await {
                Ok(0) => {}
                Ok(reaped) => tracing::debug!(reaped, "Reaped expired sessions"),
                Err(e) => tracing::warn!("Session reaper failed: {}", e),
            }
        }
    }))
}
