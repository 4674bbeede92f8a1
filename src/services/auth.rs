//! Signup, login and session checks

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Credentials, User},
    repository::Repository,
};

use super::sessions::SessionStore;

/// Wording shared by every credential failure so callers cannot probe for accounts
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Outcome of a successful login
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub user_id: i32,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    sessions: Arc<dyn SessionStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, sessions: Arc<dyn SessionStore>, config: AuthConfig) -> Self {
        Self { repository, sessions, config }
    }

    /// Create an account. No session is opened; the caller logs in separately.
    pub async fn signup(&self, credentials: &Credentials) -> AppResult<i32> {
        let email = self.check_credentials(credentials)?;

        if self.repository.users.get_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let hash = self.hash_password(&credentials.password)?;
        let user_id = self.repository.users.create(&email, &hash).await?;
        tracing::info!(user_id, "User signed up");
        Ok(user_id)
    }

    /// Verify credentials and open a session
    pub async fn login(&self, credentials: &Credentials) -> AppResult<LoginSession> {
        let email = self.check_credentials(credentials)?;

        let user = match self.repository.users.get_by_email(&email).await? {
            Some(user) => user,
            None => {
                tracing::warn!("Login for unknown account");
                return Err(AppError::NotFound(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !self.verify_password(&user, &credentials.password)? {
            tracing::warn!(user_id = user.id, "Login with wrong password");
            return Err(AppError::Validation(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.sessions.issue(user.id).await?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(LoginSession { token, user_id: user.id })
    }

    /// Resolve a session token to the logged-in user
    pub async fn authenticate(&self, token: &str) -> AppResult<i32> {
        self.sessions.validate(token).await
    }

    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.sessions.expire(token).await
    }

    /// Validate shape and domain, returning the normalized email
    fn check_credentials(&self, credentials: &Credentials) -> AppResult<String> {
        credentials.validate()?;

        let email = credentials.email.trim().to_lowercase();
        if !self.config.allowed_email_domains.is_empty() {
            let domain = email.rsplit_once('@').map(|(_, d)| d).unwrap_or_default();
            let allowed = self
                .config
                .allowed_email_domains
                .iter()
                .any(|d| d.eq_ignore_ascii_case(domain));
            if !allowed {
                return Err(AppError::Validation(INVALID_CREDENTIALS.to_string()));
            }
        }
        Ok(email)
    }

    fn argon2(&self) -> AppResult<Argon2<'static>> {
        let params = Params::new(
            self.config.password_hash_memory_kib,
            self.config.password_hash_iterations,
            1,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Invalid password hash parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        // Cost parameters are read back from the stored hash
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
