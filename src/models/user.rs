//! User account model and credentials

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Account able to log in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    /// Salted argon2 hash in PHC string format
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Signup and login request body
#[derive(Deserialize, Validate, ToSchema)]
pub struct Credentials {
    #[serde(default)]
    #[validate(email(message = "Invalid email or password"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Invalid email or password"))]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
