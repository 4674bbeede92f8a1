//! Subscriber (library member) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subscriber {
    pub id: i32,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

/// Create or update subscriber request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubscriberInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Firstname, Lastname, and Email are required fields"))]
    pub firstname: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Firstname, Lastname, and Email are required fields"))]
    pub lastname: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Firstname, Lastname, and Email are required fields"),
        email(message = "Invalid email format")
    )]
    pub email: String,
}
