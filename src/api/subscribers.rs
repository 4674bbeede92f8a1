//! Subscriber endpoints; all require a session

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::subscriber::{Subscriber, SubscriberInput},
};

use super::{AppJson, AuthenticatedUser, CreatedResponse};

#[utoipa::path(
    get,
    path = "/subscribers",
    tag = "subscribers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All subscribers", body = Vec<Subscriber>),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_subscribers(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<Vec<Subscriber>>> {
    Ok(Json(state.services.catalog.list_subscribers().await?))
}

/// Subscribers who ever borrowed the book, kept at the older path of `/books/{id}/subscribers`
#[utoipa::path(
    get,
    path = "/subscribers/{id}",
    tag = "subscribers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Borrowers of the book", body = Vec<Subscriber>),
        (status = 404, description = "No subscribers found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_borrowers_of_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Vec<Subscriber>>> {
    Ok(Json(state.services.catalog.book_subscribers(book_id).await?))
}

#[utoipa::path(
    post,
    path = "/subscribers/new",
    tag = "subscribers",
    security(("bearer_auth" = [])),
    request_body = SubscriberInput,
    responses(
        (status = 201, description = "Subscriber created", body = CreatedResponse),
        (status = 400, description = "Missing or malformed fields", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_subscriber(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    AppJson(subscriber): AppJson<SubscriberInput>,
) -> AppResult<(StatusCode, Json<CreatedResponse>)> {
    let id = state.services.catalog.create_subscriber(subscriber).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    put,
    path = "/subscribers/{id}",
    tag = "subscribers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Subscriber ID")),
    request_body = SubscriberInput,
    responses(
        (status = 200, description = "Subscriber updated", body = String),
        (status = 404, description = "Subscriber not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_subscriber(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(subscriber): AppJson<SubscriberInput>,
) -> AppResult<&'static str> {
    state.services.catalog.update_subscriber(id, subscriber).await?;
    Ok("Subscriber updated successfully")
}

/// Delete a subscriber who holds no book
#[utoipa::path(
    delete,
    path = "/subscribers/{id}",
    tag = "subscribers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Subscriber ID")),
    responses(
        (status = 200, description = "Subscriber deleted", body = String),
        (status = 404, description = "Subscriber not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Subscriber has borrowed books", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_subscriber(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<&'static str> {
    state.services.catalog.delete_subscriber(id).await?;
    Ok("Subscriber deleted successfully")
}
