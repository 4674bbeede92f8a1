//! Borrow and return endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::borrow::{BorrowRecord, BorrowRequest},
};

use super::{AppJson, AuthenticatedUser, MessageResponse};

/// Lend a book to a subscriber
#[utoipa::path(
    post,
    path = "/book/borrow",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = MessageResponse),
        (status = 400, description = "Missing required fields", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or subscriber not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is already borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    AppJson(request): AppJson<BorrowRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    state.services.borrows.borrow(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Book borrowed successfully".to_string(),
        }),
    ))
}

/// Take a book back
#[utoipa::path(
    post,
    path = "/book/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 200, description = "Book returned", body = String),
        (status = 400, description = "Book is not borrowed, or not by this subscriber", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    AppJson(request): AppJson<BorrowRequest>,
) -> AppResult<&'static str> {
    state.services.borrows.return_book(request).await?;
    Ok("Book returned successfully")
}

/// Borrow ledger of a book
#[utoipa::path(
    get,
    path = "/books/{id}/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Open and closed borrow records, oldest first", body = Vec<BorrowRecord>),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn book_history(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    Ok(Json(state.services.borrows.history(id).await?))
}
