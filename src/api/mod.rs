//! HTTP handlers and routing

pub mod auth;
pub mod authors;
pub mod books;
pub mod borrows;
pub mod health;
pub mod openapi;
pub mod search;
pub mod subscribers;

use std::time::Duration;

use axum::{
    async_trait,
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts, Multipart},
    http::request::Parts,
    routing::{get, post},
    RequestPartsExt, Router,
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    AppState,
};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

/// JSON body extractor whose rejections use the API error format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Caller holding a valid session, from the `Authorization: Bearer` header or the `token` cookie
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
            Ok(TypedHeader(Authorization(bearer))) => bearer.token().to_string(),
            Err(_) => CookieJar::from_headers(&parts.headers)
                .get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .ok_or_else(|| AppError::Unauthorized("Missing session token".to_string()))?,
        };

        let user_id = state.services.auth.authenticate(&token).await.map_err(|e| {
            tracing::warn!("Rejected session: {}", e);
            e
        })?;

        Ok(AuthenticatedUser { user_id, token })
    }
}

/// Body of creation responses
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Pull the `file` field out of a multipart upload
pub(crate) async fn read_upload(multipart: &mut Multipart) -> AppResult<(Option<String>, Bytes)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid upload: {}", e.body_text())))?;
        return Ok((file_name, bytes));
    }
    Err(AppError::Validation("No file uploaded".to_string()))
}

/// Build the application router with every route and middleware
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let body_limit = state.config.uploads.max_size_bytes;

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Accounts
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        // Books
        .route("/books", get(books::list_books))
        .route("/books/new", post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .post(books::update_book)
                .delete(books::delete_book),
        )
        .route("/books/photo/:id", post(books::upload_photo))
        .route("/books/:id/subscribers", get(books::list_book_subscribers))
        .route("/books/:id/borrows", get(borrows::book_history))
        // Borrow workflow
        .route("/book/borrow", post(borrows::borrow_book))
        .route("/book/return", post(borrows::return_book))
        // Authors
        .route("/authors", get(authors::list_authors))
        .route("/authorsbooks", get(authors::list_authors_with_books))
        .route("/authors/new", post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .post(authors::update_author)
                .delete(authors::delete_author),
        )
        .route("/author/photo/:id", post(authors::upload_photo))
        // Subscribers
        .route("/subscribers", get(subscribers::list_subscribers))
        .route("/subscribers/new", post(subscribers::create_subscriber))
        .route(
            "/subscribers/:id",
            get(subscribers::list_borrowers_of_book)
                .put(subscribers::update_subscriber)
                .post(subscribers::update_subscriber)
                .delete(subscribers::delete_subscriber),
        )
        // Search
        .route("/search_books", get(search::search_books))
        .route("/search_authors", get(search::search_authors))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
