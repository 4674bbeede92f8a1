//! Book catalog endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{BookDetails, CreateBook, UpdateBook},
        subscriber::Subscriber,
    },
};

use super::{read_upload, AppJson, AuthenticatedUser, CreatedResponse};

/// List all books with their author
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<BookDetails>)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<BookDetails>>> {
    Ok(Json(state.services.catalog.list_books().await?))
}

/// Get one book
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetails>> {
    Ok(Json(state.services.catalog.get_book(id).await?))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books/new",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = CreatedResponse),
        (status = 400, description = "Missing title or author", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    AppJson(book): AppJson<CreateBook>,
) -> AppResult<(StatusCode, Json<CreatedResponse>)> {
    let id = state.services.catalog.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Update a book. The borrowed flag is left alone.
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = String),
        (status = 400, description = "Missing title or author", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(book): AppJson<UpdateBook>,
) -> AppResult<&'static str> {
    state.services.catalog.update_book(id, book).await?;
    Ok("Book updated successfully")
}

/// Delete a book, its borrow history, and its author if this was their last book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = String),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is currently borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<&'static str> {
    state.services.catalog.delete_book(id).await?;
    Ok("Book deleted successfully")
}

/// Upload a cover image (multipart field `file`)
#[utoipa::path(
    post,
    path = "/books/photo/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Photo stored", body = String),
        (status = 400, description = "No file in the upload", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn upload_photo(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> AppResult<String> {
    let (file_name, bytes) = read_upload(&mut multipart).await?;
    let path = state
        .services
        .catalog
        .set_book_photo(id, file_name.as_deref(), &bytes)
        .await?;
    Ok(format!("File uploaded successfully: {}", path))
}

/// Subscribers who ever borrowed the book
#[utoipa::path(
    get,
    path = "/books/{id}/subscribers",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Borrowers of the book", body = Vec<Subscriber>),
        (status = 404, description = "No subscribers found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_book_subscribers(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Subscriber>>> {
    Ok(Json(state.services.catalog.book_subscribers(id).await?))
}
