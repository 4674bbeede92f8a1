//! Author endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::author::{Author, AuthorBook, AuthorWithBooks, CreateAuthor, UpdateAuthor},
};

use super::{read_upload, AppJson, AuthenticatedUser, CreatedResponse};

#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    responses(
        (status = 200, description = "All authors", body = Vec<Author>)
    )
)]
pub async fn list_authors(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Author>>> {
    Ok(Json(state.services.catalog.list_authors().await?))
}

/// Every (author, book) pair
#[utoipa::path(
    get,
    path = "/authorsbooks",
    tag = "authors",
    responses(
        (status = 200, description = "Authors with their book titles", body = Vec<AuthorBook>)
    )
)]
pub async fn list_authors_with_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<AuthorBook>>> {
    Ok(Json(state.services.catalog.list_authors_with_books().await?))
}

#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author and their books", body = AuthorWithBooks),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorWithBooks>> {
    Ok(Json(state.services.catalog.get_author(id).await?))
}

#[utoipa::path(
    post,
    path = "/authors/new",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = CreateAuthor,
    responses(
        (status = 201, description = "Author created", body = CreatedResponse),
        (status = 400, description = "Missing names", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    AppJson(author): AppJson<CreateAuthor>,
) -> AppResult<(StatusCode, Json<CreatedResponse>)> {
    let id = state.services.catalog.create_author(author).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = UpdateAuthor,
    responses(
        (status = 200, description = "Author updated", body = String),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
    AppJson(author): AppJson<UpdateAuthor>,
) -> AppResult<&'static str> {
    state.services.catalog.update_author(id, author).await?;
    Ok("Author updated successfully")
}

/// Delete an author who has no books left
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author deleted", body = String),
        (status = 400, description = "Author still has books", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<&'static str> {
    state.services.catalog.delete_author(id).await?;
    Ok("Author deleted successfully")
}

/// Upload a portrait (multipart field `file`)
#[utoipa::path(
    post,
    path = "/author/photo/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Photo stored", body = String),
        (status = 400, description = "No file in the upload", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
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
        .set_author_photo(id, file_name.as_deref(), &bytes)
        .await?;
    Ok(format!("File uploaded successfully: {}", path))
}
