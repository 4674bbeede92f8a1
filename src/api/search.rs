//! Substring search endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::{author::Author, book::BookDetails},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring to look for
    pub query: Option<String>,
}

/// Search books by title or author name
#[utoipa::path(
    get,
    path = "/search_books",
    tag = "search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<BookDetails>),
        (status = 400, description = "Query parameter is missing", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<BookDetails>>> {
    Ok(Json(state.services.catalog.search_books(params.query.as_deref()).await?))
}

/// Search authors by first or last name
#[utoipa::path(
    get,
    path = "/search_authors",
    tag = "search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching authors", body = Vec<Author>),
        (status = 400, description = "Query parameter is required", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_authors(
    State(state): State<crate::AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Author>>> {
    Ok(Json(state.services.catalog.search_authors(params.query.as_deref()).await?))
}
