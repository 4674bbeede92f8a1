//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, borrows, health, search, subscribers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "0.1.0",
        description = "Library management REST API: catalog, subscribers and borrowing"
    ),
    paths(
        // Health
        health::health_check,
        // Accounts
        auth::signup,
        auth::login,
        auth::logout,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::upload_photo,
        books::list_book_subscribers,
        // Borrows
        borrows::borrow_book,
        borrows::return_book,
        borrows::book_history,
        // Authors
        authors::list_authors,
        authors::list_authors_with_books,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        authors::upload_photo,
        // Subscribers
        subscribers::list_subscribers,
        subscribers::list_borrowers_of_book,
        subscribers::create_subscriber,
        subscribers::update_subscriber,
        subscribers::delete_subscriber,
        // Search
        search::search_books,
        search::search_authors,
    ),
    components(
        schemas(
            // Accounts
            crate::models::user::Credentials,
            auth::SignupResponse,
            auth::LoginResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Authors
            crate::models::author::Author,
            crate::models::author::AuthorBook,
            crate::models::author::AuthorBookEntry,
            crate::models::author::AuthorWithBooks,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            // Subscribers
            crate::models::subscriber::Subscriber,
            crate::models::subscriber::SubscriberInput,
            // Borrows
            crate::models::borrow::BorrowRecord,
            crate::models::borrow::BorrowRequest,
            // Shared
            super::CreatedResponse,
            super::MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Signup, login and logout"),
        (name = "books", description = "Book catalog"),
        (name = "authors", description = "Authors"),
        (name = "subscribers", description = "Library members"),
        (name = "borrows", description = "Borrow and return workflow"),
        (name = "search", description = "Substring search")
    )
)]
pub struct ApiDoc;

/// Declares the session token as a bearer credential
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
