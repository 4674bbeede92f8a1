//! API integration tests
//!
//! Drive the full router in-process over the memory repository.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use library_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{clock::ManualClock, sessions::MemorySessionStore, Services},
    AppState,
};

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response is not JSON")
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("response is not UTF-8")
    }

    fn message(&self) -> String {
        self.json()["message"].as_str().unwrap_or_default().to_string()
    }
}

impl TestApp {
    fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.password_hash_memory_kib = 8;
        config.auth.password_hash_iterations = 1;
        config.uploads.dir = std::env::temp_dir()
            .join(format!("library-api-tests-{}", std::process::id()))
            .to_string_lossy()
            .into_owned();

        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()));
        let sessions = Arc::new(MemorySessionStore::new(clock.clone(), Duration::hours(24)));
        let services = Services::new(Repository::memory(), sessions, clock.clone(), &config);

        let router = api::router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        });
        Self { router, clock }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        TestResponse { status, headers, body }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn signup(&self, email: &str, password: &str) -> TestResponse {
        self.call(Method::POST, "/signup", None, Some(json!({"email": email, "password": password})))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.call(Method::POST, "/login", None, Some(json!({"email": email, "password": password})))
            .await
    }

    /// Sign up a librarian and return a session token
    async fn token(&self) -> String {
        assert_eq!(StatusCode::CREATED, self.signup("librarian@gmail.com", "secret").await.status);
        let response = self.login("librarian@gmail.com", "secret").await;
        assert_eq!(StatusCode::OK, response.status);
        response.json()["token"].as_str().unwrap().to_string()
    }

    /// Create an author, one of their books and a subscriber
    async fn seed(&self, token: &str) -> (i64, i64, i64) {
        let author = self
            .call(
                Method::POST,
                "/authors/new",
                Some(token),
                Some(json!({"firstname": "Ursula", "lastname": "Le Guin"})),
            )
            .await;
        assert_eq!(StatusCode::CREATED, author.status);
        let author_id = author.json()["id"].as_i64().unwrap();

        let book = self
            .call(
                Method::POST,
                "/books/new",
                Some(token),
                Some(json!({"title": "The Left Hand of Darkness", "author_id": author_id})),
            )
            .await;
        assert_eq!(StatusCode::CREATED, book.status);
        let book_id = book.json()["id"].as_i64().unwrap();

        let subscriber = self
            .call(
                Method::POST,
                "/subscribers/new",
                Some(token),
                Some(json!({"firstname": "Genly", "lastname": "Ai", "email": "genly@ekumen.org"})),
            )
            .await;
        assert_eq!(StatusCode::CREATED, subscriber.status);
        let subscriber_id = subscriber.json()["id"].as_i64().unwrap();

        (author_id, book_id, subscriber_id)
    }

    async fn borrow(&self, token: &str, subscriber_id: i64, book_id: i64) -> TestResponse {
        self.call(
            Method::POST,
            "/book/borrow",
            Some(token),
            Some(json!({"subscriber_id": subscriber_id, "book_id": book_id})),
        )
        .await
    }

    async fn return_book(&self, token: &str, subscriber_id: i64, book_id: i64) -> TestResponse {
        self.call(
            Method::POST,
            "/book/return",
            Some(token),
            Some(json!({"subscriber_id": subscriber_id, "book_id": book_id})),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let response = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(StatusCode::OK, response.status);
    assert_eq!("healthy", response.json()["status"]);
}

#[tokio::test]
async fn test_signup_twice_conflicts() {
    let app = TestApp::new();
    assert_eq!(StatusCode::CREATED, app.signup("a@gmail.com", "pw").await.status);

    let response = app.signup("a@gmail.com", "pw2").await;
    assert_eq!(StatusCode::CONFLICT, response.status);
    assert_eq!("Email already in use", response.message());
}

#[tokio::test]
async fn test_signup_rejects_bad_input() {
    let app = TestApp::new();
    assert_eq!(StatusCode::BAD_REQUEST, app.signup("not-an-email", "pw").await.status);
    assert_eq!(StatusCode::BAD_REQUEST, app.signup("a@gmail.com", "").await.status);

    let garbled = Request::post("/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.send(garbled).await;
    assert_eq!(StatusCode::BAD_REQUEST, response.status);
    assert_eq!("Invalid request body", response.message());
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new();
    app.signup("a@gmail.com", "pw").await;

    let wrong = app.login("a@gmail.com", "nope").await;
    assert_eq!(StatusCode::BAD_REQUEST, wrong.status);
    assert_eq!("Invalid email or password", wrong.message());

    let unknown = app.login("b@gmail.com", "pw").await;
    assert_eq!(StatusCode::NOT_FOUND, unknown.status);
    assert_eq!("Invalid email or password", unknown.message());

    let ok = app.login("a@gmail.com", "pw").await;
    assert_eq!(StatusCode::OK, ok.status);
    let body = ok.json();
    assert_eq!("User logged in successfully", body["message"]);
    let token = body["token"].as_str().unwrap();
    assert_eq!(43, token.len());

    let cookie = ok.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with(&format!("token={}", token)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = TestApp::new();

    let response = app
        .call(Method::POST, "/authors/new", None, Some(json!({"firstname": "A", "lastname": "B"})))
        .await;
    assert_eq!(StatusCode::UNAUTHORIZED, response.status);

    let response = app.call(Method::GET, "/subscribers", Some("made-up"), None).await;
    assert_eq!(StatusCode::UNAUTHORIZED, response.status);

    // Catalog reads stay public
    assert_eq!(StatusCode::OK, app.call(Method::GET, "/books", None, None).await.status);
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let app = TestApp::new();
    let token = app.token().await;

    let request = Request::get("/subscribers")
        .header(header::COOKIE, format!("token={}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(StatusCode::OK, app.send(request).await.status);
}

#[tokio::test]
async fn test_session_expires_after_a_day() {
    let app = TestApp::new();
    let token = app.token().await;
    assert_eq!(StatusCode::OK, app.call(Method::GET, "/subscribers", Some(&token), None).await.status);

    app.clock.advance(Duration::hours(24));
    let response = app.call(Method::GET, "/subscribers", Some(&token), None).await;
    assert_eq!(StatusCode::UNAUTHORIZED, response.status);
    assert_eq!("Session expired", response.message());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new();
    let token = app.token().await;

    let response = app.call(Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(StatusCode::NO_CONTENT, response.status);
    assert!(response.headers.get(header::SET_COOKIE).is_some());

    let response = app.call(Method::GET, "/subscribers", Some(&token), None).await;
    assert_eq!(StatusCode::UNAUTHORIZED, response.status);
}

#[tokio::test]
async fn test_borrow_and_return_cycle() {
    let app = TestApp::new();
    let token = app.token().await;
    let (_, book_id, subscriber_id) = app.seed(&token).await;

    let response = app.borrow(&token, subscriber_id, book_id).await;
    assert_eq!(StatusCode::CREATED, response.status);
    assert_eq!("Book borrowed successfully", response.message());

    let book = app.call(Method::GET, &format!("/books/{}", book_id), None, None).await;
    assert_eq!(true, book.json()["is_borrowed"]);

    let response = app.borrow(&token, subscriber_id, book_id).await;
    assert_eq!(StatusCode::CONFLICT, response.status);
    assert_eq!("Book is already borrowed", response.message());

    app.clock.advance(Duration::days(7));
    let response = app.return_book(&token, subscriber_id, book_id).await;
    assert_eq!(StatusCode::OK, response.status);
    assert_eq!("Book returned successfully", response.text());

    let response = app.return_book(&token, subscriber_id, book_id).await;
    assert_eq!(StatusCode::BAD_REQUEST, response.status);
    assert_eq!("Book is not borrowed", response.message());

    let book = app.call(Method::GET, &format!("/books/{}", book_id), None, None).await;
    assert_eq!(false, book.json()["is_borrowed"]);

    let ledger = app
        .call(Method::GET, &format!("/books/{}/borrows", book_id), Some(&token), None)
        .await
        .json();
    let records = ledger.as_array().unwrap();
    assert_eq!(1, records.len());
    assert_eq!("2024-06-01T10:00:00Z", records[0]["date_of_borrow"]);
    assert_eq!("2024-06-08T10:00:00Z", records[0]["return_date"]);

    let borrowers = app
        .call(Method::GET, &format!("/books/{}/subscribers", book_id), Some(&token), None)
        .await;
    assert_eq!(StatusCode::OK, borrowers.status);
    assert_eq!(subscriber_id, borrowers.json()[0]["id"].as_i64().unwrap());

    let legacy = app
        .call(Method::GET, &format!("/subscribers/{}", book_id), Some(&token), None)
        .await;
    assert_eq!(StatusCode::OK, legacy.status);
    assert_eq!(borrowers.json(), legacy.json());
}

#[tokio::test]
async fn test_borrowers_by_book_at_subscribers_path() {
    let app = TestApp::new();
    let token = app.token().await;
    let (_, book_id, _) = app.seed(&token).await;

    let response = app.call(Method::GET, &format!("/subscribers/{}", book_id), None, None).await;
    assert_eq!(StatusCode::UNAUTHORIZED, response.status);

    let response = app
        .call(Method::GET, &format!("/subscribers/{}", book_id), Some(&token), None)
        .await;
    assert_eq!(StatusCode::NOT_FOUND, response.status);
    assert_eq!("No subscribers found", response.message());
}

#[tokio::test]
async fn test_borrow_input_errors() {
    let app = TestApp::new();
    let token = app.token().await;
    let (_, book_id, subscriber_id) = app.seed(&token).await;

    let response = app.call(Method::POST, "/book/borrow", Some(&token), Some(json!({}))).await;
    assert_eq!(StatusCode::BAD_REQUEST, response.status);
    assert_eq!("Missing required fields", response.message());

    let response = app.borrow(&token, subscriber_id, book_id + 1000).await;
    assert_eq!(StatusCode::NOT_FOUND, response.status);

    let response = app.borrow(&token, subscriber_id + 1000, book_id).await;
    assert_eq!(StatusCode::NOT_FOUND, response.status);
    // The failed borrow left the book available
    assert_eq!(StatusCode::CREATED, app.borrow(&token, subscriber_id, book_id).await.status);
}

#[tokio::test]
async fn test_return_by_other_subscriber_is_rejected() {
    let app = TestApp::new();
    let token = app.token().await;
    let (_, book_id, subscriber_id) = app.seed(&token).await;
    let other = app
        .call(
            Method::POST,
            "/subscribers/new",
            Some(&token),
            Some(json!({"firstname": "Estraven", "lastname": "Harth", "email": "estraven@karhide.org"})),
        )
        .await
        .json()["id"]
        .as_i64()
        .unwrap();

    app.borrow(&token, subscriber_id, book_id).await;
    let response = app.return_book(&token, other, book_id).await;
    assert_eq!(StatusCode::BAD_REQUEST, response.status);
    assert_eq!("Book is not borrowed by this subscriber", response.message());

    let book = app.call(Method::GET, &format!("/books/{}", book_id), None, None).await;
    assert_eq!(true, book.json()["is_borrowed"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_have_one_winner() {
    let app = Arc::new(TestApp::new());
    let token = app.token().await;
    let (_, book_id, subscriber_id) = app.seed(&token).await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let app = app.clone();
            let token = token.clone();
            tokio::spawn(async move { app.borrow(&token, subscriber_id, book_id).await.status })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }
    assert_eq!(1, statuses.iter().filter(|s| **s == StatusCode::CREATED).count());
    assert_eq!(9, statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count());

    let ledger = app
        .call(Method::GET, &format!("/books/{}/borrows", book_id), Some(&token), None)
        .await
        .json();
    assert_eq!(1, ledger.as_array().unwrap().len());
}

#[tokio::test]
async fn test_update_cannot_flip_borrowed_flag() {
    let app = TestApp::new();
    let token = app.token().await;
    let (author_id, book_id, _) = app.seed(&token).await;

    let response = app
        .call(
            Method::PUT,
            &format!("/books/{}", book_id),
            Some(&token),
            Some(json!({"title": "Renamed", "author_id": author_id, "is_borrowed": true})),
        )
        .await;
    assert_eq!(StatusCode::OK, response.status);
    assert_eq!("Book updated successfully", response.text());

    let book = app.call(Method::GET, &format!("/books/{}", book_id), None, None).await.json();
    assert_eq!("Renamed", book["book_title"]);
    assert_eq!(false, book["is_borrowed"]);
}

#[tokio::test]
async fn test_book_deletion_rules() {
    let app = TestApp::new();
    let token = app.token().await;
    let (author_id, book_id, subscriber_id) = app.seed(&token).await;

    let response = app.call(Method::DELETE, &format!("/authors/{}", author_id), Some(&token), None).await;
    assert_eq!(StatusCode::BAD_REQUEST, response.status);
    assert_eq!("Author has associated books, delete books first", response.message());

    app.borrow(&token, subscriber_id, book_id).await;
    let response = app.call(Method::DELETE, &format!("/books/{}", book_id), Some(&token), None).await;
    assert_eq!(StatusCode::CONFLICT, response.status);

    let response = app.call(Method::DELETE, &format!("/subscribers/{}", subscriber_id), Some(&token), None).await;
    assert_eq!(StatusCode::CONFLICT, response.status);

    app.return_book(&token, subscriber_id, book_id).await;
    let response = app.call(Method::DELETE, &format!("/books/{}", book_id), Some(&token), None).await;
    assert_eq!(StatusCode::OK, response.status);
    assert_eq!("Book deleted successfully", response.text());

    // Last book gone, author with it
    let response = app.call(Method::GET, &format!("/authors/{}", author_id), None, None).await;
    assert_eq!(StatusCode::NOT_FOUND, response.status);
}

#[tokio::test]
async fn test_search() {
    let app = TestApp::new();
    let token = app.token().await;
    app.seed(&token).await;

    let response = app.call(Method::GET, "/search_books", None, None).await;
    assert_eq!(StatusCode::BAD_REQUEST, response.status);
    assert_eq!("Query parameter is missing", response.message());

    let response = app.call(Method::GET, "/search_books?query=DARK", None, None).await;
    assert_eq!(StatusCode::OK, response.status);
    assert_eq!(1, response.json().as_array().unwrap().len());

    let response = app.call(Method::GET, "/search_authors?query=guin", None, None).await;
    assert_eq!("Ursula", response.json()[0]["firstname"]);

    let response = app.call(Method::GET, "/search_authors?query=", None, None).await;
    assert_eq!("Query parameter is required", response.message());
}

#[tokio::test]
async fn test_book_photo_upload() {
    let app = TestApp::new();
    let token = app.token().await;
    let (_, book_id, _) = app.seed(&token).await;

    let boundary = "X-LIBRARY-BOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cover.PNG\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::post(format!("/books/photo/{}", book_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(StatusCode::OK, response.status);
    assert!(response.text().starts_with("File uploaded successfully: "));

    let book = app.call(Method::GET, &format!("/books/{}", book_id), None, None).await.json();
    let photo = book["book_photo"].as_str().unwrap();
    assert!(photo.ends_with("fullsize.png"));
    assert_eq!(b"PNGDATA".to_vec(), std::fs::read(photo).unwrap());
}
