//! Account endpoints: signup, login, logout

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::user::Credentials};

use super::{AppJson, AuthenticatedUser, SESSION_COOKIE};

#[derive(Serialize, ToSchema)]
pub struct SignupResponse {
    pub user_id: i32,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// Session token, also set as the `token` cookie
    pub token: String,
    pub user_id: i32,
    pub message: String,
}

/// Create an account
#[utoipa::path(
    post,
    path = "/signup",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid email or password", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<crate::AppState>,
    AppJson(credentials): AppJson<Credentials>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let user_id = state.services.auth.signup(&credentials).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id,
            message: "User created successfully".to_string(),
        }),
    ))
}

/// Log in and open a session
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = LoginResponse),
        (status = 400, description = "Invalid email or password", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown account", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    AppJson(credentials): AppJson<Credentials>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let session = state.services.auth.login(&credentials).await?;

    let cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::hours(state.config.sessions.ttl_hours));

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token: session.token,
            user_id: session.user_id,
            message: "User logged in successfully".to_string(),
        }),
    ))
}

/// End the caller's session
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Not logged in", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    user: AuthenticatedUser,
    jar: CookieJar,
) -> AppResult<(StatusCode, CookieJar)> {
    state.services.auth.logout(&user.token).await?;
    tracing::info!(user_id = user.user_id, "User logged out");
    Ok((StatusCode::NO_CONTENT, jar.remove(Cookie::build(SESSION_COOKIE).path("/"))))
}
