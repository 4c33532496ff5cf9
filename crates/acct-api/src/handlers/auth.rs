//! Authentication API handlers
//!
//! Signup and login answer with an access token in the body and the refresh
//! token in an HttpOnly cookie. Refresh reads that cookie back.
//!
//! Author: hephaex@gmail.com

use crate::audit::AuditContext;
use crate::auth::{
    read_cookie, refresh_cookie, AuthSession, LoginRequest, SignupRequest, UserSummary,
    REFRESH_COOKIE_NAME,
};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Signup and login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,
    pub access_token: String,
    pub user: UserSummary,
}

/// Token refresh response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub message: String,
}

/// Register a new user account
///
/// Required: `name` (2-100), `firstName` (2-50), `email`, `password` (6+),
/// `contactNumber`. Optional: `lastName` (up to 50), `country`, `location`.
/// The email is stored trimmed and lower-cased.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse,
            headers(("set-cookie" = String, description = "refreshToken cookie"))),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ApiError),
        (status = 409, description = "Email already in use", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let context = AuditContext::from_headers(&headers);

    let session = state.auth.signup(request, &context).await?;
    let cookie = session_cookie(&state, &session)?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            access_token: session.access_token,
            user: session.user,
        }),
    ))
}

/// Login with email and password
///
/// Unknown email and wrong password produce the same 401 response.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse,
            headers(("set-cookie" = String, description = "refreshToken cookie"))),
        (status = 400, description = "Email and password required", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let context = AuditContext::from_headers(&headers);

    let session = state.auth.login(request, &context).await?;
    let cookie = session_cookie(&state, &session)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Login successful".to_string(),
            access_token: session.access_token,
            user: session.user,
        }),
    ))
}

/// Issue a new access token from the refresh-token cookie
///
/// The refresh token itself is not rotated.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    params(("refreshToken" = String, Cookie, description = "Refresh token set at signup/login")),
    responses(
        (status = 200, description = "New access token issued", body = RefreshResponse),
        (status = 401, description = "No refresh token provided", body = crate::error::ApiError),
        (status = 403, description = "Invalid or expired refresh token", body = crate::error::ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let context = AuditContext::from_headers(&headers);
    let refresh_token = read_cookie(&headers, REFRESH_COOKIE_NAME);

    let access_token = state.auth.refresh(refresh_token.as_deref(), &context)?;

    Ok(Json(RefreshResponse {
        access_token,
        message: "New access token issued".to_string(),
    }))
}

fn session_cookie(state: &AppState, session: &AuthSession) -> Result<HeaderValue, AppError> {
    refresh_cookie(
        &session.refresh_token,
        state.jwt_config.refresh_expiration_secs,
        state.secure_cookies(),
    )
    .map_err(|e| AppError::Internal(format!("Failed to build refresh cookie: {e}")))
}
