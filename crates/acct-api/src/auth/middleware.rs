/// Access guard for protected routes
///
/// Extracts the Bearer token, verifies it with the access secret and loads
/// the current user from the store. On success the request carries an
/// [`AuthenticatedUser`] extension.
use super::jwt::{verify_access_token, TokenClaims};
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use acct_core::UserPublic;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

pub const NO_TOKEN: &str = "Not authorized, no token";
pub const TOKEN_FAILED: &str = "Not authorized, token failed";
pub const USER_NOT_FOUND: &str = "User not found";

/// Authenticated user, added to request extensions by [`auth_middleware`]
///
/// Handlers extract it with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    /// Profile as stored at the time of the request
    pub profile: UserPublic,
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that requires a valid access token
///
/// * 401 - header missing or not a Bearer token
/// * 401 - token invalid, forged, expired or of the wrong kind (one message)
/// * 404 - token valid but the user no longer exists
///
/// ```ignore
/// let protected = Router::new()
///     .route("/profile", get(get_profile))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = AuditContext::from_headers(request.headers());

    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized(NO_TOKEN.to_string()))?;

    let user_id = verify_access_token(&state.jwt_config, token)
        .and_then(|claims| claims.subject_id())
        .map_err(|e| {
            audit_log(
                &AuditEvent::InvalidToken {
                    reason: e.to_string(),
                },
                &context,
            );
            AppError::Unauthorized(TOKEN_FAILED.to_string())
        })?;

    let profile = state
        .credentials
        .find_public(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id, profile });

    Ok(next.run(request).await)
}
