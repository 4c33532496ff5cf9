//! Refresh-token cookie
//!
//! The refresh token travels only in an HttpOnly, SameSite=Strict cookie.
//! `Secure` is added in production so the cookie never crosses plain HTTP.

use axum::http::{header, header::InvalidHeaderValue, HeaderMap, HeaderValue};

/// Cookie name carrying the refresh token
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Build the `Set-Cookie` value for a refresh token
pub fn refresh_cookie(
    token: &str,
    max_age_secs: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
}

/// Read a cookie value from the request's `Cookie` headers
///
/// Empty values count as absent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
}
