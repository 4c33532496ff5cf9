//! JWT token issuance and verification
//!
//! Access and refresh tokens are HS256 JWTs signed with two distinct
//! secrets. Both are stateless: validity is decided by signature and expiry
//! alone, and nothing is persisted or revocable before expiry.
//!
//! The `*_at` variants take the clock reading explicitly, which keeps issuance
//! a pure function of (subject, instant, secret) and makes expiry testable.

use acct_core::AppConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Access token lifetime: 15 minutes
pub const ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;

/// Refresh token lifetime: 7 days
pub const REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Claims embedded in an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Token issuer (the service name)
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// User's email; absent on tokens minted from a refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expiration (Unix seconds)
    pub exp: u64,
    /// Token ID: issue instant in nanoseconds, hex
    pub jti: String,
}

/// Claims embedded in a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub iss: String,
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

/// Common view over both claim sets
pub trait TokenClaims: DeserializeOwned {
    fn subject(&self) -> &str;
    fn expires_at(&self) -> u64;

    /// Parse the subject as a user ID
    fn subject_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(self.subject()).map_err(|_| JwtError::InvalidToken)
    }
}

impl TokenClaims for AccessClaims {
    fn subject(&self) -> &str {
        &self.sub
    }

    fn expires_at(&self) -> u64 {
        self.exp
    }
}

impl TokenClaims for RefreshClaims {
    fn subject(&self) -> &str {
        &self.sub
    }

    fn expires_at(&self) -> u64 {
        self.exp
    }
}

/// The only identity data token issuance needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub subject_id: Uuid,
    pub email: Option<String>,
}

impl TokenSubject {
    pub fn new(subject_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            subject_id,
            email: Some(email.into()),
        }
    }

    /// Subject known only by ID (as recovered from a refresh token)
    pub fn id_only(subject_id: Uuid) -> Self {
        Self {
            subject_id,
            email: None,
        }
    }
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// Signing configuration, built once at startup
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC key for access tokens
    pub access_secret: String,
    /// HMAC key for refresh tokens
    pub refresh_secret: String,
    /// Access token lifetime in seconds
    pub access_expiration_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_expiration_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .field("access_expiration_secs", &self.access_expiration_secs)
            .field("refresh_expiration_secs", &self.refresh_expiration_secs)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_expiration_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_expiration_secs: REFRESH_TOKEN_TTL_SECS,
            issuer: issuer.into(),
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            config.auth.access_secret.clone(),
            config.auth.refresh_secret.clone(),
            config.server.service_name.clone(),
        )
    }
}

/// Current time since the Unix epoch
pub fn unix_now() -> Result<Duration, JwtError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?)
}

/// Issue a 15-minute access token for `subject`
pub fn issue_access_token(config: &JwtConfig, subject: &TokenSubject) -> Result<String, JwtError> {
    issue_access_token_at(config, subject, unix_now()?)
}

/// Issue an access token as if the clock read `issued_at`
pub fn issue_access_token_at(
    config: &JwtConfig,
    subject: &TokenSubject,
    issued_at: Duration,
) -> Result<String, JwtError> {
    let iat = issued_at.as_secs();
    let claims = AccessClaims {
        iss: config.issuer.clone(),
        sub: subject.subject_id.to_string(),
        email: subject.email.clone(),
        iat,
        exp: iat + config.access_expiration_secs,
        jti: token_id(issued_at),
    };

    sign(&claims, &config.access_secret)
}

/// Issue a 7-day refresh token for `subject` (the email is not embedded)
pub fn issue_refresh_token(config: &JwtConfig, subject: &TokenSubject) -> Result<String, JwtError> {
    issue_refresh_token_at(config, subject, unix_now()?)
}

/// Issue a refresh token as if the clock read `issued_at`
pub fn issue_refresh_token_at(
    config: &JwtConfig,
    subject: &TokenSubject,
    issued_at: Duration,
) -> Result<String, JwtError> {
    let iat = issued_at.as_secs();
    let claims = RefreshClaims {
        iss: config.issuer.clone(),
        sub: subject.subject_id.to_string(),
        iat,
        exp: iat + config.refresh_expiration_secs,
        jti: token_id(issued_at),
    };

    sign(&claims, &config.refresh_secret)
}

/// Verify an access token against the access secret
pub fn verify_access_token(config: &JwtConfig, token: &str) -> Result<AccessClaims, JwtError> {
    verify_access_token_at(config, token, unix_now()?.as_secs())
}

pub fn verify_access_token_at(
    config: &JwtConfig,
    token: &str,
    now: u64,
) -> Result<AccessClaims, JwtError> {
    verify(token, &config.access_secret, &config.issuer, now)
}

/// Verify a refresh token against the refresh secret
pub fn verify_refresh_token(config: &JwtConfig, token: &str) -> Result<RefreshClaims, JwtError> {
    verify_refresh_token_at(config, token, unix_now()?.as_secs())
}

pub fn verify_refresh_token_at(
    config: &JwtConfig,
    token: &str,
    now: u64,
) -> Result<RefreshClaims, JwtError> {
    verify(token, &config.refresh_secret, &config.issuer, now)
}

/// Check signature and issuer, then expiry against `now` (Unix seconds)
///
/// A token is valid while `now < exp`; there is no leeway.
pub fn verify<C: TokenClaims>(
    token: &str,
    secret: &str,
    issuer: &str,
    now: u64,
) -> Result<C, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.validate_exp = false;
    validation.leeway = 0;

    let token_data = decode::<C>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::InvalidToken,
    })?;

    if now >= token_data.claims.expires_at() {
        return Err(JwtError::ExpiredToken);
    }

    Ok(token_data.claims)
}

fn sign<C: Serialize>(claims: &C, secret: &str) -> Result<String, JwtError> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn token_id(issued_at: Duration) -> String {
    format!("{:x}", issued_at.as_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new("access-secret", "refresh-secret", "acct-test")
    }

    fn subject() -> TokenSubject {
        TokenSubject::new(Uuid::new_v4(), "test@example.com")
    }

    #[test]
    fn test_issue_and_verify_access_token() {
        let config = config();
        let subject = subject();

        let token = issue_access_token(&config, &subject).unwrap();
        let claims = verify_access_token(&config, &token).unwrap();

        assert_eq!(claims.sub, subject.subject_id.to_string());
        assert_eq!(claims.email.as_deref(), Some("test@example.com"));
        assert_eq!(claims.iss, "acct-test");
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECS);
        assert_eq!(claims.subject_id().unwrap(), subject.subject_id);
    }

    #[test]
    fn test_refresh_token_lifetime_and_claims() {
        let config = config();
        let subject = subject();

        let token = issue_refresh_token(&config, &subject).unwrap();
        let claims = verify_refresh_token(&config, &token).unwrap();

        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_TTL_SECS);
        assert_eq!(claims.sub, subject.subject_id.to_string());
    }

    #[test]
    fn test_access_expiry_boundary() {
        let config = config();
        let subject = subject();
        let issued = Duration::from_secs(1_700_000_000);
        let t = issued.as_secs();

        let token = issue_access_token_at(&config, &subject, issued).unwrap();

        assert!(verify_access_token_at(&config, &token, t + 14 * 60 + 59).is_ok());
        assert!(matches!(
            verify_access_token_at(&config, &token, t + 15 * 60),
            Err(JwtError::ExpiredToken)
        ));
        assert!(matches!(
            verify_access_token_at(&config, &token, t + 15 * 60 + 1),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_refresh_expiry_boundary() {
        let config = config();
        let issued = Duration::from_secs(1_700_000_000);
        let t = issued.as_secs();

        let token = issue_refresh_token_at(&config, &subject(), issued).unwrap();

        assert!(verify_refresh_token_at(&config, &token, t + REFRESH_TOKEN_TTL_SECS - 1).is_ok());
        assert!(matches!(
            verify_refresh_token_at(&config, &token, t + REFRESH_TOKEN_TTL_SECS),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_issuance_is_deterministic_per_instant() {
        let config = config();
        let subject = subject();
        let instant = Duration::new(1_700_000_000, 123_456_789);

        let a = issue_access_token_at(&config, &subject, instant).unwrap();
        let b = issue_access_token_at(&config, &subject, instant).unwrap();
        let c = issue_access_token_at(&config, &subject, instant + Duration::from_nanos(1)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let config = config();
        let subject = subject();

        let access = issue_access_token(&config, &subject).unwrap();
        let refresh = issue_refresh_token(&config, &subject).unwrap();

        assert!(matches!(
            verify_refresh_token(&config, &access),
            Err(JwtError::InvalidSignature)
        ));
        assert!(matches!(
            verify_access_token(&config, &refresh),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = config();
        let config2 = JwtConfig::new("other-access", "other-refresh", "acct-test");

        let token = issue_access_token(&config1, &subject()).unwrap();
        assert!(matches!(
            verify_access_token(&config2, &token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_issuer() {
        let config1 = config();
        let config2 = JwtConfig::new("access-secret", "refresh-secret", "someone-else");

        let token = issue_access_token(&config1, &subject()).unwrap();
        assert!(matches!(
            verify_access_token(&config2, &token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_access_token(&config(), "invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_id_only_subject_omits_email() {
        let config = config();
        let id = Uuid::new_v4();

        let token = issue_access_token(&config, &TokenSubject::id_only(id)).unwrap();
        let claims = verify_access_token(&config, &token).unwrap();

        assert_eq!(claims.email, None);
        assert_eq!(claims.subject_id().unwrap(), id);
    }

    #[test]
    fn test_non_uuid_subject_is_invalid() {
        let claims = RefreshClaims {
            iss: "acct-test".to_string(),
            sub: "not-a-uuid".to_string(),
            iat: 0,
            exp: 1,
            jti: "0".to_string(),
        };
        assert!(matches!(claims.subject_id(), Err(JwtError::InvalidToken)));
    }
}
