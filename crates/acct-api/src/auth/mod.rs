//! Authentication module
//!
//! - Token issuance and verification (HS256, separate access/refresh keys)
//! - Password hashing with Argon2id
//! - Credential store over the user store
//! - Refresh-token cookie handling
//! - Signup, login and refresh flows
//! - Access guard middleware for protected routes

pub mod cookie;
pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use cookie::{read_cookie, refresh_cookie, REFRESH_COOKIE_NAME};
pub use credentials::{CredentialError, CredentialStore};
pub use jwt::{
    issue_access_token, issue_refresh_token, verify_access_token, verify_refresh_token,
    AccessClaims, JwtConfig, JwtError, RefreshClaims, TokenSubject,
};
pub use middleware::{auth_middleware, bearer_token, AuthenticatedUser};
pub use password::{hash_password, verify_password, PasswordConfig};
pub use service::{AuthService, AuthSession, LoginRequest, SignupRequest, UserSummary};
