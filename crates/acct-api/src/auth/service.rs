//! Authentication service layer
//!
//! Signup, login and refresh flows. The service checks input, delegates
//! persistence and password handling to the [`CredentialStore`], mints
//! tokens and records audit events. HTTP concerns (cookies, status codes)
//! stay in the handlers.

use super::credentials::CredentialStore;
use super::jwt::{
    issue_access_token, issue_refresh_token, verify_refresh_token, JwtConfig, TokenClaims,
    TokenSubject,
};
use super::password::check_password_policy;
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::error::AppError;
use acct_core::{normalize_email, NewUser, UserPublic};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

pub const MISSING_SIGNUP_FIELDS: &str = "Missing required fields";
pub const MISSING_LOGIN_FIELDS: &str = "Email and password required";
pub const NO_REFRESH_TOKEN: &str = "No refresh token provided";
pub const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";

/// User signup request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 50, message = "First name must be 2-50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 50, message = "Last name must be at most 50 characters"))]
    pub last_name: Option<String>,
    #[validate(
        email(message = "Please enter a valid email"),
        custom(function = "email_has_domain_tld")
    )]
    pub email: Option<String>,
    #[schema(format = Password)]
    pub password: Option<String>,
    pub country: Option<String>,
    pub contact_number: Option<String>,
    pub location: Option<String>,
}

impl SignupRequest {
    /// Trim every field, drop blank ones and lower-case the email
    ///
    /// The password is kept verbatim.
    fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            email: trimmed(self.email).map(|e| normalize_email(&e)),
            password: self.password.filter(|p| !p.is_empty()),
            country: trimmed(self.country),
            contact_number: trimmed(self.contact_number),
            location: trimmed(self.location),
        }
    }

    fn into_new_user(self) -> Option<NewUser> {
        Some(NewUser {
            name: self.name?,
            first_name: self.first_name?,
            email: self.email?,
            password: self.password?,
            contact_number: Some(self.contact_number?),
            last_name: self.last_name,
            country: self.country,
            location: self.location,
        })
    }
}

/// Require a dotted domain after the `@`, as in `local@domain.tld`
fn email_has_domain_tld(email: &str) -> Result<(), ValidationError> {
    let dotted = !email.chars().any(char::is_whitespace)
        && email.match_indices('@').any(|(at, _)| {
            at > 0
                && email[at + 1..]
                    .match_indices('.')
                    .any(|(dot, _)| dot > 0 && at + 1 + dot + 1 < email.len())
        });

    if dotted {
        Ok(())
    } else {
        Err(ValidationError::new("email_domain")
            .with_message(Cow::Borrowed("Please enter a valid email")))
    }
}

/// User login request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    #[schema(format = Password)]
    pub password: Option<String>,
}

/// User fields returned by signup and login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

impl From<&UserPublic> for UserSummary {
    fn from(user: &UserPublic) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Tokens and user produced by a successful signup or login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    /// Delivered only as a cookie, never in a response body
    pub refresh_token: String,
    pub user: UserSummary,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    jwt_config: JwtConfig,
}

impl AuthService {
    pub fn new(credentials: CredentialStore, jwt_config: JwtConfig) -> Self {
        Self {
            credentials,
            jwt_config,
        }
    }

    /// Register a new user and open a session
    ///
    /// * 400 - a required field is missing or a field rule fails
    /// * 409 - the email is already registered
    pub async fn signup(
        &self,
        request: SignupRequest,
        context: &AuditContext,
    ) -> Result<AuthSession, AppError> {
        let request = request.normalized();
        let email = request.email.clone().unwrap_or_default();

        let result = self.try_signup(request).await;
        match &result {
            Ok(session) => audit_log(
                &AuditEvent::SignupSuccess {
                    user_id: session.user.id,
                    email: session.user.email.clone(),
                },
                context,
            ),
            Err(e) => audit_log(
                &AuditEvent::SignupFailure {
                    email,
                    reason: format!("{e:?}"),
                },
                context,
            ),
        }
        result
    }

    async fn try_signup(&self, request: SignupRequest) -> Result<AuthSession, AppError> {
        let new_user = request
            .clone()
            .into_new_user()
            .ok_or_else(|| AppError::Validation(MISSING_SIGNUP_FIELDS.to_string()))?;
        request.validate()?;
        check_password_policy(&new_user.password).map_err(AppError::Validation)?;

        let user = self.credentials.create_user(new_user).await?;
        tracing::info!(user_id = %user.id, "User registered");

        self.open_session(&user)
    }

    /// Authenticate by email and password
    ///
    /// Unknown email and wrong password produce the same 401.
    pub async fn login(
        &self,
        request: LoginRequest,
        context: &AuditContext,
    ) -> Result<AuthSession, AppError> {
        let (Some(email), Some(password)) = (
            trimmed(request.email).map(|e| normalize_email(&e)),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::Validation(MISSING_LOGIN_FIELDS.to_string()));
        };

        let Some(user) = self.credentials.find_by_email_with_secret(&email).await? else {
            self.credentials.verify_dummy_password(&password).await;
            audit_log(
                &AuditEvent::LoginFailure {
                    email,
                    reason: "unknown email".to_string(),
                },
                context,
            );
            return Err(AppError::InvalidCredentials);
        };

        if !self.credentials.verify_password(&user, &password).await {
            audit_log(
                &AuditEvent::LoginFailure {
                    email,
                    reason: "password mismatch".to_string(),
                },
                context,
            );
            return Err(AppError::InvalidCredentials);
        }

        let session = self.open_session(&user.to_public())?;
        audit_log(
            &AuditEvent::LoginSuccess {
                user_id: user.id,
                email: user.email,
            },
            context,
        );
        Ok(session)
    }

    /// Mint a new access token from a refresh token
    ///
    /// The store is not consulted and the refresh token is not rotated. The
    /// new access token carries the subject ID only.
    ///
    /// * 401 - no refresh token was presented
    /// * 403 - the token is malformed, forged, expired or the wrong kind
    pub fn refresh(
        &self,
        refresh_token: Option<&str>,
        context: &AuditContext,
    ) -> Result<String, AppError> {
        let Some(token) = refresh_token else {
            audit_log(
                &AuditEvent::RefreshRejected {
                    reason: "no refresh token".to_string(),
                },
                context,
            );
            return Err(AppError::Unauthorized(NO_REFRESH_TOKEN.to_string()));
        };

        let subject_id = verify_refresh_token(&self.jwt_config, token)
            .and_then(|claims| claims.subject_id())
            .map_err(|e| {
                audit_log(
                    &AuditEvent::RefreshRejected {
                        reason: e.to_string(),
                    },
                    context,
                );
                AppError::Forbidden(INVALID_REFRESH_TOKEN.to_string())
            })?;

        let access_token = issue_access_token(&self.jwt_config, &TokenSubject::id_only(subject_id))
            .map_err(|e| AppError::Internal(format!("Failed to issue access token: {e}")))?;

        audit_log(&AuditEvent::TokenRefresh { user_id: subject_id }, context);
        Ok(access_token)
    }

    fn open_session(&self, user: &UserPublic) -> Result<AuthSession, AppError> {
        let subject = TokenSubject::new(user.id, user.email.clone());

        let access_token = issue_access_token(&self.jwt_config, &subject)
            .map_err(|e| AppError::Internal(format!("Failed to issue access token: {e}")))?;
        let refresh_token = issue_refresh_token(&self.jwt_config, &subject)
            .map_err(|e| AppError::Internal(format!("Failed to issue refresh token: {e}")))?;

        Ok(AuthSession {
            access_token,
            refresh_token,
            user: UserSummary::from(user),
        })
    }
}

pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
