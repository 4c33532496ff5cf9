//! Profile handlers
//!
//! Both routes sit behind the access guard, which has already resolved the
//! caller to a stored user.

use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::auth::middleware::{AuthenticatedUser, USER_NOT_FOUND};
use crate::auth::service::trimmed;
use crate::error::AppError;
use crate::state::AppState;
use acct_core::{ProfileUpdate, UserPublic};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Current profile response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub user: UserPublic,
}

/// Partial profile update
///
/// Absent, null or blank fields leave the stored value unchanged. Email and
/// password cannot be changed here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 50, message = "First name must be 2-50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 50, message = "Last name must be at most 50 characters"))]
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub contact_number: Option<String>,
    pub location: Option<String>,
}

impl UpdateProfileRequest {
    fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            country: trimmed(self.country),
            contact_number: trimmed(self.contact_number),
            location: trimmed(self.location),
        }
    }

    fn provided_fields(&self) -> Vec<String> {
        [
            ("name", &self.name),
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("country", &self.country),
            ("contactNumber", &self.contact_number),
            ("location", &self.location),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_some())
        .map(|(field, _)| field.to_string())
        .collect()
    }
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(request: UpdateProfileRequest) -> Self {
        Self {
            name: request.name,
            first_name: request.first_name,
            last_name: request.last_name,
            country: request.country,
            contact_number: request.contact_number,
            location: request.location,
        }
    }
}

/// Profile fields returned after an update
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub contact_number: Option<String>,
    pub location: Option<String>,
}

impl From<UserPublic> for ProfileSummary {
    fn from(user: UserPublic) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            first_name: user.first_name,
            last_name: user.last_name,
            country: user.country,
            contact_number: user.contact_number,
            location: user.location,
        }
    }
}

/// Profile update response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdateResponse {
    pub message: String,
    pub user: ProfileSummary,
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile fetched successfully", body = ProfileResponse),
        (status = 401, description = "Not authorized", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
    )
)]
pub async fn get_profile(Extension(user): Extension<AuthenticatedUser>) -> impl IntoResponse {
    Json(ProfileResponse {
        message: "Profile fetched successfully".to_string(),
        user: user.profile,
    })
}

/// Update the authenticated user's profile
#[utoipa::path(
    put,
    path = "/api/profile",
    tag = "profile",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ProfileUpdateResponse),
        (status = 400, description = "Invalid field value", body = crate::error::ApiError),
        (status = 401, description = "Not authorized", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
    )
)]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let request = request.normalized();
    request.validate()?;

    let fields = request.provided_fields();
    let updated = state
        .credentials
        .update_profile(user.user_id, &ProfileUpdate::from(request))
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))?;

    if !fields.is_empty() {
        audit_log(
            &AuditEvent::ProfileUpdated {
                user_id: user.user_id,
                fields,
            },
            &AuditContext::from_headers(&headers),
        );
    }

    Ok(Json(ProfileUpdateResponse {
        message: "Profile updated successfully".to_string(),
        user: ProfileSummary::from(updated),
    }))
}
