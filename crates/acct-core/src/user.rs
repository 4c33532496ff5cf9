//! User records
//!
//! `User` is the stored record, including the password hash. Everything
//! that leaves the service goes through `UserPublic`, which has no hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored user account
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    /// Immutable unique identifier
    pub id: Uuid,
    /// Trimmed, lower-cased email (unique)
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub name: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub contact_number: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("name", &self.name)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("contact_number", &self.contact_number)
            .field("country", &self.country)
            .field("location", &self.location)
            .field("is_verified", &self.is_verified)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// Build a fresh record from already-hashed signup data
    pub fn new(new_user: NewUser, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(&new_user.email),
            password_hash,
            name: new_user.name,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            contact_number: new_user.contact_number,
            country: new_user.country,
            location: new_user.location,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public projection (no password hash)
    pub fn to_public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            contact_number: self.contact_number.clone(),
            country: self.country.clone(),
            location: self.location.clone(),
            is_verified: self.is_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User representation safe for API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Signup data with the plaintext password
///
/// The password is hashed by the credential store, never by callers.
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub contact_number: Option<String>,
    pub country: Option<String>,
    pub location: Option<String>,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("first_name", &self.first_name)
            .finish_non_exhaustive()
    }
}

/// Partial profile update
///
/// `None` and blank values leave the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub contact_number: Option<String>,
    pub location: Option<String>,
}

impl ProfileUpdate {
    /// True when applying this update would change nothing
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.first_name,
            &self.last_name,
            &self.country,
            &self.contact_number,
            &self.location,
        ]
        .iter()
        .all(|field| non_blank(field).is_none())
    }
}

/// Apply a profile update to a stored record
///
/// Returns whether any field changed; `updated_at` is only bumped then.
pub fn apply_profile_update(user: &mut User, update: &ProfileUpdate, now: DateTime<Utc>) -> bool {
    let mut changed = false;

    if let Some(name) = non_blank(&update.name) {
        changed |= replace(&mut user.name, name);
    }
    if let Some(first_name) = non_blank(&update.first_name) {
        changed |= replace(&mut user.first_name, first_name);
    }
    for (slot, value) in [
        (&mut user.last_name, &update.last_name),
        (&mut user.country, &update.country),
        (&mut user.contact_number, &update.contact_number),
        (&mut user.location, &update.location),
    ] {
        if let Some(value) = non_blank(value) {
            if slot.as_deref() != Some(value.as_str()) {
                *slot = Some(value);
                changed = true;
            }
        }
    }

    if changed {
        user.updated_at = now;
    }
    changed
}

/// Trim and lower-case an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn replace(slot: &mut String, value: String) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new(
            NewUser {
                email: "  Alice@Example.COM ".to_string(),
                password: "secret1".to_string(),
                name: "Alice".to_string(),
                first_name: "Alice".to_string(),
                last_name: None,
                contact_number: Some("555-0100".to_string()),
                country: None,
                location: None,
            },
            "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_string(),
        )
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let user = sample_user();
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.is_verified);
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_public_projection_has_no_hash() {
        let user = sample_user();
        let json = serde_json::to_string(&user.to_public()).unwrap();

        assert!(!json.contains("argon2"));
        assert!(!json.to_lowercase().contains("password"));
        assert!(json.contains("\"firstName\":\"Alice\""));
        assert!(json.contains("\"contactNumber\":\"555-0100\""));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let user = sample_user();
        let debug = format!("{user:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("argon2"));
    }

    #[test]
    fn test_apply_profile_update_ignores_blank_values() {
        let mut user = sample_user();
        let before = user.clone();
        let update = ProfileUpdate {
            name: Some("   ".to_string()),
            first_name: None,
            last_name: Some(String::new()),
            ..Default::default()
        };

        assert!(update.is_empty());
        assert!(!apply_profile_update(&mut user, &update, Utc::now()));
        assert_eq!(user, before);
    }

    #[test]
    fn test_apply_profile_update_trims_and_sets() {
        let mut user = sample_user();
        let later = user.updated_at + chrono::Duration::seconds(5);
        let update = ProfileUpdate {
            name: Some(" Alice B ".to_string()),
            country: Some("Korea".to_string()),
            ..Default::default()
        };

        assert!(apply_profile_update(&mut user, &update, later));
        assert_eq!(user.name, "Alice B");
        assert_eq!(user.country.as_deref(), Some("Korea"));
        assert_eq!(user.contact_number.as_deref(), Some("555-0100"));
        assert_eq!(user.updated_at, later);
    }

    #[test]
    fn test_apply_same_values_is_not_a_change() {
        let mut user = sample_user();
        let update = ProfileUpdate {
            contact_number: Some("555-0100".to_string()),
            ..Default::default()
        };

        assert!(!apply_profile_update(&mut user, &update, Utc::now()));
    }
}
