//! Credential store
//!
//! Wraps a [`UserStore`] and owns everything that touches passwords: hashing
//! on signup and verification on login. Callers outside this module only
//! ever see [`UserPublic`]; the full [`User`] (with its hash) is handed out
//! solely for password checks during login.

use acct_core::{normalize_email, AcctError, NewUser, ProfileUpdate, User, UserPublic};
use acct_store::UserStore;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::password::{hash_password_with_config, verify_password, PasswordConfig, PasswordError};

/// Credential store errors
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Store(#[from] AcctError),

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error("Password hashing task failed: {0}")]
    Task(String),
}

/// Persistence-facing user operations with password handling
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn UserStore>,
    password_config: PasswordConfig,
    /// Hash of a fixed throwaway password, verified when a lookup misses
    dummy_hash: Arc<OnceCell<String>>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self::with_password_config(store, PasswordConfig::default())
    }

    pub fn with_password_config(store: Arc<dyn UserStore>, password_config: PasswordConfig) -> Self {
        Self {
            store,
            password_config,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Create a user, hashing the password before it reaches the store
    ///
    /// Fails with `ValidationError` when a required field is blank and with
    /// `DuplicateEmail` when the (normalized) email is already registered.
    pub async fn create_user(&self, new_user: NewUser) -> Result<UserPublic, CredentialError> {
        let missing = missing_signup_fields(&new_user);
        if !missing.is_empty() {
            return Err(AcctError::ValidationError(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))
            .into());
        }

        let email = normalize_email(&new_user.email);
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AcctError::DuplicateEmail(email).into());
        }

        let password = new_user.password.clone();
        let config = self.password_config.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
                .await
                .map_err(|e| CredentialError::Task(e.to_string()))??;

        // The store re-checks uniqueness atomically; the lookup above only
        // avoids hashing for an obvious duplicate.
        let user = self.store.insert(User::new(new_user, password_hash)).await?;

        tracing::debug!(user_id = %user.id, "User record created");
        Ok(user.to_public())
    }

    /// Look up a user by email, including the password hash
    pub async fn find_by_email_with_secret(
        &self,
        email: &str,
    ) -> Result<Option<User>, CredentialError> {
        Ok(self.store.find_by_email(&normalize_email(email)).await?)
    }

    /// Check a candidate password against a user's stored hash
    ///
    /// Never fails: an unusable stored hash is logged and counts as a
    /// mismatch.
    pub async fn verify_password(&self, user: &User, candidate: &str) -> bool {
        let hash = user.password_hash.clone();
        let candidate = candidate.to_string();
        let user_id = user.id;

        match tokio::task::spawn_blocking(move || verify_password(&candidate, &hash)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                tracing::error!(user_id = %user_id, error = %e, "Stored password hash is unusable");
                false
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Password verification task failed");
                false
            }
        }
    }

    /// Spend one password verification on a lookup that found no user
    ///
    /// Keeps an unknown email as slow as a wrong password. The outcome is
    /// discarded.
    pub async fn verify_dummy_password(&self, candidate: &str) {
        let config = self.password_config.clone();
        let hash = self
            .dummy_hash
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(move || {
                    hash_password_with_config("acct-dummy-password", &config)
                })
                .await
                .map_err(|e| CredentialError::Task(e.to_string()))?
                .map_err(CredentialError::from)
            })
            .await;

        let hash = match hash {
            Ok(hash) => hash.clone(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to prepare dummy password hash");
                return;
            }
        };

        let candidate = candidate.to_string();
        if let Err(e) =
            tokio::task::spawn_blocking(move || verify_password(&candidate, &hash)).await
        {
            tracing::error!(error = %e, "Password verification task failed");
        }
    }

    #[cfg(test)]
    pub(crate) fn dummy_hash_ready(&self) -> bool {
        self.dummy_hash.initialized()
    }

    /// Public view of a user by ID
    pub async fn find_public(&self, id: Uuid) -> Result<Option<UserPublic>, CredentialError> {
        Ok(self.store.find_by_id(id).await?.map(|u| u.to_public()))
    }

    /// Apply a partial profile update; `None` when the user does not exist
    pub async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<UserPublic>, CredentialError> {
        Ok(self
            .store
            .update_profile(id, update)
            .await?
            .map(|u| u.to_public()))
    }
}

fn missing_signup_fields(new_user: &NewUser) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if new_user.name.trim().is_empty() {
        missing.push("name");
    }
    if new_user.first_name.trim().is_empty() {
        missing.push("firstName");
    }
    if new_user.email.trim().is_empty() {
        missing.push("email");
    }
    if new_user.password.is_empty() {
        missing.push("password");
    }
    if new_user
        .contact_number
        .as_deref()
        .map_or(true, |c| c.trim().is_empty())
    {
        missing.push("contactNumber");
    }
    missing
}
