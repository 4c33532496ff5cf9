//! SurrealDB implementation of the user store
//!
//! Users live in the `users` table keyed by their UUID, with a unique
//! index on `email`.

use acct_core::{apply_profile_update, AcctError, DatabaseConfig, ProfileUpdate, Result, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::{connect, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use uuid::Uuid;

use crate::UserStore;

const TABLE: &str = "users";

/// SurrealDB user store
pub struct SurrealUserStore {
    client: Surreal<Any>,
}

impl SurrealUserStore {
    /// Connect, authenticate and select namespace/database
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let client = connect(config.url.as_str())
            .await
            .map_err(|e| AcctError::DatabaseError(format!("SurrealDB connection failed: {e}")))?;

        if let (Some(username), Some(password)) = (&config.user, &config.pass) {
            client
                .signin(Root {
                    username: username.as_str(),
                    password: password.as_str(),
                })
                .await
                .map_err(|e| AcctError::DatabaseError(format!("SurrealDB auth failed: {e}")))?;
        }

        client
            .use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .map_err(|e| AcctError::DatabaseError(format!("SurrealDB namespace error: {e}")))?;

        tracing::info!(
            namespace = %config.namespace,
            database = %config.database,
            "Connected to SurrealDB"
        );

        Ok(Self { client })
    }

    /// Initialize schema (idempotent, run on startup)
    pub async fn init_schema(&self) -> Result<()> {
        self.client
            .query(
                r#"
                DEFINE TABLE IF NOT EXISTS users SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS idx_users_email ON users FIELDS email UNIQUE;
            "#,
            )
            .await
            .map_err(|e| AcctError::DatabaseError(format!("Schema init failed: {e}")))?
            .check()
            .map_err(|e| AcctError::DatabaseError(format!("Schema init failed: {e}")))?;

        Ok(())
    }
}

/// User record as stored in SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    uid: String,
    email: String,
    password_hash: String,
    name: String,
    first_name: String,
    last_name: Option<String>,
    contact_number: Option<String>,
    country: Option<String>,
    location: Option<String>,
    #[serde(default)]
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            uid: user.id.to_string(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            name: user.name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            contact_number: user.contact_number.clone(),
            country: user.country.clone(),
            location: user.location.clone(),
            is_verified: user.is_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl TryFrom<UserRecord> for User {
    type Error = AcctError;

    fn try_from(record: UserRecord) -> Result<Self> {
        let id = Uuid::parse_str(&record.uid)
            .map_err(|_| AcctError::DatabaseError(format!("Corrupt user id: {}", record.uid)))?;

        Ok(User {
            id,
            email: record.email,
            password_hash: record.password_hash,
            name: record.name,
            first_name: record.first_name,
            last_name: record.last_name,
            contact_number: record.contact_number,
            country: record.country,
            location: record.location,
            is_verified: record.is_verified,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Whether a SurrealDB error message reports a unique index violation
fn is_unique_violation(message: &str) -> bool {
    message.contains("already contains") || message.contains("already exists")
}

#[async_trait]
impl UserStore for SurrealUserStore {
    async fn insert(&self, user: User) -> Result<User> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(AcctError::DuplicateEmail(user.email));
        }

        let created: Option<UserRecord> = self
            .client
            .create((TABLE, user.id.to_string()))
            .content(UserRecord::from(&user))
            .await
            .map_err(|e| {
                let message = e.to_string();
                if is_unique_violation(&message) {
                    AcctError::DuplicateEmail(user.email.clone())
                } else {
                    AcctError::DatabaseError(format!("Failed to create user: {message}"))
                }
            })?;

        created
            .ok_or_else(|| AcctError::DatabaseError("Failed to create user".to_string()))?
            .try_into()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let records: Vec<UserRecord> = self
            .client
            .query("SELECT * FROM users WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await
            .map_err(|e| AcctError::DatabaseError(format!("Query failed: {e}")))?
            .take(0)
            .map_err(|e| AcctError::DatabaseError(format!("Result extraction failed: {e}")))?;

        records.into_iter().next().map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let record: Option<UserRecord> = self
            .client
            .select((TABLE, id.to_string()))
            .await
            .map_err(|e| AcctError::DatabaseError(format!("Failed to get user: {e}")))?;

        record.map(User::try_from).transpose()
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>> {
        let Some(mut user) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        if !apply_profile_update(&mut user, update, Utc::now()) {
            return Ok(Some(user));
        }

        let updated: Option<UserRecord> = self
            .client
            .update((TABLE, id.to_string()))
            .content(UserRecord::from(&user))
            .await
            .map_err(|e| AcctError::DatabaseError(format!("Failed to update user: {e}")))?;

        updated.map(User::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let removed: Option<UserRecord> = self
            .client
            .delete((TABLE, id.to_string()))
            .await
            .map_err(|e| AcctError::DatabaseError(format!("Failed to delete user: {e}")))?;

        Ok(removed.is_some())
    }
}
