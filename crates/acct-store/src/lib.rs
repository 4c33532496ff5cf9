//! acct Store - Document database abstraction
//!
//! Provides the persistence seam for user records. The service talks to
//! `dyn UserStore`; SurrealDB backs it in deployments and an in-process
//! map backs it in tests and `memory://` mode.

use acct_core::{ProfileUpdate, Result, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Trait for user record storage
///
/// Every method is a single read or write; implementations enforce email
/// uniqueness at write time.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user, failing with `AcctError::DuplicateEmail` if the
    /// email is taken
    async fn insert(&self, user: User) -> Result<User>;

    /// Find a user by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Apply a profile update, returning the updated record if it exists
    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<Option<User>>;

    /// Remove a user, returning whether it existed
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

pub mod memory;
pub mod surrealdb_store;

pub use memory::MemoryUserStore;
pub use surrealdb_store::SurrealUserStore;
