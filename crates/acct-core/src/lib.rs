//! acct Core - Domain models, configuration and shared error types
//!
//! This crate defines the pieces every other acct crate builds on:
//! - User records and their public projection
//! - Service configuration loaded once at startup
//! - Common error types

pub mod config;
pub mod user;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, RuntimeMode, ServerConfig,
};
pub use user::{apply_profile_update, normalize_email, NewUser, ProfileUpdate, User, UserPublic};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for acct operations
#[derive(Error, Debug)]
pub enum AcctError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AcctError>;
