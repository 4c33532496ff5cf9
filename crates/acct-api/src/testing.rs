//! Test helpers shared by unit and integration tests
//!
//! Enabled with the `test-utils` feature. Builds a full application over
//! the in-memory store with cheap Argon2 parameters.

use crate::auth::PasswordConfig;
use crate::state::AppState;
use crate::create_router;
use acct_core::{
    AppConfig, AuthConfig, DatabaseConfig, LoggingConfig, RuntimeMode, ServerConfig,
};
use acct_store::MemoryUserStore;
use axum::Router;
use std::sync::Arc;

pub const TEST_ACCESS_SECRET: &str = "test-access-secret";
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret";
pub const TEST_SERVICE_NAME: &str = "acct-test";

/// Configuration for a test-mode service over `memory://`
pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            service_name: TEST_SERVICE_NAME.to_string(),
        },
        runtime: RuntimeMode::Test,
        database: DatabaseConfig {
            url: "memory://".to_string(),
            ..Default::default()
        },
        auth: AuthConfig {
            access_secret: TEST_ACCESS_SECRET.to_string(),
            refresh_secret: TEST_REFRESH_SECRET.to_string(),
        },
        logging: LoggingConfig::default(),
    }
}

/// Argon2 parameters light enough for tests
pub fn fast_password_config() -> PasswordConfig {
    PasswordConfig {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
        output_len: Some(32),
    }
}

/// State over a fresh in-memory store; the store is returned for direct access
pub fn test_state_with_config(config: AppConfig) -> (Arc<AppState>, Arc<MemoryUserStore>) {
    let store = Arc::new(MemoryUserStore::new());
    let state = AppState::with_password_config(config, store.clone(), fast_password_config());
    (Arc::new(state), store)
}

pub fn test_state() -> (Arc<AppState>, Arc<MemoryUserStore>) {
    test_state_with_config(test_config())
}

/// Router over a fresh in-memory store
pub fn create_router_for_testing() -> Router {
    let (state, _) = test_state();
    create_router(state)
}
