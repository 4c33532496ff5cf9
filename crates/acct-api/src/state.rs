//! Application state management
//!
//! Built once at startup from the loaded configuration and shared by every
//! handler as `Arc<AppState>`. Nothing in it is mutated after construction.
//!
//! Author: hephaex@gmail.com

use crate::auth::{AuthService, CredentialStore, JwtConfig, PasswordConfig};
use acct_core::AppConfig;
use acct_store::UserStore;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Token signing configuration
    pub jwt_config: JwtConfig,
    /// Password-aware access to the user store
    pub credentials: CredentialStore,
    /// Signup, login and refresh flows
    pub auth: AuthService,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>) -> Self {
        Self::with_password_config(config, store, PasswordConfig::default())
    }

    /// Build state with custom Argon2 parameters
    pub fn with_password_config(
        config: AppConfig,
        store: Arc<dyn UserStore>,
        password_config: PasswordConfig,
    ) -> Self {
        let jwt_config = JwtConfig::from_app_config(&config);
        let credentials = CredentialStore::with_password_config(store, password_config);
        let auth = AuthService::new(credentials.clone(), jwt_config.clone());

        Self {
            config,
            jwt_config,
            credentials,
            auth,
            start_time: Instant::now(),
        }
    }

    /// Whether cookies must carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.config.runtime.is_production()
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
