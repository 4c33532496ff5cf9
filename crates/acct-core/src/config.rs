//! acct Configuration Management
//!
//! Configuration is loaded once at startup, either from environment
//! variables (with `.env` support) or from a TOML file, and is read-only
//! afterwards. A missing required value is a fatal startup error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables that must be present for the service to start
pub const REQUIRED_ENV_VARS: [&str; 6] = [
    "PORT",
    "SERVICE_NAME",
    "APP_ENV",
    "DATABASE_URL",
    "JWT_ACCESS_SECRET",
    "JWT_REFRESH_SECRET",
];

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Runtime mode (development, production, test)
    pub runtime: RuntimeMode,

    /// Document database connection
    pub database: DatabaseConfig,

    /// Token signing secrets
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// Variables from a `.env` file in the working directory are loaded
    /// first; real environment variables take precedence.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_ENV_VARS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingRequired(missing.join(", ")));
        }

        let required =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingRequired(key.to_string()));

        let port_raw = required("PORT")?;
        let port = port_raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: "PORT".to_string(),
            value: port_raw.clone(),
        })?;

        let mut server = ServerConfig {
            port,
            service_name: required("SERVICE_NAME")?,
            ..ServerConfig::default()
        };
        if let Some(host) = get("API_HOST") {
            server.host = host;
        }

        let runtime = required("APP_ENV")?.parse()?;

        let mut database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            user: get("DATABASE_USER"),
            pass: get("DATABASE_PASS"),
            ..DatabaseConfig::default()
        };
        if let Some(namespace) = get("DATABASE_NAMESPACE") {
            database.namespace = namespace;
        }
        if let Some(name) = get("DATABASE_NAME") {
            database.database = name;
        }

        let auth = AuthConfig {
            access_secret: required("JWT_ACCESS_SECRET")?,
            refresh_secret: required("JWT_REFRESH_SECRET")?,
        };

        let mut logging = LoggingConfig::for_mode(runtime);
        if let Some(level) = get("LOG_LEVEL") {
            logging.level = level;
        }
        if let Some(json) = get("LOG_JSON") {
            logging.json_format = json.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LOG_JSON".to_string(),
                value: json,
            })?;
        }

        let config = Self {
            server,
            runtime,
            database,
            auth,
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that hold regardless of where values came from
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "PORT".to_string(),
                value: "0".to_string(),
            });
        }
        if self.server.service_name.trim().is_empty() {
            return Err(ConfigError::MissingRequired("SERVICE_NAME".to_string()));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("DATABASE_URL".to_string()));
        }
        if self.auth.access_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_ACCESS_SECRET".to_string()));
        }
        if self.auth.refresh_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_REFRESH_SECRET".to_string()));
        }
        // A shared key would let an access token pass as a refresh token.
        if self.auth.access_secret == self.auth.refresh_secret {
            return Err(ConfigError::InvalidValue {
                key: "JWT_REFRESH_SECRET".to_string(),
                value: "<same as JWT_ACCESS_SECRET>".to_string(),
            });
        }
        Ok(())
    }

    /// Address to bind the HTTP listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Service name, also used as the token issuer
    pub service_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 8080,
            service_name: "acct".to_string(),
        }
    }
}

/// Runtime mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Development,
    Production,
    Test,
}

impl RuntimeMode {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuntimeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_ENV".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Document database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL (`ws://host:8000`, or `memory://` for the in-process store)
    pub url: String,

    /// Root username
    #[serde(default)]
    pub user: Option<String>,

    /// Root password
    #[serde(default, skip_serializing)]
    pub pass: Option<String>,

    /// Namespace
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Database name
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_namespace() -> String {
    "acct".to_string()
}

fn default_database() -> String {
    "users".to_string()
}

impl DatabaseConfig {
    /// Whether the in-process store was requested
    pub fn is_memory(&self) -> bool {
        self.url.trim().starts_with("memory://")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000".to_string(),
            user: None,
            pass: None,
            namespace: default_namespace(),
            database: default_database(),
        }
    }
}

/// Token signing secrets
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for access tokens
    pub access_secret: String,

    /// HMAC key for refresh tokens (must differ from the access key)
    pub refresh_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"[REDACTED]")
            .field("refresh_secret", &"[REDACTED]")
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl LoggingConfig {
    /// Production emits JSON, everything else human-readable output
    pub fn for_mode(mode: RuntimeMode) -> Self {
        Self {
            json_format: mode.is_production(),
            ..Self::default()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
