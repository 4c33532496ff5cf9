//! Security audit logging for account events
//!
//! Signups, logins, token refreshes, rejected tokens and profile changes are
//! logged with the "audit" target, so they can be filtered and routed apart
//! from application logs (`RUST_LOG=audit=info`). Passwords and tokens are
//! never part of an event.
//!
//! Author: hephaex@gmail.com

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    SignupSuccess {
        user_id: Uuid,
        email: String,
    },

    SignupFailure {
        email: String,
        reason: String,
    },

    LoginSuccess {
        user_id: Uuid,
        email: String,
    },

    /// Failed login; `reason` is internal only and never sent to the client
    LoginFailure {
        email: String,
        reason: String,
    },

    /// Access token minted from a refresh token
    TokenRefresh {
        user_id: Uuid,
    },

    /// Refresh token missing or rejected
    RefreshRejected {
        reason: String,
    },

    /// Access token rejected by the guard
    InvalidToken {
        reason: String,
    },

    ProfileUpdated {
        user_id: Uuid,
        fields: Vec<String>,
    },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            AuditEvent::SignupSuccess { .. } => "Signup successful",
            AuditEvent::SignupFailure { .. } => "Signup failed",
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::TokenRefresh { .. } => "Token refresh",
            AuditEvent::RefreshRejected { .. } => "Refresh rejected",
            AuditEvent::InvalidToken { .. } => "Invalid token",
            AuditEvent::ProfileUpdated { .. } => "Profile updated",
        }
    }

    fn is_failure(&self) -> bool {
        matches!(
            self,
            AuditEvent::SignupFailure { .. }
                | AuditEvent::LoginFailure { .. }
                | AuditEvent::RefreshRejected { .. }
                | AuditEvent::InvalidToken { .. }
        )
    }
}

/// Request metadata attached to every audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditContext {
    /// When the request was received
    pub timestamp: DateTime<Utc>,
    /// Client IP address (from proxy headers)
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for AuditContext {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
            ip_address: None,
            user_agent: None,
        }
    }
}

impl AuditContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            timestamp: Utc::now(),
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event
///
/// Successes go out at INFO, failures at WARN. The event itself is attached
/// as JSON for log aggregators:
///
/// ```json
/// {"event_type":"login_success","user_id":"550e8400-...","email":"user@example.com"}
/// ```
pub fn audit_log(event: &AuditEvent, context: &AuditContext) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    if event.is_failure() {
        warn!(
            target: "audit",
            timestamp = %context.timestamp,
            event = %event_json,
            ip_address = ?context.ip_address,
            user_agent = ?context.user_agent,
            "{}",
            event.summary()
        );
    } else {
        info!(
            target: "audit",
            timestamp = %context.timestamp,
            event = %event_json,
            ip_address = ?context.ip_address,
            user_agent = ?context.user_agent,
            "{}",
            event.summary()
        );
    }
}

/// Extract the client IP address from proxy headers
///
/// Checks X-Forwarded-For (first hop) and then X-Real-IP.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
