//! Security audit logging for authentication events
//!
//! Registrations, logins, password resets, rejected tokens and denied
//! operations are logged at INFO level under the `audit` target so they can
//! be filtered and routed separately from application logs, e.g.
//! `RUST_LOG=audit=info`.
//!
//! Each event is also serialized to JSON in the `event` field for log
//! aggregators.

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::info;
use uuid::Uuid;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    RegistrationSuccess {
        user_id: Uuid,
        email: String,
        role: String,
        #[serde(flatten)]
        context: AuditContext,
    },

    RegistrationFailure {
        email: String,
        reason: String,
        #[serde(flatten)]
        context: AuditContext,
    },

    LoginSuccess {
        user_id: Uuid,
        email: String,
        #[serde(flatten)]
        context: AuditContext,
    },

    LoginFailure {
        email: String,
        reason: String,
        #[serde(flatten)]
        context: AuditContext,
    },

    PasswordReset {
        user_id: Uuid,
        email: String,
        #[serde(flatten)]
        context: AuditContext,
    },

    /// Bearer token missing, invalid, expired or for an unusable account
    InvalidToken {
        reason: String,
        #[serde(flatten)]
        context: AuditContext,
    },

    /// Authenticated caller without a permitted role
    AccessDenied {
        user_id: Option<Uuid>,
        email: Option<String>,
        operation: String,
        required_roles: String,
        #[serde(flatten)]
        context: AuditContext,
    },
}

impl AuditEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::RegistrationSuccess { .. } => "registration_success",
            AuditEvent::RegistrationFailure { .. } => "registration_failure",
            AuditEvent::LoginSuccess { .. } => "login_success",
            AuditEvent::LoginFailure { .. } => "login_failure",
            AuditEvent::PasswordReset { .. } => "password_reset",
            AuditEvent::InvalidToken { .. } => "invalid_token",
            AuditEvent::AccessDenied { .. } => "access_denied",
        }
    }

    fn context(&self) -> &AuditContext {
        match self {
            AuditEvent::RegistrationSuccess { context, .. }
            | AuditEvent::RegistrationFailure { context, .. }
            | AuditEvent::LoginSuccess { context, .. }
            | AuditEvent::LoginFailure { context, .. }
            | AuditEvent::PasswordReset { context, .. }
            | AuditEvent::InvalidToken { context, .. }
            | AuditEvent::AccessDenied { context, .. } => context,
        }
    }
}

/// Client details attached to every audit event
///
/// Also an extractor, so handlers can take it as an argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuditContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Log a security audit event
pub fn audit_log(event: &AuditEvent) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));
    let context = event.context();

    info!(
        target: "audit",
        timestamp = %Utc::now(),
        event_type = event.event_type(),
        ip_address = ?context.ip_address,
        user_agent = ?context.user_agent,
        event = %event_json,
        "Security event"
    );
}

/// Client IP from proxy headers
///
/// Prefers the first hop of `X-Forwarded-For`, then `X-Real-IP`.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(first_ip) = headers
        .get("x-forwarded-for")
        .and_then(|xff| xff.to_str().ok())
        .and_then(|xff| xff.split(',').next())
    {
        return Some(first_ip.trim().to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|ip| ip.to_str().ok())
        .map(|ip| ip.to_string())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
