//! Evently Core - Domain models, configuration and credential storage
//!
//! This crate defines the abstractions shared by the API server and the CLI:
//! - Roles, credentials and the authenticated principal
//! - Common error types
//! - The credential store trait with PostgreSQL and in-memory backends
//! - Configuration management

pub mod config;
pub mod credentials;
pub mod memory;

pub use config::{
    parse_ttl, AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig,
};
pub use credentials::{CredentialStore, PgCredentialStore};
pub use memory::InMemoryCredentialStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Evently operations
#[derive(Error, Debug)]
pub enum EventlyError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub type Result<T> = std::result::Result<T, EventlyError>;

// ============================================================================
// Roles
// ============================================================================

/// Role of a subject
///
/// Exactly one role is held at a time. The wire form is the variant name
/// and matching is case-sensitive: `"admin"` is not a role.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Role {
    Admin,
    Organizer,
    #[default]
    Customer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Organizer, Role::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Organizer => "Organizer",
            Role::Customer => "Customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = EventlyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Organizer" => Ok(Role::Organizer),
            "Customer" => Ok(Role::Customer),
            other => Err(EventlyError::ValidationError(format!(
                "unknown role '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Stored account row
///
/// Owned by the credential store. Email is unique and compared byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account to be created by the store
///
/// `role` falls back to [`Role::Customer`] when absent.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Option<Role>,
}

// ============================================================================
// Principal
// ============================================================================

/// Authenticated identity attached to a request
///
/// Always materialized from the current storage row, never from token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl From<&Credential> for Principal {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id,
            email: credential.email.clone(),
            is_active: credential.is_active,
            role: credential.role,
            first_name: Some(credential.first_name.clone()),
            last_name: Some(credential.last_name.clone()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
