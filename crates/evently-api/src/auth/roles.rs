//! Role requirements per operation
//!
//! Operations declare the roles allowed to invoke them once at startup:
//!
//! ```
//! use axum::http::Method;
//! use evently_api::auth::roles::{Operation, RoleRegistry};
//! use evently_core::Role;
//!
//! let registry = RoleRegistry::new();
//! registry.require_roles(Operation::get("/events"), [Role::Admin, Role::Organizer]);
//!
//! let requirement = registry.requirement_for(&Operation::new(Method::GET, "/events"));
//! assert!(requirement.permits("Organizer"));
//! ```
//!
//! An operation without a declaration, or declared with no roles, only needs
//! authentication. The registry is consulted on every request.

use axum::http::Method;
use evently_core::Role;
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

/// Identity of a routed operation: HTTP method plus route template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    method: Method,
    path: String,
}

impl Operation {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Set of role names permitted to invoke an operation
///
/// Membership is exact string equality, no case folding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRequirement {
    roles: BTreeSet<String>,
}

impl RoleRequirement {
    /// Requirement that only asks for authentication
    pub fn none() -> Self {
        Self::default()
    }

    /// Any of the given roles
    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::from_names(roles.into_iter().map(|r| r.as_str()))
    }

    /// Any of the given role names, taken verbatim
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn permits(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }
}

impl std::fmt::Display for RoleRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.names().collect();
        f.write_str(&names.join(","))
    }
}

/// Operation to role requirement map
#[derive(Debug, Default)]
pub struct RoleRegistry {
    entries: RwLock<HashMap<Operation, RoleRequirement>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the roles allowed for `operation`, replacing any earlier declaration
    pub fn require_roles(&self, operation: Operation, roles: impl IntoIterator<Item = Role>) {
        self.register(operation, RoleRequirement::any_of(roles));
    }

    pub fn register(&self, operation: Operation, requirement: RoleRequirement) {
        tracing::debug!(
            operation = %operation,
            roles = %requirement,
            "Registered role requirement"
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation, requirement);
    }

    /// Requirement for `operation`; empty when nothing was declared
    pub fn requirement_for(&self, operation: &Operation) -> RoleRequirement {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(operation)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
