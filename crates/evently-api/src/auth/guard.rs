//! Role-based allow/deny decision

use super::roles::RoleRequirement;
use evently_core::Principal;

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide whether `principal` may invoke an operation with `requirement`
///
/// An empty requirement allows everyone, including callers with no
/// principal. Otherwise a principal must be present and its role name must be
/// in the requirement.
pub fn authorize(requirement: &RoleRequirement, principal: Option<&Principal>) -> Decision {
    if requirement.is_empty() {
        return Decision::Allow;
    }

    match principal {
        Some(principal) if requirement.permits(principal.role.as_str()) => Decision::Allow,
        _ => Decision::Deny,
    }
}
