//! Authentication and authorization gates
//!
//! Two axum middleware functions, layered on protected routes so that
//! [`authenticate`] always runs before [`authorize_roles`]:
//!
//! ```ignore
//! Router::new()
//!     .route("/auth/admin-test", get(admin_test))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), authorize_roles))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
//! ```
//!
//! Handlers behind the gates read the caller with `Extension<Principal>`.

use super::error::AuthError;
use super::guard::{authorize, Decision};
use super::roles::Operation;
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::state::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use evently_core::Principal;
use std::sync::Arc;

/// Bearer token from the `Authorization` header, if well formed
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

/// Resolve the bearer token to a [`Principal`] or reject the request
///
/// A missing or malformed header is [`AuthError::Unauthenticated`] and the
/// validator is not consulted. Any validator rejection short-circuits with
/// 401 and the handler never runs. Both cases emit an `invalid_token` audit
/// event.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(token) = bearer_token(request.headers()) else {
        audit_log(&AuditEvent::InvalidToken {
            reason: "Missing or malformed bearer token".to_string(),
            context: AuditContext::from_headers(request.headers()),
        });
        return Err(AuthError::Unauthenticated);
    };

    let principal = match state.validator.validate(token).await {
        Ok(principal) => principal,
        Err(rejection) => {
            audit_log(&AuditEvent::InvalidToken {
                reason: rejection.to_string(),
                context: AuditContext::from_headers(request.headers()),
            });
            return Err(AuthError::Rejected(rejection));
        }
    };

    tracing::debug!(user_id = %principal.id, role = %principal.role, "Request authenticated");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Enforce the role requirement registered for the matched route
pub async fn authorize_roles(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let operation = Operation::new(request.method().clone(), path);

    let requirement = state.roles.requirement_for(&operation);
    let principal = request.extensions().get::<Principal>();

    if authorize(&requirement, principal) == Decision::Deny {
        audit_log(&AuditEvent::AccessDenied {
            user_id: principal.map(|p| p.id),
            email: principal.map(|p| p.email.clone()),
            operation: operation.to_string(),
            required_roles: requirement.to_string(),
            context: AuditContext::from_headers(request.headers()),
        });
        return Err(AuthError::Forbidden);
    }

    Ok(next.run(request).await)
}
