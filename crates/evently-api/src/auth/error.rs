//! Authentication and authorization failures
//!
//! Every expected failure of the credential pipeline is a variant here and
//! maps to exactly one HTTP status. Storage faults are logged where they
//! happen and reach the client only as an opaque 500.

use super::validator::Rejection;
use crate::error::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Login password mismatch
    #[error("Login Failed, please check your credentials.")]
    InvalidCredentials,

    /// Registration with an existing email
    #[error("Email already in use")]
    EmailInUse,

    /// Email lookup miss during login or reset
    #[error("{0}")]
    SubjectNotFound(String),

    /// No usable bearer token on a protected request
    #[error("Unauthorized")]
    Unauthenticated,

    /// Bearer token presented but not accepted
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Authenticated but the role is not permitted
    #[error("Forbidden resource")]
    Forbidden,

    /// Malformed request
    #[error("{0}")]
    BadRequest(String),

    /// Unexpected collaborator error
    #[error("Internal server error")]
    StorageFailure,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::Unauthenticated
            | AuthError::Rejected(_) => StatusCode::UNAUTHORIZED,
            AuthError::EmailInUse | AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::SubjectNotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::EmailInUse => "EMAIL_IN_USE",
            AuthError::SubjectNotFound(_) => "NOT_FOUND",
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::Rejected(Rejection::TokenInvalid) => "TOKEN_INVALID",
            AuthError::Rejected(Rejection::TokenExpired) => "TOKEN_EXPIRED",
            AuthError::Rejected(Rejection::SubjectNotFound) => "SUBJECT_NOT_FOUND",
            AuthError::Rejected(Rejection::SubjectInactive) => "SUBJECT_INACTIVE",
            AuthError::Rejected(Rejection::AuthenticationFailed) => "AUTHENTICATION_FAILED",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::BadRequest(_) => "BAD_REQUEST",
            AuthError::StorageFailure => "INTERNAL_ERROR",
        }
    }
}

impl From<evently_core::EventlyError> for AuthError {
    fn from(err: evently_core::EventlyError) -> Self {
        tracing::error!(error = %err, "Credential store operation failed");
        AuthError::StorageFailure
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiError::new(self.code(), self.to_string()).with_status(status);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::Rejected(Rejection::SubjectInactive).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::SubjectNotFound("User not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AuthError::EmailInUse.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::BadRequest("All fields required".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_errors_are_opaque() {
        let err = AuthError::from(evently_core::EventlyError::DatabaseError(
            "password authentication failed for user \"postgres\"".to_string(),
        ));

        assert!(matches!(err, AuthError::StorageFailure));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("postgres"));
    }
}
