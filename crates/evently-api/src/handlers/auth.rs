//! Authentication API handlers
//!
//! Public endpoints for registration, login and password reset, plus the
//! authenticated profile and the role-gated test endpoints.

use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::auth::{AuthError, LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use evently_core::Principal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

// Clients match on these exact strings, spelling included
const REGISTERED: &str = "User registerd successfully";
const LOGGED_IN: &str = "User loggedIn successfully";
const PROFILE_RETRIEVED: &str = "Profile retrieved sucessfully";

/// Success envelope `{statusCode, message, data}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    fn new(status: StatusCode, message: &str, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.to_string(),
            data,
        }
    }
}

/// Status and message without a payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub status_code: u16,
    pub message: String,
}

/// Current caller
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub status_code: u16,
    pub message: String,
    #[schema(value_type = Object)]
    pub user: Principal,
}

/// Role test endpoint result
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleTestResponse {
    pub message: String,
    pub role: String,
}

/// Register a new user account
///
/// New users get the Customer role unless one is given.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = crate::auth::UserInfo),
        (status = 400, description = "Email already in use", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    context: AuditContext,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = request.email.clone();

    match state.auth.register(request).await {
        Ok(user) => {
            audit_log(&AuditEvent::RegistrationSuccess {
                user_id: user.id,
                email: user.email.clone(),
                role: user.role.to_string(),
                context,
            });
            Ok((
                StatusCode::CREATED,
                Json(Envelope::new(StatusCode::CREATED, REGISTERED, user)),
            ))
        }
        Err(e) => {
            audit_log(&AuditEvent::RegistrationFailure {
                email,
                reason: e.to_string(),
                context,
            });
            Err(e)
        }
    }
}

/// Login with email and password
///
/// Returns the account and a signed session token.
///
/// # Responses
///
/// * `200 OK` - Authentication successful
/// * `401 Unauthorized` - Wrong password
/// * `404 Not Found` - No account with this email
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = crate::auth::LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 404, description = "Unknown email", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    context: AuditContext,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = request.email.clone();

    match state.auth.login(request).await {
        Ok(response) => {
            audit_log(&AuditEvent::LoginSuccess {
                user_id: response.id,
                email,
                context,
            });
            Ok(Json(Envelope::new(StatusCode::OK, LOGGED_IN, response)))
        }
        Err(e) => {
            audit_log(&AuditEvent::LoginFailure {
                email,
                reason: e.to_string(),
                context,
            });
            Err(e)
        }
    }
}

/// Replace an account password
///
/// Any body that does not carry both fields as non-empty strings is a
/// `400`, including a missing content type or mistyped fields.
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Missing email or password", body = crate::error::ApiError),
        (status = 404, description = "User not found", body = crate::error::ApiError),
    )
)]
pub async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    context: AuditContext,
    body: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let missing_fields = || AuthError::BadRequest("All fields required".to_string());
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected reset-password body");
        missing_fields()
    })?;

    let (email, password) = match (request.email.as_deref(), request.password.as_deref()) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => return Err(missing_fields()),
    };

    let user_id = state.auth.reset_password(email, password).await?;
    audit_log(&AuditEvent::PasswordReset {
        user_id,
        email: email.to_string(),
        context,
    });

    Ok(Json(MessageResponse {
        status_code: StatusCode::OK.as_u16(),
        message: "Password updated successfully".to_string(),
    }))
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/auth/profile",
    tag = "auth",
    responses(
        (status = 200, description = "Current user profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn profile_handler(Extension(user): Extension<Principal>) -> impl IntoResponse {
    Json(ProfileResponse {
        status_code: StatusCode::OK.as_u16(),
        message: PROFILE_RETRIEVED.to_string(),
        user,
    })
}

fn granted(message: &str, user: &Principal) -> Json<RoleTestResponse> {
    Json(RoleTestResponse {
        message: message.to_string(),
        role: user.role.to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/auth/admin-test",
    tag = "auth",
    responses(
        (status = 200, description = "Caller is an Admin", body = RoleTestResponse),
        (status = 403, description = "Forbidden resource", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn admin_test_handler(Extension(user): Extension<Principal>) -> impl IntoResponse {
    granted("Access Granted to Admin", &user)
}

#[utoipa::path(
    get,
    path = "/auth/Organizer-test",
    tag = "auth",
    responses(
        (status = 200, description = "Caller is an Admin or Organizer", body = RoleTestResponse),
        (status = 403, description = "Forbidden resource", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn organizer_test_handler(Extension(user): Extension<Principal>) -> impl IntoResponse {
    granted("Access Granted to Admin & Organizer", &user)
}

#[utoipa::path(
    get,
    path = "/auth/Customer-test",
    tag = "auth",
    responses(
        (status = 200, description = "Caller is a Customer", body = RoleTestResponse),
        (status = 403, description = "Forbidden resource", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn customer_test_handler(Extension(user): Extension<Principal>) -> impl IntoResponse {
    granted("Access Granted to Customer", &user)
}
