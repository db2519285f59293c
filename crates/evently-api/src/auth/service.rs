//! Authentication service layer
//!
//! Registration, login and password reset on top of the credential store.
//! Hashing and verification are CPU-bound and run on the blocking pool.

use super::error::AuthError;
use super::password::{hash_password, verify_password, PasswordConfig};
use super::token::TokenIssuer;
use chrono::{DateTime, Utc};
use evently_core::{
    AuthConfig, ConfigError, Credential, CredentialStore, EventlyError, NewCredential, Principal,
    Role,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Defaults to Customer
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "Organizer")]
    pub role: Option<Role>,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password reset request
///
/// Both fields are optional on the wire so a missing field becomes a 400
/// instead of a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Public account information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(value_type = String, example = "Customer")]
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Credential> for UserInfo {
    fn from(credential: Credential) -> Self {
        Self {
            id: credential.id,
            email: credential.email,
            first_name: credential.first_name,
            last_name: credential.last_name,
            role: credential.role,
            is_active: credential.is_active,
            created_at: credential.created_at,
            updated_at: credential.updated_at,
        }
    }
}

/// Successful login payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(value_type = String, example = "Customer")]
    pub role: Role,
    pub token: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    password: PasswordConfig,
    issuer: TokenIssuer,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        password: PasswordConfig,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            store,
            password,
            issuer,
        }
    }

    pub fn from_config(
        config: &AuthConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            store,
            PasswordConfig::with_cost_factor(config.hash_cost_factor),
            TokenIssuer::from_config(config)?,
        ))
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Register a new account
    ///
    /// Fails with [`AuthError::EmailInUse`] when the email is taken, including
    /// when a concurrent registration wins the insert.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserInfo, AuthError> {
        if self.store.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let password_hash = self.hash(request.password).await?;

        let created = self
            .store
            .insert(NewCredential {
                email: request.email,
                first_name: request.first_name,
                last_name: request.last_name,
                password_hash,
                role: request.role,
            })
            .await
            .map_err(|e| match e {
                EventlyError::Conflict(_) => AuthError::EmailInUse,
                other => AuthError::from(other),
            })?;

        tracing::info!(user_id = %created.id, role = %created.role, "User registered");
        Ok(UserInfo::from(created))
    }

    /// Check credentials and issue a session token
    ///
    /// An unknown email is [`AuthError::SubjectNotFound`] and a wrong
    /// password is [`AuthError::InvalidCredentials`]. The active flag is not
    /// checked here; the token carries it and validation rejects it later.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let credential = self
            .store
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AuthError::SubjectNotFound("Invalid credentials".to_string()))?;

        if !self.verify(request.password, credential.password_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issuer.issue(&Principal::from(&credential)).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign session token");
            AuthError::StorageFailure
        })?;

        Ok(LoginResponse {
            id: credential.id,
            email: credential.email,
            first_name: credential.first_name,
            last_name: credential.last_name,
            role: credential.role,
            token,
        })
    }

    /// Replace the password of the account registered under `email`
    ///
    /// Returns the account id. Tokens issued before the reset stay valid until
    /// they expire.
    pub async fn reset_password(&self, email: &str, password: &str) -> Result<Uuid, AuthError> {
        let credential = self
            .store
            .find_by_email(email)
            .await?
            .ok_or_else(|| AuthError::SubjectNotFound("User not found".to_string()))?;

        let password_hash = self.hash(password.to_string()).await?;
        self.store
            .update_password_hash(credential.id, &password_hash)
            .await
            .map_err(|e| match e {
                EventlyError::NotFound(_) => {
                    AuthError::SubjectNotFound("User not found".to_string())
                }
                other => AuthError::from(other),
            })?;

        tracing::info!(user_id = %credential.id, "Password reset");
        Ok(credential.id)
    }

    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let config = self.password.clone();
        tokio::task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                AuthError::StorageFailure
            })?
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing failed");
                AuthError::StorageFailure
            })
    }

    async fn verify(&self, password: String, hash: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password verification task failed");
                AuthError::StorageFailure
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenDecoder;
    use evently_core::InMemoryCredentialStore;
    use std::time::Duration;

    const SECRET: &str = "service-secret";

    fn light() -> PasswordConfig {
        PasswordConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        }
    }

    fn service() -> (AuthService, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let service = AuthService::new(
            store.clone(),
            light(),
            TokenIssuer::new(SECRET, Duration::from_secs(3600)),
        );
        (service, store)
    }

    fn register_request(email: &str, role: Option<Role>) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "correct horse".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_defaults_to_customer() {
        let (service, store) = service();
        let user = service
            .register(register_request("grace@example.com", None))
            .await
            .unwrap();

        assert_eq!(user.role, Role::Customer);
        assert!(user.is_active);

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "correct horse");
        assert!(verify_password("correct horse", &stored.password_hash));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (service, _) = service();
        service
            .register(register_request("dup@example.com", Some(Role::Organizer)))
            .await
            .unwrap();

        let err = service
            .register(register_request("dup@example.com", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailInUse));
    }

    #[tokio::test]
    async fn test_login_issues_token_with_claims() {
        let (service, _) = service();
        let user = service
            .register(register_request("login@example.com", Some(Role::Admin)))
            .await
            .unwrap();

        let response = service
            .login(LoginRequest {
                email: "login@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.id, user.id);
        assert_eq!(response.role, Role::Admin);

        let claims = TokenDecoder::new(SECRET).decode(&response.token).unwrap();
        assert_eq!(claims.id, user.id.to_string());
        assert_eq!(claims.email, "login@example.com");
        assert_eq!(claims.role, "Admin");
        assert!(claims.is_active);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (service, _) = service();
        service
            .register(register_request("wrong@example.com", None))
            .await
            .unwrap();

        let err = service
            .login(LoginRequest {
                email: "wrong@example.com".to_string(),
                password: "battery staple".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let (service, _) = service();
        let err = service
            .login(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "whatever".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SubjectNotFound(ref msg) if msg == "Invalid credentials"));
    }

    #[tokio::test]
    async fn test_login_does_not_check_active_flag() {
        let (service, store) = service();
        let user = service
            .register(register_request("inactive@example.com", None))
            .await
            .unwrap();
        store.set_active(user.id, false).await.unwrap();

        let response = service
            .login(LoginRequest {
                email: "inactive@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        let claims = TokenDecoder::new(SECRET).decode(&response.token).unwrap();
        assert!(!claims.is_active);
    }

    #[tokio::test]
    async fn test_reset_password() {
        let (service, _) = service();
        service
            .register(register_request("reset@example.com", None))
            .await
            .unwrap();

        service
            .reset_password("reset@example.com", "new password")
            .await
            .unwrap();

        let old = service
            .login(LoginRequest {
                email: "reset@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await;
        assert!(matches!(old, Err(AuthError::InvalidCredentials)));

        let new = service
            .login(LoginRequest {
                email: "reset@example.com".to_string(),
                password: "new password".to_string(),
            })
            .await;
        assert!(new.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_unknown_email() {
        let (service, _) = service();
        let err = service
            .reset_password("ghost@example.com", "new password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SubjectNotFound(ref msg) if msg == "User not found"));
    }
}
