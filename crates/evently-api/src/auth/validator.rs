//! Session token validation
//!
//! Every call walks the same ordered steps and stops at the first failure:
//!
//! 1. Decode: signature, structure and a UUID subject id, else [`Rejection::TokenInvalid`]
//! 2. Expiry: `now >= exp`, else [`Rejection::TokenExpired`]
//! 3. Subject lookup by id, else [`Rejection::SubjectNotFound`]
//! 4. Liveness: the stored account is active, else [`Rejection::SubjectInactive`]
//!
//! On success the principal is built from the storage row, so role changes and
//! deactivations apply to tokens issued before them. Storage faults and lookup
//! timeouts collapse into [`Rejection::AuthenticationFailed`].

use super::token::TokenDecoder;
use chrono::{DateTime, Utc};
use evently_core::{AuthConfig, CredentialStore, Principal};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Reason a token was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("User not found")]
    SubjectNotFound,

    #[error("User account is inactive")]
    SubjectInactive,

    #[error("User authentication failed")]
    AuthenticationFailed,
}

/// Resolves bearer tokens to principals
#[derive(Clone)]
pub struct TokenValidator {
    decoder: TokenDecoder,
    store: Arc<dyn CredentialStore>,
    lookup_timeout: Duration,
}

impl TokenValidator {
    pub fn new(
        decoder: TokenDecoder,
        store: Arc<dyn CredentialStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            decoder,
            store,
            lookup_timeout,
        }
    }

    pub fn from_config(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self::new(
            TokenDecoder::from_config(config),
            store,
            config.lookup_timeout(),
        )
    }

    /// Validate `token` against the current time
    pub async fn validate(&self, token: &str) -> Result<Principal, Rejection> {
        self.validate_at(token, Utc::now()).await
    }

    /// Validate `token` as if the current time were `now`
    pub async fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Principal, Rejection> {
        let claims = self
            .decoder
            .decode(token)
            .map_err(|_| Rejection::TokenInvalid)?;

        let subject_id = Uuid::parse_str(&claims.id).map_err(|_| Rejection::TokenInvalid)?;

        if claims.is_expired_at(now) {
            return Err(Rejection::TokenExpired);
        }

        let lookup = tokio::time::timeout(self.lookup_timeout, self.store.find_by_id(subject_id));
        let credential = match lookup.await {
            Ok(Ok(Some(credential))) => credential,
            Ok(Ok(None)) => return Err(Rejection::SubjectNotFound),
            Ok(Err(e)) => {
                tracing::error!(subject_id = %subject_id, error = %e, "Credential lookup failed");
                return Err(Rejection::AuthenticationFailed);
            }
            Err(_) => {
                tracing::error!(
                    subject_id = %subject_id,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "Credential lookup timed out"
                );
                return Err(Rejection::AuthenticationFailed);
            }
        };

        if !credential.is_active {
            return Err(Rejection::SubjectInactive);
        }

        Ok(Principal::from(&credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenIssuer;
    use async_trait::async_trait;
    use evently_core::{
        Credential, EventlyError, InMemoryCredentialStore, NewCredential, Result, Role,
    };

    const SECRET: &str = "validator-secret";

    struct FailingStore;

    #[async_trait]
    impl CredentialStore for FailingStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<Credential>> {
            Err(EventlyError::DatabaseError("connection reset".to_string()))
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Credential>> {
            Err(EventlyError::DatabaseError("connection reset".to_string()))
        }
        async fn insert(&self, _credential: NewCredential) -> Result<Credential> {
            Err(EventlyError::DatabaseError("connection reset".to_string()))
        }
        async fn update_password_hash(&self, _id: Uuid, _new_hash: &str) -> Result<()> {
            Err(EventlyError::DatabaseError("connection reset".to_string()))
        }
    }

    struct HangingStore;

    #[async_trait]
    impl CredentialStore for HangingStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<Credential>> {
            std::future::pending().await
        }
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Credential>> {
            std::future::pending().await
        }
        async fn insert(&self, _credential: NewCredential) -> Result<Credential> {
            std::future::pending().await
        }
        async fn update_password_hash(&self, _id: Uuid, _new_hash: &str) -> Result<()> {
            std::future::pending().await
        }
    }

    async fn seeded() -> (Arc<InMemoryCredentialStore>, Principal) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let credential = store
            .insert(NewCredential {
                email: "a@b.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                password_hash: "unused".to_string(),
                role: Some(Role::Organizer),
            })
            .await
            .unwrap();
        let principal = Principal::from(&credential);
        (store, principal)
    }

    fn validator(store: Arc<dyn CredentialStore>) -> TokenValidator {
        TokenValidator::new(TokenDecoder::new(SECRET), store, Duration::from_millis(200))
    }

    fn issuer(ttl_secs: u64) -> TokenIssuer {
        TokenIssuer::new(SECRET, Duration::from_secs(ttl_secs))
    }

    #[tokio::test]
    async fn test_valid_token_is_accepted() {
        let (store, principal) = seeded().await;
        let token = issuer(3600).issue(&principal).unwrap();

        let accepted = validator(store).validate(&token).await.unwrap();
        assert_eq!(accepted, principal);
    }

    #[tokio::test]
    async fn test_garbage_and_foreign_tokens_are_invalid() {
        let (store, principal) = seeded().await;
        let validator = validator(store);

        assert_eq!(validator.validate("not-a-token").await, Err(Rejection::TokenInvalid));

        let foreign = TokenIssuer::new("other-secret", Duration::from_secs(3600))
            .issue(&principal)
            .unwrap();
        assert_eq!(validator.validate(&foreign).await, Err(Rejection::TokenInvalid));
    }

    #[tokio::test]
    async fn test_zero_ttl_is_expired() {
        let (store, principal) = seeded().await;
        let token = issuer(0).issue(&principal).unwrap();

        assert_eq!(validator(store).validate(&token).await, Err(Rejection::TokenExpired));
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let (store, principal) = seeded().await;
        let validator = validator(store);
        let issued_at = Utc::now();
        let token = issuer(60).issue_at(&principal, issued_at).unwrap();

        let just_before = issued_at + chrono::Duration::seconds(59);
        let at_expiry = issued_at + chrono::Duration::seconds(60);
        assert!(validator.validate_at(&token, just_before).await.is_ok());
        assert_eq!(
            validator.validate_at(&token, at_expiry).await,
            Err(Rejection::TokenExpired)
        );
    }

    #[tokio::test]
    async fn test_expiry_is_checked_before_lookup() {
        // Expired tokens never reach storage, even a broken one
        let (_, principal) = seeded().await;
        let token = issuer(0).issue(&principal).unwrap();

        assert_eq!(
            validator(Arc::new(FailingStore)).validate(&token).await,
            Err(Rejection::TokenExpired)
        );
    }

    #[tokio::test]
    async fn test_non_uuid_subject_is_invalid_even_when_expired() {
        use crate::auth::token::Claims;
        use jsonwebtoken::{encode, EncodingKey, Header};

        let (store, _) = seeded().await;
        let claims = Claims {
            id: "not-a-uuid".to_string(),
            email: "a@b.com".to_string(),
            is_active: true,
            role: "Organizer".to_string(),
            iat: 1_000,
            exp: 1_060,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(validator(store).validate(&token).await, Err(Rejection::TokenInvalid));
    }

    #[tokio::test]
    async fn test_unknown_subject() {
        let (_, principal) = seeded().await;
        let token = issuer(3600).issue(&principal).unwrap();
        let empty = Arc::new(InMemoryCredentialStore::new());

        assert_eq!(validator(empty).validate(&token).await, Err(Rejection::SubjectNotFound));
    }

    #[tokio::test]
    async fn test_deactivation_after_issue_is_honored() {
        let (store, principal) = seeded().await;
        let token = issuer(3600).issue(&principal).unwrap();
        let validator = validator(store.clone());

        assert!(validator.validate(&token).await.is_ok());
        store.set_active(principal.id, false).await.unwrap();
        assert_eq!(validator.validate(&token).await, Err(Rejection::SubjectInactive));
    }

    #[tokio::test]
    async fn test_role_comes_from_storage() {
        let (store, principal) = seeded().await;
        let token = issuer(3600).issue(&principal).unwrap();

        store.set_role(principal.id, Role::Customer).await.unwrap();
        let accepted = validator(store).validate(&token).await.unwrap();
        assert_eq!(accepted.role, Role::Customer);
    }

    #[tokio::test]
    async fn test_storage_failure_is_opaque() {
        let (_, principal) = seeded().await;
        let token = issuer(3600).issue(&principal).unwrap();

        assert_eq!(
            validator(Arc::new(FailingStore)).validate(&token).await,
            Err(Rejection::AuthenticationFailed)
        );
    }

    #[tokio::test]
    async fn test_lookup_timeout_fails_authentication() {
        let (_, principal) = seeded().await;
        let token = issuer(3600).issue(&principal).unwrap();

        assert_eq!(
            validator(Arc::new(HangingStore)).validate(&token).await,
            Err(Rejection::AuthenticationFailed)
        );
    }
}
