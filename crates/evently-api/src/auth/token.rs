//! Session token issuance and decoding
//!
//! Session tokens are HS256 JWTs signed with the single shared secret from
//! [`AuthConfig`]. They carry the subject's id, email, active flag and role
//! plus `iat`/`exp`. There is no `jti`: identical claims issued in the same
//! second produce identical tokens.

use chrono::{DateTime, Utc};
use evently_core::{AuthConfig, ConfigError, Principal};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Claims embedded in a session token
///
/// Only `id` is trusted after validation; the rest is informational for
/// clients and is re-read from storage on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject ID
    pub id: String,
    /// Email at issuance
    pub email: String,
    /// Active flag at issuance
    pub is_active: bool,
    /// Role at issuance
    pub role: String,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expiration (Unix seconds)
    pub exp: u64,
}

impl Claims {
    /// Whether the token is past its lifetime at `now`
    ///
    /// A token is live for `[iat, exp)`, so a zero TTL is expired on issue.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        unix_secs(now) >= self.exp
    }
}

/// Token errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token")]
    InvalidToken,
}

/// Signs session tokens
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Build from configuration, parsing the TTL string
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(&config.token_signing_secret, config.ttl()?))
    }

    /// Lifetime of issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `principal` valid from now for the configured TTL
    pub fn issue(&self, principal: &Principal) -> Result<String, TokenError> {
        self.issue_at(principal, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = unix_secs(now);
        let claims = Claims {
            id: principal.id.to_string(),
            email: principal.email.clone(),
            is_active: principal.is_active,
            role: principal.role.to_string(),
            iat,
            exp: iat.saturating_add(self.ttl.as_secs()),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.key)?)
    }
}

/// Verifies session token signatures
#[derive(Clone)]
pub struct TokenDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl TokenDecoder {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked separately so a bad signature always wins over
        // expiry and the boundary has no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.token_signing_secret)
    }

    /// Check the signature and structure and return the claims
    ///
    /// Does not look at `exp`; see [`Claims::is_expired_at`].
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::InvalidToken)
    }
}

fn unix_secs(at: DateTime<Utc>) -> u64 {
    at.timestamp().max(0) as u64
}
