//! Application state management

use crate::auth::{AuthService, RoleRegistry, TokenValidator};
use evently_core::{AuthConfig, ConfigError, CredentialStore};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers and middleware
pub struct AppState {
    /// Server start time
    pub start_time: Instant,
    /// Bearer token validator for the authentication gate
    pub validator: TokenValidator,
    /// Registration, login and password reset
    pub auth: AuthService,
    /// Role requirements consulted by the authorization gate
    pub roles: RoleRegistry,
}

impl AppState {
    /// Build the auth components from `config` over `store`
    ///
    /// Fails when the config does not validate, e.g. a blank signing secret
    /// or an unparseable TTL.
    pub fn new(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ConfigError> {
        config.validate()?;

        let validator = TokenValidator::from_config(config, store.clone());
        let auth = AuthService::from_config(config, store)?;

        Ok(Self {
            start_time: Instant::now(),
            validator,
            auth,
            roles: RoleRegistry::new(),
        })
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
