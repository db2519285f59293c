/// Password hashing and verification using Argon2id
///
/// The configurable cost factor (`HASH_COST_FACTOR`, default 12) is the Argon2
/// time cost. Memory and parallelism stay fixed:
/// - Algorithm: Argon2id
/// - Memory: 19 MiB
/// - Parallelism: 1 lane
/// - Salt: 16 bytes random, embedded in the PHC string
/// - Output: 32 bytes hash
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use thiserror::Error;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),
}

/// Password hashing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub memory_cost: u32,
    /// Time cost, the cost factor (default: 12)
    pub time_cost: u32,
    /// Parallelism (lanes, default: 1)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::with_cost_factor(evently_core::config::DEFAULT_HASH_COST_FACTOR)
    }
}

impl PasswordConfig {
    /// Default parameters with the given time cost
    pub fn with_cost_factor(cost_factor: u32) -> Self {
        Self {
            memory_cost: 19456,
            time_cost: cost_factor,
            parallelism: 1,
            output_len: Some(32),
        }
    }

    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))
    }
}

/// Hash a plaintext password
///
/// # Returns
///
/// * `Ok(String)` - PHC string (algorithm, parameters, salt and hash)
/// * `Err(PasswordError)` - If the parameters are invalid or hashing fails
///
/// # Example
///
/// ```no_run
/// use evently_api::auth::password::{hash_password, PasswordConfig};
///
/// let hash = hash_password("pw123456", &PasswordConfig::default()).unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str, config: &PasswordConfig) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = config.to_params()?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// Parameters and salt are read from the PHC string, so hashes produced with
/// any cost factor verify. The digest comparison is constant time. A hash that
/// cannot be parsed never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
