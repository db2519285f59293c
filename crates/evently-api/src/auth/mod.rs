//! Authentication and authorization module
//!
//! - Password hashing with Argon2
//! - Session token issuing and decoding (HS256 JWT)
//! - Token validation against the credential store
//! - Role requirements per operation and the allow/deny decision
//! - Middleware chaining the two gates
//! - Authentication service for registration, login and password reset

pub mod error;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod service;
pub mod token;
pub mod validator;

pub use error::AuthError;
pub use guard::{authorize, Decision};
pub use middleware::{authenticate, authorize_roles, bearer_token};
pub use password::{hash_password, verify_password, PasswordConfig, PasswordError};
pub use roles::{Operation, RoleRegistry, RoleRequirement};
pub use service::{
    AuthService, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest, UserInfo,
};
pub use token::{Claims, TokenDecoder, TokenError, TokenIssuer};
pub use validator::{Rejection, TokenValidator};
