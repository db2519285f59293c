//! Cross-cutting HTTP middleware
//!
//! The authentication and authorization gates live in [`crate::auth::middleware`].

pub mod security_headers;

pub use security_headers::security_headers_middleware;
