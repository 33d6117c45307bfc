//! `festflow-auth`: identities, credentials, session tokens and the
//! authorization policy.
//!
//! This crate is decoupled from HTTP and storage.

pub mod claims;
pub mod identity;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;

pub use claims::{JwtClaims, SessionClaims, TokenValidationError, validate_claims};
pub use identity::{Identity, normalize_email};
pub use password::{PasswordError, Passwords, generate_temporary_password, validate_new_password};
pub use policy::{AuthzError, ManagedResource};
pub use roles::{KnownRole, Role};
pub use token::{Hs256JwtValidator, JwtValidator, TokenError};
