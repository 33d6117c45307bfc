//! Signed session tokens (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::claims::{JwtClaims, SessionClaims, TokenValidationError, validate_claims};

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::days(1);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token could not be decoded: {0}")]
    Malformed(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("token could not be signed: {0}")]
    Signing(String),
}

/// Issues and verifies session tokens.
///
/// One implementation is selected at deployment time; callers only see
/// [`SessionClaims`].
pub trait JwtValidator: Send + Sync {
    fn issue(&self, claims: &SessionClaims, now: DateTime<Utc>) -> Result<String, TokenError>;

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError>;

    fn ttl(&self) -> Duration;
}

/// HMAC-SHA256 token codec with a shared secret.
pub struct Hs256JwtValidator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        Self::with_ttl(secret, DEFAULT_TOKEN_TTL)
    }

    pub fn with_ttl(secret: Vec<u8>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `validate_claims`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn issue(&self, claims: &SessionClaims, now: DateTime<Utc>) -> Result<String, TokenError> {
        let jwt = JwtClaims::new(claims, now, self.ttl);
        encode(&Header::new(Algorithm::HS256), &jwt, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let data = decode::<JwtClaims>(token, &self.decoding, &Self::validation())
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims.into_session())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
