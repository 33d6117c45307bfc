use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use festflow_core::{ClubId, UserId};

use crate::{KnownRole, Role};

/// Per-request projection of an identity's authorization-relevant fields.
///
/// Recomputed from the token on every request and passed explicitly into
/// policy checks and lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: UserId,
    pub role: Role,
    pub club_id: Option<ClubId>,
    pub must_change_password: bool,
}

impl SessionClaims {
    pub fn known_role(&self) -> Option<KnownRole> {
        self.role.known()
    }
}

/// JWT claims model (wire form of [`SessionClaims`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtClaims {
    /// Subject: the identity id.
    pub sub: UserId,

    pub role: Role,

    #[serde(default)]
    pub club_id: Option<ClubId>,

    #[serde(default)]
    pub must_change_password: bool,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    pub fn new(claims: &SessionClaims, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            sub: claims.user_id,
            role: claims.role.clone(),
            club_id: claims.club_id,
            must_change_password: claims.must_change_password,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    pub fn into_session(self) -> SessionClaims {
        SessionClaims {
            user_id: self.sub,
            role: self.role,
            club_id: self.club_id,
            must_change_password: self.must_change_password,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification lives in
/// [`crate::token`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn claims_at(issued_at: DateTime<Utc>, ttl: Duration) -> JwtClaims {
        let session = SessionClaims {
            user_id: UserId::new(),
            role: Role::USER,
            club_id: None,
            must_change_password: false,
        };
        JwtClaims::new(&session, issued_at, ttl)
    }

    #[test]
    fn window_is_half_open() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let claims = claims_at(t0, Duration::days(1));

        assert!(validate_claims(&claims, t0).is_ok());
        assert_eq!(
            validate_claims(&claims, t0 + Duration::days(1)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&claims, t0 - Duration::seconds(1)),
            Err(TokenValidationError::NotYetValid)
        );
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let claims = claims_at(t0, Duration::zero());
        assert_eq!(
            validate_claims(&claims, t0),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn wire_names_match_the_cookie_contract() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let value = serde_json::to_value(claims_at(t0, Duration::days(1))).unwrap();

        assert_eq!(value["role"], "USER");
        assert_eq!(value["iat"], t0.timestamp());
        assert_eq!(value["exp"], (t0 + Duration::days(1)).timestamp());
        assert!(value.get("mustChangePassword").is_some());
        assert!(value.get("clubId").is_some());
    }
}
