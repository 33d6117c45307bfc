//! Identity records (user accounts) and their invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use festflow_core::{ClubId, DomainError, DomainResult, Entity, UserId, error::required_text};

use crate::{KnownRole, SessionClaims};

/// A user account.
///
/// # Invariants
/// - `email` is trimmed and lower-cased (uniqueness is case-insensitive).
/// - `club_id` is set iff `role` is `Coordinator`.
/// - `password_hash` is a PHC string; the plaintext is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: KnownRole,
    pub club_id: Option<ClubId>,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: Option<String>) -> DomainResult<String> {
    let email = normalize_email(&required_text("email", email)?);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::validation("invalid email format")),
    }
}

impl Identity {
    fn build(
        name: Option<String>,
        email: Option<String>,
        password_hash: String,
        role: KnownRole,
        club_id: Option<ClubId>,
        must_change_password: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = required_text("name", name)?;
        let email = validate_email(email)?;

        if (role == KnownRole::Coordinator) != club_id.is_some() {
            return Err(DomainError::validation(
                "a club is required for coordinators and only for coordinators",
            ));
        }

        Ok(Self {
            id: UserId::new(),
            name,
            email,
            password_hash,
            role,
            club_id,
            must_change_password,
            created_at: now,
            updated_at: now,
        })
    }

    /// Self-registered attendee account.
    pub fn new_user(
        name: Option<String>,
        email: Option<String>,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Self::build(name, email, password_hash, KnownRole::User, None, false, now)
    }

    /// Coordinator created by the super-admin with a temporary credential.
    pub fn new_coordinator(
        name: Option<String>,
        email: Option<String>,
        club_id: ClubId,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Self::build(
            name,
            email,
            password_hash,
            KnownRole::Coordinator,
            Some(club_id),
            true,
            now,
        )
    }

    /// The single super-admin, provisioned with a temporary credential.
    pub fn new_super_admin(
        name: &str,
        email: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Self::build(
            Some(name.to_string()),
            Some(email.to_string()),
            password_hash,
            KnownRole::SuperAdmin,
            None,
            true,
            now,
        )
    }

    /// Attach the credential hash to a freshly validated identity.
    pub fn with_password_hash(mut self, password_hash: String) -> Self {
        self.password_hash = password_hash;
        self
    }

    /// Replace the credential and clear the forced-change flag.
    pub fn set_password(&mut self, password_hash: String, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.must_change_password = false;
        self.updated_at = now;
    }

    /// Project the authorization-relevant fields into session claims.
    pub fn claims(&self) -> SessionClaims {
        SessionClaims {
            user_id: self.id,
            role: self.role.into(),
            club_id: self.club_id,
            must_change_password: self.must_change_password,
        }
    }
}

impl Entity for Identity {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn new_user_normalizes_email_and_defaults_role() {
        let user = Identity::new_user(some(" Asha "), some("  Asha@Campus.EDU "), "h".into(), Utc::now())
            .unwrap();

        assert_eq!(user.name, "Asha");
        assert_eq!(user.email, "asha@campus.edu");
        assert_eq!(user.role, KnownRole::User);
        assert_eq!(user.club_id, None);
        assert!(!user.must_change_password);
    }

    #[test]
    fn rejects_missing_name_and_bad_email() {
        assert!(Identity::new_user(None, some("a@b.c"), "h".into(), Utc::now()).is_err());
        assert!(Identity::new_user(some("A"), some("no-at-sign"), "h".into(), Utc::now()).is_err());
        assert!(Identity::new_user(some("A"), some("@campus.edu"), "h".into(), Utc::now()).is_err());
    }

    #[test]
    fn coordinator_carries_club_and_must_change_password() {
        let club = ClubId::new();
        let c = Identity::new_coordinator(some("Ravi"), some("ravi@campus.edu"), club, "h".into(), Utc::now())
            .unwrap();

        let claims = c.claims();
        assert_eq!(claims.role, Role::COORDINATOR);
        assert_eq!(claims.club_id, Some(club));
        assert!(claims.must_change_password);
    }

    #[test]
    fn set_password_clears_flag() {
        let mut admin =
            Identity::new_super_admin("Faculty Incharge", "superadmin@festflow.edu", "h".into(), Utc::now())
                .unwrap();
        assert!(admin.must_change_password);

        admin.set_password("h2".into(), Utc::now());
        assert!(!admin.must_change_password);
        assert_eq!(admin.password_hash, "h2");
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = Identity::new_user(some("A"), some("a@b.c"), "secret-hash".into(), Utc::now()).unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
