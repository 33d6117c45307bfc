use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use festflow_core::{ClubId, DomainResult, Entity, UserId, error::required_text};

/// Club names are unique after trimming, compared case-insensitively.
pub fn normalize_club_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A student club.
///
/// `coordinator` is a weak back-reference; the coordinator's identity holds
/// the authoritative club link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    pub description: String,
    pub is_approved: bool,
    pub coordinator: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Club {
    pub fn create(
        name: Option<String>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: ClubId::new(),
            name: required_text("name", name)?,
            description: description.map(|d| d.trim().to_string()).unwrap_or_default(),
            is_approved: false,
            coordinator: None,
            created_at: now,
        })
    }

    /// Idempotent.
    pub fn approve(&mut self) {
        self.is_approved = true;
    }

    /// Replaces any previous coordinator.
    pub fn assign_coordinator(&mut self, user: UserId) -> Option<UserId> {
        self.coordinator.replace(user)
    }
}

impl Entity for Club {
    type Id = ClubId;

    fn id(&self) -> ClubId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use festflow_core::DomainError;

    #[test]
    fn create_trims_and_defaults() {
        let club = Club::create(Some("  Robotics ".into()), None, Utc::now()).unwrap();
        assert_eq!(club.name, "Robotics");
        assert_eq!(club.description, "");
        assert!(!club.is_approved);
        assert!(club.coordinator.is_none());
    }

    #[test]
    fn name_is_required() {
        assert!(matches!(
            Club::create(Some("   ".into()), Some("x".into()), Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn approve_and_assign() {
        let mut club = Club::create(Some("Drama".into()), None, Utc::now()).unwrap();
        club.approve();
        club.approve();
        assert!(club.is_approved);

        let (first, second) = (UserId::new(), UserId::new());
        assert_eq!(club.assign_coordinator(first), None);
        assert_eq!(club.assign_coordinator(second), Some(first));
        assert_eq!(club.coordinator, Some(second));
    }

    #[test]
    fn names_compare_case_insensitively() {
        assert_eq!(normalize_club_name(" Robotics "), normalize_club_name("ROBOTICS"));
    }

    #[test]
    fn serializes_camel_case() {
        let club = Club::create(Some("Drama".into()), None, Utc::now()).unwrap();
        let v = serde_json::to_value(&club).unwrap();
        assert_eq!(v["isApproved"], false);
        assert!(v["coordinator"].is_null());
    }
}
