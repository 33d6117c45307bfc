//! Event aggregate: details, registrations and check-ins.
//!
//! State is derived rather than stored: an event is *open* while
//! `now < registration_deadline` and *closed* afterwards. Registrations and
//! check-ins are append-only.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use festflow_auth::ManagedResource;
use festflow_core::{ClubId, DomainError, DomainResult, Entity, EventId, UserId, error::required_text};

use crate::FestType;

/// Largest accepted seat limit; the column is a 32-bit signed integer.
pub const MAX_SEATS_LIMIT: u32 = i32::MAX as u32;

/// Lifecycle guard failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("already registered for this event")]
    AlreadyRegistered,

    #[error("registration deadline has passed")]
    DeadlinePassed,

    #[error("no seats left for this event")]
    SeatsExhausted,

    #[error("user is not registered for this event")]
    NotRegistered,

    #[error("user is already checked in")]
    AlreadyCheckedIn,
}

/// Unvalidated event fields as submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub fest_type: Option<String>,
    #[serde(default)]
    pub registration_deadline: Option<String>,
    #[serde(default)]
    pub max_seats: Option<u32>,
    /// Only honoured for the super-admin; coordinators always use their own club.
    #[serde(default, alias = "club")]
    pub club_id: Option<ClubId>,
}

/// The editable, validated part of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub fest_type: FestType,
    pub registration_deadline: DateTime<Utc>,
    pub max_seats: Option<u32>,
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (UTC) or a bare date (midnight UTC).
fn parse_instant(field: &str, value: Option<String>) -> DomainResult<DateTime<Utc>> {
    let raw = required_text(field, value)?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(DomainError::validation(format!("{field} is not a valid date")))
}

impl EventDetails {
    pub fn from_draft(draft: EventDraft) -> DomainResult<Self> {
        let title = required_text("title", draft.title)?;
        let date = parse_instant("date", draft.date)?;
        let fest_type = required_text("festType", draft.fest_type)?.parse::<FestType>()?;
        let registration_deadline =
            parse_instant("registrationDeadline", draft.registration_deadline)?;

        match draft.max_seats {
            Some(0) => return Err(DomainError::validation("maxSeats must be positive")),
            Some(n) if n > MAX_SEATS_LIMIT => {
                return Err(DomainError::validation(format!(
                    "maxSeats must be at most {MAX_SEATS_LIMIT}"
                )));
            }
            _ => {}
        }

        Ok(Self {
            title,
            description: draft.description.map(|d| d.trim().to_string()).unwrap_or_default(),
            date,
            fest_type,
            registration_deadline,
            max_seats: draft.max_seats,
        })
    }
}

/// Persisted shape of an event, used to rehydrate from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: EventId,
    pub club_id: Option<ClubId>,
    pub created_by: UserId,
    pub details: EventDetails,
    pub registrations: Vec<UserId>,
    pub checked_in_users: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate root: Event.
///
/// # Invariants
/// - `registrations` holds no duplicate.
/// - `checked_in_users` holds no duplicate and is a subset of `registrations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    id: EventId,
    club_id: Option<ClubId>,
    created_by: UserId,
    #[serde(flatten)]
    details: EventDetails,
    registrations: Vec<UserId>,
    checked_in_users: Vec<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Event {
    pub fn create(
        club_id: ClubId,
        created_by: UserId,
        details: EventDetails,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::new(),
            club_id: Some(club_id),
            created_by,
            details,
            registrations: Vec::new(),
            checked_in_users: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild from storage, re-establishing the membership invariants.
    pub fn from_record(record: EventRecord) -> Self {
        let mut registrations: Vec<UserId> = Vec::with_capacity(record.registrations.len());
        for user in record.registrations {
            if !registrations.contains(&user) {
                registrations.push(user);
            }
        }
        let mut checked_in_users: Vec<UserId> = Vec::new();
        for user in record.checked_in_users {
            if registrations.contains(&user) && !checked_in_users.contains(&user) {
                checked_in_users.push(user);
            }
        }

        Self {
            id: record.id,
            club_id: record.club_id,
            created_by: record.created_by,
            details: record.details,
            registrations,
            checked_in_users,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn club_id(&self) -> Option<ClubId> {
        self.club_id
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn details(&self) -> &EventDetails {
        &self.details
    }

    pub fn registrations(&self) -> &[UserId] {
        &self.registrations
    }

    pub fn checked_in_users(&self) -> &[UserId] {
        &self.checked_in_users
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_registered(&self, user: UserId) -> bool {
        self.registrations.contains(&user)
    }

    pub fn is_checked_in(&self, user: UserId) -> bool {
        self.checked_in_users.contains(&user)
    }

    /// Registration is open strictly before the deadline.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now < self.details.registration_deadline
    }

    pub fn seats_left(&self) -> Option<u32> {
        let taken = u32::try_from(self.registrations.len()).unwrap_or(u32::MAX);
        self.details.max_seats.map(|max| max.saturating_sub(taken))
    }

    /// Full overwrite of the editable fields. Membership lists are untouched.
    pub fn edit(&mut self, details: EventDetails, now: DateTime<Utc>) {
        self.details = details;
        self.updated_at = now;
    }

    /// Guards run in order: membership, deadline, seats.
    pub fn register(&mut self, user: UserId, now: DateTime<Utc>) -> Result<(), LifecycleError> {
        if self.is_registered(user) {
            return Err(LifecycleError::AlreadyRegistered);
        }
        if !self.is_open(now) {
            return Err(LifecycleError::DeadlinePassed);
        }
        if self.seats_left() == Some(0) {
            return Err(LifecycleError::SeatsExhausted);
        }

        self.registrations.push(user);
        self.updated_at = now;
        Ok(())
    }

    /// Terminal transition for an attendee; there is no undo.
    pub fn check_in(&mut self, user: UserId, now: DateTime<Utc>) -> Result<(), LifecycleError> {
        if !self.is_registered(user) {
            return Err(LifecycleError::NotRegistered);
        }
        if self.is_checked_in(user) {
            return Err(LifecycleError::AlreadyCheckedIn);
        }

        self.checked_in_users.push(user);
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.id
    }
}

impl ManagedResource for Event {
    fn club_id(&self) -> Option<ClubId> {
        self.club_id
    }

    fn created_by(&self) -> UserId {
        self.created_by
    }
}
