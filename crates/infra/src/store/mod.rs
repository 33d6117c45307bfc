//! Persistence boundary for identities, clubs and events.
//!
//! Each store is a trait so services can run against the in-memory tables
//! (tests, local development) or PostgreSQL. Uniqueness rules and the
//! register/check-in guards are enforced *by the store*, atomically with the
//! write.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use festflow_auth::{Identity, KnownRole};
use festflow_clubs::Club;
use festflow_core::{ClubId, Clock, EventId, UserId};
use festflow_events::{Event, EventDetails, LifecycleError};

pub use memory::{InMemoryClubStore, InMemoryEventStore, InMemoryIdentityStore, InMemoryTable};
pub use postgres::{PostgresClubStore, PostgresEventStore, PostgresIdentityStore, migrate};

/// Store operation error.
///
/// Conflicts and lifecycle guard failures are deterministic and map to 4xx
/// responses; `Backend` is an infrastructure failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,

    #[error("club name already in use")]
    DuplicateClubName,

    #[error("a super-admin already exists")]
    SuperAdminExists,

    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("storage failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter for event queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub club_id: Option<ClubId>,
    /// Inclusive lower bound on the registration deadline.
    pub deadline_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the registration deadline.
    pub deadline_before: Option<DateTime<Utc>>,
}

impl EventQuery {
    pub fn for_club(club_id: ClubId) -> Self {
        Self {
            club_id: Some(club_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        let deadline = event.details().registration_deadline;
        self.club_id.is_none_or(|c| event.club_id() == Some(c))
            && self.deadline_from.is_none_or(|from| deadline >= from)
            && self.deadline_before.is_none_or(|before| deadline < before)
    }
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Fails with `DuplicateEmail` or `SuperAdminExists`.
    async fn insert(&self, identity: Identity) -> StoreResult<Identity>;
    async fn get(&self, id: UserId) -> StoreResult<Option<Identity>>;
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;
    async fn find_super_admin(&self) -> StoreResult<Option<Identity>>;
    async fn list_by_role(&self, role: KnownRole) -> StoreResult<Vec<Identity>>;
    /// Unknown ids are skipped; order follows `ids`.
    async fn get_many(&self, ids: &[UserId]) -> StoreResult<Vec<Identity>>;
    /// Persist credential fields (`password_hash`, `must_change_password`, `updated_at`).
    async fn update_credentials(&self, identity: &Identity) -> StoreResult<()>;
    /// Returns whether a record was removed.
    async fn remove(&self, id: UserId) -> StoreResult<bool>;
}

#[async_trait]
pub trait ClubStore: Send + Sync {
    /// Fails with `DuplicateClubName` (case-insensitive, trimmed).
    async fn insert(&self, club: Club) -> StoreResult<Club>;
    async fn get(&self, id: ClubId) -> StoreResult<Option<Club>>;
    /// Ordered by creation time.
    async fn list(&self) -> StoreResult<Vec<Club>>;
    async fn approve(&self, id: ClubId) -> StoreResult<Club>;
    async fn assign_coordinator(&self, id: ClubId, coordinator: UserId) -> StoreResult<Club>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: Event) -> StoreResult<Event>;
    async fn get(&self, id: EventId) -> StoreResult<Option<Event>>;
    /// Ordered by event date.
    async fn list(&self, query: EventQuery) -> StoreResult<Vec<Event>>;
    /// Overwrites the editable fields only.
    async fn update_details(
        &self,
        id: EventId,
        details: EventDetails,
        now: DateTime<Utc>,
    ) -> StoreResult<Event>;
    /// Atomic guard-and-append. `clock` is read while the event is locked.
    async fn register(&self, id: EventId, user: UserId, clock: &dyn Clock) -> StoreResult<Event>;
    async fn check_in(&self, id: EventId, user: UserId, clock: &dyn Clock) -> StoreResult<Event>;
}

/// The three stores, shared.
#[derive(Clone)]
pub struct Stores {
    pub identities: Arc<dyn IdentityStore>,
    pub clubs: Arc<dyn ClubStore>,
    pub events: Arc<dyn EventStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            identities: Arc::new(InMemoryIdentityStore::default()),
            clubs: Arc::new(InMemoryClubStore::default()),
            events: Arc::new(InMemoryEventStore::default()),
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            identities: Arc::new(PostgresIdentityStore::new(pool.clone())),
            clubs: Arc::new(PostgresClubStore::new(pool.clone())),
            events: Arc::new(PostgresEventStore::new(pool)),
        }
    }
}
