//! Event lifecycle: creation, editing, registration, check-in and listings.
//!
//! Every operation takes the caller's claims explicitly and consults
//! `festflow_auth::policy` before touching the stores.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use festflow_auth::policy::{self, ensure};
use festflow_auth::{KnownRole, SessionClaims};
use festflow_core::{ClubId, Clock, Entity, EventId, UserId};
use festflow_events::{Event, EventDetails, EventDraft, ListingView, PublicEvent, PublicListing};

use super::error::{ServiceError, ServiceResult, found};
use crate::notify::Notifier;
use crate::store::{EventQuery, StoreError, Stores};

pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Events visible to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visible {
    /// Full records, for the super-admin and coordinators.
    Managed(Vec<Event>),
    /// Public projection for everyone else.
    Public(Vec<PublicEvent>),
}

/// A registered attendee as seen by the event's managers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registrant {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub checked_in: bool,
}

fn event_not_found(err: StoreError) -> ServiceError {
    match err {
        StoreError::NotFound => ServiceError::NotFound("event"),
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct EventLifecycle {
    stores: Stores,
    notifier: Arc<dyn Notifier>,
    notify_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl EventLifecycle {
    pub fn new(stores: Stores, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            notifier,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
            clock,
        }
    }

    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    async fn load(&self, id: EventId) -> ServiceResult<Event> {
        found(self.stores.events.get(id).await?, "event")
    }

    async fn load_managed(&self, claims: &SessionClaims, id: EventId) -> ServiceResult<Event> {
        let event = self.load(id).await?;
        ensure(
            policy::can_manage_event(claims, &event),
            "event belongs to another club",
        )?;
        Ok(event)
    }

    #[tracing::instrument(skip(self, claims, draft), fields(user_id = %claims.user_id))]
    pub async fn create(&self, claims: &SessionClaims, draft: EventDraft) -> ServiceResult<Event> {
        ensure(
            policy::can_create_event(claims),
            "only coordinators and the super-admin create events",
        )?;
        let club_id = policy::resolve_event_club(claims, draft.club_id)?;
        found(self.stores.clubs.get(club_id).await?, "club")?;

        let details = EventDetails::from_draft(draft)?;
        let event = Event::create(club_id, claims.user_id, details, self.clock.now());
        let event = self.stores.events.insert(event).await?;

        tracing::info!(event_id = %event.id(), club_id = %club_id, "event created");
        Ok(event)
    }

    #[tracing::instrument(skip(self, claims, draft), fields(user_id = %claims.user_id))]
    pub async fn edit(&self, claims: &SessionClaims, id: EventId, draft: EventDraft) -> ServiceResult<Event> {
        self.load_managed(claims, id).await?;
        let details = EventDetails::from_draft(draft)?;

        let event = self
            .stores
            .events
            .update_details(id, details, self.clock.now())
            .await
            .map_err(event_not_found)?;
        tracing::info!(event_id = %id, "event updated");
        Ok(event)
    }

    /// The store applies the membership, deadline and seat guards atomically.
    /// The confirmation is sent afterwards and cannot fail the registration.
    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.user_id))]
    pub async fn register(&self, claims: &SessionClaims, id: EventId) -> ServiceResult<Event> {
        ensure(policy::can_register(claims), "only attendee accounts register")?;

        let event = self
            .stores
            .events
            .register(id, claims.user_id, self.clock.as_ref())
            .await
            .map_err(event_not_found)?;
        tracing::info!(event_id = %id, "registration recorded");

        self.send_confirmation(claims.user_id, &event).await;
        Ok(event)
    }

    async fn send_confirmation(&self, user_id: UserId, event: &Event) {
        let identity = match self.stores.identities.get(user_id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::warn!(%user_id, event_id = %event.id(), "registration confirmation skipped: account not found");
                return;
            }
            Err(err) => {
                tracing::warn!(%user_id, event_id = %event.id(), error = %err, "registration confirmation skipped");
                return;
            }
        };

        let delivery = self.notifier.notify_registration(&identity, event);
        match tokio::time::timeout(self.notify_timeout, delivery).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(%user_id, event_id = %event.id(), error = %err, "registration confirmation failed");
            }
            Err(_) => {
                tracing::warn!(
                    %user_id,
                    event_id = %event.id(),
                    timeout_ms = self.notify_timeout.as_millis() as u64,
                    "registration confirmation timed out"
                );
            }
        }
    }

    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.user_id))]
    pub async fn check_in(&self, claims: &SessionClaims, id: EventId, attendee: UserId) -> ServiceResult<Event> {
        self.load_managed(claims, id).await?;

        let event = self
            .stores
            .events
            .check_in(id, attendee, self.clock.as_ref())
            .await
            .map_err(event_not_found)?;
        tracing::info!(event_id = %id, %attendee, "attendee checked in");
        Ok(event)
    }

    pub async fn registrants(&self, claims: &SessionClaims, id: EventId) -> ServiceResult<Vec<Registrant>> {
        let event = self.load_managed(claims, id).await?;
        let identities = self.stores.identities.get_many(event.registrations()).await?;

        Ok(identities
            .into_iter()
            .map(|i| Registrant {
                checked_in: event.is_checked_in(i.id),
                id: i.id,
                name: i.name,
                email: i.email,
            })
            .collect())
    }

    pub async fn list_visible(&self, claims: Option<&SessionClaims>) -> ServiceResult<Visible> {
        match claims.and_then(|c| c.known_role().map(|r| (r, c.club_id))) {
            Some((KnownRole::SuperAdmin, _)) => {
                Ok(Visible::Managed(self.stores.events.list(EventQuery::default()).await?))
            }
            Some((KnownRole::Coordinator, Some(club_id))) => Ok(Visible::Managed(
                self.stores.events.list(EventQuery::for_club(club_id)).await?,
            )),
            Some((KnownRole::Coordinator, None)) => Ok(Visible::Managed(Vec::new())),
            _ => Ok(Visible::Public(self.list_public(PublicListing::default()).await?)),
        }
    }

    async fn club_names(&self) -> ServiceResult<HashMap<ClubId, String>> {
        let clubs = self.stores.clubs.list().await?;
        Ok(clubs.into_iter().map(|c| (c.id, c.name)).collect())
    }

    pub async fn list_public(&self, listing: PublicListing) -> ServiceResult<Vec<PublicEvent>> {
        let now = self.clock.now();
        let query = match listing.view {
            ListingView::Upcoming => EventQuery {
                deadline_from: Some(now),
                ..EventQuery::default()
            },
            ListingView::Past => EventQuery {
                deadline_before: Some(now),
                ..EventQuery::default()
            },
        };

        let events = self.stores.events.list(query).await?;
        let names = self.club_names().await?;

        Ok(events
            .iter()
            .filter_map(|event| {
                let club_name = event.club_id().and_then(|c| names.get(&c)).cloned();
                listing
                    .admits(event, club_name.as_deref(), now)
                    .then(|| PublicEvent::project(event, club_name))
            })
            .collect())
    }

    pub async fn get_public(&self, id: EventId) -> ServiceResult<PublicEvent> {
        let event = self.load(id).await?;
        let club_name = match event.club_id() {
            Some(club_id) => self.stores.clubs.get(club_id).await?.map(|c| c.name),
            None => None,
        };
        Ok(PublicEvent::project(&event, club_name))
    }
}
