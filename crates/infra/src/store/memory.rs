//! In-memory stores for tests and local development.
//!
//! Every check-and-mutate happens under one write lock, which gives the same
//! atomicity the Postgres stores get from row locks and constraints.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use festflow_auth::{Identity, KnownRole};
use festflow_clubs::{Club, normalize_club_name};
use festflow_core::{ClubId, Clock, Entity, EventId, UserId};
use festflow_events::{Event, EventDetails};

use super::{ClubStore, EventQuery, EventStore, IdentityStore, StoreError, StoreResult};

/// Id-keyed table guarded by a single lock.
#[derive(Debug)]
pub struct InMemoryTable<T: Entity> {
    inner: RwLock<HashMap<T::Id, T>>,
}

impl<T: Entity> Default for InMemoryTable<T> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory table lock poisoned".to_string())
}

impl<T: Entity + Clone> InMemoryTable<T> {
    pub fn get(&self, id: T::Id) -> StoreResult<Option<T>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> StoreResult<Option<T>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|v| pred(v)).cloned())
    }

    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> StoreResult<Vec<T>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().filter(|v| pred(v)).cloned().collect())
    }

    /// Run `f` with exclusive access to the whole table.
    pub fn write<R>(&self, f: impl FnOnce(&mut HashMap<T::Id, T>) -> StoreResult<R>) -> StoreResult<R> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        f(&mut map)
    }

    /// Apply `f` to one record under the write lock; the record is only
    /// replaced when `f` succeeds.
    pub fn update(&self, id: T::Id, f: impl FnOnce(&mut T) -> StoreResult<()>) -> StoreResult<T> {
        self.write(|map| {
            let current = map.get(&id).ok_or(StoreError::NotFound)?;
            let mut next = current.clone();
            f(&mut next)?;
            map.insert(id, next.clone());
            Ok(next)
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    table: InMemoryTable<Identity>,
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn insert(&self, identity: Identity) -> StoreResult<Identity> {
        self.table.write(|map| {
            if map.values().any(|i| i.email == identity.email) {
                return Err(StoreError::DuplicateEmail);
            }
            if identity.role == KnownRole::SuperAdmin
                && map.values().any(|i| i.role == KnownRole::SuperAdmin)
            {
                return Err(StoreError::SuperAdminExists);
            }
            map.insert(identity.id, identity.clone());
            Ok(identity)
        })
    }

    async fn get(&self, id: UserId) -> StoreResult<Option<Identity>> {
        self.table.get(id)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        self.table.find(|i| i.email == email)
    }

    async fn find_super_admin(&self) -> StoreResult<Option<Identity>> {
        self.table.find(|i| i.role == KnownRole::SuperAdmin)
    }

    async fn list_by_role(&self, role: KnownRole) -> StoreResult<Vec<Identity>> {
        let mut found = self.table.filter(|i| i.role == role)?;
        found.sort_by_key(|i| i.created_at);
        Ok(found)
    }

    async fn get_many(&self, ids: &[UserId]) -> StoreResult<Vec<Identity>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(identity) = self.table.get(*id)? {
                out.push(identity);
            }
        }
        Ok(out)
    }

    async fn update_credentials(&self, identity: &Identity) -> StoreResult<()> {
        self.table.update(identity.id, |stored| {
            stored.password_hash = identity.password_hash.clone();
            stored.must_change_password = identity.must_change_password;
            stored.updated_at = identity.updated_at;
            Ok(())
        })?;
        Ok(())
    }

    async fn remove(&self, id: UserId) -> StoreResult<bool> {
        self.table.write(|map| Ok(map.remove(&id).is_some()))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryClubStore {
    table: InMemoryTable<Club>,
}

#[async_trait]
impl ClubStore for InMemoryClubStore {
    async fn insert(&self, club: Club) -> StoreResult<Club> {
        let key = normalize_club_name(&club.name);
        self.table.write(|map| {
            if map.values().any(|c| normalize_club_name(&c.name) == key) {
                return Err(StoreError::DuplicateClubName);
            }
            map.insert(club.id, club.clone());
            Ok(club)
        })
    }

    async fn get(&self, id: ClubId) -> StoreResult<Option<Club>> {
        self.table.get(id)
    }

    async fn list(&self) -> StoreResult<Vec<Club>> {
        let mut clubs = self.table.filter(|_| true)?;
        clubs.sort_by_key(|c| c.created_at);
        Ok(clubs)
    }

    async fn approve(&self, id: ClubId) -> StoreResult<Club> {
        self.table.update(id, |club| {
            club.approve();
            Ok(())
        })
    }

    async fn assign_coordinator(&self, id: ClubId, coordinator: UserId) -> StoreResult<Club> {
        self.table.update(id, |club| {
            club.assign_coordinator(coordinator);
            Ok(())
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    table: InMemoryTable<Event>,
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: Event) -> StoreResult<Event> {
        self.table.write(|map| {
            map.insert(event.id(), event.clone());
            Ok(event)
        })
    }

    async fn get(&self, id: EventId) -> StoreResult<Option<Event>> {
        self.table.get(id)
    }

    async fn list(&self, query: EventQuery) -> StoreResult<Vec<Event>> {
        let mut events = self.table.filter(|e| query.matches(e))?;
        events.sort_by_key(|e| (e.details().date, e.created_at()));
        Ok(events)
    }

    async fn update_details(
        &self,
        id: EventId,
        details: EventDetails,
        now: DateTime<Utc>,
    ) -> StoreResult<Event> {
        self.table.update(id, |event| {
            event.edit(details, now);
            Ok(())
        })
    }

    async fn register(&self, id: EventId, user: UserId, clock: &dyn Clock) -> StoreResult<Event> {
        self.table.update(id, |event| {
            event.register(user, clock.now())?;
            Ok(())
        })
    }

    async fn check_in(&self, id: EventId, user: UserId, clock: &dyn Clock) -> StoreResult<Event> {
        self.table.update(id, |event| {
            event.check_in(user, clock.now())?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use festflow_core::SystemClock;
    use festflow_events::{EventDraft, LifecycleError};
    use std::sync::Arc;

    fn identity(email: &str) -> Identity {
        Identity::new_user(Some("Asha".into()), Some(email.into()), "hash".into(), Utc::now()).unwrap()
    }

    fn event(deadline: DateTime<Utc>) -> Event {
        let details = EventDetails::from_draft(EventDraft {
            title: Some("Hackathon".into()),
            date: Some("2030-01-20".into()),
            fest_type: Some("Nimbus".into()),
            registration_deadline: Some(deadline.to_rfc3339()),
            ..Default::default()
        })
        .unwrap();
        Event::create(ClubId::new(), UserId::new(), details, Utc::now())
    }

    #[tokio::test]
    async fn identity_email_is_unique() {
        let store = InMemoryIdentityStore::default();
        store.insert(identity("a@x.edu")).await.unwrap();

        let err = store.insert(identity("a@x.edu")).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail);
    }

    #[tokio::test]
    async fn only_one_super_admin() {
        let store = InMemoryIdentityStore::default();
        let first = Identity::new_super_admin("A", "a@x.edu", "h".into(), Utc::now()).unwrap();
        let second = Identity::new_super_admin("B", "b@x.edu", "h".into(), Utc::now()).unwrap();

        store.insert(first.clone()).await.unwrap();
        assert_eq!(store.insert(second).await.unwrap_err(), StoreError::SuperAdminExists);
        assert_eq!(store.find_super_admin().await.unwrap().map(|i| i.id), Some(first.id));
    }

    #[tokio::test]
    async fn club_names_are_unique_ignoring_case() {
        let store = InMemoryClubStore::default();
        store.insert(Club::create(Some("Robotics".into()), None, Utc::now()).unwrap()).await.unwrap();

        let dup = Club::create(Some(" robotics ".into()), None, Utc::now()).unwrap();
        assert_eq!(store.insert(dup).await.unwrap_err(), StoreError::DuplicateClubName);
    }

    #[tokio::test]
    async fn event_query_filters_club_and_deadline() {
        let store = InMemoryEventStore::default();
        let t = Utc.with_ymd_and_hms(2030, 1, 10, 0, 0, 0).unwrap();
        let early = store.insert(event(t)).await.unwrap();
        let late = store.insert(event(t + Duration::days(5))).await.unwrap();

        let mine = store.list(EventQuery::for_club(early.club_id().unwrap())).await.unwrap();
        assert_eq!(mine.iter().map(|e| e.id()).collect::<Vec<_>>(), vec![early.id()]);

        let window = EventQuery {
            deadline_from: Some(t + Duration::days(1)),
            ..Default::default()
        };
        let found = store.list(window).await.unwrap();
        assert_eq!(found.iter().map(|e| e.id()).collect::<Vec<_>>(), vec![late.id()]);
    }

    #[tokio::test]
    async fn failed_guard_leaves_record_untouched() {
        let store = InMemoryEventStore::default();
        let ev = store.insert(event(Utc::now() + Duration::days(1))).await.unwrap();
        let u = UserId::new();

        let err = store.check_in(ev.id(), u, &SystemClock).await.unwrap_err();
        assert_eq!(err, StoreError::Lifecycle(LifecycleError::NotRegistered));
        assert_eq!(store.get(ev.id()).await.unwrap().unwrap(), ev);
    }

    #[tokio::test]
    async fn concurrent_duplicate_registrations_admit_one() {
        let store = Arc::new(InMemoryEventStore::default());
        let ev = store.insert(event(Utc::now() + Duration::days(1))).await.unwrap();
        let (id, u) = (ev.id(), UserId::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.register(id, u, &SystemClock).await
            }));
        }

        let mut ok = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert_eq!(e, StoreError::Lifecycle(LifecycleError::AlreadyRegistered)),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(store.get(id).await.unwrap().unwrap().registrations(), &[u]);
    }

    #[tokio::test]
    async fn update_on_missing_record_is_not_found() {
        let store = InMemoryClubStore::default();
        assert_eq!(store.approve(ClubId::new()).await.unwrap_err(), StoreError::NotFound);
    }
}
