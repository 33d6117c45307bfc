//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | Constraint / condition | StoreError |
//! |------------------------|------------|
//! | `identities_email_key` (23505) | `DuplicateEmail` |
//! | `identities_single_super_admin` (23505) | `SuperAdminExists` |
//! | `clubs_name_lower_key` (23505) | `DuplicateClubName` |
//! | foreign key violation (23503) | `NotFound` |
//! | anything else | `Backend` |
//!
//! ## Atomicity
//!
//! `register` and `check_in` run in one transaction that locks the event row
//! (`SELECT ... FOR UPDATE`), applies the domain guards to the locked state,
//! then inserts the membership row. Primary keys on `(event_id, user_id)` and
//! the composite foreign key from check-ins to registrations back this up.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use festflow_auth::{Identity, KnownRole};
use festflow_clubs::Club;
use festflow_core::{ClubId, Clock, Entity, EventId, UserId};
use festflow_events::{Event, EventDetails, EventRecord, FestType};

use super::{ClubStore, EventQuery, EventStore, IdentityStore, StoreError, StoreResult};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS clubs (
        id             UUID PRIMARY KEY,
        name           TEXT NOT NULL,
        description    TEXT NOT NULL DEFAULT '',
        is_approved    BOOLEAN NOT NULL DEFAULT FALSE,
        coordinator_id UUID NULL,
        created_at     TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS clubs_name_lower_key ON clubs (lower(btrim(name)))",
    r#"
    CREATE TABLE IF NOT EXISTS identities (
        id                   UUID PRIMARY KEY,
        name                 TEXT NOT NULL,
        email                TEXT NOT NULL,
        password_hash        TEXT NOT NULL,
        role                 TEXT NOT NULL CHECK (role IN ('SUPER_ADMIN', 'COORDINATOR', 'USER')),
        club_id              UUID NULL REFERENCES clubs (id),
        must_change_password BOOLEAN NOT NULL DEFAULT FALSE,
        created_at           TIMESTAMPTZ NOT NULL,
        updated_at           TIMESTAMPTZ NOT NULL,
        CONSTRAINT identities_email_key UNIQUE (email)
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS identities_single_super_admin ON identities (role) WHERE role = 'SUPER_ADMIN'",
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id                    UUID PRIMARY KEY,
        club_id               UUID NULL REFERENCES clubs (id),
        created_by            UUID NOT NULL,
        title                 TEXT NOT NULL,
        description           TEXT NOT NULL DEFAULT '',
        date                  TIMESTAMPTZ NOT NULL,
        fest_type             TEXT NOT NULL,
        registration_deadline TIMESTAMPTZ NOT NULL,
        max_seats             INTEGER NULL CHECK (max_seats > 0),
        created_at            TIMESTAMPTZ NOT NULL,
        updated_at            TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS events_club_id_idx ON events (club_id)",
    "CREATE INDEX IF NOT EXISTS events_registration_deadline_idx ON events (registration_deadline)",
    r#"
    CREATE TABLE IF NOT EXISTS event_registrations (
        event_id      UUID NOT NULL REFERENCES events (id),
        user_id       UUID NOT NULL REFERENCES identities (id),
        position      BIGSERIAL,
        registered_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (event_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS event_check_ins (
        event_id      UUID NOT NULL,
        user_id       UUID NOT NULL,
        position      BIGSERIAL,
        checked_in_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (event_id, user_id),
        FOREIGN KEY (event_id, user_id) REFERENCES event_registrations (event_id, user_id)
    )
    "#,
];

/// Create tables and indexes if they do not exist yet.
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
    }
    Ok(())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned());
            match (code.as_deref(), db_err.constraint()) {
                (Some("23505"), Some("identities_email_key")) => StoreError::DuplicateEmail,
                (Some("23505"), Some("identities_single_super_admin")) => {
                    StoreError::SuperAdminExists
                }
                (Some("23505"), Some("clubs_name_lower_key")) => StoreError::DuplicateClubName,
                (Some("23503"), _) => StoreError::NotFound,
                _ => StoreError::Backend(format!(
                    "database error in {operation}: {}",
                    db_err.message()
                )),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn decode_error(operation: &str, what: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("failed to decode row in {operation}: {what}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Identities
// ─────────────────────────────────────────────────────────────────────────────

const IDENTITY_COLUMNS: &str = "id, name, email, password_hash, role, club_id, must_change_password, created_at, updated_at";

fn identity_from_row(row: &PgRow) -> StoreResult<Identity> {
    let get = |e: sqlx::Error| decode_error("identity", e);
    let role: String = row.try_get("role").map_err(get)?;
    Ok(Identity {
        id: UserId::from_uuid(row.try_get("id").map_err(get)?),
        name: row.try_get("name").map_err(get)?,
        email: row.try_get("email").map_err(get)?,
        password_hash: row.try_get("password_hash").map_err(get)?,
        role: role.parse::<KnownRole>().map_err(|e| decode_error("identity", e))?,
        club_id: row
            .try_get::<Option<Uuid>, _>("club_id")
            .map_err(get)?
            .map(ClubId::from_uuid),
        must_change_password: row.try_get("must_change_password").map_err(get)?,
        created_at: row.try_get("created_at").map_err(get)?,
        updated_at: row.try_get("updated_at").map_err(get)?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresIdentityStore {
    pool: PgPool,
}

impl PostgresIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, operation: &str, clause: &str, bind: Uuid) -> StoreResult<Option<Identity>> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE {clause}");
        let row = sqlx::query(&sql)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        row.as_ref().map(identity_from_row).transpose()
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    #[instrument(skip(self, identity), fields(user_id = %identity.id), err)]
    async fn insert(&self, identity: Identity) -> StoreResult<Identity> {
        sqlx::query(
            r#"
            INSERT INTO identities (
                id, name, email, password_hash, role, club_id,
                must_change_password, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*identity.id.as_uuid())
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(identity.club_id.map(Uuid::from))
        .bind(identity.must_change_password)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_identity", e))?;
        Ok(identity)
    }

    async fn get(&self, id: UserId) -> StoreResult<Option<Identity>> {
        self.fetch_one_where("get_identity", "id = $1", *id.as_uuid()).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_identity_by_email", e))?;
        row.as_ref().map(identity_from_row).transpose()
    }

    async fn find_super_admin(&self) -> StoreResult<Option<Identity>> {
        let sql = format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE role = 'SUPER_ADMIN' LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_super_admin", e))?;
        row.as_ref().map(identity_from_row).transpose()
    }

    async fn list_by_role(&self, role: KnownRole) -> StoreResult<Vec<Identity>> {
        let sql = format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE role = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_identities_by_role", e))?;
        rows.iter().map(identity_from_row).collect()
    }

    async fn get_many(&self, ids: &[UserId]) -> StoreResult<Vec<Identity>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let sql = format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ANY($1)");
        let rows = sqlx::query(&sql)
            .bind(&uuids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_many_identities", e))?;

        let mut by_id: HashMap<UserId, Identity> = rows
            .iter()
            .map(identity_from_row)
            .map(|r| r.map(|i| (i.id, i)))
            .collect::<StoreResult<_>>()?;
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn update_credentials(&self, identity: &Identity) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE identities
            SET password_hash = $2, must_change_password = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(*identity.id.as_uuid())
        .bind(&identity.password_hash)
        .bind(identity.must_change_password)
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_credentials", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn remove(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_identity", e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clubs
// ─────────────────────────────────────────────────────────────────────────────

const CLUB_COLUMNS: &str = "id, name, description, is_approved, coordinator_id, created_at";

fn club_from_row(row: &PgRow) -> StoreResult<Club> {
    let get = |e: sqlx::Error| decode_error("club", e);
    Ok(Club {
        id: ClubId::from_uuid(row.try_get("id").map_err(get)?),
        name: row.try_get("name").map_err(get)?,
        description: row.try_get("description").map_err(get)?,
        is_approved: row.try_get("is_approved").map_err(get)?,
        coordinator: row
            .try_get::<Option<Uuid>, _>("coordinator_id")
            .map_err(get)?
            .map(UserId::from_uuid),
        created_at: row.try_get("created_at").map_err(get)?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresClubStore {
    pool: PgPool,
}

impl PostgresClubStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn update_returning(&self, operation: &str, set: &str, id: ClubId, value: Option<Uuid>) -> StoreResult<Club> {
        let sql = format!("UPDATE clubs SET {set} WHERE id = $1 RETURNING {CLUB_COLUMNS}");
        let mut query = sqlx::query(&sql).bind(*id.as_uuid());
        if let Some(value) = value {
            query = query.bind(value);
        }
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?
            .ok_or(StoreError::NotFound)?;
        club_from_row(&row)
    }
}

#[async_trait]
impl ClubStore for PostgresClubStore {
    #[instrument(skip(self, club), fields(club_id = %club.id), err)]
    async fn insert(&self, club: Club) -> StoreResult<Club> {
        sqlx::query(
            r#"
            INSERT INTO clubs (id, name, description, is_approved, coordinator_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*club.id.as_uuid())
        .bind(&club.name)
        .bind(&club.description)
        .bind(club.is_approved)
        .bind(club.coordinator.map(Uuid::from))
        .bind(club.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_club", e))?;
        Ok(club)
    }

    async fn get(&self, id: ClubId) -> StoreResult<Option<Club>> {
        let sql = format!("SELECT {CLUB_COLUMNS} FROM clubs WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_club", e))?;
        row.as_ref().map(club_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Club>> {
        let sql = format!("SELECT {CLUB_COLUMNS} FROM clubs ORDER BY created_at ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_clubs", e))?;
        rows.iter().map(club_from_row).collect()
    }

    async fn approve(&self, id: ClubId) -> StoreResult<Club> {
        self.update_returning("approve_club", "is_approved = TRUE", id, None).await
    }

    async fn assign_coordinator(&self, id: ClubId, coordinator: UserId) -> StoreResult<Club> {
        self.update_returning(
            "assign_coordinator",
            "coordinator_id = $2",
            id,
            Some(*coordinator.as_uuid()),
        )
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

const EVENT_COLUMNS: &str = "id, club_id, created_by, title, description, date, fest_type, registration_deadline, max_seats, created_at, updated_at";

/// `max_seats` as stored; limits beyond the column range are an error, never NULL.
fn seats_column(details: &EventDetails) -> StoreResult<Option<i32>> {
    details
        .max_seats
        .map(|m| i32::try_from(m).map_err(|_| StoreError::Backend(format!("maxSeats {m} exceeds column range"))))
        .transpose()
}

fn event_record_from_row(row: &PgRow) -> StoreResult<EventRecord> {
    let get = |e: sqlx::Error| decode_error("event", e);
    let fest_type: String = row.try_get("fest_type").map_err(get)?;
    let max_seats: Option<i32> = row.try_get("max_seats").map_err(get)?;

    Ok(EventRecord {
        id: EventId::from_uuid(row.try_get("id").map_err(get)?),
        club_id: row
            .try_get::<Option<Uuid>, _>("club_id")
            .map_err(get)?
            .map(ClubId::from_uuid),
        created_by: UserId::from_uuid(row.try_get("created_by").map_err(get)?),
        details: EventDetails {
            title: row.try_get("title").map_err(get)?,
            description: row.try_get("description").map_err(get)?,
            date: row.try_get("date").map_err(get)?,
            fest_type: fest_type.parse::<FestType>().map_err(|e| decode_error("event", e))?,
            registration_deadline: row.try_get("registration_deadline").map_err(get)?,
            max_seats: max_seats.and_then(|m| u32::try_from(m).ok()),
        },
        registrations: Vec::new(),
        checked_in_users: Vec::new(),
        created_at: row.try_get("created_at").map_err(get)?,
        updated_at: row.try_get("updated_at").map_err(get)?,
    })
}

/// Load membership lists for the given events, in insertion order.
async fn load_members(
    conn: &mut PgConnection,
    table: &str,
    event_ids: &[Uuid],
) -> StoreResult<HashMap<Uuid, Vec<UserId>>> {
    let sql = format!(
        "SELECT event_id, user_id FROM {table} WHERE event_id = ANY($1) ORDER BY position ASC"
    );
    let rows = sqlx::query(&sql)
        .bind(event_ids)
        .fetch_all(conn)
        .await
        .map_err(|e| map_sqlx_error("load_members", e))?;

    let mut out: HashMap<Uuid, Vec<UserId>> = HashMap::new();
    for row in rows {
        let event_id: Uuid = row.try_get("event_id").map_err(|e| decode_error(table, e))?;
        let user_id: Uuid = row.try_get("user_id").map_err(|e| decode_error(table, e))?;
        out.entry(event_id).or_default().push(UserId::from_uuid(user_id));
    }
    Ok(out)
}

async fn hydrate(conn: &mut PgConnection, rows: &[PgRow]) -> StoreResult<Vec<Event>> {
    let mut records = rows.iter().map(event_record_from_row).collect::<StoreResult<Vec<_>>>()?;
    let ids: Vec<Uuid> = records.iter().map(|r| *r.id.as_uuid()).collect();

    let mut registrations = load_members(&mut *conn, "event_registrations", &ids).await?;
    let mut checked_in = load_members(&mut *conn, "event_check_ins", &ids).await?;

    for record in &mut records {
        let key = *record.id.as_uuid();
        record.registrations = registrations.remove(&key).unwrap_or_default();
        record.checked_in_users = checked_in.remove(&key).unwrap_or_default();
    }
    Ok(records.into_iter().map(Event::from_record).collect())
}

#[derive(Debug, Clone, Copy)]
enum Membership {
    Registration,
    CheckIn,
}

impl Membership {
    fn operation(self) -> &'static str {
        match self {
            Membership::Registration => "register",
            Membership::CheckIn => "check_in",
        }
    }

    fn columns(self) -> (&'static str, &'static str) {
        match self {
            Membership::Registration => ("event_registrations", "registered_at"),
            Membership::CheckIn => ("event_check_ins", "checked_in_at"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the event row, apply the domain guard to the locked state, then
    /// insert the membership row and bump `updated_at`.
    async fn guarded_append(
        &self,
        membership: Membership,
        id: EventId,
        user: UserId,
        clock: &dyn Clock,
    ) -> StoreResult<Event> {
        let operation = membership.operation();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?
            .ok_or(StoreError::NotFound)?;

        let mut event = hydrate(&mut *tx, std::slice::from_ref(&row))
            .await?
            .pop()
            .ok_or(StoreError::NotFound)?;

        let now = clock.now();
        match membership {
            Membership::Registration => event.register(user, now)?,
            Membership::CheckIn => event.check_in(user, now)?,
        }

        let (table, timestamp_column) = membership.columns();
        let insert = format!(
            "INSERT INTO {table} (event_id, user_id, {timestamp_column}) VALUES ($1, $2, $3)"
        );
        sqlx::query(&insert)
            .bind(*id.as_uuid())
            .bind(*user.as_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        sqlx::query("UPDATE events SET updated_at = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        tx.commit().await.map_err(|e| map_sqlx_error(operation, e))?;
        Ok(event)
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    #[instrument(skip(self, event), fields(event_id = %event.id()), err)]
    async fn insert(&self, event: Event) -> StoreResult<Event> {
        let d = event.details();
        let max_seats = seats_column(d)?;
        sqlx::query(
            r#"
            INSERT INTO events (
                id, club_id, created_by, title, description, date, fest_type,
                registration_deadline, max_seats, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(*event.id().as_uuid())
        .bind(event.club_id().map(Uuid::from))
        .bind(*event.created_by().as_uuid())
        .bind(&d.title)
        .bind(&d.description)
        .bind(d.date)
        .bind(d.fest_type.as_str())
        .bind(d.registration_deadline)
        .bind(max_seats)
        .bind(event.created_at())
        .bind(event.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_event", e))?;
        Ok(event)
    }

    async fn get(&self, id: EventId) -> StoreResult<Option<Event>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("get_event", e))?;
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("get_event", e))?;

        match row {
            Some(row) => Ok(hydrate(&mut *conn, std::slice::from_ref(&row)).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, query: EventQuery) -> StoreResult<Vec<Event>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("list_events", e))?;
        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE ($1::uuid IS NULL OR club_id = $1)
              AND ($2::timestamptz IS NULL OR registration_deadline >= $2)
              AND ($3::timestamptz IS NULL OR registration_deadline < $3)
            ORDER BY date ASC, created_at ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(query.club_id.map(Uuid::from))
            .bind(query.deadline_from)
            .bind(query.deadline_before)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("list_events", e))?;

        hydrate(&mut *conn, &rows).await
    }

    async fn update_details(
        &self,
        id: EventId,
        details: EventDetails,
        now: DateTime<Utc>,
    ) -> StoreResult<Event> {
        let max_seats = seats_column(&details)?;
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $2, description = $3, date = $4, fest_type = $5,
                registration_deadline = $6, max_seats = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .bind(&details.title)
        .bind(&details.description)
        .bind(details.date)
        .bind(details.fest_type.as_str())
        .bind(details.registration_deadline)
        .bind(max_seats)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_event_details", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.get(id).await?.ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self, clock), fields(event_id = %id, user_id = %user), err)]
    async fn register(&self, id: EventId, user: UserId, clock: &dyn Clock) -> StoreResult<Event> {
        self.guarded_append(Membership::Registration, id, user, clock)
            .await
    }

    #[instrument(skip(self, clock), fields(event_id = %id, user_id = %user), err)]
    async fn check_in(&self, id: EventId, user: UserId, clock: &dyn Clock) -> StoreResult<Event> {
        self.guarded_append(Membership::CheckIn, id, user, clock)
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn details(max_seats: Option<u32>) -> EventDetails {
        EventDetails {
            title: "Robo Wars".into(),
            description: String::new(),
            date: Utc::now(),
            fest_type: FestType::Nimbus,
            registration_deadline: Utc::now(),
            max_seats,
        }
    }

    #[test]
    fn seat_limit_is_stored_or_rejected_never_dropped() {
        assert_eq!(seats_column(&details(None)), Ok(None));
        assert_eq!(seats_column(&details(Some(120))), Ok(Some(120)));
        assert!(matches!(
            seats_column(&details(Some(3_000_000_000))),
            Err(StoreError::Backend(_))
        ));
    }
}
