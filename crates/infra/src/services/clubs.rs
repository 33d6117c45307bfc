//! Club registry and coordinator provisioning (super-admin only).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use festflow_auth::policy::{self, ensure};
use festflow_auth::{Identity, KnownRole, Passwords, SessionClaims, generate_temporary_password};
use festflow_clubs::Club;
use festflow_core::{ClubId, Clock, UserId};

use super::error::{ServiceError, ServiceResult, found};
use crate::store::{StoreError, Stores};

pub const TEMPORARY_PASSWORD_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorRef {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// A club together with its coordinator's contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubOverview {
    #[serde(flatten)]
    pub club: Club,
    pub coordinator_details: Option<CoordinatorRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorOverview {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub club_id: Option<ClubId>,
    pub club_name: Option<String>,
    pub must_change_password: bool,
}

/// Result of provisioning a coordinator. The temporary password is only
/// ever returned here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedCoordinator {
    pub identity: Identity,
    pub club: Club,
    pub temporary_password: String,
}

fn club_not_found(err: StoreError) -> ServiceError {
    match err {
        StoreError::NotFound => ServiceError::NotFound("club"),
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct ClubRegistry {
    stores: Stores,
    passwords: Passwords,
    clock: Arc<dyn Clock>,
}

impl ClubRegistry {
    pub fn new(stores: Stores, passwords: Passwords, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            passwords,
            clock,
        }
    }

    fn ensure_admin(claims: &SessionClaims) -> ServiceResult<()> {
        ensure(policy::can_administer(claims), "super-admin only")?;
        Ok(())
    }

    pub async fn create_club(
        &self,
        claims: &SessionClaims,
        name: Option<String>,
        description: Option<String>,
    ) -> ServiceResult<Club> {
        Self::ensure_admin(claims)?;
        let club = Club::create(name, description, self.clock.now())?;
        let club = self.stores.clubs.insert(club).await?;

        tracing::info!(club_id = %club.id, name = %club.name, "club created");
        Ok(club)
    }

    pub async fn approve_club(&self, claims: &SessionClaims, id: ClubId) -> ServiceResult<Club> {
        Self::ensure_admin(claims)?;
        let club = self.stores.clubs.approve(id).await.map_err(club_not_found)?;

        tracing::info!(club_id = %id, "club approved");
        Ok(club)
    }

    pub async fn list_clubs(&self, claims: &SessionClaims) -> ServiceResult<Vec<ClubOverview>> {
        Self::ensure_admin(claims)?;
        let clubs = self.stores.clubs.list().await?;

        let coordinator_ids: Vec<UserId> = clubs.iter().filter_map(|c| c.coordinator).collect();
        let coordinators: HashMap<UserId, CoordinatorRef> = self
            .stores
            .identities
            .get_many(&coordinator_ids)
            .await?
            .into_iter()
            .map(|i| {
                (
                    i.id,
                    CoordinatorRef {
                        id: i.id,
                        name: i.name,
                        email: i.email,
                    },
                )
            })
            .collect();

        Ok(clubs
            .into_iter()
            .map(|club| ClubOverview {
                coordinator_details: club.coordinator.and_then(|id| coordinators.get(&id).cloned()),
                club,
            })
            .collect())
    }

    pub async fn list_coordinators(&self, claims: &SessionClaims) -> ServiceResult<Vec<CoordinatorOverview>> {
        Self::ensure_admin(claims)?;
        let coordinators = self.stores.identities.list_by_role(KnownRole::Coordinator).await?;
        let club_names: HashMap<ClubId, String> = self
            .stores
            .clubs
            .list()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(coordinators
            .into_iter()
            .map(|i| CoordinatorOverview {
                club_name: i.club_id.and_then(|c| club_names.get(&c).cloned()),
                id: i.id,
                name: i.name,
                email: i.email,
                club_id: i.club_id,
                must_change_password: i.must_change_password,
            })
            .collect())
    }

    /// Creates the coordinator identity, then links it from the club.
    ///
    /// If the club update fails the identity is removed again, so either both
    /// writes are visible or neither is.
    #[tracing::instrument(skip(self, claims, name, email), fields(admin_id = %claims.user_id))]
    pub async fn create_coordinator(
        &self,
        claims: &SessionClaims,
        name: Option<String>,
        email: Option<String>,
        club_id: ClubId,
    ) -> ServiceResult<ProvisionedCoordinator> {
        Self::ensure_admin(claims)?;
        found(self.stores.clubs.get(club_id).await?, "club")?;

        let temporary_password = generate_temporary_password(TEMPORARY_PASSWORD_LEN);
        let identity = Identity::new_coordinator(name, email, club_id, String::new(), self.clock.now())?;
        let identity = identity.with_password_hash(self.passwords.hash(&temporary_password)?);
        let identity = self.stores.identities.insert(identity).await?;

        let club = match self.stores.clubs.assign_coordinator(club_id, identity.id).await {
            Ok(club) => club,
            Err(err) => {
                tracing::warn!(
                    user_id = %identity.id,
                    %club_id,
                    error = %err,
                    "linking coordinator to club failed; removing created account"
                );
                if let Err(cleanup) = self.stores.identities.remove(identity.id).await {
                    tracing::error!(user_id = %identity.id, error = %cleanup, "failed to remove orphaned coordinator account");
                }
                return Err(club_not_found(err));
            }
        };

        tracing::info!(user_id = %identity.id, %club_id, "coordinator created");
        Ok(ProvisionedCoordinator {
            identity,
            club,
            temporary_password,
        })
    }
}
