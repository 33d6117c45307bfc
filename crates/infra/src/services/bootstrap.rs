//! One-time provisioning of the super-admin account.

use festflow_auth::{Identity, Passwords};
use festflow_core::Clock;

use super::error::ServiceResult;
use crate::store::IdentityStore;

pub const SUPER_ADMIN_NAME: &str = "Faculty Incharge";
pub const SUPER_ADMIN_EMAIL: &str = "superadmin@festflow.edu";
/// Must be changed at first login.
pub const SUPER_ADMIN_TEMP_PASSWORD: &str = "ChangeMe123!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created(Identity),
    AlreadyExists(Identity),
}

/// Create the sole super-admin unless one exists.
pub async fn ensure_super_admin(
    identities: &dyn IdentityStore,
    passwords: &Passwords,
    clock: &dyn Clock,
) -> ServiceResult<BootstrapOutcome> {
    if let Some(existing) = identities.find_super_admin().await? {
        return Ok(BootstrapOutcome::AlreadyExists(existing));
    }

    let hash = passwords.hash(SUPER_ADMIN_TEMP_PASSWORD)?;
    let admin = Identity::new_super_admin(SUPER_ADMIN_NAME, SUPER_ADMIN_EMAIL, hash, clock.now())?;

    match identities.insert(admin).await {
        Ok(admin) => Ok(BootstrapOutcome::Created(admin)),
        // Lost a race with a concurrent bootstrap.
        Err(err) => match identities.find_super_admin().await? {
            Some(existing) => Ok(BootstrapOutcome::AlreadyExists(existing)),
            None => Err(err.into()),
        },
    }
}
