//! Application services: orchestration over the stores, with explicit claims.

pub mod authenticator;
pub mod bootstrap;
pub mod clubs;
pub mod error;
pub mod lifecycle;

pub use authenticator::{Authenticator, Session};
pub use bootstrap::{BootstrapOutcome, ensure_super_admin};
pub use clubs::{ClubOverview, ClubRegistry, CoordinatorOverview, CoordinatorRef, ProvisionedCoordinator};
pub use error::{ServiceError, ServiceResult};
pub use lifecycle::{EventLifecycle, Registrant, Visible};
