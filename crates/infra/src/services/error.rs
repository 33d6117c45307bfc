//! Service-level error taxonomy.
//!
//! Every variant except `Server` is a deterministic, client-attributable
//! outcome. `Server` carries internal context for logging only.

use thiserror::Error;

use festflow_auth::{AuthzError, PasswordError};
use festflow_core::DomainError;
use festflow_events::LifecycleError;

use crate::store::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("email already in use")]
    DuplicateEmail,

    #[error("club name already in use")]
    DuplicateClubName,

    #[error("a super-admin already exists")]
    SuperAdminExists,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("password change required")]
    PasswordChangeRequired,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("already registered for this event")]
    AlreadyRegistered,

    #[error("user is already checked in")]
    AlreadyCheckedIn,

    #[error("user is not registered for this event")]
    NotRegistered,

    #[error("registration deadline has passed")]
    DeadlinePassed,

    #[error("no seats left for this event")]
    SeatsExhausted,

    #[error("a club must be specified")]
    ClubRequired,

    #[error("current password is incorrect")]
    WrongCurrentPassword,

    #[error("new passwords do not match")]
    PasswordMismatch,

    #[error("server error: {0}")]
    Server(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(reason) => Self::Forbidden(reason),
            AuthzError::ClubRequired => Self::ClubRequired,
        }
    }
}

impl From<LifecycleError> for ServiceError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::AlreadyRegistered => Self::AlreadyRegistered,
            LifecycleError::DeadlinePassed => Self::DeadlinePassed,
            LifecycleError::SeatsExhausted => Self::SeatsExhausted,
            LifecycleError::NotRegistered => Self::NotRegistered,
            LifecycleError::AlreadyCheckedIn => Self::AlreadyCheckedIn,
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        Self::Server(err.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::DuplicateClubName => Self::DuplicateClubName,
            StoreError::SuperAdminExists => Self::SuperAdminExists,
            StoreError::NotFound => Self::NotFound("record"),
            StoreError::Lifecycle(e) => e.into(),
            StoreError::Backend(msg) => Self::Server(msg),
        }
    }
}

/// Map a missing record to `NotFound` naming what was looked up.
pub(crate) fn found<T>(value: Option<T>, what: &'static str) -> ServiceResult<T> {
    value.ok_or(ServiceError::NotFound(what))
}
