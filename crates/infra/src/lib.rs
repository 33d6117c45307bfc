//! `festflow-infra`: storage, notifications and application services.

pub mod notify;
pub mod services;
pub mod store;


pub use notify::{DeliveryError, LogNotifier, Notifier, QrPayload};
pub use services::{Authenticator, ClubRegistry, EventLifecycle, ServiceError, ServiceResult};
pub use store::{StoreError, Stores};
