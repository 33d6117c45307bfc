//! Registration notifications.
//!
//! After a successful registration the attendee receives a scannable code
//! whose content is the JSON payload `{"userId", "eventId"}`. Delivery is
//! best-effort: callers bound it with a timeout and never fail the
//! registration because of it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use festflow_auth::Identity;
use festflow_core::{Entity, EventId, UserId};
use festflow_events::Event;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("failed to encode notification payload: {0}")]
    Encode(String),

    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Content of the attendee's check-in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub user_id: UserId,
    pub event_id: EventId,
}

impl QrPayload {
    pub fn for_registration(identity: &Identity, event: &Event) -> Self {
        Self {
            user_id: identity.id,
            event_id: event.id(),
        }
    }

    pub fn encode(&self) -> Result<String, DeliveryError> {
        serde_json::to_string(self).map_err(|e| DeliveryError::Encode(e.to_string()))
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_registration(&self, identity: &Identity, event: &Event) -> Result<(), DeliveryError>;
}

/// Writes the notification to the log instead of sending mail.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_registration(&self, identity: &Identity, event: &Event) -> Result<(), DeliveryError> {
        let payload = QrPayload::for_registration(identity, event).encode()?;
        tracing::info!(
            to = %identity.email,
            event_id = %event.id(),
            event_title = %event.details().title,
            qr_payload = %payload,
            "registration confirmation dispatched"
        );
        Ok(())
    }
}
