//! `festflow-events`: the fest event model and its registration/check-in
//! lifecycle.
//!
//! Pure domain logic: no IO, no HTTP, no storage. Callers supply `now`.

pub mod event;
pub mod fest;
pub mod listing;

pub use event::{Event, EventDetails, EventDraft, EventRecord, LifecycleError};
pub use fest::FestType;
pub use listing::{ListingView, PublicEvent, PublicListing};
