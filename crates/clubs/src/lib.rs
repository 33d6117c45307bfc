//! Clubs domain module.
//!
//! Clubs own events and have at most one coordinator. Pure domain logic
//! (no IO, no HTTP, no storage).

pub mod club;

pub use club::{Club, normalize_club_name};
