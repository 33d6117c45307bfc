//! Public browsing: projection and filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use festflow_core::{ClubId, Entity, EventId};

use crate::{Event, FestType};

/// Event as shown to anonymous visitors and attendees.
///
/// Carries no registration or check-in detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicEvent {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub fest_type: FestType,
    pub registration_deadline: DateTime<Utc>,
    pub max_seats: Option<u32>,
    pub club_id: Option<ClubId>,
    pub club_name: Option<String>,
}

impl PublicEvent {
    pub fn project(event: &Event, club_name: Option<String>) -> Self {
        let d = event.details();
        Self {
            id: event.id(),
            title: d.title.clone(),
            description: d.description.clone(),
            date: d.date,
            fest_type: d.fest_type,
            registration_deadline: d.registration_deadline,
            max_seats: d.max_seats,
            club_id: event.club_id(),
            club_name,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingView {
    /// Deadline not yet passed (`deadline >= now`).
    #[default]
    Upcoming,
    /// Deadline passed (`deadline < now`).
    Past,
}

impl ListingView {
    /// Anything other than `past` means upcoming.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("past") => ListingView::Past,
            _ => ListingView::Upcoming,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicListing {
    pub fest_type: Option<FestType>,
    /// Case-insensitive substring of the club name.
    pub club_name: Option<String>,
    pub view: ListingView,
}

impl PublicListing {
    pub fn admits(&self, event: &Event, club_name: Option<&str>, now: DateTime<Utc>) -> bool {
        let d = event.details();

        let in_view = match self.view {
            ListingView::Upcoming => d.registration_deadline >= now,
            ListingView::Past => d.registration_deadline < now,
        };
        if !in_view {
            return false;
        }

        if let Some(fest) = self.fest_type {
            if d.fest_type != fest {
                return false;
            }
        }

        match self.club_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            None => true,
            Some(needle) => club_name
                .map(|name| name.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
        }
    }
}
