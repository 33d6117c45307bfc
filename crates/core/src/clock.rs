//! Time source for deadline checks.

use chrono::{DateTime, Utc};

/// Source of "now".
///
/// Lifecycle operations read the clock at the moment they write, so a
/// deadline crossed between load and write is still observed.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
