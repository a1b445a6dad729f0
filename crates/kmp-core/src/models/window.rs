//! Active-window status model.
//!
//! Officers and member roles are time-boxed: each carries a start date and an
//! optional expiry, and a status derived from where "now" falls in that window
//! or from how the window was closed.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WindowStatus {
    Upcoming,
    Current,
    Expired,
    Released,
    Replaced,
    Deactivated,
}

impl WindowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowStatus::Upcoming => "Upcoming",
            WindowStatus::Current => "Current",
            WindowStatus::Expired => "Expired",
            WindowStatus::Released => "Released",
            WindowStatus::Replaced => "Replaced",
            WindowStatus::Deactivated => "Deactivated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Upcoming" => Some(WindowStatus::Upcoming),
            "Current" => Some(WindowStatus::Current),
            "Expired" => Some(WindowStatus::Expired),
            "Released" => Some(WindowStatus::Released),
            "Replaced" => Some(WindowStatus::Replaced),
            "Deactivated" => Some(WindowStatus::Deactivated),
            _ => None,
        }
    }

    /// Status of a window `[start_on, expires_on)` as seen at `now`.
    ///
    /// A start today or in the past is current; an expiry already in the
    /// past overrides everything else.
    pub fn for_window(
        start_on: DateTime<Utc>,
        expires_on: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut status = if start_on.date_naive() <= now.date_naive() {
            WindowStatus::Current
        } else {
            WindowStatus::Upcoming
        };
        if matches!(expires_on, Some(end) if end < now) {
            status = WindowStatus::Expired;
        }
        status
    }

    /// Whether a record in this status still occupies its slot.
    pub fn is_live(&self) -> bool {
        matches!(self, WindowStatus::Current | WindowStatus::Upcoming)
    }

    /// Whether this status can close a window.
    pub fn is_terminal(&self) -> bool {
        !self.is_live()
    }
}

impl std::fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expiry for a window of `term_length_months` starting at `start_on`.
///
/// A term of zero months means the window is open-ended.
pub fn expiry_for_term(start_on: DateTime<Utc>, term_length_months: u32) -> Option<DateTime<Utc>> {
    if term_length_months == 0 {
        return None;
    }
    start_on.checked_add_months(Months::new(term_length_months))
}
