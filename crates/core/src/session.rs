//! Trading session windows.
//!
//! The stop engine only scans while at least one exchange session is open;
//! each exchange has its own daily window.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// A single daily trading window in exchange-local time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWindow {
    pub name: String,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl SessionWindow {
    pub fn new(name: impl Into<String>, open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            name: name.into(),
            open,
            close,
        }
    }

    /// True if `t` falls inside the window. Close is exclusive.
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.open <= t && t < self.close
    }
}

/// The set of session windows the system trades across.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSchedule {
    pub windows: Vec<SessionWindow>,
}

impl SessionSchedule {
    pub fn new(windows: Vec<SessionWindow>) -> Self {
        Self { windows }
    }

    /// Equity (09:15-15:30) and commodity (09:00-23:30) windows.
    pub fn india_default() -> Self {
        Self::new(vec![
            SessionWindow::new(
                "equity",
                NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
                NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
            ),
            SessionWindow::new(
                "commodity",
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
            ),
        ])
    }

    /// True if at least one window is open at `now` on a weekday.
    pub fn any_open(&self, now: NaiveDateTime) -> bool {
        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let t = now.time();
        self.windows.iter().any(|w| w.contains(t))
    }

    /// True if the named window is open at `now` on a weekday. An unknown
    /// name is closed.
    pub fn is_open(&self, name: &str, now: NaiveDateTime) -> bool {
        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let t = now.time();
        self.windows
            .iter()
            .any(|w| w.name == name && w.contains(t))
    }
}
