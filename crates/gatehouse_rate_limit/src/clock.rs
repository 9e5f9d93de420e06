//! Calendar sources for budget rollover.

use chrono::{Datelike, Local, NaiveDate};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of "today" for calendar comparisons.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually driven clock for tests and replays.
///
/// Clones share the same date.
///
/// ```
/// use chrono::NaiveDate;
/// use gatehouse_rate_limit::{Clock, ManualClock};
///
/// let clock = ManualClock::new(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
/// clock.advance_days(1);
/// assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    date: Arc<Mutex<NaiveDate>>,
}

impl ManualClock {
    /// Start at `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Arc::new(Mutex::new(date)),
        }
    }

    /// Jump to `date`.
    pub fn set(&self, date: NaiveDate) {
        *self.date.lock() = date;
    }

    /// Move forward by whole days.
    pub fn advance_days(&self, days: u64) {
        let mut date = self.date.lock();
        if let Some(next) = date.checked_add_days(chrono::Days::new(days)) {
            *date = next;
        }
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.date.lock()
    }
}

/// Calendar month marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("{:04}-{:02}", year, month)]
pub struct MonthKey {
    /// Calendar year
    pub year: i32,
    /// Month number, 1-based
    pub month: u32,
}

impl MonthKey {
    /// Month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}
