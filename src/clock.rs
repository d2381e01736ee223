use chrono::{DateTime, Duration, FixedOffset, Local, NaiveTime, TimeZone, Utc};
use std::cell::Cell;

use crate::day_key::DayKey;

/// Source of "now", carrying the viewer's local offset so day keys come out
/// in local time.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;

    fn today(&self) -> DayKey {
        DayKey::from_instant(&self.now())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Noon UTC on the given day.
    pub fn at_day(day: DayKey) -> Self {
        let noon = day.date().and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
        Self::new(Utc.from_utc_datetime(&noon).fixed_offset())
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.now.get()
    }
}
