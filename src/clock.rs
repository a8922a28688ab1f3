//! Wall-clock resolution in the schedule's timezone

use crate::schedule::TimeOfDay;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Current local time in `tz`, truncated to the minute
pub fn resolve_now(clock: &dyn Clock, tz: Tz) -> DateTime<Tz> {
    truncate_to_minute(clock.now_utc().with_timezone(&tz))
}

/// Drop seconds and sub-second precision
pub fn truncate_to_minute(at: DateTime<Tz>) -> DateTime<Tz> {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

/// Schedule key for a local time
pub fn time_of_day(at: &DateTime<Tz>) -> TimeOfDay {
    TimeOfDay::from_time(at)
}
