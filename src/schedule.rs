//! Schedule table and time-of-day lookup
//!
//! Lookup is an exact match at minute granularity. There is no window and
//! no nearest match: if no invocation runs during an entry's minute, that
//! entry is skipped for the day.

use crate::config::ScheduleItem;
use crate::error::{Result, SwitcherError};
use crate::mode::Mode;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Wall-clock time of day at minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Build from hour and minute; `None` when out of range
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Truncate any time to its minute
    pub fn from_time<T: Timelike>(time: &T) -> Self {
        // hour() and minute() are always in range
        Self(NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(NaiveTime::MIN))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl FromStr for TimeOfDay {
    type Err = SwitcherError;

    /// Parse strict 24-hour `HH:MM`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SwitcherError::validation("time", format!("'{}' is not a valid HH:MM time", s));
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let (hh, mm) = (&s[0..2], &s[3..5]);
        if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hour: u32 = hh.parse().map_err(|_| invalid())?;
        let minute: u32 = mm.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One row of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub time: TimeOfDay,
    pub mode: Mode,
}

impl ScheduleEntry {
    pub fn new(time: TimeOfDay, mode: Mode) -> Self {
        Self { time, mode }
    }
}

/// Ordered, immutable schedule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Self { entries }
    }

    /// Validate raw configuration rows into a schedule.
    ///
    /// Every row is checked; the error lists all offending rows, not only
    /// the first.
    pub fn from_items(items: &[ScheduleItem]) -> Result<Self> {
        let mut entries = Vec::with_capacity(items.len());
        let mut problems = Vec::new();

        for (idx, item) in items.iter().enumerate() {
            let time = item.time.parse::<TimeOfDay>();
            let mode = item.mode.parse::<Mode>();
            match (time, mode) {
                (Ok(time), Ok(mode)) => entries.push(ScheduleEntry::new(time, mode)),
                (time, mode) => {
                    if time.is_err() {
                        problems.push(format!("schedule[{}].time: invalid time '{}'", idx, item.time));
                    }
                    if mode.is_err() {
                        problems.push(format!("schedule[{}].mode: invalid mode '{}'", idx, item.mode));
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(Self { entries })
        } else {
            Err(SwitcherError::config(problems.join("; ")))
        }
    }

    /// Mode of the first entry scheduled exactly at `at`.
    pub fn lookup(&self, at: TimeOfDay) -> Option<Mode> {
        self.entries.iter().find(|e| e.time == at).map(|e| e.mode)
    }

    /// Times that appear more than once, in first-seen order.
    pub fn duplicate_times(&self) -> Vec<TimeOfDay> {
        let mut seen = Vec::new();
        let mut dupes = Vec::new();
        for entry in &self.entries {
            if seen.contains(&entry.time) {
                if !dupes.contains(&entry.time) {
                    dupes.push(entry.time);
                }
            } else {
                seen.push(entry.time);
            }
        }
        dupes
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
