#![allow(dead_code)]

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use modeswitch::device::{DeviceClient, DeviceConnector, ModeReport};
use modeswitch::error::{Result, SwitcherError};
use modeswitch::mode::Mode;
use modeswitch::schedule::{Schedule, ScheduleEntry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Call log shared between a fake device and the test
#[derive(Debug, Default)]
pub struct Calls {
    pub connects: AtomicUsize,
    pub reads: AtomicUsize,
    pub writes: Mutex<Vec<Mode>>,
}

impl Calls {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<Mode> {
        self.writes.lock().unwrap().clone()
    }

    pub fn device_calls(&self) -> usize {
        self.reads() + self.writes().len()
    }
}

/// Scripted gateway
pub struct FakeDevice {
    pub report: Option<ModeReport>,
    pub fail_writes: bool,
    pub calls: Arc<Calls>,
}

impl FakeDevice {
    pub fn reporting<R: Into<ModeReport>>(report: R) -> Self {
        Self {
            report: Some(report.into()),
            fail_writes: false,
            calls: Arc::new(Calls::default()),
        }
    }

    /// A device whose mode read always fails
    pub fn unreadable() -> Self {
        Self {
            report: None,
            fail_writes: false,
            calls: Arc::new(Calls::default()),
        }
    }

    pub fn rejecting_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

#[async_trait::async_trait]
impl DeviceClient for FakeDevice {
    async fn get_mode(&self) -> Result<ModeReport> {
        self.calls.reads.fetch_add(1, Ordering::SeqCst);
        self.report
            .clone()
            .ok_or_else(|| SwitcherError::mode_decode("payload missing mode"))
    }

    async fn set_mode(&self, mode: Mode) -> Result<()> {
        self.calls.writes.lock().unwrap().push(mode);
        if self.fail_writes {
            Err(SwitcherError::switch("gateway answered 503 Service Unavailable"))
        } else {
            Ok(())
        }
    }
}

/// Hands out a fresh [`FakeDevice`] per connect, sharing one call log
pub struct FakeConnector {
    pub report: Option<ModeReport>,
    pub fail_writes: bool,
    pub reject_login: bool,
    pub calls: Arc<Calls>,
}

impl FakeConnector {
    pub fn reporting<R: Into<ModeReport>>(report: R) -> Self {
        Self {
            report: Some(report.into()),
            fail_writes: false,
            reject_login: false,
            calls: Arc::new(Calls::default()),
        }
    }

    pub fn bad_credentials() -> Self {
        Self {
            report: None,
            fail_writes: false,
            reject_login: true,
            calls: Arc::new(Calls::default()),
        }
    }
}

#[async_trait::async_trait]
impl DeviceConnector for FakeConnector {
    async fn connect(&self) -> Result<Box<dyn DeviceClient>> {
        self.calls.connects.fetch_add(1, Ordering::SeqCst);
        if self.reject_login {
            return Err(SwitcherError::auth("login rejected with status 401 Unauthorized"));
        }
        Ok(Box::new(FakeDevice {
            report: self.report.clone(),
            fail_writes: self.fail_writes,
            calls: self.calls.clone(),
        }))
    }
}

/// `00:00 -> emergency_backup`, `15:00 -> time_of_use`
pub fn two_entry_schedule() -> Schedule {
    Schedule::new(vec![
        ScheduleEntry::new("00:00".parse().unwrap(), Mode::EmergencyBackup),
        ScheduleEntry::new("15:00".parse().unwrap(), Mode::TimeOfUse),
    ])
}

/// Local time on a fixed day in Los Angeles
pub fn la_time(hour: u32, minute: u32) -> DateTime<Tz> {
    chrono_tz::America::Los_Angeles
        .with_ymd_and_hms(2024, 5, 20, hour, minute, 0)
        .unwrap()
}
