//! Canonical gateway operating modes
//!
//! The set is closed: nothing outside these three values is ever written to
//! the device.

use crate::error::{Result, SwitcherError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating mode of the energy-storage gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Keep the battery full for grid outages
    EmergencyBackup,

    /// Charge and discharge around utility rate periods
    TimeOfUse,

    /// Prioritise powering the home from solar and battery
    SelfConsumption,
}

impl Mode {
    /// Every canonical mode, in declaration order
    pub const ALL: [Mode; 3] = [Mode::EmergencyBackup, Mode::TimeOfUse, Mode::SelfConsumption];

    /// Canonical configuration/wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::EmergencyBackup => "emergency_backup",
            Mode::TimeOfUse => "time_of_use",
            Mode::SelfConsumption => "self_consumption",
        }
    }

    /// Look up a mode by its exact canonical name
    pub fn from_canonical(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Comma-separated list of canonical names, for error messages
    pub fn canonical_names() -> String {
        Self::ALL
            .iter()
            .map(Mode::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = SwitcherError;

    /// Strict parse: only the exact canonical names are accepted.
    fn from_str(s: &str) -> Result<Self> {
        Self::from_canonical(s).ok_or_else(|| {
            SwitcherError::validation(
                "mode",
                format!("unknown mode '{}' (expected one of: {})", s, Self::canonical_names()),
            )
        })
    }
}
