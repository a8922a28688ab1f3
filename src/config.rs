//! Configuration management for Modeswitch
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable
//! overrides of the device credentials.

use crate::error::{Result, SwitcherError};
use crate::mode::Mode;
use crate::normalizer::{ModeNormalizer, fold_name};
use crate::schedule::{Schedule, TimeOfDay};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA timezone the schedule times are expressed in
    pub timezone: String,

    /// Ordered list of mode switches
    pub schedule: Vec<ScheduleItem>,

    /// Reject schedules that list the same time more than once
    pub schedule_strict: bool,

    /// Extra identifiers the device may report for a mode
    pub normalizer: NormalizerConfig,

    /// Remote gateway connection
    pub device: DeviceConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// HTTP trigger binding configuration
    pub web: WebConfig,
}

/// Raw schedule row as written in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// Time in HH:MM format
    pub time: String,

    /// Target mode name
    pub mode: String,
}

impl ScheduleItem {
    pub fn new<T: Into<String>, M: Into<String>>(time: T, mode: M) -> Self {
        Self {
            time: time.into(),
            mode: mode.into(),
        }
    }
}

/// Additional device identifiers mapped onto canonical modes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Numeric mode codes reported by the firmware
    pub mode_codes: BTreeMap<i64, Mode>,

    /// Alternative mode names reported by the firmware (case-insensitive)
    pub mode_names: BTreeMap<String, Mode>,
}

/// Remote gateway connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Base URL of the gateway API
    pub base_url: String,

    /// Account user name
    pub username: String,

    /// Account password - never written back to disk
    #[serde(skip_serializing)]
    pub password: String,

    /// Gateway identifier
    pub gateway_id: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console level override
    pub console_level: Option<String>,

    /// Optional file level override
    pub file_level: Option<String>,

    /// Directory or file path for the rolling log; empty disables file logging
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// HTTP trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

/// Outcome of checking one schedule row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleCheck {
    pub index: usize,
    pub time: String,
    pub mode: String,
    pub time_valid: bool,
    pub mode_valid: bool,
}

impl ScheduleCheck {
    pub fn is_valid(&self) -> bool {
        self.time_valid && self.mode_valid
    }
}

/// Row-by-row verification report for a schedule
#[derive(Debug, Clone, Default)]
pub struct ScheduleReport {
    pub checks: Vec<ScheduleCheck>,
    pub duplicate_times: Vec<String>,
}

impl ScheduleReport {
    pub fn is_valid(&self) -> bool {
        self.checks.iter().all(ScheduleCheck::is_valid)
    }
}

/// Check every schedule row without stopping at the first problem
pub fn verify_schedule(config: &Config) -> ScheduleReport {
    let checks: Vec<ScheduleCheck> = config
        .schedule
        .iter()
        .enumerate()
        .map(|(index, item)| ScheduleCheck {
            index,
            time: item.time.clone(),
            mode: item.mode.clone(),
            time_valid: item.time.parse::<TimeOfDay>().is_ok(),
            mode_valid: Mode::from_canonical(&item.mode).is_some(),
        })
        .collect();

    let mut seen: Vec<&str> = Vec::new();
    let mut duplicate_times = Vec::new();
    for check in checks.iter().filter(|c| c.time_valid) {
        if seen.contains(&check.time.as_str()) {
            if !duplicate_times.contains(&check.time) {
                duplicate_times.push(check.time.clone());
            }
        } else {
            seen.push(&check.time);
        }
    }

    ScheduleReport {
        checks,
        duplicate_times,
    }
}

impl DeviceConfig {
    /// Fail with an authentication error when any credential is missing
    pub fn check_credentials(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("device.base_url", &self.base_url),
            ("device.username", &self.username),
            ("device.password", &self.password),
            ("device.gateway_id", &self.gateway_id),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SwitcherError::auth(format!(
                "Missing gateway credentials: {}",
                missing.join(", ")
            )))
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SwitcherError::config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_yaml::from_str(&contents).map_err(|e| {
            SwitcherError::config(format!("Invalid YAML in {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "modeswitch.yaml",
            "/data/modeswitch.yaml",
            "/etc/modeswitch/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Load from an explicit path or the default locations, then apply
    /// environment overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Override credentials and timezone from `MODESWITCH_*` variables
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Same as [`Config::apply_env_overrides`] with an injectable lookup
    pub fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("MODESWITCH_USERNAME") {
            self.device.username = v;
        }
        if let Some(v) = get("MODESWITCH_PASSWORD") {
            self.device.password = v;
        }
        if let Some(v) = get("MODESWITCH_GATEWAY_ID") {
            self.device.gateway_id = v;
        }
        if let Some(v) = get("MODESWITCH_BASE_URL") {
            self.device.base_url = v;
        }
        if let Some(v) = get("MODESWITCH_TIMEZONE") {
            self.timezone = v;
        }
    }

    /// Parsed IANA timezone
    pub fn tz(&self) -> Result<Tz> {
        Tz::from_str(self.timezone.trim()).map_err(|e| {
            SwitcherError::validation("timezone", format!("'{}': {}", self.timezone, e))
        })
    }

    /// Schedule rows whose mode is outside the canonical set
    pub fn invalid_schedule_modes(&self) -> Vec<String> {
        self.schedule
            .iter()
            .filter(|item| Mode::from_canonical(&item.mode).is_none())
            .map(|item| item.mode.clone())
            .collect()
    }

    /// Validated schedule, ready for lookup
    pub fn schedule(&self) -> Result<Schedule> {
        let schedule = Schedule::from_items(&self.schedule)?;
        let dupes = schedule.duplicate_times();
        if self.schedule_strict && !dupes.is_empty() {
            let list = dupes.iter().map(ToString::to_string).collect::<Vec<_>>();
            return Err(SwitcherError::validation(
                "schedule",
                format!("duplicate times: {}", list.join(", ")),
            ));
        }
        Ok(schedule)
    }

    /// Normalizer seeded with the built-in identifiers plus configured ones
    pub fn normalizer(&self) -> ModeNormalizer {
        ModeNormalizer::default()
            .with_codes(self.normalizer.mode_codes.iter().map(|(k, v)| (*k, *v)))
            .with_names(
                self.normalizer
                    .mode_names
                    .iter()
                    .map(|(k, v)| (k.clone(), *v)),
            )
    }

    /// Reject `mode_names` aliases that would redefine a canonical name
    fn validate_mode_names(&self) -> Result<()> {
        let conflicts: Vec<String> = self
            .normalizer
            .mode_names
            .iter()
            .filter_map(|(alias, mode)| {
                Mode::from_canonical(&fold_name(alias))
                    .filter(|canonical| canonical != mode)
                    .map(|canonical| format!("'{}' is {}, not {}", alias, canonical, mode))
            })
            .collect();

        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(SwitcherError::validation(
                "normalizer.mode_names",
                conflicts.join("; "),
            ))
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        self.schedule()?;
        self.validate_mode_names()?;
        crate::logging::parse_log_level(&self.logging.level)?;

        if self.device.timeout_secs == 0 {
            return Err(SwitcherError::validation(
                "device.timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.web.port == 0 {
            return Err(SwitcherError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}
