//! # Modeswitch - Schedule-driven Operating Mode Reconciler
//!
//! Keeps a home energy-storage gateway in the operating mode a fixed daily
//! schedule asks for. Each invocation is independent: resolve the local
//! minute, authenticate with the gateway, look the minute up in the
//! schedule, and switch the gateway only when it is not already in the
//! scheduled mode.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration, environment overrides and validation
//! - `logging`: Structured logging and tracing
//! - `mode`: The canonical operating modes
//! - `schedule`: Time-of-day parsing and schedule lookup
//! - `normalizer`: Mapping raw device reports onto canonical modes
//! - `device`: Device session traits
//! - `clock`: Local wall-clock resolution
//! - `reconciler`: The per-invocation state machine
//! - `cloud`: HTTP client for the gateway API (feature `cloud`)
//! - `web`: HTTP trigger endpoint (feature `web`)

pub mod clock;
#[cfg(feature = "cloud")]
pub mod cloud;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod mode;
pub mod normalizer;
pub mod reconciler;
pub mod schedule;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use device::{DeviceClient, DeviceConnector, ModeReport};
pub use error::{Result, SwitcherError};
pub use mode::Mode;
pub use normalizer::{ModeNormalizer, NormalizedMode};
pub use reconciler::{FailureReason, ReconciliationOutcome, Reconciler, reconcile};
pub use schedule::{Schedule, ScheduleEntry, TimeOfDay};
