//! Device client capabilities
//!
//! The gateway is reached through two traits: a [`DeviceConnector`] that
//! builds and authenticates a session, and the [`DeviceClient`] session it
//! hands back. Both may fail; the reconciler decides which failures are
//! fatal.

use crate::error::Result;
use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw mode value as reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeReport {
    /// A mode name, recognised or not
    Name(String),

    /// An opaque numeric identifier
    Code(i64),
}

impl fmt::Display for ModeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeReport::Name(name) => write!(f, "'{}'", name),
            ModeReport::Code(code) => write!(f, "#{}", code),
        }
    }
}

impl From<Mode> for ModeReport {
    fn from(mode: Mode) -> Self {
        ModeReport::Name(mode.as_str().to_string())
    }
}

impl From<&str> for ModeReport {
    fn from(name: &str) -> Self {
        ModeReport::Name(name.to_string())
    }
}

impl From<i64> for ModeReport {
    fn from(code: i64) -> Self {
        ModeReport::Code(code)
    }
}

/// An authenticated session against one gateway
#[async_trait::async_trait]
pub trait DeviceClient: Send + Sync {
    /// Read the mode the gateway currently reports
    async fn get_mode(&self) -> Result<ModeReport>;

    /// Ask the gateway to switch to `mode`
    async fn set_mode(&self, mode: Mode) -> Result<()>;
}

/// Builds and authenticates device sessions, one per invocation
#[async_trait::async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn DeviceClient>>;
}
