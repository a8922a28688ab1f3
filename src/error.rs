//! Error types and handling for Modeswitch
//!
//! This module defines the error types used throughout the application.
//! Only authentication, switch, and configuration errors ever end an
//! invocation with a failure; mode decode errors are absorbed by the
//! normalizer.

use thiserror::Error;

/// Result type alias for Modeswitch operations
pub type Result<T> = std::result::Result<T, SwitcherError>;

/// Main error type for Modeswitch
#[derive(Debug, Error)]
pub enum SwitcherError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// The device client could not be constructed or authenticated
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// The device reported a mode the client cannot interpret
    #[error("Mode decode error: {message}")]
    ModeDecode { message: String },

    /// The write call changing the device mode failed
    #[error("Switch error: {message}")]
    Switch { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl SwitcherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        SwitcherError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        SwitcherError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        SwitcherError::Auth {
            message: message.into(),
        }
    }

    /// Create a new mode decode error
    pub fn mode_decode<S: Into<String>>(message: S) -> Self {
        SwitcherError::ModeDecode {
            message: message.into(),
        }
    }

    /// Create a new switch error
    pub fn switch<S: Into<String>>(message: S) -> Self {
        SwitcherError::Switch {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        SwitcherError::Network {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        SwitcherError::Io {
            message: message.into(),
        }
    }

    /// Whether this error must stop an invocation before any device work
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SwitcherError::Config { .. } | SwitcherError::Validation { .. }
        )
    }
}

impl From<std::io::Error> for SwitcherError {
    fn from(err: std::io::Error) -> Self {
        SwitcherError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for SwitcherError {
    fn from(err: serde_yaml::Error) -> Self {
        SwitcherError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SwitcherError {
    fn from(err: serde_json::Error) -> Self {
        SwitcherError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "cloud")]
impl From<reqwest::Error> for SwitcherError {
    fn from(err: reqwest::Error) -> Self {
        SwitcherError::network(err.to_string())
    }
}
