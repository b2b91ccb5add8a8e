//! Unified error types for tpfan
//!
//! This module defines all error types used throughout the daemon.
//! Uses thiserror for ergonomic error definitions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error reading temperature sensors
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Error talking to the fan control file
    #[error("Fan control error: {0}")]
    Sink(#[from] SinkError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from domain type validation
    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    /// A condition the engine guarantees can never happen
    #[error("Internal invariant violated: {0}")]
    Internal(#[from] InvariantViolation),

    /// Signal handler could not be installed
    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl AppError {
    /// Whether this error may be logged and retried once the daemon is
    /// past its first tick.
    ///
    /// Environmental failures (sensors, control file) are transient at
    /// runtime. Configuration and invariant errors never are.
    pub fn tolerated_after_first_tick(&self) -> bool {
        matches!(self, AppError::Sensor(_) | AppError::Sink(_))
    }

    /// Optional remediation hint printed below the error message
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            AppError::Sink(e) => e.hint(),
            _ => None,
        }
    }
}

/// Errors from temperature sensor discovery and reads
#[derive(Error, Debug)]
pub enum SensorError {
    /// The hwmon root could not be listed
    #[error("{path}: {source}")]
    HwmonUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No sensor produced a usable reading
    #[error("Couldn't find any valid temperature")]
    NoValidReading,
}

/// Errors from the fan control file
#[derive(Error, Debug)]
pub enum SinkError {
    /// Control file could not be opened or read
    #[error("{path}: open: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A command was rejected by the control file
    #[error("{path}: write '{command}': {source}")]
    Write {
        path: PathBuf,
        command: String,
        #[source]
        source: io::Error,
    },
}

impl SinkError {
    /// Hint for the most common misconfigurations of thinkpad_acpi
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            SinkError::Open { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                Some("is thinkpad_acpi loaded?")
            }
            SinkError::Write { source, .. }
                if source.raw_os_error() == Some(libc::EINVAL) =>
            {
                Some("did you enable fan_control=1?")
            }
            _ => None,
        }
    }
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("{path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config value rejected by a domain type
    #[error("Invalid configuration value for '{key}': {source}")]
    Domain {
        key: String,
        #[source]
        source: DomainError,
    },
}

/// Errors from domain type validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Level token is empty, too long or contains whitespace
    #[error("Invalid fan level token '{0}' (1-15 printable characters)")]
    InvalidLevelToken(String),

    /// Watchdog timeout outside what the kernel accepts
    #[error("Invalid watchdog timeout: {0}s (must be 0-{max})", max = crate::domain::WatchdogTimeout::MAX_SECS)]
    InvalidWatchdogTimeout(u32),

    /// Thresholds must be strictly descending from maximum to low
    #[error("Thresholds must be strictly descending: {hotter} at {hotter_temp}°C is not above {cooler} at {cooler_temp}°C")]
    UnorderedThresholds {
        hotter: &'static str,
        hotter_temp: i32,
        cooler: &'static str,
        cooler_temp: i32,
    },

    /// Negative temperature hysteresis
    #[error("Temperature hysteresis must not be negative: {0}")]
    NegativeHysteresis(i32),
}

/// Conditions that indicate a logic defect rather than an environmental
/// problem. These abort the daemon.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The rule scan fell through the sentinel
    #[error("No threshold matched temperature {0}°C")]
    NoRuleMatched(i32),

    /// A kernel clock could not be read
    #[error("clock_gettime({clock}): {reason}")]
    ClockUnavailable { clock: &'static str, reason: String },
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
