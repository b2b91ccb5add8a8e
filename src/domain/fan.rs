//! Fan-related domain types
//!
//! Provides validated types for fan levels, level tokens, watchdog
//! timeouts and the commands understood by the fan control file.

use crate::error::DomainError;
use std::fmt;

/// Discrete fan level, ordered hottest first
///
/// The discriminant is the level's position in the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FanLevel {
    /// Full speed
    Max,
    /// Medium speed
    Med,
    /// Low speed
    Low,
    /// Fan off
    Off,
}

impl FanLevel {
    /// All levels in scan order (hottest threshold first)
    pub const ALL: [FanLevel; 4] = [FanLevel::Max, FanLevel::Med, FanLevel::Low, FanLevel::Off];

    /// Position in the rule table
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human readable name used in log lines
    pub const fn label(self) -> &'static str {
        match self {
            FanLevel::Max => "maximum",
            FanLevel::Med => "medium",
            FanLevel::Low => "low",
            FanLevel::Off => "off",
        }
    }

    /// Token written to the control file unless configuration overrides it
    pub const fn default_token(self) -> &'static str {
        match self {
            FanLevel::Max => LevelToken::FULL_SPEED,
            FanLevel::Med => "4",
            FanLevel::Low => "1",
            FanLevel::Off => "0",
        }
    }
}

impl fmt::Display for FanLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value accepted by the `level` command: `0`-`7` or a keyword such as
/// `full-speed`, `disengaged` or `auto`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LevelToken(String);

impl LevelToken {
    /// Longest token accepted from configuration
    pub const MAX_LEN: usize = 15;
    /// Keyword for maximum speed on models that support it
    pub const FULL_SPEED: &'static str = "full-speed";
    /// Fallback for maximum speed when `full-speed` is not supported
    pub const LEVEL_7: &'static str = "7";
    /// Hands control back to the embedded controller
    pub const AUTO: &'static str = "auto";

    /// Create a new LevelToken with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidLevelToken` if the token is empty,
    /// longer than 15 characters or contains non-printable characters
    pub fn new(token: impl Into<String>) -> Result<Self, DomainError> {
        let token = token.into();
        let valid = !token.is_empty()
            && token.len() <= Self::MAX_LEN
            && token.bytes().all(|b| b.is_ascii_graphic());
        if !valid {
            return Err(DomainError::InvalidLevelToken(token));
        }
        Ok(Self(token))
    }

    /// Create a LevelToken without validation (for internal use)
    ///
    /// Caller must ensure the token satisfies the rules of `new`
    pub(crate) fn new_unchecked(token: &str) -> Self {
        Self(token.to_string())
    }

    /// Token that returns the fan to automatic mode
    pub fn auto() -> Self {
        Self::new_unchecked(Self::AUTO)
    }

    /// Get the token as written to the control file
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kernel watchdog timeout in seconds (0 disarms)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchdogTimeout(u32);

impl WatchdogTimeout {
    /// Largest timeout thinkpad_acpi accepts
    pub const MAX_SECS: u32 = 120;
    /// Disarmed watchdog
    pub const DISARMED: Self = Self(0);

    /// Create a new WatchdogTimeout with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidWatchdogTimeout` if secs > 120
    pub fn from_secs(secs: u32) -> Result<Self, DomainError> {
        if secs > Self::MAX_SECS {
            return Err(DomainError::InvalidWatchdogTimeout(secs));
        }
        Ok(Self(secs))
    }

    /// Get the timeout in seconds
    #[inline]
    pub const fn as_secs(&self) -> u32 {
        self.0
    }
}

impl Default for WatchdogTimeout {
    fn default() -> Self {
        Self(Self::MAX_SECS)
    }
}

impl fmt::Display for WatchdogTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single command for the fan control file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `level <token>`
    Level(LevelToken),
    /// `watchdog <secs>`
    Watchdog(WatchdogTimeout),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Level(token) => write!(f, "level {}", token),
            Command::Watchdog(timeout) => write!(f, "watchdog {}", timeout),
        }
    }
}
