//! Suspend/resume detection
//!
//! Infers a suspend/resume cycle between two calls from the boot-time
//! clock advancing further than the monotonic clock.

use crate::platform::ClockReading;
use std::time::Duration;

/// Boot-time may run ahead of monotonic by this much without counting as
/// a suspend
pub const SUSPEND_SLACK: Duration = Duration::from_millis(200);

/// Result of a suspend check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeState {
    /// The system was suspended since the last check
    Detected,
    /// No suspend since the last check (or no baseline yet)
    NotDetected,
}

/// Compares consecutive clock readings
#[derive(Debug, Clone, Default)]
pub struct SuspendDetector {
    previous: Option<ClockReading>,
}

impl SuspendDetector {
    /// Create a detector with no baseline
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a suspend happened since the previous call
    ///
    /// The first call only records a baseline. Every call replaces the
    /// baseline with `now`.
    pub fn detect(&mut self, now: ClockReading) -> ResumeState {
        let Some(previous) = self.previous.replace(now) else {
            return ResumeState::NotDetected;
        };

        let monotonic = now.monotonic.saturating_sub(previous.monotonic);
        let boottime = now.boottime.saturating_sub(previous.boottime);

        if boottime > monotonic + SUSPEND_SLACK {
            log::debug!(
                "boottime advanced {:?}, monotonic advanced {:?}",
                boottime,
                monotonic
            );
            ResumeState::Detected
        } else {
            ResumeState::NotDetected
        }
    }
}
