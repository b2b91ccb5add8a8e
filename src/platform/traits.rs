//! Trait definitions for the hardware seam
//!
//! These traits abstract over sysfs, procfs and the kernel clocks to
//! enable testing with mocks.

use crate::domain::{Command, Temperature};
use crate::error::{InvariantViolation, SensorError, SinkError};
use std::time::Duration;

/// Source of the current maximum temperature
pub trait SensorSource {
    /// Maximum temperature across all monitored sensors
    ///
    /// # Errors
    /// Returns `SensorError::NoValidReading` if no sensor produced a
    /// usable value
    fn max_temperature(&mut self) -> Result<Temperature, SensorError>;
}

/// Destination for fan control commands
///
/// Any successful write also counts as a watchdog refresh on the kernel
/// side.
pub trait ControlSink {
    /// Write a single command
    fn write(&mut self, command: &Command) -> Result<(), SinkError>;
}

/// A pair of clock readings taken at the same moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockReading {
    /// Time that stops advancing while the system is suspended
    pub monotonic: Duration,
    /// Time that keeps advancing across suspend
    pub boottime: Duration,
}

/// Source of clock readings
pub trait Clock {
    /// Read both clocks
    ///
    /// # Errors
    /// Returns `InvariantViolation::ClockUnavailable` if the kernel refuses
    /// a clock; without it the watchdog can no longer be kept alive
    fn now(&self) -> Result<ClockReading, InvariantViolation>;
}
