//! Kernel clock access
//!
//! `CLOCK_MONOTONIC` stops while the machine is suspended,
//! `CLOCK_BOOTTIME` does not. Comparing the two across ticks reveals a
//! suspend/resume cycle.

use crate::error::InvariantViolation;
use crate::platform::{Clock, ClockReading};
use std::io;
use std::time::Duration;

/// Reads `CLOCK_MONOTONIC` and `CLOCK_BOOTTIME` via libc
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Result<ClockReading, InvariantViolation> {
        Ok(ClockReading {
            monotonic: read_clock(libc::CLOCK_MONOTONIC, "CLOCK_MONOTONIC")?,
            boottime: read_clock(libc::CLOCK_BOOTTIME, "CLOCK_BOOTTIME")?,
        })
    }
}

fn read_clock(clock: libc::clockid_t, name: &'static str) -> Result<Duration, InvariantViolation> {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: ts is a valid, writable timespec and both clock ids are
    // supported on every Linux kernel with thinkpad_acpi.
    let ret = unsafe { libc::clock_gettime(clock, &mut ts) };
    if ret != 0 {
        return Err(InvariantViolation::ClockUnavailable {
            clock: name,
            reason: io::Error::last_os_error().to_string(),
        });
    }
    Ok(Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clocks_advance() {
        let clock = SystemClock::new();
        let first = clock.now().unwrap();
        let second = clock.now().unwrap();
        assert!(second.monotonic >= first.monotonic);
        assert!(second.boottime >= first.boottime);
        assert!(first.boottime >= first.monotonic);
    }

    #[test]
    fn test_unknown_clock_is_invariant_violation() {
        let err = read_clock(12345, "CLOCK_BOGUS").unwrap_err();
        assert!(matches!(
            err,
            InvariantViolation::ClockUnavailable { clock: "CLOCK_BOGUS", .. }
        ));
    }
}
