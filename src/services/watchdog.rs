//! Kernel watchdog keep-alive
//!
//! thinkpad_acpi reverts the fan to automatic mode if nothing is written
//! to the control file within the watchdog period. Any write counts, so
//! an explicit `watchdog` command is only sent when no level change has
//! refreshed it recently.

use crate::domain::{Command, WatchdogTimeout};
use crate::error::SinkError;
use crate::platform::{ClockReading, ControlSink};
use crate::services::{FanDecisionEngine, ResumeState, SuspendDetector};

use std::time::Duration;

/// Seconds before the deadline at which the watchdog is refreshed
pub const WATCHDOG_GRACE_PERIOD_SECS: u32 = 2;

/// What `maybe_refresh` did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchdogOutcome {
    /// A resume was detected and the active level rewritten
    pub level_rewritten: bool,
    /// A `watchdog` command was written
    pub refreshed: bool,
}

/// Keeps the kernel watchdog from expiring
#[derive(Debug, Clone)]
pub struct WatchdogKeeper {
    timeout: WatchdogTimeout,
    suspend: SuspendDetector,
}

impl WatchdogKeeper {
    /// Create a keeper for the given watchdog period
    pub fn new(timeout: WatchdogTimeout) -> Self {
        Self {
            timeout,
            suspend: SuspendDetector::new(),
        }
    }

    /// Configured watchdog period
    pub fn timeout(&self) -> WatchdogTimeout {
        self.timeout
    }

    /// Elapsed time after the last write at which a refresh is due
    pub fn refresh_after(&self) -> Duration {
        Duration::from_secs(u64::from(
            self.timeout
                .as_secs()
                .saturating_sub(WATCHDOG_GRACE_PERIOD_SECS),
        ))
    }

    /// Arm the kernel watchdog with the configured period
    pub fn arm<S: ControlSink>(
        &self,
        engine: &mut FanDecisionEngine,
        sink: &mut S,
        now: Duration,
    ) -> Result<(), SinkError> {
        engine.issue(sink, &Command::Watchdog(self.timeout), now)
    }

    /// Disarm the kernel watchdog
    pub fn disarm<S: ControlSink>(
        &self,
        engine: &mut FanDecisionEngine,
        sink: &mut S,
        now: Duration,
    ) -> Result<(), SinkError> {
        engine.issue(sink, &Command::Watchdog(WatchdogTimeout::DISARMED), now)
    }

    /// Rewrite the level after a resume and refresh the watchdog if due
    ///
    /// Called on ticks where the engine did not write a new level.
    pub fn maybe_refresh<S: ControlSink>(
        &mut self,
        engine: &mut FanDecisionEngine,
        sink: &mut S,
        now: ClockReading,
    ) -> Result<WatchdogOutcome, SinkError> {
        let mut outcome = WatchdogOutcome::default();

        if self.suspend.detect(now) == ResumeState::Detected {
            // Some models drop back to "auto" across suspend unless the
            // level is written again.
            match engine.current_rule().map(|r| Command::Level(r.command.clone())) {
                Some(command) => {
                    log::info!("Clock jump detected, possible resume. Rewriting fan level");
                    engine.issue(sink, &command, now.monotonic)?;
                    outcome.level_rewritten = true;
                }
                None => log::warn!("Clock jump detected, but no fan level has been set yet"),
            }
        }

        if let Some(last) = engine.last_watchdog_ping() {
            if now.monotonic.saturating_sub(last) < self.refresh_after() {
                return Ok(outcome);
            }
        }

        // Writing the same level again (0 -> 0) spins the fan up briefly on
        // some models, so use the dedicated command.
        engine.issue(sink, &Command::Watchdog(self.timeout), now.monotonic)?;
        outcome.refreshed = true;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RuleTable, Temperature};
    use crate::mock::MockSink;

    fn at(secs: u64) -> ClockReading {
        ClockReading {
            monotonic: Duration::from_secs(secs),
            boottime: Duration::from_secs(secs),
        }
    }

    fn settled_engine(sink: &mut MockSink) -> FanDecisionEngine {
        let mut engine = FanDecisionEngine::new(RuleTable::default(), 10, 3);
        engine
            .decide(Some(Temperature::new(50)), sink, Duration::ZERO)
            .unwrap();
        sink.clear();
        engine
    }

    #[test]
    fn test_refresh_after() {
        let keeper = WatchdogKeeper::new(WatchdogTimeout::from_secs(120).unwrap());
        assert_eq!(keeper.refresh_after(), Duration::from_secs(118));
    }

    #[test]
    fn test_refresh_exactly_at_deadline() {
        let mut sink = MockSink::new();
        let mut engine = settled_engine(&mut sink);
        let mut keeper = WatchdogKeeper::new(WatchdogTimeout::from_secs(120).unwrap());

        for secs in 1..118 {
            let outcome = keeper.maybe_refresh(&mut engine, &mut sink, at(secs)).unwrap();
            assert!(!outcome.refreshed, "refreshed early at {}s", secs);
        }
        assert!(sink.commands().is_empty());

        let outcome = keeper.maybe_refresh(&mut engine, &mut sink, at(118)).unwrap();
        assert!(outcome.refreshed);
        assert_eq!(sink.commands(), &[Command::Watchdog(keeper.timeout())]);
        assert_eq!(engine.last_watchdog_ping(), Some(Duration::from_secs(118)));

        // Deadline restarts from the refresh
        sink.clear();
        let outcome = keeper.maybe_refresh(&mut engine, &mut sink, at(200)).unwrap();
        assert!(!outcome.refreshed);
    }

    #[test]
    fn test_level_write_counts_as_refresh() {
        let mut sink = MockSink::new();
        let mut engine = settled_engine(&mut sink);
        let mut keeper = WatchdogKeeper::new(WatchdogTimeout::from_secs(10).unwrap());

        engine
            .decide(Some(Temperature::new(95)), &mut sink, Duration::from_secs(5))
            .unwrap();
        sink.clear();

        let outcome = keeper.maybe_refresh(&mut engine, &mut sink, at(12)).unwrap();
        assert!(!outcome.refreshed);
        let outcome = keeper.maybe_refresh(&mut engine, &mut sink, at(13)).unwrap();
        assert!(outcome.refreshed);
    }

    #[test]
    fn test_resume_rewrites_level() {
        let mut sink = MockSink::new();
        let mut engine = settled_engine(&mut sink);
        let mut keeper = WatchdogKeeper::new(WatchdogTimeout::default());

        keeper.maybe_refresh(&mut engine, &mut sink, at(1)).unwrap();

        let resumed = ClockReading {
            monotonic: Duration::from_secs(2),
            boottime: Duration::from_secs(302),
        };
        let outcome = keeper.maybe_refresh(&mut engine, &mut sink, resumed).unwrap();
        assert!(outcome.level_rewritten);
        assert!(!outcome.refreshed);
        assert_eq!(sink.levels(), vec!["0"]);
    }

    #[test]
    fn test_resume_without_rule_still_refreshes() {
        let mut sink = MockSink::new();
        let mut engine = FanDecisionEngine::new(RuleTable::default(), 10, 3);
        let mut keeper = WatchdogKeeper::new(WatchdogTimeout::default());

        keeper.maybe_refresh(&mut engine, &mut sink, at(1)).unwrap();
        let resumed = ClockReading {
            monotonic: Duration::from_secs(2),
            boottime: Duration::from_secs(302),
        };
        let outcome = keeper.maybe_refresh(&mut engine, &mut sink, resumed).unwrap();
        assert!(!outcome.level_rewritten);
        assert!(sink.levels().is_empty());
        assert_eq!(engine.last_watchdog_ping(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_arm_and_disarm() {
        let mut sink = MockSink::new();
        let mut engine = FanDecisionEngine::new(RuleTable::default(), 10, 3);
        let keeper = WatchdogKeeper::new(WatchdogTimeout::from_secs(30).unwrap());

        keeper.arm(&mut engine, &mut sink, Duration::ZERO).unwrap();
        keeper.disarm(&mut engine, &mut sink, Duration::ZERO).unwrap();

        let written: Vec<_> = sink.commands().iter().map(|c| c.to_string()).collect();
        assert_eq!(written, vec!["watchdog 30", "watchdog 0"]);
    }

    #[test]
    fn test_failed_refresh_propagates() {
        let mut sink = MockSink::new();
        let mut engine = FanDecisionEngine::new(RuleTable::default(), 10, 3);
        let mut keeper = WatchdogKeeper::new(WatchdogTimeout::default());
        sink.set_failing(true);

        assert!(keeper.maybe_refresh(&mut engine, &mut sink, at(1)).is_err());
        assert!(engine.last_watchdog_ping().is_none());
    }
}
