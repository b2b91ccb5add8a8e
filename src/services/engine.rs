//! Fan level decision engine
//!
//! Maps the current maximum temperature onto the rule table with two
//! tiers of hysteresis:
//!
//! - degree hysteresis: the threshold of the *active* rule is lowered by
//!   `temp_hysteresis` before checking whether to leave it, so the fan
//!   lags when cooling but reacts immediately when heating.
//! - tick hysteresis: after entering a level the engine stays there for
//!   at least `tick_hysteresis` ticks before a cooler level is considered.

use crate::domain::{Command, FanLevel, Rule, RuleTable, Temperature};
use crate::error::{InvariantViolation, Result, SinkError};
use crate::platform::ControlSink;

use std::time::Duration;

/// Ticks a newly entered level is held before moving down
pub const DEFAULT_TICK_HYSTERESIS: u32 = 3;
/// Degrees subtracted from the active rule's threshold
pub const DEFAULT_TEMP_HYSTERESIS: i32 = 10;

/// Outcome of a single decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The active level stays as it is; nothing was written
    NotSet,
    /// A new level was written
    Set(FanLevel),
    /// No valid temperature; the fallback level was written
    Invalid,
}

/// Owns the rule table and all state needed to pick a fan level
#[derive(Debug, Clone)]
pub struct FanDecisionEngine {
    rules: RuleTable,
    current: Option<FanLevel>,
    tick_penalty: u32,
    tick_hysteresis: u32,
    temp_hysteresis: i32,
    last_watchdog_ping: Option<Duration>,
}

impl FanDecisionEngine {
    /// Create an engine with no active level
    pub fn new(rules: RuleTable, temp_hysteresis: i32, tick_hysteresis: u32) -> Self {
        Self {
            rules,
            current: None,
            tick_penalty: tick_hysteresis,
            tick_hysteresis,
            temp_hysteresis,
            last_watchdog_ping: None,
        }
    }

    /// Decide the fan level for this tick and write it if it changed
    ///
    /// `reading` is `None` when no sensor produced a usable value; the
    /// fallback (maximum) level is then written without touching the
    /// active level. `now` is the monotonic time of this tick.
    ///
    /// # Errors
    /// Returns `AppError::Sink` if a write failed (the transition is not
    /// committed and will be retried) and `AppError::Internal` if no rule
    /// matched.
    pub fn decide<S: ControlSink>(
        &mut self,
        reading: Option<Temperature>,
        sink: &mut S,
        now: Duration,
    ) -> Result<Decision> {
        self.tick_penalty = self.tick_penalty.saturating_sub(1);

        let Some(temp) = reading else {
            let command = Command::Level(self.rules.fallback().command.clone());
            self.issue(sink, &command, now)?;
            return Ok(Decision::Invalid);
        };

        let Some(level) = self.select(temp)? else {
            log::debug!(
                "Temperature {}, keeping {} (tick penalty {})",
                temp,
                self.current.map_or("none", FanLevel::label),
                self.tick_penalty
            );
            return Ok(Decision::NotSet);
        };

        let command = Command::Level(self.rules.get(level).command.clone());
        self.issue(sink, &command, now)?;
        self.current = Some(level);
        self.tick_penalty = self.tick_hysteresis;

        log::info!("Temperature now {}, fan set to {}", temp, level);
        Ok(Decision::Set(level))
    }

    /// Scan hottest to coldest; `None` means keep the active level
    fn select(
        &self,
        temp: Temperature,
    ) -> std::result::Result<Option<FanLevel>, InvariantViolation> {
        let mut penalty = 0;

        for rule in self.rules.rules() {
            let is_current = self.current == Some(rule.level);
            if is_current {
                if self.tick_penalty > 0 {
                    return Ok(None);
                }
                penalty = self.temp_hysteresis;
            }

            if rule.threshold.is_exceeded_by(temp, penalty) {
                return Ok((!is_current).then_some(rule.level));
            }
        }

        Err(InvariantViolation::NoRuleMatched(temp.as_celsius()))
    }

    /// Write a command and record it as a watchdog refresh
    pub fn issue<S: ControlSink>(
        &mut self,
        sink: &mut S,
        command: &Command,
        now: Duration,
    ) -> std::result::Result<(), SinkError> {
        sink.write(command)?;
        self.last_watchdog_ping = Some(now);
        Ok(())
    }

    /// Currently active rule, `None` before the first valid decision
    pub fn current_rule(&self) -> Option<&Rule> {
        self.current.map(|level| self.rules.get(level))
    }

    /// Currently active level
    pub fn current_level(&self) -> Option<FanLevel> {
        self.current
    }

    /// Ticks left before a cooler level may be chosen
    pub fn tick_penalty(&self) -> u32 {
        self.tick_penalty
    }

    /// Monotonic time of the last successful write
    pub fn last_watchdog_ping(&self) -> Option<Duration> {
        self.last_watchdog_ping
    }

    /// The rule table
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSink;
    use proptest::prelude::*;

    fn engine(temp_hysteresis: i32, tick_hysteresis: u32) -> FanDecisionEngine {
        FanDecisionEngine::new(RuleTable::default(), temp_hysteresis, tick_hysteresis)
    }

    fn run(engine: &mut FanDecisionEngine, sink: &mut MockSink, temps: &[i32]) -> Vec<Decision> {
        temps
            .iter()
            .map(|&t| {
                engine
                    .decide(Some(Temperature::new(t)), sink, Duration::ZERO)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let engine = engine(10, 3);
        assert!(engine.current_rule().is_none());
        assert_eq!(engine.tick_penalty(), 3);
        assert!(engine.last_watchdog_ping().is_none());
    }

    #[test]
    fn test_first_decision_sets_level() {
        let mut engine = engine(10, 3);
        let mut sink = MockSink::new();

        let decision = engine
            .decide(Some(Temperature::new(40)), &mut sink, Duration::from_secs(7))
            .unwrap();

        assert_eq!(decision, Decision::Set(FanLevel::Off));
        assert_eq!(sink.levels(), vec!["0"]);
        assert_eq!(engine.tick_penalty(), 3);
        assert_eq!(engine.last_watchdog_ping(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_scenario_table() {
        use Decision::{NotSet, Set};

        let mut engine = engine(10, 3);
        let mut sink = MockSink::new();

        let decisions = run(&mut engine, &mut sink, &[95, 95, 85, 85, 85, 65]);
        assert_eq!(
            decisions,
            vec![
                Set(FanLevel::Max),
                NotSet, // penalty 2
                NotSet, // penalty 1
                NotSet, // penalty 0, 85 > 90 - 10 keeps maximum
                NotSet,
                Set(FanLevel::Low), // 65 > 70 - 10 picks low
            ]
        );
        assert_eq!(sink.levels(), vec!["full-speed", "1"]);
    }

    #[test]
    fn test_settled_engine_is_idempotent() {
        let mut engine = engine(10, 3);
        let mut sink = MockSink::new();

        run(&mut engine, &mut sink, &[75]);
        sink.clear();

        let decisions = run(&mut engine, &mut sink, &[75; 10]);
        assert!(decisions.iter().all(|d| *d == Decision::NotSet));
        assert!(sink.commands().is_empty());
        assert_eq!(engine.current_level(), Some(FanLevel::Low));
    }

    #[test]
    fn test_heating_is_immediate() {
        let mut engine = engine(10, 3);
        let mut sink = MockSink::new();

        let decisions = run(&mut engine, &mut sink, &[75, 85, 95]);
        assert_eq!(
            decisions,
            vec![
                Decision::Set(FanLevel::Low),
                Decision::Set(FanLevel::Med),
                Decision::Set(FanLevel::Max),
            ]
        );
    }

    #[test]
    fn test_cooling_waits_for_tick_penalty() {
        let mut engine = engine(10, 3);
        let mut sink = MockSink::new();

        // Enter medium at 85; then 65 is below 80 - 10 but the level is
        // pinned until the penalty has run out.
        let decisions = run(&mut engine, &mut sink, &[85, 65, 65, 65]);
        assert_eq!(
            decisions,
            vec![
                Decision::Set(FanLevel::Med),
                Decision::NotSet,
                Decision::NotSet,
                Decision::Set(FanLevel::Low),
            ]
        );
    }

    #[test]
    fn test_degree_hysteresis_holds_level() {
        let mut engine = engine(10, 3);
        let mut sink = MockSink::new();

        // 75 is below the medium threshold but above 80 - 10
        let decisions = run(&mut engine, &mut sink, &[85, 75, 75, 75, 75, 75]);
        assert_eq!(decisions[0], Decision::Set(FanLevel::Med));
        assert!(decisions[1..].iter().all(|d| *d == Decision::NotSet));
        assert_eq!(engine.tick_penalty(), 0);

        // At exactly threshold - hysteresis the level is left
        let decisions = run(&mut engine, &mut sink, &[70]);
        assert_eq!(decisions, vec![Decision::Set(FanLevel::Low)]);
    }

    #[test]
    fn test_hysteresis_not_applied_to_hotter_rules() {
        let mut engine = engine(10, 0);
        let mut sink = MockSink::new();

        run(&mut engine, &mut sink, &[50]);
        assert_eq!(engine.current_level(), Some(FanLevel::Off));

        // 65 would exceed 70 - 10, but low is hotter than the current rule
        let decisions = run(&mut engine, &mut sink, &[65, 71]);
        assert_eq!(decisions, vec![Decision::NotSet, Decision::Set(FanLevel::Low)]);
    }

    #[test]
    fn test_invalid_reading_falls_back_to_maximum() {
        let mut engine = engine(10, 3);
        let mut sink = MockSink::new();

        run(&mut engine, &mut sink, &[85]);
        sink.clear();

        let decision = engine.decide(None, &mut sink, Duration::ZERO).unwrap();
        assert_eq!(decision, Decision::Invalid);
        assert_eq!(sink.levels(), vec!["full-speed"]);
        assert_eq!(engine.current_level(), Some(FanLevel::Med));
        assert_eq!(engine.tick_penalty(), 2);

        // Next valid reading continues from medium
        let decisions = run(&mut engine, &mut sink, &[95]);
        assert_eq!(decisions, vec![Decision::Set(FanLevel::Max)]);
    }

    #[test]
    fn test_invalid_before_any_rule() {
        let mut engine = engine(10, 3);
        let mut sink = MockSink::new();

        assert_eq!(
            engine.decide(None, &mut sink, Duration::ZERO).unwrap(),
            Decision::Invalid
        );
        assert!(engine.current_rule().is_none());
    }

    #[test]
    fn test_failed_write_not_committed() {
        let mut engine = engine(10, 3);
        let mut sink = MockSink::new();
        sink.set_failing(true);

        let result = engine.decide(Some(Temperature::new(85)), &mut sink, Duration::ZERO);
        assert!(result.is_err());
        assert!(engine.current_rule().is_none());
        assert!(engine.last_watchdog_ping().is_none());

        sink.set_failing(false);
        let decisions = run(&mut engine, &mut sink, &[85]);
        assert_eq!(decisions, vec![Decision::Set(FanLevel::Med)]);
    }

    proptest! {
        #[test]
        fn test_decisions_respect_hysteresis(
            readings in prop::collection::vec(prop::option::of(-40i32..130), 1..80),
            temp_hysteresis in 0i32..20,
            tick_hysteresis in 0u32..6,
        ) {
            let mut engine = engine(temp_hysteresis, tick_hysteresis);
            let mut sink = MockSink::new();

            for reading in readings {
                let before = engine.current_level();
                let penalty = engine.tick_penalty();

                let decision = engine
                    .decide(reading.map(Temperature::new), &mut sink, Duration::ZERO)
                    .unwrap();

                if let Some(rule) = engine.current_rule() {
                    prop_assert!(engine.rules().rules().contains(rule));
                }

                match decision {
                    Decision::Set(level) => {
                        prop_assert_eq!(engine.current_level(), Some(level));
                        if let Some(previous) = before {
                            if level.index() > previous.index() {
                                prop_assert!(penalty <= 1, "moved down with penalty {}", penalty);
                            }
                        }
                    }
                    Decision::NotSet | Decision::Invalid => {
                        prop_assert_eq!(engine.current_level(), before);
                    }
                }
            }
        }
    }
}
