//! Rule table mapping temperature thresholds to fan levels

use crate::domain::{FanLevel, LevelToken, Temperature};
use crate::error::DomainError;
use std::fmt;

/// Temperature above which a rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// Applies when the temperature is strictly above this many degrees
    Above(i32),
    /// Sentinel that matches any temperature
    Floor,
}

impl Threshold {
    /// Whether `temp` exceeds this threshold lowered by `penalty` degrees
    pub fn is_exceeded_by(&self, temp: Temperature, penalty: i32) -> bool {
        match *self {
            Threshold::Above(t) => {
                i64::from(temp.as_celsius()) > i64::from(t) - i64::from(penalty)
            }
            Threshold::Floor => true,
        }
    }

    /// Degrees for a real threshold, `None` for the sentinel
    pub fn celsius(&self) -> Option<i32> {
        match *self {
            Threshold::Above(t) => Some(t),
            Threshold::Floor => None,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Above(t) => write!(f, "{}°C", t),
            Threshold::Floor => f.write_str("-inf"),
        }
    }
}

/// One discrete fan level and the temperature above which it applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Which level this rule selects
    pub level: FanLevel,
    /// Token sent with the `level` command
    pub command: LevelToken,
    /// Temperature above which the rule matches
    pub threshold: Threshold,
}

impl Rule {
    /// Name used in log lines
    pub fn label(&self) -> &'static str {
        self.level.label()
    }
}

/// Ordered rules, strictly descending by threshold, ending in the sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: [Rule; 4],
}

impl RuleTable {
    /// Default maximum threshold in Celsius
    pub const DEFAULT_MAX_TEMP: i32 = 90;
    /// Default medium threshold in Celsius
    pub const DEFAULT_MED_TEMP: i32 = 80;
    /// Default low threshold in Celsius
    pub const DEFAULT_LOW_TEMP: i32 = 70;

    /// Create a rule table from the three real thresholds and the four
    /// level tokens (indexed by `FanLevel`)
    ///
    /// # Errors
    /// Returns `DomainError::UnorderedThresholds` unless
    /// `max > med > low`
    pub fn new(
        max_temp: i32,
        med_temp: i32,
        low_temp: i32,
        commands: [LevelToken; 4],
    ) -> Result<Self, DomainError> {
        let temps = [max_temp, med_temp, low_temp];
        for (pair, levels) in temps.windows(2).zip(FanLevel::ALL.windows(2)) {
            if pair[0] <= pair[1] {
                return Err(DomainError::UnorderedThresholds {
                    hotter: levels[0].label(),
                    hotter_temp: pair[0],
                    cooler: levels[1].label(),
                    cooler_temp: pair[1],
                });
            }
        }

        let [max_cmd, med_cmd, low_cmd, off_cmd] = commands;
        Ok(Self {
            rules: [
                Rule {
                    level: FanLevel::Max,
                    command: max_cmd,
                    threshold: Threshold::Above(max_temp),
                },
                Rule {
                    level: FanLevel::Med,
                    command: med_cmd,
                    threshold: Threshold::Above(med_temp),
                },
                Rule {
                    level: FanLevel::Low,
                    command: low_cmd,
                    threshold: Threshold::Above(low_temp),
                },
                Rule {
                    level: FanLevel::Off,
                    command: off_cmd,
                    threshold: Threshold::Floor,
                },
            ],
        })
    }

    /// Replace the command token of one level
    pub fn with_command(mut self, level: FanLevel, command: LevelToken) -> Self {
        self.rules[level.index()].command = command;
        self
    }

    /// Rules in scan order (hottest first)
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rule for a specific level
    pub fn get(&self, level: FanLevel) -> &Rule {
        &self.rules[level.index()]
    }

    /// Rule used when no valid temperature is available
    pub fn fallback(&self) -> &Rule {
        self.get(FanLevel::Max)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        let [max, med, low, off] = FanLevel::ALL;
        let token = |level: FanLevel| LevelToken::new_unchecked(level.default_token());
        Self {
            rules: [
                Rule {
                    level: max,
                    command: token(max),
                    threshold: Threshold::Above(Self::DEFAULT_MAX_TEMP),
                },
                Rule {
                    level: med,
                    command: token(med),
                    threshold: Threshold::Above(Self::DEFAULT_MED_TEMP),
                },
                Rule {
                    level: low,
                    command: token(low),
                    threshold: Threshold::Above(Self::DEFAULT_LOW_TEMP),
                },
                Rule {
                    level: off,
                    command: token(off),
                    threshold: Threshold::Floor,
                },
            ],
        }
    }
}
