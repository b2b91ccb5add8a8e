//! Configuration system
//!
//! Handles the line-oriented config file and validation of the values it
//! provides.

pub mod file;

pub use file::{ConfigFile, Directive, DEFAULT_CONFIG_PATH};

use crate::domain::{FanLevel, LevelToken, RuleTable, WatchdogTimeout};
use crate::error::ConfigError;
use crate::services::engine::DEFAULT_TEMP_HYSTERESIS;
use crate::services::watchdog::WATCHDOG_GRACE_PERIOD_SECS;

/// Main configuration structure
///
/// Holds raw values as read from the file; `validate` checks them and the
/// accessors convert them into domain types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Threshold for the maximum level in Celsius
    pub max_temp: i32,
    /// Threshold for the medium level in Celsius
    pub med_temp: i32,
    /// Threshold for the low level in Celsius
    pub low_temp: i32,
    /// Level tokens indexed by `FanLevel`
    pub levels: [LevelToken; 4],
    /// Kernel watchdog period in seconds
    pub watchdog_secs: i64,
    /// Degrees of hysteresis applied to the active level
    pub temp_hysteresis: i32,
    /// hwmon chip names to skip
    pub ignore_sensors: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_temp: RuleTable::DEFAULT_MAX_TEMP,
            med_temp: RuleTable::DEFAULT_MED_TEMP,
            low_temp: RuleTable::DEFAULT_LOW_TEMP,
            levels: FanLevel::ALL.map(|l| LevelToken::new_unchecked(l.default_token())),
            watchdog_secs: i64::from(WatchdogTimeout::MAX_SECS),
            temp_hysteresis: DEFAULT_TEMP_HYSTERESIS,
            ignore_sensors: Vec::new(),
        }
    }
}

impl Config {
    /// Check every value, failing on the first invalid one
    ///
    /// # Errors
    /// Returns `ConfigError` naming the offending key
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.watchdog_timeout()?;
        self.rule_table()?;
        if self.temp_hysteresis < 0 {
            return Err(ConfigError::Domain {
                key: "temp_hysteresis".to_string(),
                source: crate::error::DomainError::NegativeHysteresis(self.temp_hysteresis),
            });
        }
        Ok(())
    }

    /// Watchdog period, which must leave room for the grace period
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` unless
    /// `2 <= watchdog_secs <= 120`
    pub fn watchdog_timeout(&self) -> Result<WatchdogTimeout, ConfigError> {
        let min = i64::from(WATCHDOG_GRACE_PERIOD_SECS);
        let max = i64::from(WatchdogTimeout::MAX_SECS);
        let invalid = || ConfigError::InvalidValue {
            key: "watchdog_secs".to_string(),
            message: format!(
                "{} is out of range (must be between {} and {})",
                self.watchdog_secs, min, max
            ),
        };

        if !(min..=max).contains(&self.watchdog_secs) {
            return Err(invalid());
        }
        let secs = u32::try_from(self.watchdog_secs).map_err(|_| invalid())?;
        WatchdogTimeout::from_secs(secs).map_err(|_| invalid())
    }

    /// Rule table built from the thresholds and level tokens
    ///
    /// # Errors
    /// Returns `ConfigError::Domain` if the thresholds are not strictly
    /// descending
    pub fn rule_table(&self) -> Result<RuleTable, ConfigError> {
        RuleTable::new(
            self.max_temp,
            self.med_temp,
            self.low_temp,
            self.levels.clone(),
        )
        .map_err(|source| ConfigError::Domain {
            key: "max_temp/med_temp/low_temp".to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.watchdog_timeout().unwrap().as_secs(), 120);
        assert_eq!(config.rule_table().unwrap(), RuleTable::default());
    }

    #[test]
    fn test_watchdog_range() {
        let mut config = Config::default();
        for secs in [2, 60, 120] {
            config.watchdog_secs = secs;
            assert!(config.watchdog_timeout().is_ok(), "{} rejected", secs);
        }
        for secs in [-1, 0, 1, 121, 5000] {
            config.watchdog_secs = secs;
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidValue { .. })),
                "{} accepted",
                secs
            );
        }
    }

    #[test]
    fn test_negative_hysteresis_rejected() {
        let config = Config {
            temp_hysteresis: -1,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Domain {
                source: DomainError::NegativeHysteresis(-1),
                ..
            })
        ));
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        let config = Config {
            med_temp: 95,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Domain {
                source: DomainError::UnorderedThresholds { .. },
                ..
            })
        ));
    }
}
