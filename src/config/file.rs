//! Configuration file loading
//!
//! The config file is a list of `key value` directives, one per line, in
//! any order. Unknown keys and lines without a value are skipped; later
//! directives override earlier ones.
//!
//! ```text
//! max_temp 85
//! med_temp 75
//! low_temp 60
//! max_level disengaged
//! watchdog_secs 60
//! temp_hysteresis 5
//! ignore_sensor nvme
//! ```

use crate::config::Config;
use crate::domain::{FanLevel, LevelToken};
use crate::error::ConfigError;

use std::io;
use std::path::Path;
use std::str::FromStr;

/// Default location of the config file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/tpfan.conf";

/// A single `key value` pair from the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive<'a> {
    /// 1-based line number
    pub line: usize,
    /// Directive name
    pub key: &'a str,
    /// First token after the name
    pub value: &'a str,
}

impl<'a> Directive<'a> {
    /// Split `content` into directives, skipping lines with fewer than two
    /// tokens
    pub fn parse_all(content: &'a str) -> impl Iterator<Item = Directive<'a>> + 'a {
        content.lines().enumerate().filter_map(|(idx, line)| {
            let mut tokens = line.split_whitespace();
            Some(Directive {
                line: idx + 1,
                key: tokens.next()?,
                value: tokens.next()?,
            })
        })
    }
}

/// Configuration file handler
pub struct ConfigFile;

impl ConfigFile {
    /// Load and validate configuration from a file
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns `ConfigError::Read` if the file exists but cannot be read,
    /// or any validation error
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(content) => {
                log::debug!("Loading config from {}", path.display());
                Self::parse(&content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} not found, using defaults", path.display());
                Ok(Config::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parse and validate configuration from a string
    ///
    /// # Errors
    /// Returns `ConfigError` for invalid level tokens and failed
    /// validation
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        let mut config = Config::default();
        for directive in Directive::parse_all(content) {
            apply(&mut config, &directive)?;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Dispatch a directive to the setter for its key
fn apply(config: &mut Config, directive: &Directive<'_>) -> Result<(), ConfigError> {
    match directive.key {
        "max_temp" => set_number(&mut config.max_temp, directive),
        "med_temp" => set_number(&mut config.med_temp, directive),
        "low_temp" => set_number(&mut config.low_temp, directive),
        "watchdog_secs" => set_number(&mut config.watchdog_secs, directive),
        "temp_hysteresis" => set_number(&mut config.temp_hysteresis, directive),
        "max_level" => set_level(config, FanLevel::Max, directive)?,
        "med_level" => set_level(config, FanLevel::Med, directive)?,
        "low_level" => set_level(config, FanLevel::Low, directive)?,
        "off_level" => set_level(config, FanLevel::Off, directive)?,
        "ignore_sensor" => config.ignore_sensors.push(directive.value.to_string()),
        _ => log::debug!(
            "Skipping unknown config key '{}' on line {}",
            directive.key,
            directive.line
        ),
    }
    Ok(())
}

fn set_number<T: FromStr>(dest: &mut T, directive: &Directive<'_>) {
    match directive.value.parse() {
        Ok(value) => *dest = value,
        Err(_) => log::warn!(
            "Ignoring '{} {}' on line {}: not a number",
            directive.key,
            directive.value,
            directive.line
        ),
    }
}

fn set_level(
    config: &mut Config,
    level: FanLevel,
    directive: &Directive<'_>,
) -> Result<(), ConfigError> {
    let token = LevelToken::new(directive.value).map_err(|source| ConfigError::Domain {
        key: directive.key.to_string(),
        source,
    })?;
    config.levels[level.index()] = token;
    Ok(())
}
