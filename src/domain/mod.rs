//! Domain models for tpfan
//!
//! This module contains all domain types with validation.
//! Types are validated on construction (fail-fast pattern).

pub mod fan;
pub mod rule;
pub mod thermal;

pub use fan::{Command, FanLevel, LevelToken, WatchdogTimeout};
pub use rule::{Rule, RuleTable, Threshold};
pub use thermal::Temperature;
