//! tpfan - zero-configuration ThinkPad fan control library
//!
//! This library provides the fan level decision engine, the kernel
//! watchdog keep-alive and the hwmon/thinkpad_acpi adapters used by the
//! `tpfan` daemon.
//!
//! # Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Control loop
//! - [`config`]: Configuration file and validation
//! - [`domain`]: Domain models with validation
//! - [`error`]: Error types
//! - [`platform`]: hwmon, thinkpad_acpi and clock abstraction layer
//! - [`services`]: Decision engine, watchdog keeper, suspend detection

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod platform;
pub mod services;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
