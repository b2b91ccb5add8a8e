//! CLI argument definitions using clap derive
//!
//! The daemon takes no arguments: any argument prints the help text.
//! Paths can be overridden through the environment.

use crate::config::DEFAULT_CONFIG_PATH;
use crate::platform::hwmon::DEFAULT_HWMON_ROOT;
use crate::platform::tpacpi::DEFAULT_FAN_CONTROL;

use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

const ENV_HELP: &str = "\
Environment:
  TPFAN_CONFIG       Config file [default: /etc/tpfan.conf]
  TPFAN_FAN_CONTROL  Fan control file [default: /proc/acpi/ibm/fan]
  TPFAN_HWMON_ROOT   hwmon class directory [default: /sys/class/hwmon]
  RUST_LOG           Log filter [default: info]

See the tpfan(1) man page for details.";

/// Zero-configuration ThinkPad fan daemon.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "tpfan")]
#[command(version, about, long_about = None)]
#[command(override_usage = "tpfan [any argument]")]
#[command(after_help = ENV_HELP)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, hide = true, env = "TPFAN_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// thinkpad_acpi fan control file
    #[arg(long, hide = true, env = "TPFAN_FAN_CONTROL", default_value = DEFAULT_FAN_CONTROL)]
    pub fan_control: PathBuf,

    /// hwmon class directory
    #[arg(long, hide = true, env = "TPFAN_HWMON_ROOT", default_value = DEFAULT_HWMON_ROOT)]
    pub hwmon_root: PathBuf,
}

impl Cli {
    /// Whether the arguments ask for help (any argument at all)
    pub fn wants_help<I: IntoIterator<Item = OsString>>(args: I) -> bool {
        args.into_iter().nth(1).is_some()
    }

    /// Settings from the environment only
    pub fn from_env() -> Self {
        Self::parse_from([env!("CARGO_PKG_NAME")])
    }

    /// Print the help text to stdout
    pub fn print_help() -> std::io::Result<()> {
        Self::command().print_help()
    }
}
