//! CLI argument parsing
//!
//! Uses clap for the help text and environment overrides.

pub mod args;

pub use args::Cli;
