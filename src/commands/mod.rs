//! Command handlers
//!
//! The daemon has a single command: run the control loop.

pub mod control;

pub use control::{run_control, ControlLoop, LoopState};
