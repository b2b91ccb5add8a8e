//! Service layer for fan control
//!
//! Services encapsulate the state machines that decide fan levels, keep
//! the kernel watchdog fed and notice suspend/resume cycles.

pub mod engine;
pub mod suspend;
pub mod watchdog;

pub use engine::{Decision, FanDecisionEngine};
pub use suspend::{ResumeState, SuspendDetector};
pub use watchdog::{WatchdogKeeper, WatchdogOutcome};
