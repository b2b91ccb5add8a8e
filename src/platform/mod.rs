//! Hardware abstraction layer
//!
//! Provides trait-based abstractions over hwmon, thinkpad_acpi and the
//! system clocks for testability.

pub mod clock;
pub mod hwmon;
pub mod tpacpi;
pub mod traits;

pub use clock::SystemClock;
pub use hwmon::HwmonSensors;
pub use tpacpi::TpacpiFan;
pub use traits::{Clock, ClockReading, ControlSink, SensorSource};
