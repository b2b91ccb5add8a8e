//! Mock implementations for testing
//!
//! Provides scripted sensors, a recording control sink and a manual clock
//! for unit testing without ThinkPad hardware.

use crate::domain::{Command, Temperature};
use crate::error::{InvariantViolation, SensorError, SinkError};
use crate::platform::{Clock, ClockReading, ControlSink, SensorSource};

use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Sensor that replays a script of readings
///
/// `None` entries produce `SensorError::NoValidReading`. Once the script
/// is exhausted the last entry repeats.
#[derive(Debug, Default)]
pub struct MockSensor {
    script: VecDeque<Option<i32>>,
    last: Option<i32>,
    reads: usize,
}

impl MockSensor {
    /// Create a sensor that replays `script` (degrees Celsius)
    pub fn new(script: impl IntoIterator<Item = Option<i32>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: None,
            reads: 0,
        }
    }

    /// Create a sensor that always reports `celsius`
    pub fn constant(celsius: i32) -> Self {
        Self::new([Some(celsius)])
    }

    /// Number of reads performed
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl SensorSource for MockSensor {
    fn max_temperature(&mut self) -> Result<Temperature, SensorError> {
        self.reads += 1;
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
            .map(Temperature::new)
            .ok_or(SensorError::NoValidReading)
    }
}

/// Sink that records every accepted command
#[derive(Debug, Default)]
pub struct MockSink {
    commands: Vec<Command>,
    attempts: usize,
    failing: bool,
}

impl MockSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail with `EINVAL`
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Number of writes tried, including rejected ones
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// All accepted commands in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Tokens of the accepted `level` commands in order
    pub fn levels(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Level(token) => Some(token.to_string()),
                Command::Watchdog(_) => None,
            })
            .collect()
    }

    /// Forget recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl ControlSink for MockSink {
    fn write(&mut self, command: &Command) -> Result<(), SinkError> {
        self.attempts += 1;
        if self.failing {
            return Err(SinkError::Write {
                path: PathBuf::from("mock"),
                command: command.to_string(),
                source: io::Error::from_raw_os_error(libc::EINVAL),
            });
        }
        self.commands.push(command.clone());
        Ok(())
    }
}

/// Clock advanced by hand
#[derive(Debug, Default)]
pub struct MockClock {
    now: Cell<ClockReading>,
}

impl MockClock {
    /// Create a clock at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance both clocks by `by`
    pub fn advance(&self, by: Duration) {
        self.suspend(by, Duration::ZERO);
    }

    /// Advance monotonic by `awake` and boottime by `awake + asleep`
    pub fn suspend(&self, awake: Duration, asleep: Duration) {
        let now = self.now.get();
        self.now.set(ClockReading {
            monotonic: now.monotonic + awake,
            boottime: now.boottime + awake + asleep,
        });
    }
}

impl Clock for MockClock {
    fn now(&self) -> Result<ClockReading, InvariantViolation> {
        Ok(self.now.get())
    }
}
