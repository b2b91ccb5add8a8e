//! thinkpad_acpi fan control file
//!
//! Commands are written to `/proc/acpi/ibm/fan` one per write. The handle
//! is kept open between ticks and dropped after a failed write so the
//! next command reopens it.

use crate::domain::Command;
use crate::error::SinkError;
use crate::platform::ControlSink;

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default thinkpad_acpi fan control file
pub const DEFAULT_FAN_CONTROL: &str = "/proc/acpi/ibm/fan";

/// Fan controlled through thinkpad_acpi
#[derive(Debug)]
pub struct TpacpiFan {
    path: PathBuf,
    file: Option<File>,
}

impl TpacpiFan {
    /// Create a handle for the control file at `path`
    ///
    /// The file is opened lazily on the first write.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    /// Path of the control file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the firmware advertises the `full-speed` level
    ///
    /// # Errors
    /// Returns `SinkError::Open` if the control file cannot be read
    pub fn supports_full_speed(&self) -> Result<bool, SinkError> {
        let status = fs::read_to_string(&self.path).map_err(|source| SinkError::Open {
            path: self.path.clone(),
            source,
        })?;
        Ok(status.lines().any(|line| line.contains("full-speed")))
    }

    fn handle(&mut self) -> Result<&mut File, SinkError> {
        let file = match self.file.take() {
            Some(file) => file,
            None => OpenOptions::new()
                .write(true)
                .open(&self.path)
                .map_err(|source| SinkError::Open {
                    path: self.path.clone(),
                    source,
                })?,
        };
        Ok(self.file.insert(file))
    }
}

impl ControlSink for TpacpiFan {
    fn write(&mut self, command: &Command) -> Result<(), SinkError> {
        let line = command.to_string();
        let result = self.handle()?.write_all(line.as_bytes());

        if let Err(source) = result {
            self.file = None;
            return Err(SinkError::Write {
                path: self.path.clone(),
                command: line,
                source,
            });
        }

        log::debug!("{}: {}", self.path.display(), line);
        Ok(())
    }
}
