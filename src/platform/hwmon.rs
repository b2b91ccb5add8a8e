//! hwmon temperature sensors
//!
//! Every `temp*_input` file below `/sys/class/hwmon` is opened once at
//! startup and re-read in place on each tick; the kernel serves a fresh
//! value after seeking back to the start.

use crate::domain::Temperature;
use crate::error::SensorError;
use crate::platform::SensorSource;

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Default hwmon class directory
pub const DEFAULT_HWMON_ROOT: &str = "/sys/class/hwmon";

/// An open `temp*_input` file
#[derive(Debug)]
struct SensorHandle {
    path: PathBuf,
    file: File,
}

impl SensorHandle {
    /// Read the current value in millidegrees Celsius
    fn read_millicelsius(&mut self) -> Option<i32> {
        let mut buf = [0u8; 32];
        self.file.seek(SeekFrom::Start(0)).ok()?;
        let n = self.file.read(&mut buf[..31]).ok()?;
        if n == 0 {
            return None;
        }
        parse_leading_int(std::str::from_utf8(&buf[..n]).ok()?)
    }
}

/// All non-ignored temperature sensors of the machine
#[derive(Debug)]
pub struct HwmonSensors {
    handles: Vec<SensorHandle>,
    ignored_chips: usize,
}

impl HwmonSensors {
    /// Discover sensors below `root`, skipping chips whose `name` is in
    /// `ignore`
    ///
    /// Chips or files that cannot be opened are skipped.
    ///
    /// # Errors
    /// Returns `SensorError::HwmonUnavailable` if `root` cannot be listed
    pub fn discover<P: AsRef<Path>>(root: P, ignore: &[String]) -> Result<Self, SensorError> {
        let root = root.as_ref();
        let entries = fs::read_dir(root).map_err(|source| SensorError::HwmonUnavailable {
            path: root.to_path_buf(),
            source,
        })?;

        let mut chip_dirs: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        chip_dirs.sort();

        let mut handles = Vec::new();
        let mut ignored_chips = 0;

        for chip_dir in chip_dirs {
            let Ok(files) = fs::read_dir(&chip_dir) else {
                continue;
            };

            if let Some(name) = chip_name(&chip_dir) {
                if ignore.iter().any(|i| *i == name) {
                    log::debug!("Ignoring sensor chip {} ({})", name, chip_dir.display());
                    ignored_chips += 1;
                    continue;
                }
            }

            let mut inputs: Vec<PathBuf> = files
                .flatten()
                .filter(|f| {
                    let fname = f.file_name();
                    let fname = fname.to_string_lossy();
                    fname.starts_with("temp") && fname.contains("_input")
                })
                .map(|f| f.path())
                .collect();
            inputs.sort();

            for path in inputs {
                match File::open(&path) {
                    Ok(file) => handles.push(SensorHandle { path, file }),
                    Err(e) => log::debug!("Skipping {}: {}", path.display(), e),
                }
            }
        }

        log::debug!("Monitoring {} temperature sensors", handles.len());
        Ok(Self {
            handles,
            ignored_chips,
        })
    }

    /// Number of open sensor files
    pub fn sensor_count(&self) -> usize {
        self.handles.len()
    }

    /// Number of chips skipped because of `ignore_sensor`
    pub fn ignored_count(&self) -> usize {
        self.ignored_chips
    }

    /// Paths of the open sensor files
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.handles.iter().map(|h| h.path.as_path())
    }
}

impl SensorSource for HwmonSensors {
    fn max_temperature(&mut self) -> Result<Temperature, SensorError> {
        self.handles
            .iter_mut()
            .filter_map(SensorHandle::read_millicelsius)
            .max()
            .map(Temperature::from_millicelsius)
            .ok_or(SensorError::NoValidReading)
    }
}

fn chip_name(chip_dir: &Path) -> Option<String> {
    let name = fs::read_to_string(chip_dir.join("name")).ok()?;
    let name = name.lines().next().unwrap_or_default().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Parse an optionally signed decimal integer at the start of `s`,
/// ignoring leading whitespace and any trailing text
fn parse_leading_int(s: &str) -> Option<i32> {
    let s = s.trim_start();
    let digits_start = usize::from(s.starts_with(['-', '+']));
    let end = s[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |i| i + digits_start);
    if end == digits_start {
        return None;
    }
    s[..end].parse().ok()
}
