//! Thermal domain types
//!
//! Provides the temperature value type used by the decision engine.

use std::fmt;

/// Temperature in whole degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Temperature(i32);

impl Temperature {
    /// Create a new Temperature
    pub const fn new(celsius: i32) -> Self {
        Self(celsius)
    }

    /// Convert a hwmon reading in millidegrees Celsius
    ///
    /// Truncates toward zero, so 85999 becomes 85°C.
    pub const fn from_millicelsius(millis: i32) -> Self {
        Self(millis / 1000)
    }

    /// Get the temperature in Celsius
    #[inline]
    pub const fn as_celsius(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_display() {
        let temp = Temperature::new(65);
        assert_eq!(temp.to_string(), "65°C");
    }

    #[test]
    fn test_temperature_from_millicelsius() {
        assert_eq!(Temperature::from_millicelsius(85_999).as_celsius(), 85);
        assert_eq!(Temperature::from_millicelsius(1_000).as_celsius(), 1);
        assert_eq!(Temperature::from_millicelsius(-5_500).as_celsius(), -5);
    }

    #[test]
    fn test_temperature_comparisons() {
        assert!(Temperature::new(50) < Temperature::new(75));
    }
}
