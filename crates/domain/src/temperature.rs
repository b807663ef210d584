//! Temperature record: unit conversion, precision scaling, and running
//! statistics.

use serde::{Deserialize, Serialize};

use crate::time::{Timestamp, minutes_since};

/// Update-age cap in minutes (one day), matching the driver field range.
pub const UPDATE_AGE_CAP: f64 = 1440.0;

/// Unit conversion applied to incoming readings.
///
/// At most one of `FToC`/`CToF` is active; re-selecting the active one is a
/// no-op, switching to the other resets the running statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conversion {
    #[default]
    None,
    FToC,
    CToF,
}

impl Conversion {
    /// Apply this conversion to a single reading, rounded to one decimal.
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        let converted = match self {
            Self::None => return value,
            Self::FToC => (value - 32.0) / 1.8,
            Self::CToF => value * 1.8 + 32.0,
        };
        (converted * 10.0).round() / 10.0
    }
}

/// Per-device temperature state and statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    pub current: Option<f64>,
    pub previous: Option<f64>,
    pub highest: Option<f64>,
    pub lowest: Option<f64>,
    /// Midpoint of highest and lowest, once both exist.
    pub average: Option<f64>,
    /// When the value last actually changed; identical reads do not touch it.
    pub last_change: Option<Timestamp>,
    /// Fractional digits assumed in a raw integer reading.
    pub precision: u32,
    /// Whether incoming readings are raw integers to be scaled down.
    pub raw_to_precision: bool,
    pub conversion: Conversion,
}

impl TemperatureRecord {
    #[must_use]
    pub fn new(precision: u32, raw_to_precision: bool, conversion: Conversion) -> Self {
        Self {
            current: None,
            previous: None,
            highest: None,
            lowest: None,
            average: None,
            last_change: None,
            precision,
            raw_to_precision,
            conversion,
        }
    }

    /// Scale and convert one incoming reading without recording it.
    #[must_use]
    pub fn normalize(&self, raw: f64) -> f64 {
        let scaled = if self.raw_to_precision {
            let factor = 10f64.powi(self.precision.min(9) as i32);
            let scaled = raw / factor;
            (scaled * factor).round() / factor
        } else {
            raw
        };
        self.conversion.apply(scaled)
    }

    /// Record one reading taken at `at`.
    ///
    /// Returns the new derived value when it differs from the current one.
    /// An unchanged value is a strict no-op: no statistics mutation, and
    /// the update-age clock keeps accruing from the last real change.
    pub fn observe(&mut self, raw: f64, at: Timestamp) -> Option<f64> {
        self.observe_value(self.normalize(raw), at)
    }

    /// Record an already-derived value (a manual set), skipping scaling and
    /// conversion. Same change-detection semantics as [`observe`](Self::observe).
    pub fn observe_value(&mut self, value: f64, at: Timestamp) -> Option<f64> {
        if self.current == Some(value) {
            return None;
        }
        self.previous = self.current;
        self.current = Some(value);
        self.last_change = Some(at);
        if self.highest.is_none_or(|high| value > high) {
            self.highest = Some(value);
        }
        if self.lowest.is_none_or(|low| value < low) {
            self.lowest = Some(value);
        }
        if let (Some(high), Some(low)) = (self.highest, self.lowest) {
            self.average = Some(((high + low) / 2.0 * 10.0).round() / 10.0);
        }
        Some(value)
    }

    /// Select the unit conversion. Re-selecting the active conversion is a
    /// no-op; an actual switch resets the running statistics and reports
    /// `true`.
    pub fn set_conversion(&mut self, conversion: Conversion) -> bool {
        if self.conversion == conversion {
            return false;
        }
        self.conversion = conversion;
        self.reset_statistics();
        true
    }

    /// Enable or disable raw-to-precision scaling; a change resets the
    /// running statistics.
    pub fn set_raw_to_precision(&mut self, enabled: bool) -> bool {
        if self.raw_to_precision == enabled {
            return false;
        }
        self.raw_to_precision = enabled;
        self.reset_statistics();
        true
    }

    /// Clear highest/lowest/average and the update-age clock. The current
    /// value is deliberately kept.
    pub fn reset_statistics(&mut self) {
        self.highest = None;
        self.lowest = None;
        self.average = None;
        self.last_change = None;
    }

    /// Minutes since the last real change, capped at [`UPDATE_AGE_CAP`].
    #[must_use]
    pub fn update_age(&self, at: Timestamp) -> f64 {
        self.last_change
            .map_or(0.0, |since| minutes_since(since, at, UPDATE_AGE_CAP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now;
    use chrono::Duration;

    #[test]
    fn should_track_high_low_over_sequence() {
        let mut record = TemperatureRecord::new(0, false, Conversion::None);
        let at = now();
        assert_eq!(record.observe(70.0, at), Some(70.0));
        assert_eq!(record.observe(70.0, at + Duration::seconds(30)), None);
        assert_eq!(record.observe(72.5, at + Duration::seconds(60)), Some(72.5));

        assert_eq!(record.highest, Some(72.5));
        assert_eq!(record.lowest, Some(70.0));
        assert_eq!(record.previous, Some(70.0));
    }

    #[test]
    fn should_not_reset_update_age_on_identical_read() {
        let mut record = TemperatureRecord::new(0, false, Conversion::None);
        let at = now();
        record.observe(70.0, at);
        record.observe(70.0, at + Duration::minutes(10));

        assert_eq!(record.last_change, Some(at));
        let age = record.update_age(at + Duration::minutes(10));
        assert!((age - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_reset_update_age_only_on_change() {
        let mut record = TemperatureRecord::new(0, false, Conversion::None);
        let at = now();
        record.observe(70.0, at);
        record.observe(72.5, at + Duration::minutes(5));
        assert_eq!(record.last_change, Some(at + Duration::minutes(5)));
    }

    #[test]
    fn should_scale_raw_reading_by_precision() {
        let record = TemperatureRecord::new(1, true, Conversion::None);
        assert!((record.normalize(725.0) - 72.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_convert_celsius_to_fahrenheit() {
        let record = TemperatureRecord::new(0, false, Conversion::CToF);
        assert!((record.normalize(20.0) - 68.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_convert_fahrenheit_to_celsius_with_rounding() {
        let record = TemperatureRecord::new(0, false, Conversion::FToC);
        assert!((record.normalize(70.0) - 21.1).abs() < f64::EPSILON);
    }

    #[test]
    fn should_combine_raw_scaling_and_conversion() {
        let record = TemperatureRecord::new(1, true, Conversion::CToF);
        // 215 raw -> 21.5 C -> 70.7 F
        assert!((record.normalize(215.0) - 70.7).abs() < f64::EPSILON);
    }

    #[test]
    fn should_ignore_reapplying_same_conversion() {
        let mut record = TemperatureRecord::new(0, false, Conversion::FToC);
        record.observe(70.0, now());
        let before = record.clone();
        assert!(!record.set_conversion(Conversion::FToC));
        assert_eq!(record, before);
    }

    #[test]
    fn should_reset_statistics_when_switching_conversion() {
        let mut record = TemperatureRecord::new(0, false, Conversion::FToC);
        record.observe(70.0, now());
        assert!(record.set_conversion(Conversion::CToF));
        assert_eq!(record.highest, None);
        assert_eq!(record.lowest, None);
        assert_eq!(record.last_change, None);
        // current survives a statistics reset
        assert!(record.current.is_some());
    }

    #[test]
    fn should_keep_current_on_explicit_reset() {
        let mut record = TemperatureRecord::new(0, false, Conversion::None);
        record.observe(70.0, now());
        record.reset_statistics();
        assert_eq!(record.current, Some(70.0));
        assert_eq!(record.highest, None);
        assert_eq!(record.lowest, None);
        assert_eq!(record.average, None);
    }

    #[test]
    fn should_compute_average_of_extremes() {
        let mut record = TemperatureRecord::new(0, false, Conversion::None);
        let at = now();
        record.observe(60.0, at);
        record.observe(80.0, at + Duration::seconds(1));
        assert_eq!(record.average, Some(70.0));
    }
}
