//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for last-change tracking and update-age statistics.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whole minutes elapsed between `since` and `at`, rounded to one decimal,
/// capped to `cap` so stale devices do not overflow narrow driver fields.
#[must_use]
pub fn minutes_since(since: Timestamp, at: Timestamp, cap: f64) -> f64 {
    let minutes = (at - since).num_seconds() as f64 / 60.0;
    let rounded = (minutes * 10.0).round() / 10.0;
    rounded.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_round_minutes_to_one_decimal() {
        let start = now();
        let later = start + Duration::seconds(90);
        let minutes = minutes_since(start, later, 1440.0);
        assert!((minutes - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_cap_minutes_at_limit() {
        let start = now();
        let later = start + Duration::days(30);
        assert!((minutes_since(start, later, 1440.0) - 1440.0).abs() < f64::EPSILON);
    }
}
