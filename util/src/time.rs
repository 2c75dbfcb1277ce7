//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a number of seconds into a `std::time::Duration`, saturating negative or NaN values to
/// zero and values too large to represent to `Duration::MAX`.
pub fn seconds_to_std_duration(seconds: f64) -> std::time::Duration {
    if !(seconds > 0.0) {
        return std::time::Duration::from_secs(0)
    }

    std::time::Duration::try_from_secs_f64(seconds).unwrap_or(std::time::Duration::MAX)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(duration_to_seconds(chrono::Duration::milliseconds(1500)), Some(1.5));
        assert_eq!(duration_to_seconds(chrono::Duration::zero()), Some(0.0));
    }

    #[test]
    fn test_seconds_to_std_duration() {
        assert_eq!(seconds_to_std_duration(0.25).as_millis(), 250);
        assert_eq!(seconds_to_std_duration(-1.0).as_nanos(), 0);
        assert_eq!(seconds_to_std_duration(f64::NAN).as_nanos(), 0);
        assert_eq!(seconds_to_std_duration(1e20), std::time::Duration::MAX);
        assert_eq!(seconds_to_std_duration(f64::INFINITY), std::time::Duration::MAX);
    }
}
