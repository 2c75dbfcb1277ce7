//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Bound a value into the closed range `[min, max]`.
///
/// Values already inside the range are returned untouched, so the boundaries themselves are
/// exact. A NaN value is passed through.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    if value < min {
        return min
    }
    if value > max {
        return max
    }

    value
}

/// Symmetric triangular ramp over `[0, period]`.
///
/// Rises linearly from 0 to 1 over the first half of the period and falls back to 0 over the
/// second half. Outside the period, or for a non-positive period, the ramp is 0.
pub fn triangle_ramp<T>(elapsed: T, period: T) -> T
where
    T: Float
{
    let zero = T::zero();
    let half = period / T::from(2.0).unwrap_or_else(T::one);

    if half <= zero || elapsed < zero || elapsed > period {
        return zero
    }

    let scale = if elapsed <= half {
        elapsed / half
    }
    else {
        (period - elapsed) / half
    };

    clamp(scale, zero, T::one())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(0.5f64, -1.0, 1.0), 0.5);
        assert_eq!(clamp(1.0f64, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-1.0f64, -1.0, 1.0), -1.0);
        assert_eq!(clamp(1.0000001f64, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-57.0f64, 0.0, 1.0), 0.0);
        assert_eq!(clamp(f64::INFINITY, 0.0, 1.0), 1.0);
        assert!(clamp(f64::NAN, 0.0, 1.0).is_nan());
    }

    #[test]
    fn test_triangle_ramp() {
        assert_eq!(triangle_ramp(0.0f64, 2.0), 0.0);
        assert_eq!(triangle_ramp(0.5f64, 2.0), 0.5);
        assert_eq!(triangle_ramp(1.0f64, 2.0), 1.0);
        assert_eq!(triangle_ramp(1.5f64, 2.0), 0.5);
        assert_eq!(triangle_ramp(2.0f64, 2.0), 0.0);
        assert_eq!(triangle_ramp(2.5f64, 2.0), 0.0);
        assert_eq!(triangle_ramp(1.0f64, 0.0), 0.0);
    }
}
