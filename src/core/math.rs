//! Numeric helpers for money and score calculations.
//!
//! Monetary figures are carried as `f64` and rounded to two decimals
//! at the points where an invariant is asserted (landed-cost and fee
//! sums). These helpers keep that rounding in one place.

/// Round to two decimal places, the resolution of every monetary
/// figure the engine reports.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to the given number of decimal places.
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let multiplier = 10_f64.powi(decimals as i32);
    (value * multiplier).round() / multiplier
}

/// Clamp a value to the range [0.0, 1.0].
pub fn clamp01(x: f64) -> f64 {
    x.max(0.0).min(1.0)
}

/// Safe division that returns 0.0 if the denominator is zero.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Percentage change from `old_value` to `new_value`.
pub fn pct_change(old_value: f64, new_value: f64) -> f64 {
    if old_value == 0.0 {
        return 0.0;
    }
    (new_value - old_value) / old_value
}

/// Check whether two floating point numbers are approximately equal.
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Linear interpolation of `x` from the range [x0, x1] onto [y0, y1].
/// Used by the piecewise margin ramp in scoring.
pub fn lerp_segment(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if x1 <= x0 {
        return y0;
    }
    let t = clamp01((x - x0) / (x1 - x0));
    y0 + t * (y1 - y0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.006), 1.01);
        assert_eq!(round2(2.344), 2.34);
        assert_eq!(round2(-0.125), -0.13);
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(10.0, 2.0), 5.0);
        assert_eq!(safe_div(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_lerp_segment() {
        assert_eq!(lerp_segment(7.5, 0.0, 15.0, 0.0, 30.0), 15.0);
        assert_eq!(lerp_segment(-5.0, 0.0, 15.0, 0.0, 30.0), 0.0);
        assert_eq!(lerp_segment(20.0, 0.0, 15.0, 0.0, 30.0), 30.0);
    }

    #[test]
    fn test_pct_change() {
        assert!(approx_eq(pct_change(100.0, 110.0), 0.10, 1e-12));
        assert_eq!(pct_change(0.0, 5.0), 0.0);
    }
}
