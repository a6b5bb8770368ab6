//! Fixed-tolerance float comparisons.
//!
//! One tolerance constant for the whole workspace. Every comparison that
//! decides feasibility, saturation, or emission goes through these helpers so
//! the discipline cannot drift between modules.

/// The global comparison tolerance. Never redefine this per module.
pub const EPS: f64 = 1e-9;

/// True if `v` is indistinguishable from zero.
#[inline]
pub fn approx_zero(v: f64) -> bool {
    v.abs() <= EPS
}

/// True if `a` and `b` agree within `EPS`, scaled by the larger magnitude.
///
/// The scale factor floors at 1 so comparisons near zero stay absolute.
#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPS * 1.0_f64.max(a.abs()).max(b.abs())
}

/// True if `a <= b` within the scaled tolerance.
#[inline]
pub fn approx_le(a: f64, b: f64) -> bool {
    a <= b + EPS * 1.0_f64.max(b.abs())
}

/// True if a constraint with the given slack and right-hand side is binding.
///
/// A constraint is tight when its slack is at most `EPS * max(1, |rhs|)`.
#[inline]
pub fn tight(slack: f64, rhs: f64) -> bool {
    slack <= EPS * 1.0_f64.max(rhs.abs())
}

/// Normalize a value for emission: magnitudes at or below `EPS` become
/// exactly `0.0` (this also erases negative zero).
#[inline]
pub fn snap_zero(v: f64) -> f64 {
    if v.abs() <= EPS {
        0.0
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_zero_within_eps() {
        assert!(approx_zero(0.0));
        assert!(approx_zero(5e-10));
        assert!(approx_zero(-5e-10));
        assert!(!approx_zero(2e-9));
    }

    #[test]
    fn approx_eq_scales_with_magnitude() {
        // Absolute near zero.
        assert!(approx_eq(0.0, 5e-10));
        assert!(!approx_eq(0.0, 1e-8));
        // Relative at large magnitude: 1e9 * 1e-9 = 1 of headroom.
        assert!(approx_eq(1e9, 1e9 + 0.5));
        assert!(!approx_eq(1e9, 1e9 + 10.0));
    }

    #[test]
    fn approx_le_admits_slightly_over() {
        assert!(approx_le(10.0, 10.0));
        assert!(approx_le(10.0 + 1e-10, 10.0));
        assert!(!approx_le(10.1, 10.0));
    }

    #[test]
    fn tight_uses_rhs_scale() {
        assert!(tight(0.0, 100.0));
        assert!(tight(5e-8, 100.0));
        assert!(!tight(1e-3, 100.0));
        // rhs below 1 floors the scale at 1.
        assert!(tight(5e-10, 0.0));
        assert!(!tight(1e-8, 0.0));
    }

    #[test]
    fn snap_zero_erases_traces_and_negative_zero() {
        assert_eq!(snap_zero(5e-10), 0.0);
        assert_eq!(snap_zero(-5e-10), 0.0);
        assert!(snap_zero(-0.0).is_sign_positive());
        assert_eq!(snap_zero(1.5), 1.5);
    }
}
