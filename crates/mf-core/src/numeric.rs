use crate::MfError;

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute/relative tolerance pair used for balance and conservation checks.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, MfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(MfError::NonFinite { what, value: v })
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(v: Real, decimals: u32) -> Real {
    let scale = 10f64.powi(decimals as i32);
    (v * scale).round() / scale
}

/// Position of the first step where `values` decreases by more than `tol`.
///
/// Returns `None` when the sequence is non-decreasing within tolerance.
pub fn first_decrease(values: &[Real], tol: Tolerances) -> Option<usize> {
    values.windows(2).position(|w| {
        let drop = w[0] - w[1];
        drop > 0.0 && !nearly_equal(w[0], w[1], tol)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn round_to_decimals() {
        assert_eq!(round_to(0.123_456, 3), 0.123);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn first_decrease_ignores_noise() {
        let tol = Tolerances::default();
        assert_eq!(first_decrease(&[0.0, 1.0, 1.0, 2.0], tol), None);
        assert_eq!(first_decrease(&[0.0, 1.0, 1.0 - 1e-15, 2.0], tol), None);
        assert_eq!(first_decrease(&[0.0, 2.0, 1.0], tol), Some(1));
    }
}
