//! Piecewise cubic Hermite interpolation with shape-preserving slopes.
//!
//! Slopes follow Fritsch and Carlson: zero at local extrema, a weighted harmonic mean
//! of the neighbouring secants elsewhere, and a one-sided three-point estimate at the
//! ends. Monotone knots therefore give a monotone curve.

use crate::error::{InterpError, InterpResult};

/// A shape-preserving cubic through a set of knots.
#[derive(Debug, Clone, PartialEq)]
pub struct Pchip {
    x: Vec<f64>,
    y: Vec<f64>,
    d: Vec<f64>,
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// One-sided slope at an end knot.
fn edge_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if sign(d) != sign(m0) {
        0.0
    } else if sign(m0) != sign(m1) && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

impl Pchip {
    /// Fit through knots `x` (strictly increasing) and values `y`.
    pub fn new(x: &[f64], y: &[f64]) -> InterpResult<Self> {
        if x.len() != y.len() {
            return Err(InterpError::InvalidGrid {
                what: format!("{} knots but {} values", x.len(), y.len()),
            });
        }
        if x.is_empty() {
            return Err(InterpError::InvalidGrid {
                what: "no knots".to_string(),
            });
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(InterpError::InvalidGrid {
                what: "knots must be finite".to_string(),
            });
        }
        if let Some(w) = x.windows(2).find(|w| w[1] <= w[0]) {
            return Err(InterpError::InvalidGrid {
                what: format!("knots must be strictly increasing ({} then {})", w[0], w[1]),
            });
        }

        let n = x.len();
        let mut d = vec![0.0; n];
        if n == 2 {
            let m = (y[1] - y[0]) / (x[1] - x[0]);
            d.fill(m);
        } else if n > 2 {
            let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
            let m: Vec<f64> = y
                .windows(2)
                .zip(&h)
                .map(|(w, hk)| (w[1] - w[0]) / hk)
                .collect();

            for k in 1..n - 1 {
                let (m0, m1) = (m[k - 1], m[k]);
                if m0 == 0.0 || m1 == 0.0 || sign(m0) != sign(m1) {
                    continue;
                }
                let w1 = 2.0 * h[k] + h[k - 1];
                let w2 = h[k] + 2.0 * h[k - 1];
                d[k] = (w1 + w2) / (w1 / m0 + w2 / m1);
            }
            d[0] = edge_slope(h[0], h[1], m[0], m[1]);
            d[n - 1] = edge_slope(h[n - 2], h[n - 3], m[n - 2], m[n - 3]);
        }

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            d,
        })
    }

    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// Value at `xq`. Outside the knot range the end values are held; NaN maps to NaN.
    pub fn eval(&self, xq: f64) -> f64 {
        if xq.is_nan() {
            return f64::NAN;
        }
        let n = self.x.len();
        if xq <= self.x[0] {
            return self.y[0];
        }
        if xq >= self.x[n - 1] {
            return self.y[n - 1];
        }
        let k = self.x.partition_point(|v| *v <= xq) - 1;
        let h = self.x[k + 1] - self.x[k];
        let t = (xq - self.x[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        h00 * self.y[k] + h10 * h * self.d[k] + h01 * self.y[k + 1] + h11 * h * self.d[k + 1]
    }

    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproduces_knots_and_lines() {
        let x = [0.0, 1.0, 2.5, 4.0];
        let y = [1.0, 3.0, 6.0, 9.0];
        let p = Pchip::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert_eq!(p.eval(*xi), *yi);
        }
        assert!((p.eval(0.5) - 2.0).abs() < 1e-12);
        assert!((p.eval(3.0) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn holds_end_values_outside_range() {
        let p = Pchip::new(&[0.0, 1.0, 2.0], &[0.0, 10.0, 30.0]).unwrap();
        assert_eq!(p.eval(-1.0), 0.0);
        assert_eq!(p.eval(5.0), 30.0);
        assert_eq!(p.eval(f64::NEG_INFINITY), 0.0);
        assert_eq!(p.eval(f64::INFINITY), 30.0);
        assert!(p.eval(f64::NAN).is_nan());
    }

    #[test]
    fn flat_segments_stay_flat() {
        let p = Pchip::new(&[0.0, 1.0, 2.0, 3.0], &[0.0, 5.0, 5.0, 8.0]).unwrap();
        for i in 0..=10 {
            let x = 1.0 + i as f64 / 10.0;
            assert!((p.eval(x) - 5.0).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_bad_knots() {
        assert!(Pchip::new(&[], &[]).is_err());
        assert!(Pchip::new(&[0.0, 0.0], &[1.0, 2.0]).is_err());
        assert!(Pchip::new(&[0.0, 1.0], &[1.0]).is_err());
        assert!(Pchip::new(&[0.0, f64::NAN], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn single_knot_is_constant() {
        let p = Pchip::new(&[1.0], &[4.0]).unwrap();
        assert_eq!(p.eval(0.0), 4.0);
        assert_eq!(p.eval(9.0), 4.0);
    }
}
