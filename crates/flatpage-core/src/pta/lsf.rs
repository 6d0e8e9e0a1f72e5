//! Least-squares fitting for Pta.
//!
//! Sums are accumulated in `f64` over centered coordinates; page
//! coordinates run into the thousands and raw fourth-power sums lose
//! precision.

use crate::error::{Error, Result};
use crate::pta::Pta;

impl Pta {
    /// Mean and half-range of x, used to map x into `[-1, 1]`.
    fn x_normalization(&self) -> (f64, f64) {
        let n = self.len() as f64;
        let mean = self.x_coords().iter().map(|&x| f64::from(x)).sum::<f64>() / n;
        let half = self
            .x_coords()
            .iter()
            .fold(0f64, |acc, &x| acc.max((f64::from(x) - mean).abs()));
        (mean, half)
    }

    /// Linear least-squares fit y = ax + b. Returns `(a, b)`.
    ///
    /// # Errors
    ///
    /// Returns an error with fewer than 2 points or when all x are equal.
    pub fn get_linear_lsf(&self) -> Result<(f32, f32)> {
        let n = self.len();
        if n < 2 {
            return Err(Error::InvalidParameter("less than 2 pts found".to_string()));
        }
        let (mx, half) = self.x_normalization();
        let my = self.y_coords().iter().map(|&y| f64::from(y)).sum::<f64>() / n as f64;
        let mut sxx = 0f64;
        let mut sxy = 0f64;
        for (x, y) in self.iter() {
            let dx = f64::from(x) - mx;
            sxx += dx * dx;
            sxy += dx * (f64::from(y) - my);
        }
        if half == 0.0 || sxx <= 1e-12 * half * half * n as f64 {
            return Err(Error::InvalidParameter("no solution found".to_string()));
        }
        let a = sxy / sxx;
        let b = my - a * mx;
        Ok((a as f32, b as f32))
    }

    /// Quadratic LSF: y = ax² + bx + c. Returns `(a, b, c)`.
    ///
    /// The fit is solved in `u = (x - mean) / half_range` and converted back,
    /// which keeps the normal equations well scaled for any coordinate range.
    ///
    /// # Errors
    ///
    /// Returns an error with fewer than 3 points or fewer than 3 distinct x.
    pub fn get_quadratic_lsf(&self) -> Result<(f32, f32, f32)> {
        let n = self.len();
        if n < 3 {
            return Err(Error::InvalidParameter("less than 3 pts found".to_string()));
        }
        let (m, d) = self.x_normalization();
        if d == 0.0 {
            return Err(Error::InvalidParameter("quadratic solution failed".to_string()));
        }

        let mut su = 0f64;
        let mut sy = 0f64;
        let mut su2 = 0f64;
        let mut su3 = 0f64;
        let mut su4 = 0f64;
        let mut suy = 0f64;
        let mut su2y = 0f64;
        for (x, y) in self.iter() {
            let u = (f64::from(x) - m) / d;
            let y = f64::from(y);
            let u2 = u * u;
            su += u;
            sy += y;
            su2 += u2;
            su3 += u2 * u;
            su4 += u2 * u2;
            suy += u * y;
            su2y += u2 * y;
        }

        let f = [
            [su4, su3, su2],
            [su3, su2, su],
            [su2, su, n as f64],
        ];
        let [ga, gb, gc] = gauss_jordan_3(f, [su2y, suy, sy], n as f64)
            .ok_or_else(|| Error::InvalidParameter("quadratic solution failed".to_string()))?;

        // y = ga u² + gb u + gc with u = (x - m) / d
        let d2 = d * d;
        let a = ga / d2;
        let b = gb / d - 2.0 * ga * m / d2;
        let c = gc - gb * m / d + ga * m * m / d2;
        Ok((a as f32, b as f32, c as f32))
    }
}

/// Evaluate y = ax + b at x.
#[inline]
pub fn apply_linear_fit(a: f32, b: f32, x: f32) -> f32 {
    a * x + b
}

/// Evaluate y = ax² + bx + c at x.
#[inline]
pub fn apply_quadratic_fit(a: f32, b: f32, c: f32, x: f32) -> f32 {
    a * x * x + b * x + c
}

/// Gauss-Jordan elimination with partial pivoting for a 3x3 system.
///
/// A pivot below `1e-9 * scale` is treated as singular.
fn gauss_jordan_3(mut m: [[f64; 3]; 3], mut b: [f64; 3], scale: f64) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3).max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))?;
        m.swap(col, pivot);
        b.swap(col, pivot);

        let diag = m[col][col];
        if diag.abs() < 1e-9 * scale {
            return None;
        }
        for v in &mut m[col] {
            *v /= diag;
        }
        b[col] /= diag;

        let pivot_row = m[col];
        let pivot_b = b[col];
        for row in 0..3 {
            if row == col {
                continue;
            }
            let factor = m[row][col];
            for (rv, cv) in m[row].iter_mut().zip(pivot_row.iter()) {
                *rv -= cv * factor;
            }
            b[row] -= pivot_b * factor;
        }
    }
    Some(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_lsf() {
        // y = 2x + 1
        let pta: Pta = (0..5).map(|i| (i as f32, 2.0 * i as f32 + 1.0)).collect();
        let (a, b) = pta.get_linear_lsf().unwrap();
        assert!((a - 2.0).abs() < 1e-5);
        assert!((b - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_linear_lsf_degenerate() {
        let pta: Pta = (0..4).map(|i| (3.0, i as f32)).collect();
        assert!(pta.get_linear_lsf().is_err());
        assert!(Pta::new().get_linear_lsf().is_err());
    }

    #[test]
    fn test_quadratic_lsf() {
        // y = 0.001x² - 0.5x + 100 over page-sized x
        let pta: Pta = (0..50)
            .map(|i| {
                let x = i as f32 * 40.0;
                (x, 0.001 * x * x - 0.5 * x + 100.0)
            })
            .collect();
        let (a, b, c) = pta.get_quadratic_lsf().unwrap();
        assert!((a - 0.001).abs() < 1e-6);
        assert!((b + 0.5).abs() < 1e-3);
        assert!((c - 100.0).abs() < 0.05);
        assert!((apply_quadratic_fit(a, b, c, 1000.0) - 600.0).abs() < 0.1);
    }

    #[test]
    fn test_quadratic_lsf_needs_three_distinct_x() {
        let pta: Pta = [(1.0, 1.0), (1.0, 2.0), (2.0, 3.0)].into_iter().collect();
        assert!(pta.get_quadratic_lsf().is_err());
        let pta: Pta = [(1.0, 1.0), (2.0, 2.0)].into_iter().collect();
        assert!(pta.get_quadratic_lsf().is_err());
    }
}
