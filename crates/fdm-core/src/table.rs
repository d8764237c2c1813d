//! Breakpoint tables.
//!
//! Both tables are immutable after construction and clamp lookups to the
//! boundary values: there is no extrapolation beyond the table edges.

use crate::error::{FdmError, FdmResult};
use crate::numeric::is_strictly_increasing;

/// Bracketing pair for `x` in `keys` with interpolation fraction.
///
/// Returns `(i0, i1, t)` so that the result is `v[i0] + t * (v[i1] - v[i0])`.
/// Outside the key range both indices are the boundary index and `t` is 0.
fn bracket(keys: &[f64], x: f64) -> (usize, usize, f64) {
    let n = keys.len();
    if n == 1 || x <= keys[0] {
        return (0, 0, 0.0);
    }
    if x >= keys[n - 1] {
        return (n - 1, n - 1, 0.0);
    }
    // keys[0] < x < keys[n-1], so 1 <= i <= n-1
    let i = keys.partition_point(|&k| k <= x);
    let (k0, k1) = (keys[i - 1], keys[i]);
    (i - 1, i, (x - k0) / (k1 - k0))
}

#[inline]
fn lerp(v0: f64, v1: f64, t: f64) -> f64 {
    if t == 0.0 { v0 } else { v0 + t * (v1 - v0) }
}

/// Piecewise-linear lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table1D {
    keys: Vec<f64>,
    values: Vec<f64>,
}

impl Table1D {
    /// Create a table from breakpoints and values.
    ///
    /// # Errors
    ///
    /// Fails if the table is empty, lengths differ, keys are not strictly
    /// increasing, or any entry is non-finite.
    pub fn new(keys: Vec<f64>, values: Vec<f64>) -> FdmResult<Self> {
        if keys.is_empty() {
            return Err(FdmError::invalid_arg("table must have at least one breakpoint"));
        }
        if keys.len() != values.len() {
            return Err(FdmError::invalid_arg(format!(
                "table has {} keys but {} values",
                keys.len(),
                values.len()
            )));
        }
        if !is_strictly_increasing(&keys) {
            return Err(FdmError::invalid_arg(
                "table keys must be finite and strictly increasing",
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(FdmError::invalid_arg("table values must be finite"));
        }
        Ok(Self { keys, values })
    }

    /// Single-entry table returning `value` everywhere.
    pub fn constant(value: f64) -> Self {
        Self {
            keys: vec![0.0],
            values: vec![value],
        }
    }

    /// Two-point table through `(x0, y0)` and `(x1, y1)`.
    pub fn linear(x0: f64, y0: f64, x1: f64, y1: f64) -> FdmResult<Self> {
        Self::new(vec![x0, x1], vec![y0, y1])
    }

    /// Create a table from `(key, value)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> FdmResult<Self> {
        let (keys, values) = pairs.iter().copied().unzip();
        Self::new(keys, values)
    }

    /// Interpolated value at `x`, clamped to the first/last value outside
    /// the breakpoint range. NaN input yields NaN.
    pub fn value(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let (i0, i1, t) = bracket(&self.keys, x);
        lerp(self.values[i0], self.values[i1], t)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_value(&self) -> f64 {
        self.values[0]
    }

    pub fn last_value(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    pub fn min_key(&self) -> f64 {
        self.keys[0]
    }

    pub fn max_key(&self) -> f64 {
        self.keys[self.keys.len() - 1]
    }

    /// Key at which the largest value occurs (first one on ties).
    pub fn key_of_max_value(&self) -> f64 {
        let mut best = 0;
        for (i, v) in self.values.iter().enumerate() {
            if *v > self.values[best] {
                best = i;
            }
        }
        self.keys[best]
    }

    /// Key at which the smallest value occurs (first one on ties).
    pub fn key_of_min_value(&self) -> f64 {
        let mut best = 0;
        for (i, v) in self.values.iter().enumerate() {
            if *v < self.values[best] {
                best = i;
            }
        }
        self.keys[best]
    }

    /// Copy of the table with every value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            keys: self.keys.clone(),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }
}

/// Bilinear lookup table over independent row and column breakpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Table2D {
    row_keys: Vec<f64>,
    col_keys: Vec<f64>,
    /// Row-major, `row_keys.len() * col_keys.len()` entries.
    values: Vec<f64>,
}

impl Table2D {
    /// Create a table from row/column breakpoints and row-major values.
    ///
    /// # Errors
    ///
    /// Fails if either axis is empty or not strictly increasing, if the value
    /// count is not `rows * cols`, or if any entry is non-finite.
    pub fn new(row_keys: Vec<f64>, col_keys: Vec<f64>, values: Vec<f64>) -> FdmResult<Self> {
        if row_keys.is_empty() || col_keys.is_empty() {
            return Err(FdmError::invalid_arg(
                "2D table must have at least one row and one column",
            ));
        }
        if !is_strictly_increasing(&row_keys) {
            return Err(FdmError::invalid_arg(
                "2D table row keys must be finite and strictly increasing",
            ));
        }
        if !is_strictly_increasing(&col_keys) {
            return Err(FdmError::invalid_arg(
                "2D table column keys must be finite and strictly increasing",
            ));
        }
        let expected = row_keys.len() * col_keys.len();
        if values.len() != expected {
            return Err(FdmError::invalid_arg(format!(
                "2D table has {} values, expected {} ({} rows x {} columns)",
                values.len(),
                expected,
                row_keys.len(),
                col_keys.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(FdmError::invalid_arg("2D table values must be finite"));
        }
        Ok(Self {
            row_keys,
            col_keys,
            values,
        })
    }

    /// Create a table from a list of rows.
    pub fn from_rows(row_keys: Vec<f64>, col_keys: Vec<f64>, rows: &[Vec<f64>]) -> FdmResult<Self> {
        if rows.len() != row_keys.len() || rows.iter().any(|r| r.len() != col_keys.len()) {
            return Err(FdmError::invalid_arg(format!(
                "2D table rows do not match axes ({} rows x {} columns expected)",
                row_keys.len(),
                col_keys.len()
            )));
        }
        Self::new(row_keys, col_keys, rows.concat())
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.col_keys.len() + col]
    }

    /// Bilinear value at `(row, col)`, each axis clamped independently.
    pub fn value(&self, row: f64, col: f64) -> f64 {
        if row.is_nan() || col.is_nan() {
            return f64::NAN;
        }
        let (r0, r1, tr) = bracket(&self.row_keys, row);
        let (c0, c1, tc) = bracket(&self.col_keys, col);
        let lower = lerp(self.at(r0, c0), self.at(r0, c1), tc);
        let upper = lerp(self.at(r1, c0), self.at(r1, c1), tc);
        lerp(lower, upper, tr)
    }

    pub fn rows(&self) -> usize {
        self.row_keys.len()
    }

    pub fn cols(&self) -> usize {
        self.col_keys.len()
    }

    pub fn row_keys(&self) -> &[f64] {
        &self.row_keys
    }

    pub fn col_keys(&self) -> &[f64] {
        &self.col_keys
    }

    /// 1D slice of the table at a fixed row key.
    pub fn row_table(&self, row: f64) -> Table1D {
        let values = self.col_keys.iter().map(|&c| self.value(row, c)).collect();
        Table1D {
            keys: self.col_keys.clone(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table1D {
        Table1D::new(vec![-1.0, 0.0, 2.0, 5.0], vec![4.0, 0.0, 1.0, -2.0]).unwrap()
    }

    #[test]
    fn exact_at_breakpoints() {
        let t = sample();
        for (k, v) in t.keys().iter().zip(t.values()) {
            assert_eq!(t.value(*k), *v);
        }
    }

    #[test]
    fn interpolates_between_breakpoints() {
        let t = sample();
        assert_eq!(t.value(-0.5), 2.0);
        assert_eq!(t.value(1.0), 0.5);
        assert_eq!(t.value(3.5), -0.5);
    }

    #[test]
    fn clamps_outside_range() {
        let t = sample();
        assert_eq!(t.value(-100.0), 4.0);
        assert_eq!(t.value(100.0), -2.0);
        assert!(t.value(f64::NAN).is_nan());
    }

    #[test]
    fn invalid_tables_rejected() {
        assert!(Table1D::new(vec![], vec![]).is_err());
        assert!(Table1D::new(vec![0.0, 1.0], vec![0.0]).is_err());
        assert!(Table1D::new(vec![0.0, 0.0], vec![0.0, 1.0]).is_err());
        assert!(Table1D::new(vec![1.0, 0.0], vec![0.0, 1.0]).is_err());
        assert!(Table1D::new(vec![0.0, 1.0], vec![0.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn extrema_helpers() {
        let t = sample();
        assert_eq!(t.key_of_max_value(), -1.0);
        assert_eq!(t.key_of_min_value(), 5.0);
        assert_eq!(t.first_value(), 4.0);
        assert_eq!(t.last_value(), -2.0);
        assert_eq!(t.scaled(2.0).value(1.0), 1.0);
        assert_eq!(Table1D::constant(3.0).value(-7.0), 3.0);
    }

    #[test]
    fn bilinear_lookup() {
        // z = row + 10 * col
        let t = Table2D::from_rows(
            vec![0.0, 1.0, 2.0],
            vec![0.0, 1.0],
            &[vec![0.0, 10.0], vec![1.0, 11.0], vec![2.0, 12.0]],
        )
        .unwrap();

        assert_eq!(t.value(1.0, 1.0), 11.0);
        assert!((t.value(0.5, 0.5) - 5.5).abs() < 1e-12);
        assert!((t.value(1.5, 0.25) - 4.0).abs() < 1e-12);
        // independent clamping on each axis
        assert_eq!(t.value(-3.0, 0.0), 0.0);
        assert_eq!(t.value(5.0, 9.0), 12.0);
        assert!((t.value(5.0, 0.5) - 7.0).abs() < 1e-12);
        assert!((t.row_table(0.5).value(1.0) - 10.5).abs() < 1e-12);
    }

    #[test]
    fn inconsistent_2d_rejected() {
        assert!(Table2D::new(vec![0.0, 1.0], vec![0.0], vec![1.0]).is_err());
        assert!(Table2D::new(vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0; 4]).is_err());
        assert!(Table2D::from_rows(vec![0.0], vec![0.0, 1.0], &[vec![1.0]]).is_err());
    }

    #[test]
    fn linear_helper() {
        let t = Table1D::linear(0.0, 1.0, 10.0, 3.0).unwrap();
        assert_eq!(t.value(5.0), 2.0);
        assert_eq!(t.min_key(), 0.0);
        assert_eq!(t.max_key(), 10.0);
        assert!(Table1D::linear(1.0, 0.0, 1.0, 0.0).is_err());
    }
}
