//! Fixed-length state vector.

use nalgebra::DVector;
use std::ops::{Index, IndexMut};

/// Ordered `f64` state whose length is fixed at construction.
///
/// Arithmetic helpers combine vectors element-wise over `self`'s length;
/// missing entries on the other operand count as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector(DVector<f64>);

impl StateVector {
    pub fn zeros(len: usize) -> Self {
        Self(DVector::zeros(len))
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Self(DVector::from_column_slice(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        self.0.as_mut_slice()
    }

    pub fn as_dvector(&self) -> &DVector<f64> {
        &self.0
    }

    /// `self + s * k`.
    pub fn add_scaled(&self, k: &StateVector, s: f64) -> StateVector {
        let mut out = self.clone();
        out.add_scaled_mut(k, s);
        out
    }

    /// `self += s * k` in place.
    pub fn add_scaled_mut(&mut self, k: &StateVector, s: f64) {
        for (x, dx) in self.0.iter_mut().zip(k.0.iter()) {
            *x += s * dx;
        }
    }

    /// Overwrite with the values of `other`.
    pub fn assign(&mut self, other: &StateVector) {
        for (x, v) in self.0.iter_mut().zip(other.0.iter()) {
            *x = *v;
        }
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Largest absolute element-wise difference.
    pub fn max_abs_diff(&self, other: &StateVector) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0.0, |m, (a, b)| m.max((a - b).abs()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }
}

impl Index<usize> for StateVector {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl IndexMut<usize> for StateVector {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}
