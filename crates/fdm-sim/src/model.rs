//! Pluggable derivative function.

use crate::state::StateVector;

/// A dynamic system `x_dot = f(x)` bound once to an integrator.
///
/// Evaluation is infallible: anything that can fail must do so while the
/// model is being constructed, not while it is being integrated.
pub trait DerivativeModel {
    /// Compute the state derivative at `x`. The result has `x.len()` entries.
    ///
    /// Takes `&mut self` so models can cache intermediate results of the
    /// last evaluation (forces, air data) for later publication.
    fn derivative(&mut self, x: &StateVector) -> StateVector;

    /// Project a freshly integrated state back onto its valid manifold
    /// (e.g. renormalize a quaternion). Called once after every step.
    fn project(&mut self, _x: &mut StateVector) {}
}

/// Adapts a closure into a [`DerivativeModel`].
pub struct FnModel<F>(pub F);

impl<F> DerivativeModel for FnModel<F>
where
    F: FnMut(&StateVector) -> StateVector,
{
    fn derivative(&mut self, x: &StateVector) -> StateVector {
        (self.0)(x)
    }
}

impl<F> std::fmt::Debug for FnModel<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnModel")
    }
}
