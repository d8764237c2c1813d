//! Fixed-step time integrators.

use fdm_core::{FdmError, FdmResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::DerivativeModel;
use crate::state::StateVector;

/// One explicit integration scheme.
pub trait Scheme {
    /// Advance `x` by `dt` using `model`, returning the new state.
    fn step<M: DerivativeModel>(&self, model: &mut M, x: &StateVector, dt: f64) -> StateVector;
}

/// Rectangular (explicit Euler): `x' = x + f(x) dt`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EulerRect;

impl Scheme for EulerRect {
    fn step<M: DerivativeModel>(&self, model: &mut M, x: &StateVector, dt: f64) -> StateVector {
        let xdot = model.derivative(x);
        x.add_scaled(&xdot, dt)
    }
}

/// Second-order Runge-Kutta, midpoint form.
#[derive(Clone, Copy, Debug, Default)]
pub struct RungeKutta2;

impl Scheme for RungeKutta2 {
    fn step<M: DerivativeModel>(&self, model: &mut M, x: &StateVector, dt: f64) -> StateVector {
        let k1 = model.derivative(x);
        let k2 = model.derivative(&x.add_scaled(&k1, 0.5 * dt));
        x.add_scaled(&k2, dt)
    }
}

/// Classical fourth-order Runge-Kutta.
#[derive(Clone, Copy, Debug, Default)]
pub struct RungeKutta4;

impl Scheme for RungeKutta4 {
    fn step<M: DerivativeModel>(&self, model: &mut M, x: &StateVector, dt: f64) -> StateVector {
        let k1 = model.derivative(x);
        let k2 = model.derivative(&x.add_scaled(&k1, 0.5 * dt));
        let k3 = model.derivative(&x.add_scaled(&k2, 0.5 * dt));
        let k4 = model.derivative(&x.add_scaled(&k3, dt));

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let mut out = x.clone();
        out.add_scaled_mut(&k1, dt / 6.0);
        out.add_scaled_mut(&k2, dt / 3.0);
        out.add_scaled_mut(&k3, dt / 3.0);
        out.add_scaled_mut(&k4, dt / 6.0);
        out
    }
}

/// Integration scheme selector, as named in configuration files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// Rectangular / explicit Euler (1 derivative call per step).
    #[serde(alias = "euler_rect")]
    Euler,
    /// Midpoint Runge-Kutta (2 derivative calls per step).
    Rk2,
    /// Classical Runge-Kutta (default, 4 derivative calls per step).
    #[default]
    Rk4,
}

impl IntegratorKind {
    pub fn derivative_calls(self) -> usize {
        match self {
            IntegratorKind::Euler => 1,
            IntegratorKind::Rk2 => 2,
            IntegratorKind::Rk4 => 4,
        }
    }
}

/// A derivative model bound to an integration scheme.
///
/// The model is supplied once at construction and never re-bound; switching
/// scheme does not touch the model.
#[derive(Debug)]
pub struct Integrator<M> {
    kind: IntegratorKind,
    model: M,
}

impl<M: DerivativeModel> Integrator<M> {
    pub fn new(kind: IntegratorKind, model: M) -> Self {
        Self { kind, model }
    }

    pub fn kind(&self) -> IntegratorKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: IntegratorKind) {
        self.kind = kind;
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// Advance `x` in place by `dt`. No-op when `dt <= 0`.
    pub fn integrate(&mut self, dt: f64, x: &mut StateVector) {
        if !(dt > 0.0) {
            return;
        }
        let mut next = match self.kind {
            IntegratorKind::Euler => EulerRect.step(&mut self.model, x, dt),
            IntegratorKind::Rk2 => RungeKutta2.step(&mut self.model, x, dt),
            IntegratorKind::Rk4 => RungeKutta4.step(&mut self.model, x, dt),
        };
        self.model.project(&mut next);
        x.assign(&next);
    }
}

/// Two-phase construction for callers that create the model separately.
#[derive(Debug)]
pub struct IntegratorBuilder<M> {
    kind: IntegratorKind,
    model: Option<M>,
}

impl<M> Default for IntegratorBuilder<M> {
    fn default() -> Self {
        Self {
            kind: IntegratorKind::default(),
            model: None,
        }
    }
}

impl<M: DerivativeModel> IntegratorBuilder<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: IntegratorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn model(mut self, model: M) -> Self {
        self.model = Some(model);
        self
    }

    /// # Errors
    ///
    /// `NullPointer` if no derivative model was supplied.
    pub fn build(self) -> FdmResult<Integrator<M>> {
        let model = self
            .model
            .ok_or_else(|| FdmError::null_pointer("integrator derivative model is not set"))?;
        debug!(kind = ?self.kind, "integrator bound");
        Ok(Integrator::new(self.kind, model))
    }
}
