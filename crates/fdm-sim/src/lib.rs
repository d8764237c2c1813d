//! Numerical integration for the flight dynamics engine.
//!
//! Provides:
//! - `StateVector`, a fixed-length state container
//! - `DerivativeModel`, the pluggable `x_dot = f(x)` interface
//! - fixed-step explicit schemes (rectangular Euler, RK2 midpoint, classical RK4)
//! - `Integrator`, which binds one model to one scheme at construction

pub mod integrator;
pub mod model;
pub mod state;

pub use integrator::{
    EulerRect, Integrator, IntegratorBuilder, IntegratorKind, RungeKutta2, RungeKutta4, Scheme,
};
pub use model::{DerivativeModel, FnModel};
pub use state::StateVector;
