//! Capability interfaces the aircraft is composed from.

use fdm_core::DataBus;
use nalgebra::{UnitQuaternion, Vector3};

use crate::air_data::AirData;
use crate::environment::AtmosphereState;

/// Body-axis force and moment about the body origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceMoment {
    pub force: Vector3<f64>,
    pub moment: Vector3<f64>,
}

impl Default for ForceMoment {
    fn default() -> Self {
        Self::zero()
    }
}

impl ForceMoment {
    pub fn zero() -> Self {
        Self {
            force: Vector3::zeros(),
            moment: Vector3::zeros(),
        }
    }

    /// A force applied at body point `at`.
    pub fn at_point(force: Vector3<f64>, at: &Vector3<f64>) -> Self {
        Self {
            force,
            moment: at.cross(&force),
        }
    }
}

impl std::ops::AddAssign for ForceMoment {
    fn add_assign(&mut self, rhs: Self) {
        self.force += rhs.force;
        self.moment += rhs.moment;
    }
}

impl std::ops::Add for ForceMoment {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

/// Everything a force model may read about the current state.
#[derive(Debug, Clone, Copy)]
pub struct ForceContext<'a> {
    pub air: &'a AirData,
    pub atmosphere: &'a AtmosphereState,
    /// Body to NED attitude.
    pub q_bn: UnitQuaternion<f64>,
    /// Earth-relative velocity, body axes.
    pub velocity: Vector3<f64>,
    /// Earth-relative angular velocity, body axes.
    pub omega: Vector3<f64>,
    /// Centre of gravity, body axes.
    pub cg: Vector3<f64>,
    pub altitude_asl: f64,
    /// Height of the body origin above the terrain.
    pub altitude_agl: f64,
    /// Slice of the state vector owned by the subsystem.
    pub extra: &'a [f64],
    /// Whether any fuel is left on board.
    pub fuel_available: bool,
}

/// Produces a force and moment from the current state.
pub trait ForceContributor {
    fn compute_force_and_moment(&mut self, ctx: &ForceContext<'_>, bus: &DataBus) -> ForceMoment;
}

/// Maps pilot inputs on the bus to actuator positions.
pub trait ControlChannelMapper {
    fn map_channels(&mut self, dt: f64, bus: &mut DataBus);
}

/// Subsystem state integrated alongside the rigid-body state.
pub trait ExtraStates {
    fn extra_count(&self) -> usize;

    /// Fill `out` (length [`extra_count`](Self::extra_count)) with the initial values.
    fn initial_extra(&self, out: &mut [f64]);

    /// Rates of the extra states, as evaluated by the last force computation.
    fn extra_derivatives(&self, out: &mut [f64]);

    /// Pull integrated values back into their admissible range.
    fn project_extra(&self, _x: &mut [f64]) {}
}

/// Common lifecycle of every subsystem.
pub trait Subsystem {
    fn name(&self) -> &'static str;

    /// Clear element memory and accumulated results back to the state right
    /// after construction.
    fn reinitialize(&mut self);

    /// Write telemetry under `output/`.
    fn publish(&self, _bus: &mut DataBus) {}
}
