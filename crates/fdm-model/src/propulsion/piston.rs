//! Piston engine driving a propeller.
//!
//! The spin state is the shaft speed `w` (rad/s):
//!
//! ```text
//! I dw/dt = Q_engine + Q_starter - Q_prop - f w
//! ```
//!
//! Shaft power lapses with density through the Gagg-Ferrar factor and with
//! the mixture setting. Propeller thrust and torque come from `CT(J, pitch)`
//! and `CP(J, pitch)` tables.

use std::f64::consts::TAU;

use fdm_config::{GovernorDef, PistonDef};
use fdm_controls::{Element, Pid};
use fdm_core::{FdmError, FdmResult, Table2D};
use nalgebra::Vector3;

use super::{EngineInputs, EngineModel, EngineStatus};
use crate::traits::{ForceContext, ForceMoment};

/// Mixture below which combustion stops.
const MIN_MIXTURE: f64 = 0.05;
/// Mixture setting giving best power.
const BEST_POWER_MIXTURE: f64 = 0.85;
/// Fraction of idle rpm at which a cranking engine catches.
const START_FRACTION: f64 = 0.5;
/// Fraction of idle rpm below which a running engine stalls.
const STALL_FRACTION: f64 = 0.25;
/// Propeller speed (rev/s) below which the advance ratio is taken as zero.
const MIN_PROP_SPEED: f64 = 0.5;

fn rpm_to_rad(rpm: f64) -> f64 {
    rpm * TAU / 60.0
}

/// Gagg-Ferrar power lapse with density ratio `sigma`.
pub fn altitude_factor(sigma: f64) -> f64 {
    (1.132 * sigma - 0.132).max(0.0)
}

/// Power fraction for a mixture setting in `[0, 1]`.
pub fn mixture_factor(mixture: f64) -> f64 {
    if mixture < MIN_MIXTURE {
        return 0.0;
    }
    (1.0 - 2.0 * (mixture - BEST_POWER_MIXTURE).powi(2)).max(0.0)
}

#[derive(Debug, Clone)]
struct Governor {
    rpm_min: f64,
    rpm_max: f64,
    pid: Pid,
}

impl Governor {
    fn new(def: &GovernorDef, pitch_min: f64, pitch_max: f64) -> FdmResult<Self> {
        let mut pid = Pid::new(def.kp, def.ki, def.kd).with_saturation(pitch_min, pitch_max)?;
        pid.set_value(pitch_min);
        Ok(Self {
            rpm_min: def.rpm_min,
            rpm_max: def.rpm_max,
            pid,
        })
    }

    fn target(&self, lever: f64) -> f64 {
        self.rpm_min + lever.clamp(0.0, 1.0) * (self.rpm_max - self.rpm_min)
    }
}

#[derive(Debug, Clone)]
pub struct PistonEngine {
    position: Vector3<f64>,
    max_power: f64,
    idle_power_fraction: f64,
    omega_idle: f64,
    inertia: f64,
    friction: f64,
    starter_torque: f64,
    sfc: f64,
    diameter: f64,
    rotation: f64,
    pitch_min: f64,
    thrust_coefficient: Table2D,
    power_coefficient: Table2D,
    governor: Option<Governor>,

    running: bool,
    pitch: f64,
    status: EngineStatus,
}

impl PistonEngine {
    pub fn new(def: &PistonDef) -> FdmResult<Self> {
        if !(def.inertia > 0.0) {
            return Err(FdmError::invalid_arg("piston engine inertia must be positive"));
        }
        let prop = &def.propeller;
        let governor = prop
            .governor
            .as_ref()
            .map(|g| Governor::new(g, prop.pitch_min_deg, prop.pitch_max_deg))
            .transpose()?;
        Ok(Self {
            position: Vector3::from(def.position),
            max_power: def.max_power,
            idle_power_fraction: def.idle_power_fraction,
            omega_idle: rpm_to_rad(def.rpm_idle),
            inertia: def.inertia,
            friction: def.friction,
            starter_torque: def.starter_torque,
            sfc: def.specific_fuel_consumption,
            diameter: prop.diameter,
            rotation: prop.rotation,
            pitch_min: prop.pitch_min_deg,
            thrust_coefficient: prop.thrust_coefficient.to_table()?,
            power_coefficient: prop.power_coefficient.to_table()?,
            governor,
            running: false,
            pitch: prop.pitch_min_deg,
            status: EngineStatus {
                pitch: prop.pitch_min_deg,
                ..EngineStatus::default()
            },
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn can_run(inputs: &EngineInputs, fuel_available: bool) -> bool {
        inputs.fuel && inputs.ignition && inputs.mixture >= MIN_MIXTURE && fuel_available
    }

    /// Shaft power (W) for the given inputs and density ratio.
    pub fn shaft_power(&self, inputs: &EngineInputs, sigma: f64) -> f64 {
        let throttle = self.idle_power_fraction + (1.0 - self.idle_power_fraction) * inputs.throttle;
        self.max_power * throttle * altitude_factor(sigma) * mixture_factor(inputs.mixture)
    }
}

impl EngineModel for PistonEngine {
    fn kind(&self) -> &'static str {
        "piston"
    }

    fn position(&self) -> Vector3<f64> {
        self.position
    }

    fn evaluate(&mut self, ctx: &ForceContext<'_>, inputs: &EngineInputs, x: f64) -> (ForceMoment, f64) {
        let omega = x.max(0.0);
        let atm = ctx.atmosphere;
        let burning = self.running && Self::can_run(inputs, ctx.fuel_available);

        let power = if burning {
            self.shaft_power(inputs, atm.density_ratio())
        } else {
            0.0
        };
        let engine_torque = power / omega.max(self.omega_idle);
        let starter = if inputs.starter && omega < self.omega_idle {
            self.starter_torque
        } else {
            0.0
        };

        let n = omega / TAU;
        let d = self.diameter;
        let advance = if n > MIN_PROP_SPEED {
            (ctx.air.velocity.x / (n * d)).max(0.0)
        } else {
            0.0
        };
        let ct = self.thrust_coefficient.value(advance, self.pitch);
        let cp = self.power_coefficient.value(advance, self.pitch);
        let rho_n2 = atm.density * n * n;
        let thrust = ct * rho_n2 * d.powi(4);
        let prop_torque = cp * rho_n2 * d.powi(5) / TAU;

        let mut rate = (engine_torque + starter - prop_torque - self.friction * omega) / self.inertia;
        if omega <= 0.0 && rate < 0.0 {
            rate = 0.0;
        }

        let mut load = ForceMoment::at_point(Vector3::new(thrust, 0.0, 0.0), &self.position);
        load.moment.x -= self.rotation * (engine_torque + starter);

        self.status = EngineStatus {
            running: self.running,
            rpm: omega * 60.0 / TAU,
            thrust,
            power,
            torque: engine_torque,
            fuel_flow: self.sfc * power,
            pitch: self.pitch,
        };
        (load, rate)
    }

    fn post_step(&mut self, dt: f64, inputs: &EngineInputs, x: f64, fuel_available: bool) {
        let omega = x.max(0.0);
        let can_run = Self::can_run(inputs, fuel_available);
        if self.running {
            if !can_run || omega < STALL_FRACTION * self.omega_idle {
                self.running = false;
            }
        } else if can_run && omega >= START_FRACTION * self.omega_idle {
            self.running = true;
        }

        if let Some(gov) = &mut self.governor {
            let rpm = omega * 60.0 / TAU;
            gov.pid.update(dt, rpm - gov.target(inputs.propeller));
            self.pitch = gov.pid.value();
        }
    }

    fn start_running(&mut self) -> f64 {
        self.running = true;
        self.omega_idle
    }

    fn status(&self) -> EngineStatus {
        self.status
    }

    fn reinitialize(&mut self) {
        self.running = false;
        self.pitch = self.pitch_min;
        if let Some(gov) = &mut self.governor {
            gov.pid.set_value(self.pitch_min);
        }
        self.status = EngineStatus {
            pitch: self.pitch_min,
            ..EngineStatus::default()
        };
    }
}
