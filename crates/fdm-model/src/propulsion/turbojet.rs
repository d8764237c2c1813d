//! Single-spool turbojet.
//!
//! The spin state is the spool fraction `n` in `[0, 1]`, following a
//! first-order lag towards the commanded spool speed. Thrust scales with
//! `n^4` and a lapse table over altitude and Mach.

use fdm_config::TurbojetDef;
use fdm_core::{FdmError, FdmResult, Table2D};
use nalgebra::Vector3;

use super::{EngineInputs, EngineModel, EngineStatus};
use crate::traits::{ForceContext, ForceMoment};

/// Fraction of the starter spool speed at which light-off happens.
const LIGHT_OFF_FRACTION: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct Turbojet {
    position: Vector3<f64>,
    max_thrust: f64,
    thrust_lapse: Table2D,
    time_constant: f64,
    idle_spool: f64,
    starter_spool: f64,
    tsfc: f64,
    rpm_max: f64,

    running: bool,
    status: EngineStatus,
}

impl Turbojet {
    pub fn new(def: &TurbojetDef) -> FdmResult<Self> {
        if !(def.spool_time_constant > 0.0) {
            return Err(FdmError::invalid_arg("turbojet spool time constant must be positive"));
        }
        Ok(Self {
            position: Vector3::from(def.position),
            max_thrust: def.max_thrust,
            thrust_lapse: def.thrust_lapse.to_table()?,
            time_constant: def.spool_time_constant,
            idle_spool: def.idle_spool,
            starter_spool: def.starter_spool,
            tsfc: def.thrust_specific_fuel_consumption,
            rpm_max: def.rpm_max,
            running: false,
            status: EngineStatus::default(),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Commanded spool fraction.
    fn command(&self, burning: bool, inputs: &EngineInputs) -> f64 {
        if burning {
            self.idle_spool + (1.0 - self.idle_spool) * inputs.throttle
        } else if inputs.starter {
            self.starter_spool
        } else {
            0.0
        }
    }
}

impl EngineModel for Turbojet {
    fn kind(&self) -> &'static str {
        "turbojet"
    }

    fn position(&self) -> Vector3<f64> {
        self.position
    }

    fn evaluate(&mut self, ctx: &ForceContext<'_>, inputs: &EngineInputs, x: f64) -> (ForceMoment, f64) {
        let n = x.clamp(0.0, 1.0);
        let burning = self.running && inputs.fuel && ctx.fuel_available;
        let rate = (self.command(burning, inputs) - n) / self.time_constant;

        let thrust = if burning {
            self.max_thrust * self.thrust_lapse.value(ctx.altitude_asl, ctx.air.mach) * n.powi(4)
        } else {
            0.0
        };
        self.status = EngineStatus {
            running: self.running,
            rpm: n * self.rpm_max,
            thrust,
            power: 0.0,
            torque: 0.0,
            fuel_flow: self.tsfc * thrust,
            pitch: 0.0,
        };
        (
            ForceMoment::at_point(Vector3::new(thrust, 0.0, 0.0), &self.position),
            rate,
        )
    }

    fn post_step(&mut self, _dt: f64, inputs: &EngineInputs, x: f64, fuel_available: bool) {
        let fuelled = inputs.fuel && fuel_available;
        if self.running {
            if !fuelled {
                self.running = false;
            }
        } else if fuelled && inputs.ignition && x >= LIGHT_OFF_FRACTION * self.starter_spool {
            self.running = true;
        }
    }

    fn start_running(&mut self) -> f64 {
        self.running = true;
        self.idle_spool
    }

    fn clamp_state(&self, x: f64) -> f64 {
        x.clamp(0.0, 1.0)
    }

    fn status(&self) -> EngineStatus {
        self.status
    }

    fn reinitialize(&mut self) {
        self.running = false;
        self.status = EngineStatus::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air_data::AirData;
    use crate::environment::Atmosphere;
    use approx::assert_relative_eq;
    use fdm_config::Table2DDef;
    use nalgebra::UnitQuaternion;

    fn def() -> TurbojetDef {
        TurbojetDef {
            name: "jet".into(),
            position: [-2.0, 0.0, 0.5],
            max_thrust: 12_000.0,
            thrust_lapse: Table2DDef {
                rows: vec![0.0, 10_000.0],
                cols: vec![0.0, 0.8],
                values: vec![vec![1.0, 0.9], vec![0.4, 0.35]],
            },
            spool_time_constant: 1.5,
            idle_spool: 0.55,
            starter_spool: 0.25,
            thrust_specific_fuel_consumption: 2.5e-5,
            rpm_max: 20_000.0,
        }
    }

    fn inputs(throttle: f64) -> EngineInputs {
        EngineInputs {
            throttle,
            mixture: 1.0,
            propeller: 1.0,
            fuel: true,
            ignition: true,
            starter: false,
        }
    }

    fn evaluate(engine: &mut Turbojet, inputs: &EngineInputs, altitude: f64, n: f64) -> (ForceMoment, f64) {
        let atmosphere = Atmosphere::default().at_altitude(altitude);
        let air = AirData::compute(Vector3::zeros(), &Vector3::zeros(), &atmosphere, 10.0, 1.5);
        let ctx = ForceContext {
            air: &air,
            atmosphere: &atmosphere,
            q_bn: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            omega: Vector3::zeros(),
            cg: Vector3::zeros(),
            altitude_asl: altitude,
            altitude_agl: altitude,
            extra: &[],
            fuel_available: true,
        };
        engine.evaluate(&ctx, inputs, n)
    }

    #[test]
    fn full_spool_static_thrust() {
        let mut engine = Turbojet::new(&def()).unwrap();
        engine.start_running();
        let (load, rate) = evaluate(&mut engine, &inputs(1.0), 0.0, 1.0);
        assert_relative_eq!(load.force.x, 12_000.0);
        assert_relative_eq!(rate, 0.0);
        // thrust line below the origin pitches the nose up
        assert!(load.moment.y > 0.0);
        assert_relative_eq!(engine.status().fuel_flow, 0.3, epsilon = 1e-12);
        assert_relative_eq!(engine.status().rpm, 20_000.0);
    }

    #[test]
    fn thrust_lapses_with_altitude() {
        let mut engine = Turbojet::new(&def()).unwrap();
        engine.start_running();
        let (load, _) = evaluate(&mut engine, &inputs(1.0), 5_000.0, 1.0);
        assert_relative_eq!(load.force.x, 12_000.0 * 0.7, max_relative = 1e-12);
    }

    #[test]
    fn spool_lags_towards_throttle_command() {
        let mut engine = Turbojet::new(&def()).unwrap();
        engine.start_running();
        let (_, rate) = evaluate(&mut engine, &inputs(1.0), 0.0, 0.55);
        assert_relative_eq!(rate, 0.45 / 1.5, epsilon = 1e-12);
        let (_, rate) = evaluate(&mut engine, &inputs(0.0), 0.0, 0.8);
        assert_relative_eq!(rate, -0.25 / 1.5, epsilon = 1e-12);
    }

    #[test]
    fn start_sequence() {
        let mut engine = Turbojet::new(&def()).unwrap();
        let mut crank = inputs(0.0);
        crank.starter = true;
        let (load, rate) = evaluate(&mut engine, &crank, 0.0, 0.0);
        assert_eq!(load.force.x, 0.0);
        assert_relative_eq!(rate, 0.25 / 1.5, epsilon = 1e-12);

        engine.post_step(0.01, &crank, 0.1, true);
        assert!(!engine.is_running());
        engine.post_step(0.01, &crank, 0.21, true);
        assert!(engine.is_running());

        engine.post_step(0.01, &crank, 0.5, false);
        assert!(!engine.is_running());
    }
}
