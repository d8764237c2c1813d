//! Table-based stability-derivative aerodynamic model.
//!
//! Lift, drag and side force coefficients are built in stability axes:
//!
//! ```text
//! CL = CL(a) + CL_de de + CL_q q^ + CL_flaps flaps
//! CD = CD(a) + CD_de |de| + CD_flaps flaps + CD_gear gear + CD_ab airbrake + CD_b2 b^2
//! CY = CY_b b + CY_dr dr + CY_p p^ + CY_r r^
//! ```
//!
//! and rotated into body axes through the angle of attack. Rolling, pitching
//! and yawing moment coefficients are body-axis quantities about the moment
//! reference point.

use fdm_config::{AeroDef, AeroDerivatives};
use fdm_core::{DataBus, DataRef, FdmResult, ResultExt, Table1D};
use nalgebra::Vector3;

use crate::paths;
use crate::traits::{ForceContext, ForceContributor, ForceMoment, Subsystem};

#[derive(Debug, Clone, Copy)]
struct SurfaceRefs {
    aileron: DataRef,
    elevator: DataRef,
    rudder: DataRef,
    flaps: DataRef,
    airbrake: DataRef,
    landing_gear: DataRef,
}

/// Coefficients of the last evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AeroCoefficients {
    pub lift: f64,
    pub drag: f64,
    pub side: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

#[derive(Debug, Clone)]
pub struct Aerodynamics {
    wing_area: f64,
    wing_span: f64,
    mean_chord: f64,
    moment_reference: Vector3<f64>,
    lift: Table1D,
    drag: Table1D,
    pitch_moment: Table1D,
    d: AeroDerivatives,
    surfaces: SurfaceRefs,
    last: AeroCoefficients,
    last_load: ForceMoment,
}

impl Aerodynamics {
    pub fn new(def: &AeroDef, bus: &mut DataBus) -> FdmResult<Self> {
        let mut bind = |name: &str| {
            bus.add_value(&paths::actuator(name))
                .with_context(|| format!("binding aerodynamics to '{name}'"))
        };
        let surfaces = SurfaceRefs {
            aileron: bind("aileron")?,
            elevator: bind("elevator")?,
            rudder: bind("rudder")?,
            flaps: bind("flaps")?,
            airbrake: bind("airbrake")?,
            landing_gear: bind("landing_gear")?,
        };
        Ok(Self {
            wing_area: def.wing_area,
            wing_span: def.wing_span,
            mean_chord: def.mean_chord,
            moment_reference: Vector3::from(def.moment_reference),
            lift: def.lift.to_table().context("aerodynamics lift table")?,
            drag: def.drag.to_table().context("aerodynamics drag table")?,
            pitch_moment: def
                .pitch_moment
                .to_table()
                .context("aerodynamics pitch moment table")?,
            d: def.derivatives,
            surfaces,
            last: AeroCoefficients::default(),
            last_load: ForceMoment::zero(),
        })
    }

    pub fn wing_span(&self) -> f64 {
        self.wing_span
    }

    pub fn mean_chord(&self) -> f64 {
        self.mean_chord
    }

    pub fn coefficients(&self) -> AeroCoefficients {
        self.last
    }

    pub fn last_load(&self) -> ForceMoment {
        self.last_load
    }

    /// Stability-axis force and body-axis moment coefficients.
    pub fn coefficients_at(
        &self,
        alpha: f64,
        beta: f64,
        rates: [f64; 3],
        surfaces: [f64; 6],
    ) -> AeroCoefficients {
        let d = &self.d;
        let [p_hat, q_hat, r_hat] = rates;
        let [aileron, elevator, rudder, flaps, airbrake, gear] = surfaces;
        AeroCoefficients {
            lift: self.lift.value(alpha)
                + d.lift_elevator * elevator
                + d.lift_q * q_hat
                + d.lift_flaps * flaps,
            drag: self.drag.value(alpha)
                + d.drag_elevator * elevator.abs()
                + d.drag_flaps * flaps
                + d.drag_gear * gear
                + d.drag_airbrake * airbrake
                + d.drag_beta2 * beta * beta,
            side: d.side_beta * beta + d.side_rudder * rudder + d.side_p * p_hat + d.side_r * r_hat,
            roll: d.roll_beta * beta
                + d.roll_p * p_hat
                + d.roll_r * r_hat
                + d.roll_aileron * aileron
                + d.roll_rudder * rudder,
            pitch: self.pitch_moment.value(alpha)
                + d.pitch_elevator * elevator
                + d.pitch_q * q_hat
                + d.pitch_flaps * flaps,
            yaw: d.yaw_beta * beta
                + d.yaw_p * p_hat
                + d.yaw_r * r_hat
                + d.yaw_aileron * aileron
                + d.yaw_rudder * rudder,
        }
    }
}

impl ForceContributor for Aerodynamics {
    fn compute_force_and_moment(&mut self, ctx: &ForceContext<'_>, bus: &DataBus) -> ForceMoment {
        let air = ctx.air;
        if air.dynamic_pressure <= 0.0 {
            self.last = AeroCoefficients::default();
            self.last_load = ForceMoment::zero();
            return self.last_load;
        }
        let s = &self.surfaces;
        let surfaces = [
            bus.get(s.aileron),
            bus.get(s.elevator),
            bus.get(s.rudder),
            bus.get(s.flaps),
            bus.get(s.airbrake),
            bus.get(s.landing_gear),
        ];
        let c = self.coefficients_at(air.alpha, air.beta, [air.p_hat, air.q_hat, air.r_hat], surfaces);

        let qs = air.dynamic_pressure * self.wing_area;
        let lift = qs * c.lift;
        let drag = qs * c.drag;
        let (sin_a, cos_a) = air.alpha.sin_cos();
        let force = Vector3::new(
            -drag * cos_a + lift * sin_a,
            qs * c.side,
            -drag * sin_a - lift * cos_a,
        );
        let moment_ref = Vector3::new(
            qs * self.wing_span * c.roll,
            qs * self.mean_chord * c.pitch,
            qs * self.wing_span * c.yaw,
        );
        let load = ForceMoment {
            force,
            moment: moment_ref + self.moment_reference.cross(&force),
        };
        self.last = c;
        self.last_load = load;
        load
    }
}

impl Subsystem for Aerodynamics {
    fn name(&self) -> &'static str {
        "aerodynamics"
    }

    fn reinitialize(&mut self) {
        self.last = AeroCoefficients::default();
        self.last_load = ForceMoment::zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air_data::AirData;
    use crate::environment::Atmosphere;
    use approx::assert_relative_eq;
    use fdm_config::TableDef;
    use nalgebra::UnitQuaternion;

    fn def() -> AeroDef {
        AeroDef {
            wing_area: 16.0,
            wing_span: 10.0,
            mean_chord: 1.6,
            moment_reference: [0.0; 3],
            lift: TableDef {
                keys: vec![-0.2, 0.0, 0.2],
                values: vec![-0.7, 0.3, 1.3],
            },
            drag: TableDef {
                keys: vec![0.0],
                values: vec![0.03],
            },
            pitch_moment: TableDef {
                keys: vec![-0.2, 0.2],
                values: vec![0.2, -0.2],
            },
            derivatives: AeroDerivatives {
                pitch_elevator: -1.2,
                roll_aileron: 0.2,
                ..AeroDerivatives::default()
            },
        }
    }

    fn load(aero: &mut Aerodynamics, bus: &DataBus, velocity: Vector3<f64>) -> ForceMoment {
        let atmosphere = Atmosphere::default().at_altitude(0.0);
        let air = AirData::compute(velocity, &Vector3::zeros(), &atmosphere, 10.0, 1.6);
        let ctx = ForceContext {
            air: &air,
            atmosphere: &atmosphere,
            q_bn: UnitQuaternion::identity(),
            velocity,
            omega: Vector3::zeros(),
            cg: Vector3::zeros(),
            altitude_asl: 0.0,
            altitude_agl: 100.0,
            extra: &[],
            fuel_available: true,
        };
        aero.compute_force_and_moment(&ctx, bus)
    }

    #[test]
    fn zero_alpha_lift_and_drag() {
        let mut bus = DataBus::new();
        let mut aero = Aerodynamics::new(&def(), &mut bus).unwrap();
        let fm = load(&mut aero, &bus, Vector3::new(50.0, 0.0, 0.0));
        let qs = 0.5 * 1.225 * 2500.0 * 16.0;
        assert_relative_eq!(fm.force.x, -qs * 0.03, max_relative = 1e-6);
        assert_relative_eq!(fm.force.z, -qs * 0.3, max_relative = 1e-6);
        assert_relative_eq!(fm.force.y, 0.0);
        assert_relative_eq!(aero.coefficients().lift, 0.3);
    }

    #[test]
    fn surfaces_produce_moments() {
        let mut bus = DataBus::new();
        let mut aero = Aerodynamics::new(&def(), &mut bus).unwrap();
        bus.set_value("controls/elevator", -0.1).unwrap();
        bus.set_value("controls/aileron", 0.1).unwrap();
        let fm = load(&mut aero, &bus, Vector3::new(50.0, 0.0, 0.0));
        // nose up from trailing-edge-up elevator, right roll from aileron
        assert!(fm.moment.y > 0.0);
        assert!(fm.moment.x > 0.0);
        assert_relative_eq!(aero.coefficients().pitch, 0.12, epsilon = 1e-12);
    }

    #[test]
    fn no_load_at_rest() {
        let mut bus = DataBus::new();
        let mut aero = Aerodynamics::new(&def(), &mut bus).unwrap();
        let fm = load(&mut aero, &bus, Vector3::zeros());
        assert_eq!(fm, ForceMoment::zero());
    }

    #[test]
    fn moment_transfer_from_reference_point() {
        let mut bus = DataBus::new();
        let mut shifted = def();
        shifted.moment_reference = [0.5, 0.0, 0.0];
        let mut aero = Aerodynamics::new(&shifted, &mut bus).unwrap();
        let fm = load(&mut aero, &bus, Vector3::new(50.0, 0.0, 0.0));
        // lift acting ahead of the origin pitches the nose up; Cm(0) = 0
        assert!(fm.moment.y > 0.0);
        assert_relative_eq!(fm.moment.y, 0.5 * -fm.force.z, max_relative = 1e-9);
    }
}
