//! Rigid-body equations of motion.
//!
//! State layout:
//!
//! ```text
//! [0..3)   position        NED from the origin (flat) or ECEF (wgs84), m
//! [3..7)   attitude        quaternion w, x, y, z, body to NED (flat) or ECEF (wgs84)
//! [7..10)  velocity        earth-relative, body axes, m/s
//! [10..13) angular rate    inertial, body axes, rad/s
//! [13..)   extra states    engine spin states
//! ```
//!
//! Newton-Euler in body axes about the centre of gravity:
//!
//! ```text
//! v_dot = F/m + g_b - (w + w_ie) x v
//! w_dot = I^-1 (M_cg - w x I w)          M_cg = M_o - r_cg x F
//! q_dot = 1/2 q (0, w - w_ie)
//! p_dot = q v
//! ```

use fdm_config::{AircraftDef, ConfigError, validate_aircraft};
use fdm_core::units::wrap_two_pi;
use fdm_core::{DataBus, DataRef, FdmError, FdmResult, ResultExt};
use fdm_sim::{DerivativeModel, StateVector};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use tracing::debug;

use crate::aerodynamics::Aerodynamics;
use crate::air_data::AirData;
use crate::controls::Controls;
use crate::environment::{AtmosphereState, Environment, G0};
use crate::io::FlightOut;
use crate::landing_gear::LandingGear;
use crate::mass::Mass;
use crate::nav::{Geodetic, Navigation};
use crate::paths;
use crate::propulsion::Propulsion;
use crate::traits::{ControlChannelMapper, ExtraStates, ForceContext, ForceContributor, ForceMoment, Subsystem};

pub const POSITION: usize = 0;
pub const ATTITUDE: usize = 3;
pub const VELOCITY: usize = 7;
pub const ANGULAR_RATE: usize = 10;
/// Number of rigid-body states ahead of the extra states.
pub const RIGID_BODY_STATES: usize = 13;

/// Intermediate results of the last derivative evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub geodetic: Geodetic,
    pub altitude_agl: f64,
    /// Body to NED.
    pub q_bn: UnitQuaternion<f64>,
    pub atmosphere: AtmosphereState,
    pub air: AirData,
    pub velocity_ned: Vector3<f64>,
    /// Earth-relative body rates.
    pub omega: Vector3<f64>,
    pub angular_acceleration: Vector3<f64>,
    /// Non-gravitational force per unit mass, body axes.
    pub specific_force: Vector3<f64>,
    pub gravity: f64,
    pub load: ForceMoment,
}

impl Snapshot {
    fn at_rest(atmosphere: AtmosphereState) -> Self {
        Self {
            geodetic: Geodetic::default(),
            altitude_agl: 0.0,
            q_bn: UnitQuaternion::identity(),
            atmosphere,
            air: AirData::default(),
            velocity_ned: Vector3::zeros(),
            omega: Vector3::zeros(),
            angular_acceleration: Vector3::zeros(),
            specific_force: Vector3::zeros(),
            gravity: 0.0,
            load: ForceMoment::zero(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FlightRefs {
    roll: DataRef,
    pitch: DataRef,
    heading: DataRef,
    p: DataRef,
    q: DataRef,
    r: DataRef,
    alpha: DataRef,
    beta: DataRef,
    true_airspeed: DataRef,
    indicated_airspeed: DataRef,
    mach: DataRef,
    altitude_asl: DataRef,
    altitude_agl: DataRef,
    vertical_speed: DataRef,
    load_factor: DataRef,
}

impl FlightRefs {
    fn bind(bus: &mut DataBus) -> FdmResult<Self> {
        let mut bind = |name: &str| bus.add_value(&paths::flight_output(name));
        Ok(Self {
            roll: bind("roll")?,
            pitch: bind("pitch")?,
            heading: bind("heading")?,
            p: bind("p")?,
            q: bind("q")?,
            r: bind("r")?,
            alpha: bind("alpha")?,
            beta: bind("beta")?,
            true_airspeed: bind("true_airspeed")?,
            indicated_airspeed: bind("indicated_airspeed")?,
            mach: bind("mach")?,
            altitude_asl: bind("altitude_asl")?,
            altitude_agl: bind("altitude_agl")?,
            vertical_speed: bind("vertical_speed")?,
            load_factor: bind("load_factor")?,
        })
    }

    fn publish(&self, f: &FlightOut, bus: &mut DataBus) {
        bus.set(self.roll, f.roll);
        bus.set(self.pitch, f.pitch);
        bus.set(self.heading, f.heading);
        bus.set(self.p, f.roll_rate);
        bus.set(self.q, f.pitch_rate);
        bus.set(self.r, f.yaw_rate);
        bus.set(self.alpha, f.angle_of_attack);
        bus.set(self.beta, f.sideslip);
        bus.set(self.true_airspeed, f.true_airspeed);
        bus.set(self.indicated_airspeed, f.indicated_airspeed);
        bus.set(self.mach, f.mach);
        bus.set(self.altitude_asl, f.altitude_asl);
        bus.set(self.altitude_agl, f.altitude_agl);
        bus.set(self.vertical_speed, f.vertical_speed);
        bus.set(self.load_factor, f.load_factor);
    }
}

/// The aircraft as a derivative model: subsystems and the data bus they
/// are bound to.
#[derive(Debug)]
pub struct AircraftModel {
    bus: DataBus,
    nav: Navigation,
    environment: Environment,
    aerodynamics: Option<Aerodynamics>,
    propulsion: Propulsion,
    gear: LandingGear,
    mass: Mass,
    controls: Controls,
    flight_refs: FlightRefs,
    span: f64,
    chord: f64,
    snapshot: Snapshot,
}

impl AircraftModel {
    /// Bind every subsystem of `def` to a fresh bus. The flat frame is
    /// anchored at `origin` (latitude, longitude in rad).
    ///
    /// `def` is validated before anything is bound.
    pub fn new(def: &AircraftDef, origin: (f64, f64)) -> FdmResult<Self> {
        validate_aircraft(def).map_err(|source| {
            FdmError::from(ConfigError::Validation {
                file: def.name.clone(),
                source,
            })
        })?;
        let mut bus = DataBus::new();
        for name in paths::CONTROL_INPUTS {
            bus.add_value(&paths::control_input(name))?;
        }
        for name in paths::ACTUATORS {
            bus.add_value(&paths::actuator(name))?;
        }
        let flight_refs = FlightRefs::bind(&mut bus)?;

        let environment = Environment::new(&def.environment, &mut bus).context("initializing environment")?;
        let mass = Mass::new(&def.mass, &mut bus).context("initializing mass")?;
        let aerodynamics = def
            .aerodynamics
            .as_ref()
            .map(|a| Aerodynamics::new(a, &mut bus))
            .transpose()
            .context("initializing aerodynamics")?;
        let propulsion =
            Propulsion::new(&def.propulsion.engines, &mut bus).context("initializing propulsion")?;
        let gear = LandingGear::new(&def.landing_gear, &mut bus).context("initializing landing gear")?;
        let controls = Controls::new(&def.controls.channels, &mut bus).context("initializing controls")?;

        let (span, chord) = aerodynamics
            .as_ref()
            .map(|a| (a.wing_span(), a.mean_chord()))
            .unwrap_or((1.0, 1.0));
        let snapshot = Snapshot::at_rest(environment.atmosphere().at_altitude(0.0));
        debug!(
            aircraft = %def.name,
            nodes = bus.len(),
            engines = propulsion.len(),
            wheels = gear.wheel_count(),
            "aircraft model bound"
        );
        Ok(Self {
            bus,
            nav: Navigation::new(def.navigation, origin.0, origin.1),
            environment,
            aerodynamics,
            propulsion,
            gear,
            mass,
            controls,
            flight_refs,
            span,
            chord,
            snapshot,
        })
    }

    pub fn state_len(&self) -> usize {
        RIGID_BODY_STATES + self.propulsion.extra_count()
    }

    pub fn bus(&self) -> &DataBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut DataBus {
        &mut self.bus
    }

    pub fn navigation(&self) -> &Navigation {
        &self.nav
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn aerodynamics(&self) -> Option<&Aerodynamics> {
        self.aerodynamics.as_ref()
    }

    pub fn propulsion(&self) -> &Propulsion {
        &self.propulsion
    }

    pub fn propulsion_mut(&mut self) -> &mut Propulsion {
        &mut self.propulsion
    }

    pub fn gear(&self) -> &LandingGear {
        &self.gear
    }

    pub fn mass(&self) -> &Mass {
        &self.mass
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Put every control channel in steady state for the current inputs.
    pub fn prime_controls(&mut self) {
        self.controls.prime(&mut self.bus);
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Pick up bus inputs and run the control channels once for this tick.
    pub fn pre_step(&mut self, dt: f64) {
        self.environment.update(&self.bus);
        self.mass.update(&self.bus);
        self.controls.map_channels(dt, &mut self.bus);
    }

    /// Discrete updates after integration: engine running state and fuel burn.
    pub fn post_step(&mut self, dt: f64, x: &StateVector) {
        let fuel_available = self.mass.fuel_available();
        let extra = &x.as_slice()[RIGID_BODY_STATES..];
        self.propulsion.post_step(dt, extra, &self.bus, fuel_available);
        let burn = self.propulsion.fuel_flow() * dt;
        if burn > 0.0 {
            self.mass.drain_fuel(burn);
        }
    }

    /// Flight observables of the last evaluation.
    pub fn flight(&self) -> FlightOut {
        let s = &self.snapshot;
        let (roll, pitch, yaw) = s.q_bn.euler_angles();
        let v = s.velocity_ned;
        let ground_speed = v.x.hypot(v.y);
        let vertical_speed = -v.z;
        let (sin_roll, cos_roll) = roll.sin_cos();
        let cos_pitch = pitch.cos();
        let turn_rate = if cos_pitch.abs() > 1e-6 {
            (s.omega.y * sin_roll + s.omega.z * cos_roll) / cos_pitch
        } else {
            0.0
        };

        let arm = self.mass.pilot_position() - self.mass.cg();
        let pilot = s.specific_force
            + s.angular_acceleration.cross(&arm)
            + s.omega.cross(&s.omega.cross(&arm));

        FlightOut {
            latitude: s.geodetic.latitude,
            longitude: s.geodetic.longitude,
            altitude_asl: s.geodetic.altitude,
            altitude_agl: s.altitude_agl,
            roll,
            pitch,
            heading: wrap_two_pi(yaw),
            angle_of_attack: s.air.alpha,
            sideslip: s.air.beta,
            climb_angle: vertical_speed.atan2(ground_speed),
            track: wrap_two_pi(v.y.atan2(v.x)),
            true_airspeed: s.air.true_airspeed,
            indicated_airspeed: s.air.indicated_airspeed(&s.atmosphere),
            equivalent_airspeed: s.air.equivalent_airspeed(&s.atmosphere),
            ground_speed,
            vertical_speed,
            mach: s.air.mach,
            dynamic_pressure: s.air.dynamic_pressure,
            roll_rate: s.omega.x,
            pitch_rate: s.omega.y,
            yaw_rate: s.omega.z,
            turn_rate,
            load_factor: -s.specific_force.z / G0,
            pilot_gx: pilot.x / G0,
            pilot_gy: pilot.y / G0,
            pilot_gz: -pilot.z / G0,
            vel_north: v.x,
            vel_east: v.y,
            vel_down: v.z,
        }
    }

    /// Write subsystem and flight telemetry to the bus.
    pub fn publish(&mut self) {
        let flight = self.flight();
        self.flight_refs.publish(&flight, &mut self.bus);
        self.mass.publish(&mut self.bus);
        self.propulsion.publish(&mut self.bus);
        self.gear.publish(&mut self.bus);
    }

    /// Back to the state right after construction; bus values are zeroed
    /// and the mass station inputs restored.
    pub fn reinitialize(&mut self) {
        self.bus.reset_values();
        self.mass.reinitialize();
        self.mass.write_inputs(&mut self.bus);
        if let Some(aero) = &mut self.aerodynamics {
            aero.reinitialize();
        }
        self.propulsion.reinitialize();
        self.gear.reinitialize();
        self.controls.reinitialize();
        self.snapshot = Snapshot::at_rest(self.environment.atmosphere().at_altitude(0.0));
    }
}

fn vector(s: &[f64], at: usize) -> Vector3<f64> {
    Vector3::new(s[at], s[at + 1], s[at + 2])
}

impl DerivativeModel for AircraftModel {
    fn derivative(&mut self, x: &StateVector) -> StateVector {
        let s = x.as_slice();
        let position = vector(s, POSITION);
        let q = UnitQuaternion::new_normalize(Quaternion::new(
            s[ATTITUDE],
            s[ATTITUDE + 1],
            s[ATTITUDE + 2],
            s[ATTITUDE + 3],
        ));
        let v = vector(s, VELOCITY);
        let omega = vector(s, ANGULAR_RATE);

        let geodetic = self.nav.geodetic(&position);
        let q_bn = self.nav.attitude_ned(&geodetic, &q);
        let earth_rate = self.nav.earth_rate_body(&q);
        let omega_rel = omega - earth_rate;
        let atmosphere = self.environment.atmosphere().at_altitude(geodetic.altitude);
        let wind = q_bn.inverse_transform_vector(&self.environment.wind());
        let air = AirData::compute(v - wind, &omega_rel, &atmosphere, self.span, self.chord);
        let altitude_agl = geodetic.altitude - self.environment.terrain_elevation();

        let ctx = ForceContext {
            air: &air,
            atmosphere: &atmosphere,
            q_bn,
            velocity: v,
            omega: omega_rel,
            cg: self.mass.cg(),
            altitude_asl: geodetic.altitude,
            altitude_agl,
            extra: &s[RIGID_BODY_STATES..],
            fuel_available: self.mass.fuel_available(),
        };
        let mut load = ForceMoment::zero();
        if let Some(aero) = &mut self.aerodynamics {
            load += aero.compute_force_and_moment(&ctx, &self.bus);
        }
        load += self.propulsion.compute_force_and_moment(&ctx, &self.bus);
        load += self.gear.compute_force_and_moment(&ctx, &self.bus);

        let gravity = self.environment.gravity(geodetic.latitude, geodetic.altitude);
        let gravity_body = q_bn.inverse_transform_vector(&Vector3::new(0.0, 0.0, gravity));
        let specific_force = load.force / self.mass.total();
        let v_dot = specific_force + gravity_body - (omega + earth_rate).cross(&v);

        let inertia = self.mass.inertia();
        let moment_cg = load.moment - self.mass.cg().cross(&load.force);
        let omega_dot = self.mass.inertia_inv() * (moment_cg - omega.cross(&(inertia * omega)));

        let q_dot = q.quaternion() * Quaternion::from_imag(omega_rel) * 0.5;
        let p_dot = q * v;

        let mut d = StateVector::zeros(x.len());
        let out = d.as_mut_slice();
        out[POSITION..ATTITUDE].copy_from_slice(p_dot.as_slice());
        out[ATTITUDE] = q_dot.w;
        out[ATTITUDE + 1] = q_dot.i;
        out[ATTITUDE + 2] = q_dot.j;
        out[ATTITUDE + 3] = q_dot.k;
        out[VELOCITY..ANGULAR_RATE].copy_from_slice(v_dot.as_slice());
        out[ANGULAR_RATE..RIGID_BODY_STATES].copy_from_slice(omega_dot.as_slice());
        self.propulsion.extra_derivatives(&mut out[RIGID_BODY_STATES..]);

        self.snapshot = Snapshot {
            geodetic,
            altitude_agl,
            q_bn,
            atmosphere,
            air,
            velocity_ned: q_bn * v,
            omega: omega_rel,
            angular_acceleration: omega_dot,
            specific_force,
            gravity,
            load,
        };
        d
    }

    fn project(&mut self, x: &mut StateVector) {
        let s = x.as_mut_slice();
        let q = &mut s[ATTITUDE..VELOCITY];
        let norm = q.iter().map(|c| c * c).sum::<f64>().sqrt();
        if norm > 0.0 && norm.is_finite() {
            q.iter_mut().for_each(|c| *c /= norm);
        } else {
            q.copy_from_slice(&[1.0, 0.0, 0.0, 0.0]);
        }
        self.propulsion.project_extra(&mut s[RIGID_BODY_STATES..]);
    }
}
