//! Aircraft: the integrated model plus its state vector and tick logic.

use fdm_config::{AircraftDef, LimitsDef};
use fdm_core::{DataBus, DataRef, FdmResult};
use fdm_sim::{DerivativeModel, Integrator, StateVector};
use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, info, warn};

use crate::dynamics::{ANGULAR_RATE, ATTITUDE, AircraftModel, POSITION, RIGID_BODY_STATES, VELOCITY};
use crate::io::{
    ControlsOut, Crash, DataInp, DataOut, EngineOut, EnvironmentOut, InitialConditions, MassOut, Phase,
    WheelOut,
};
use crate::nav::Geodetic;
use crate::paths;
use crate::traits::ExtraStates;

/// Height above terrain and airspeed below which a start is made on the gear.
const GROUND_START_HEIGHT: f64 = 0.1;
const GROUND_START_SPEED: f64 = 0.1;
const SETTLE_ITERATIONS: usize = 60;
/// Depth below the touchdown height searched when settling on the gear.
const SETTLE_DEPTH: f64 = 2.0;

#[derive(Debug, Clone)]
struct InputRefs {
    controls: Vec<DataRef>,
    engines: Vec<Vec<DataRef>>,
    masses: Vec<DataRef>,
    environment: Vec<DataRef>,
    actuators: ActuatorRefs,
}

#[derive(Debug, Clone, Copy)]
struct ActuatorRefs {
    aileron: DataRef,
    elevator: DataRef,
    rudder: DataRef,
    flaps: DataRef,
    airbrake: DataRef,
    landing_gear: DataRef,
    brake_left: DataRef,
    brake_right: DataRef,
    nose_wheel_steering: DataRef,
}

impl ActuatorRefs {
    fn resolve(bus: &DataBus) -> FdmResult<Self> {
        let get = |name: &str| bus.get_ref(&paths::actuator(name));
        Ok(Self {
            aileron: get("aileron")?,
            elevator: get("elevator")?,
            rudder: get("rudder")?,
            flaps: get("flaps")?,
            airbrake: get("airbrake")?,
            landing_gear: get("landing_gear")?,
            brake_left: get("brake_left")?,
            brake_right: get("brake_right")?,
            nose_wheel_steering: get("nose_wheel_steering")?,
        })
    }

    fn read(&self, bus: &DataBus) -> ControlsOut {
        ControlsOut {
            aileron: bus.get(self.aileron),
            elevator: bus.get(self.elevator),
            rudder: bus.get(self.rudder),
            flaps: bus.get(self.flaps),
            airbrake: bus.get(self.airbrake),
            landing_gear: bus.get(self.landing_gear),
            brake_left: bus.get(self.brake_left),
            brake_right: bus.get(self.brake_right),
            nose_wheel_steering: bus.get(self.nose_wheel_steering),
        }
    }
}

impl InputRefs {
    fn resolve(bus: &DataBus, engines: usize, stations: usize) -> FdmResult<Self> {
        let all = |paths: Vec<String>| -> FdmResult<Vec<DataRef>> {
            paths.iter().map(|p| bus.get_ref(p)).collect()
        };
        Ok(Self {
            controls: all(paths::CONTROL_INPUTS.iter().map(|n| paths::control_input(n)).collect())?,
            engines: (0..engines)
                .map(|k| all(paths::ENGINE_INPUTS.iter().map(|n| paths::engine_input(k, n)).collect()))
                .collect::<FdmResult<_>>()?,
            masses: all((0..stations).map(paths::mass_station_input).collect())?,
            environment: all(
                paths::ENVIRONMENT_INPUTS
                    .iter()
                    .map(|n| paths::environment_input(n))
                    .collect(),
            )?,
            actuators: ActuatorRefs::resolve(bus)?,
        })
    }
}

fn write_all(bus: &mut DataBus, refs: &[DataRef], values: &[f64]) {
    for (&r, &v) in refs.iter().zip(values) {
        bus.set(r, v);
    }
}

#[derive(Debug)]
pub struct Aircraft {
    name: String,
    integrator: Integrator<AircraftModel>,
    state: StateVector,
    time_step: f64,
    limits: LimitsDef,
    refs: InputRefs,
    sim_time: f64,
    crash: Crash,
}

impl Aircraft {
    /// Build the aircraft and place it at `inp.initial`, with `inp` applied
    /// to the bus and the control channels in steady state.
    pub fn new(def: &AircraftDef, inp: &DataInp) -> FdmResult<Self> {
        let ic = inp.initial;
        let model = AircraftModel::new(def, (ic.latitude, ic.longitude))?;
        let refs = InputRefs::resolve(
            model.bus(),
            model.propulsion().len(),
            model.mass().station_count(),
        )?;
        let state = StateVector::zeros(model.state_len());
        let mut aircraft = Self {
            name: def.name.clone(),
            integrator: Integrator::new(def.integrator, model),
            state,
            time_step: def.time_step,
            limits: def.limits,
            refs,
            sim_time: 0.0,
            crash: Crash::None,
        };
        aircraft.start(inp);
        info!(
            aircraft = %aircraft.name,
            states = aircraft.state.len(),
            integrator = ?def.integrator,
            "aircraft initialized"
        );
        Ok(aircraft)
    }

    fn start(&mut self, inp: &DataInp) {
        self.set_inputs(inp);
        let model = self.integrator.model_mut();
        model.pre_step(0.0);
        model.prime_controls();
        self.state = initial_state(self.integrator.model_mut(), &inp.initial);
        let model = self.integrator.model_mut();
        model.derivative(&self.state);
        model.publish();
        self.sim_time = 0.0;
        self.crash = Crash::None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured integration step (s).
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn crash(&self) -> Crash {
        self.crash
    }

    pub fn state(&self) -> &StateVector {
        &self.state
    }

    pub fn model(&self) -> &AircraftModel {
        self.integrator.model()
    }

    pub fn bus(&self) -> &DataBus {
        self.integrator.model().bus()
    }

    pub fn bus_mut(&mut self) -> &mut DataBus {
        self.integrator.model_mut().bus_mut()
    }

    /// Copy an input snapshot onto the bus.
    pub fn set_inputs(&mut self, inp: &DataInp) {
        let refs = &self.refs;
        let bus = self.integrator.model_mut().bus_mut();
        write_all(bus, &refs.controls, &inp.controls.values());
        for (engine, values) in refs.engines.iter().zip(&inp.engines) {
            write_all(bus, engine, &values.values());
        }
        write_all(bus, &refs.masses, &inp.masses);
        write_all(bus, &refs.environment, &inp.environment.values());
    }

    /// Advance by `dt`: control channels, integration, discrete subsystem
    /// updates and telemetry.
    pub fn step(&mut self, dt: f64) {
        if !(dt > 0.0) {
            return;
        }
        self.integrator.model_mut().pre_step(dt);
        self.integrator.integrate(dt, &mut self.state);
        let model = self.integrator.model_mut();
        model.post_step(dt, &self.state);
        // observables at the final state
        model.derivative(&self.state);
        model.publish();
        self.sim_time += dt;
        self.check_crash();
    }

    /// Run control channels and refresh telemetry without moving the state.
    pub fn refresh(&mut self, dt: f64) {
        let model = self.integrator.model_mut();
        model.pre_step(dt);
        model.derivative(&self.state);
        model.publish();
    }

    /// Reset every subsystem and restart from `inp.initial`.
    pub fn reinitialize(&mut self, inp: &DataInp) {
        self.integrator.model_mut().reinitialize();
        self.start(inp);
        debug!(aircraft = %self.name, "aircraft reinitialized");
    }

    fn check_crash(&mut self) {
        if self.crash.is_crash() {
            return;
        }
        let model = self.integrator.model();
        let flight = model.flight();
        let crash = if flight.altitude_agl < 0.0 || model.gear().bottomed() {
            Crash::Collision
        } else if self.limits.vne.is_some_and(|vne| flight.true_airspeed > vne) {
            Crash::Overspeed
        } else if self.limits.load_factor_min.is_some_and(|n| flight.load_factor < n)
            || self.limits.load_factor_max.is_some_and(|n| flight.load_factor > n)
        {
            Crash::Overstress
        } else {
            Crash::None
        };
        if crash.is_crash() {
            warn!(
                aircraft = %self.name,
                ?crash,
                time = self.sim_time,
                altitude_agl = flight.altitude_agl,
                tas = flight.true_airspeed,
                load_factor = flight.load_factor,
                "aircraft crashed"
            );
            self.crash = crash;
        }
    }

    /// Output snapshot of the last completed tick.
    pub fn output(&self, phase: Phase) -> DataOut {
        let model = self.integrator.model();
        let snapshot = model.snapshot();
        let bus = model.bus();

        let wind = model.environment().wind();
        let atm = &snapshot.atmosphere;
        let environment = EnvironmentOut {
            temperature: atm.temperature,
            pressure: atm.pressure,
            density: atm.density,
            speed_of_sound: atm.speed_of_sound,
            wind_north: wind.x,
            wind_east: wind.y,
            gravity: snapshot.gravity,
        };

        let controls = self.refs.actuators.read(bus);

        let mut engines = [EngineOut::default(); fdm_config::MAX_ENGINES];
        for (out, s) in engines.iter_mut().zip(model.propulsion().statuses()) {
            *out = EngineOut {
                active: true,
                running: s.running,
                rpm: s.rpm,
                thrust: s.thrust,
                power: s.power,
                torque: s.torque,
                fuel_flow: s.fuel_flow,
                pitch: s.pitch,
            };
        }

        let mut wheels = [WheelOut::default(); fdm_config::MAX_WHEELS];
        for (out, w) in wheels.iter_mut().zip(model.gear().wheel_states()) {
            *out = WheelOut {
                active: true,
                weight_on_wheel: w.wow,
                compression: w.compression,
                normal_force: w.normal_force,
            };
        }

        let mass = model.mass();
        let cg = mass.cg();
        DataOut {
            flight: model.flight(),
            environment,
            controls,
            engines,
            wheels,
            mass: MassOut {
                total: mass.total(),
                fuel: mass.fuel(),
                cg_x: cg.x,
                cg_y: cg.y,
                cg_z: cg.z,
            },
            crash: self.crash,
            phase,
            sim_time: self.sim_time,
        }
    }
}

/// Body origin height above terrain at which the struts carry `weight`.
fn settle_height(model: &AircraftModel, q_bn: &UnitQuaternion<f64>, weight: f64) -> Option<f64> {
    let gear = model.gear();
    let touch = gear.max_tip_depth(q_bn)?;
    let (mut lo, mut hi) = (touch - SETTLE_DEPTH, touch);
    for _ in 0..SETTLE_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if gear.static_normal_force(q_bn, mid) > weight {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

fn initial_state(model: &mut AircraftModel, ic: &InitialConditions) -> StateVector {
    let q_bn = UnitQuaternion::from_euler_angles(0.0, 0.0, ic.heading);
    let terrain = model.environment().terrain_elevation();
    let on_ground = ic.altitude_agl < GROUND_START_HEIGHT && ic.airspeed.abs() < GROUND_START_SPEED;

    let agl = if on_ground {
        let weight = model.mass().total() * model.environment().gravity(ic.latitude, terrain);
        settle_height(model, &q_bn, weight).unwrap_or(ic.altitude_agl)
    } else {
        ic.altitude_agl
    };
    let geo = Geodetic {
        latitude: ic.latitude,
        longitude: ic.longitude,
        altitude: terrain + agl,
    };
    let nav = *model.navigation();
    let (position, q) = nav.initial_state(geo, q_bn);

    let velocity = if on_ground {
        Vector3::zeros()
    } else {
        Vector3::new(ic.airspeed, 0.0, 0.0) + q_bn.inverse_transform_vector(&model.environment().wind())
    };
    // at rest relative to the earth
    let omega = nav.earth_rate_body(&q);

    let mut x = StateVector::zeros(model.state_len());
    let s = x.as_mut_slice();
    s[POSITION..ATTITUDE].copy_from_slice(position.as_slice());
    let c = q.quaternion();
    s[ATTITUDE..VELOCITY].copy_from_slice(&[c.w, c.i, c.j, c.k]);
    s[VELOCITY..ANGULAR_RATE].copy_from_slice(velocity.as_slice());
    s[ANGULAR_RATE..RIGID_BODY_STATES].copy_from_slice(omega.as_slice());

    let propulsion = model.propulsion_mut();
    let extra = &mut s[RIGID_BODY_STATES..];
    propulsion.initial_extra(extra);
    if ic.engines_on {
        propulsion.start_all(extra);
    }
    debug!(
        on_ground,
        altitude_agl = agl,
        heading = ic.heading,
        airspeed = ic.airspeed,
        "initial state"
    );
    x
}
