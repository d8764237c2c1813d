//! Snapshot structs exchanged with the simulation at tick boundaries.
//!
//! [`DataInp`] and [`DataOut`] are plain `Copy` values with fixed-size
//! arrays, so they can be moved across threads and recorded as JSON without
//! holding any reference into the running aircraft.

use fdm_config::{AircraftDef, MAX_ENGINES, MAX_MASS_STATIONS, MAX_WHEELS};
use serde::{Deserialize, Serialize};

/// Simulation phase, requested in [`DataInp`] and reported in [`DataOut`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Init,
    Work,
    Freeze,
    Pause,
    Stop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crash {
    #[default]
    None,
    Collision,
    Overspeed,
    Overstress,
}

impl Crash {
    pub fn is_crash(self) -> bool {
        self != Crash::None
    }
}

/// Pilot controls, normalized: sticks and pedals in `[-1, 1]`, everything
/// else in `[0, 1]`. Gear position 1 is down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsInp {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub roll_trim: f64,
    pub pitch_trim: f64,
    pub yaw_trim: f64,
    pub brake_left: f64,
    pub brake_right: f64,
    pub nose_wheel_steering: f64,
    pub landing_gear: f64,
    pub flaps: f64,
    pub airbrake: f64,
}

impl Default for ControlsInp {
    fn default() -> Self {
        Self {
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            roll_trim: 0.0,
            pitch_trim: 0.0,
            yaw_trim: 0.0,
            brake_left: 0.0,
            brake_right: 0.0,
            nose_wheel_steering: 0.0,
            landing_gear: 1.0,
            flaps: 0.0,
            airbrake: 0.0,
        }
    }
}

impl ControlsInp {
    /// Values in the order of [`crate::paths::CONTROL_INPUTS`].
    pub fn values(&self) -> [f64; 12] {
        [
            self.roll,
            self.pitch,
            self.yaw,
            self.roll_trim,
            self.pitch_trim,
            self.yaw_trim,
            self.brake_left,
            self.brake_right,
            self.nose_wheel_steering,
            self.landing_gear,
            self.flaps,
            self.airbrake,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineInp {
    pub throttle: f64,
    pub mixture: f64,
    pub propeller: f64,
    pub fuel: bool,
    pub ignition: bool,
    pub starter: bool,
}

impl Default for EngineInp {
    fn default() -> Self {
        Self {
            throttle: 0.0,
            mixture: 1.0,
            propeller: 1.0,
            fuel: true,
            ignition: true,
            starter: false,
        }
    }
}

impl EngineInp {
    /// Values in the order of [`crate::paths::ENGINE_INPUTS`].
    pub fn values(&self) -> [f64; 6] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            self.throttle,
            self.mixture,
            self.propeller,
            flag(self.fuel),
            flag(self.ignition),
            flag(self.starter),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentInp {
    /// K
    pub sea_level_temperature: f64,
    /// Pa
    pub sea_level_pressure: f64,
    /// Direction the wind blows from (rad).
    pub wind_direction: f64,
    /// m/s
    pub wind_speed: f64,
}

impl Default for EnvironmentInp {
    fn default() -> Self {
        Self {
            sea_level_temperature: 288.15,
            sea_level_pressure: 101_325.0,
            wind_direction: 0.0,
            wind_speed: 0.0,
        }
    }
}

impl EnvironmentInp {
    /// Values in the order of [`crate::paths::ENVIRONMENT_INPUTS`].
    pub fn values(&self) -> [f64; 4] {
        [
            self.sea_level_temperature,
            self.sea_level_pressure,
            self.wind_direction,
            self.wind_speed,
        ]
    }
}

/// Where and how the aircraft starts. Angles in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialConditions {
    pub latitude: f64,
    pub longitude: f64,
    /// Height of the body origin above the terrain (m); near zero together
    /// with zero airspeed starts the aircraft resting on its gear.
    pub altitude_agl: f64,
    pub heading: f64,
    /// m/s along the body x axis.
    pub airspeed: f64,
    pub engines_on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataInp {
    pub controls: ControlsInp,
    pub engines: [EngineInp; MAX_ENGINES],
    /// kg per mass station.
    pub masses: [f64; MAX_MASS_STATIONS],
    pub environment: EnvironmentInp,
    pub initial: InitialConditions,
    pub phase: Phase,
    /// Simulated seconds per wall-clock second.
    pub time_coef: f64,
}

impl Default for DataInp {
    fn default() -> Self {
        Self {
            controls: ControlsInp::default(),
            engines: [EngineInp::default(); MAX_ENGINES],
            masses: [0.0; MAX_MASS_STATIONS],
            environment: EnvironmentInp::default(),
            initial: InitialConditions::default(),
            phase: Phase::Idle,
            time_coef: 1.0,
        }
    }
}

impl DataInp {
    /// Defaults with station masses and environment taken from `def`.
    pub fn for_aircraft(def: &AircraftDef) -> Self {
        let mut inp = Self::default();
        for (slot, station) in inp.masses.iter_mut().zip(&def.mass.stations) {
            *slot = station.initial;
        }
        let env = &def.environment;
        inp.environment = EnvironmentInp {
            sea_level_temperature: env.sea_level_temperature,
            sea_level_pressure: env.sea_level_pressure,
            wind_direction: env.wind.direction_deg.to_radians(),
            wind_speed: env.wind.speed,
        };
        inp
    }
}

/// Flight state. Angles in radians, SI units otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightOut {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_asl: f64,
    pub altitude_agl: f64,

    pub roll: f64,
    pub pitch: f64,
    pub heading: f64,
    pub angle_of_attack: f64,
    pub sideslip: f64,
    pub climb_angle: f64,
    pub track: f64,

    pub true_airspeed: f64,
    pub indicated_airspeed: f64,
    pub equivalent_airspeed: f64,
    pub ground_speed: f64,
    pub vertical_speed: f64,
    pub mach: f64,
    pub dynamic_pressure: f64,

    pub roll_rate: f64,
    pub pitch_rate: f64,
    pub yaw_rate: f64,
    pub turn_rate: f64,

    pub load_factor: f64,
    /// Specific force at the pilot position in g, body axes, z positive
    /// up so that level flight reads 1.
    pub pilot_gx: f64,
    pub pilot_gy: f64,
    pub pilot_gz: f64,

    pub vel_north: f64,
    pub vel_east: f64,
    pub vel_down: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentOut {
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    pub speed_of_sound: f64,
    pub wind_north: f64,
    pub wind_east: f64,
    pub gravity: f64,
}

/// Actuator positions as written by the control channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsOut {
    pub aileron: f64,
    pub elevator: f64,
    pub rudder: f64,
    pub flaps: f64,
    pub airbrake: f64,
    pub landing_gear: f64,
    pub brake_left: f64,
    pub brake_right: f64,
    pub nose_wheel_steering: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOut {
    pub active: bool,
    pub running: bool,
    pub rpm: f64,
    pub thrust: f64,
    pub power: f64,
    pub torque: f64,
    pub fuel_flow: f64,
    pub pitch: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelOut {
    pub active: bool,
    pub weight_on_wheel: bool,
    pub compression: f64,
    pub normal_force: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MassOut {
    pub total: f64,
    pub fuel: f64,
    pub cg_x: f64,
    pub cg_y: f64,
    pub cg_z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataOut {
    pub flight: FlightOut,
    pub environment: EnvironmentOut,
    pub controls: ControlsOut,
    pub engines: [EngineOut; MAX_ENGINES],
    pub wheels: [WheelOut; MAX_WHEELS],
    pub mass: MassOut,
    pub crash: Crash,
    pub phase: Phase,
    /// s
    pub sim_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{CONTROL_INPUTS, ENGINE_INPUTS};

    #[test]
    fn defaults_leave_gear_down_and_engines_fuelled() {
        let inp = DataInp::default();
        assert_eq!(inp.controls.landing_gear, 1.0);
        assert!(inp.engines.iter().all(|e| e.fuel && e.ignition && !e.starter));
        assert_eq!(inp.time_coef, 1.0);
        assert_eq!(inp.phase, Phase::Idle);
    }

    #[test]
    fn value_orders_match_bus_paths() {
        let controls = ControlsInp {
            landing_gear: 0.25,
            airbrake: 0.5,
            ..ControlsInp::default()
        };
        let values = controls.values();
        assert_eq!(values.len(), CONTROL_INPUTS.len());
        let gear = CONTROL_INPUTS.iter().position(|&n| n == "landing_gear").unwrap();
        assert_eq!(values[gear], 0.25);
        assert_eq!(values[CONTROL_INPUTS.len() - 1], 0.5);

        let engine = EngineInp {
            starter: true,
            ..EngineInp::default()
        };
        let starter = ENGINE_INPUTS.iter().position(|&n| n == "starter").unwrap();
        assert_eq!(engine.values()[starter], 1.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let inp: DataInp =
            serde_json::from_str(r#"{ "controls": { "pitch": 0.2 }, "phase": "work" }"#).unwrap();
        assert_eq!(inp.controls.pitch, 0.2);
        assert_eq!(inp.controls.landing_gear, 1.0);
        assert_eq!(inp.phase, Phase::Work);
        assert_eq!(inp.engines[3], EngineInp::default());
    }
}
