//! Atmosphere, gravity and wind.
//!
//! The atmosphere is the U.S. Standard Atmosphere 1976 up to 84.852 km
//! geopotential altitude. A non-standard day is modelled by offsetting the
//! temperature profile by the sea-level temperature deviation and scaling the
//! pressure profile by the sea-level pressure ratio.

use fdm_config::{EnvironmentDef, GravityDef};
use fdm_core::{DataBus, DataRef, FdmResult, ResultExt};
use nalgebra::Vector3;

use crate::nav::wgs84;
use crate::paths;

/// Standard gravity (m/s^2).
pub const G0: f64 = 9.806_65;
/// Specific gas constant of dry air (J/(kg K)).
pub const R_AIR: f64 = 287.052_87;
/// Ratio of specific heats of air.
pub const GAMMA: f64 = 1.4;

pub const STD_SL_TEMPERATURE: f64 = 288.15;
pub const STD_SL_PRESSURE: f64 = 101_325.0;
pub const STD_SL_DENSITY: f64 = 1.225;
pub const STD_SL_SPEED_OF_SOUND: f64 = 340.294;

/// Effective earth radius for the geopotential conversion (m).
const EARTH_RADIUS: f64 = 6_356_766.0;

/// Layer base geopotential altitudes (m).
const LAYER_BASE: [f64; 8] = [0.0, 11_000.0, 20_000.0, 32_000.0, 47_000.0, 51_000.0, 71_000.0, 84_852.0];
/// Layer temperature gradients (K/m).
const LAPSE_RATE: [f64; 7] = [-0.0065, 0.0, 0.001, 0.0028, 0.0, -0.0028, -0.002];

const SUTHERLAND_BETA: f64 = 1.458e-6;
const SUTHERLAND_S: f64 = 110.4;

/// Lowest geopotential altitude the profile is extended down to (m).
const MIN_ALTITUDE: f64 = -5_000.0;

/// Thermodynamic state of the air at one altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphereState {
    /// K
    pub temperature: f64,
    /// Pa
    pub pressure: f64,
    /// kg/m^3
    pub density: f64,
    /// m/s
    pub speed_of_sound: f64,
    /// Pa s
    pub dynamic_viscosity: f64,
    /// m^2/s
    pub kinematic_viscosity: f64,
}

impl AtmosphereState {
    /// Density ratio to the standard sea-level value.
    pub fn density_ratio(&self) -> f64 {
        self.density / STD_SL_DENSITY
    }
}

/// Geopotential altitude for a geometric altitude `z`.
pub fn geopotential_altitude(z: f64) -> f64 {
    EARTH_RADIUS * z / (EARTH_RADIUS + z)
}

/// Standard temperature and pressure at geopotential altitude `h`.
fn standard_profile(h: f64) -> (f64, f64) {
    let h = h.clamp(MIN_ALTITUDE, LAYER_BASE[7]);
    let mut t_base = STD_SL_TEMPERATURE;
    let mut p_base = STD_SL_PRESSURE;
    let mut layer = 0;
    while layer < LAPSE_RATE.len() - 1 && h > LAYER_BASE[layer + 1] {
        let dh = LAYER_BASE[layer + 1] - LAYER_BASE[layer];
        let (t, p) = layer_step(t_base, p_base, LAPSE_RATE[layer], dh);
        t_base = t;
        p_base = p;
        layer += 1;
    }
    layer_step(t_base, p_base, LAPSE_RATE[layer], h - LAYER_BASE[layer])
}

fn layer_step(t_base: f64, p_base: f64, lapse: f64, dh: f64) -> (f64, f64) {
    if lapse == 0.0 {
        (t_base, p_base * (-G0 * dh / (R_AIR * t_base)).exp())
    } else {
        let t = t_base + lapse * dh;
        (t, p_base * (t / t_base).powf(-G0 / (R_AIR * lapse)))
    }
}

fn air_state(temperature: f64, pressure: f64) -> AtmosphereState {
    let density = pressure / (R_AIR * temperature);
    let dynamic_viscosity = SUTHERLAND_BETA * temperature.powf(1.5) / (temperature + SUTHERLAND_S);
    AtmosphereState {
        temperature,
        pressure,
        density,
        speed_of_sound: (GAMMA * R_AIR * temperature).sqrt(),
        dynamic_viscosity,
        kinematic_viscosity: dynamic_viscosity / density,
    }
}

/// Atmosphere with adjustable sea-level conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atmosphere {
    pub sea_level_temperature: f64,
    pub sea_level_pressure: f64,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self {
            sea_level_temperature: STD_SL_TEMPERATURE,
            sea_level_pressure: STD_SL_PRESSURE,
        }
    }
}

impl Atmosphere {
    /// State at geopotential altitude `h` (m).
    pub fn at_geopotential(&self, h: f64) -> AtmosphereState {
        let (t_std, p_std) = standard_profile(h);
        let t = t_std + (self.sea_level_temperature - STD_SL_TEMPERATURE);
        let p = p_std * self.sea_level_pressure / STD_SL_PRESSURE;
        air_state(t, p)
    }

    /// State at geometric altitude above mean sea level (m).
    pub fn at_altitude(&self, altitude: f64) -> AtmosphereState {
        self.at_geopotential(geopotential_altitude(altitude))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GravityModel {
    Wgs84,
    Constant(f64),
    Disabled,
}

impl From<GravityDef> for GravityModel {
    fn from(def: GravityDef) -> Self {
        match def {
            GravityDef::Wgs84 => GravityModel::Wgs84,
            GravityDef::Constant(g) => GravityModel::Constant(g),
            GravityDef::Disabled => GravityModel::Disabled,
        }
    }
}

impl GravityModel {
    /// Gravity magnitude at geodetic latitude `lat` (rad) and height `h` (m).
    pub fn magnitude(self, lat: f64, h: f64) -> f64 {
        match self {
            GravityModel::Wgs84 => normal_gravity(lat, h),
            GravityModel::Constant(g) => g,
            GravityModel::Disabled => 0.0,
        }
    }
}

/// WGS-84 normal gravity: Somigliana's formula with the second-order
/// free-air height correction.
pub fn normal_gravity(lat: f64, h: f64) -> f64 {
    const GAMMA_E: f64 = 9.780_325_335_9;
    const K: f64 = 0.001_931_852_652_41;
    const M: f64 = 0.003_449_786_506_84;
    let s2 = lat.sin().powi(2);
    let g_surface = GAMMA_E * (1.0 + K * s2) / (1.0 - wgs84::E2 * s2).sqrt();
    let a = wgs84::A;
    let f = wgs84::F;
    g_surface * (1.0 - 2.0 / a * (1.0 + f + M - 2.0 * f * s2) * h + 3.0 * h * h / (a * a))
}

/// Wind velocity in NED for a wind blowing *from* `direction` (rad, true).
pub fn wind_ned(direction: f64, speed: f64) -> Vector3<f64> {
    Vector3::new(-speed * direction.cos(), -speed * direction.sin(), 0.0)
}

#[derive(Debug, Clone, Copy)]
struct EnvironmentRefs {
    sea_level_temperature: DataRef,
    sea_level_pressure: DataRef,
    wind_direction: DataRef,
    wind_speed: DataRef,
}

/// Environment subsystem: atmosphere, gravity, wind and terrain.
#[derive(Debug, Clone)]
pub struct Environment {
    atmosphere: Atmosphere,
    gravity: GravityModel,
    wind: Vector3<f64>,
    terrain_elevation: f64,
    refs: EnvironmentRefs,
}

impl Environment {
    pub fn new(def: &EnvironmentDef, bus: &mut DataBus) -> FdmResult<Self> {
        let mut bind = |name: &str| {
            bus.add_value(&paths::environment_input(name))
                .with_context(|| format!("binding environment input '{name}'"))
        };
        let refs = EnvironmentRefs {
            sea_level_temperature: bind("sea_level_temperature")?,
            sea_level_pressure: bind("sea_level_pressure")?,
            wind_direction: bind("wind_direction")?,
            wind_speed: bind("wind_speed")?,
        };
        let direction = def.wind.direction_deg.to_radians();
        bus.set(refs.sea_level_temperature, def.sea_level_temperature);
        bus.set(refs.sea_level_pressure, def.sea_level_pressure);
        bus.set(refs.wind_direction, direction);
        bus.set(refs.wind_speed, def.wind.speed);

        Ok(Self {
            atmosphere: Atmosphere {
                sea_level_temperature: def.sea_level_temperature,
                sea_level_pressure: def.sea_level_pressure,
            },
            gravity: def.gravity.into(),
            wind: wind_ned(direction, def.wind.speed),
            terrain_elevation: def.terrain_elevation,
            refs,
        })
    }

    /// Pick up sea-level conditions and wind from the bus. Non-positive
    /// sea-level values are ignored.
    pub fn update(&mut self, bus: &DataBus) {
        let t = bus.get(self.refs.sea_level_temperature);
        let p = bus.get(self.refs.sea_level_pressure);
        if t > 0.0 {
            self.atmosphere.sea_level_temperature = t;
        }
        if p > 0.0 {
            self.atmosphere.sea_level_pressure = p;
        }
        let direction = bus.get(self.refs.wind_direction);
        let speed = bus.get(self.refs.wind_speed);
        if direction.is_finite() && speed.is_finite() {
            self.wind = wind_ned(direction, speed.max(0.0));
        }
    }

    pub fn atmosphere(&self) -> &Atmosphere {
        &self.atmosphere
    }

    pub fn gravity_model(&self) -> GravityModel {
        self.gravity
    }

    pub fn gravity(&self, lat: f64, altitude: f64) -> f64 {
        self.gravity.magnitude(lat, altitude)
    }

    pub fn wind(&self) -> Vector3<f64> {
        self.wind
    }

    pub fn terrain_elevation(&self) -> f64 {
        self.terrain_elevation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sea_level_standard_day() {
        let s = Atmosphere::default().at_altitude(0.0);
        assert_relative_eq!(s.temperature, 288.15);
        assert_relative_eq!(s.pressure, 101_325.0);
        assert_relative_eq!(s.density, 1.225, epsilon = 1e-6);
        assert_relative_eq!(s.speed_of_sound, 340.294, epsilon = 1e-3);
        assert_relative_eq!(s.dynamic_viscosity, 1.789e-5, epsilon = 1e-8);
    }

    #[test]
    fn tropopause() {
        let s = Atmosphere::default().at_geopotential(11_000.0);
        assert_relative_eq!(s.temperature, 216.65, epsilon = 1e-9);
        assert_relative_eq!(s.pressure, 22_632.06, epsilon = 0.1);
        assert_relative_eq!(s.speed_of_sound, 295.07, epsilon = 0.01);
    }

    #[test]
    fn upper_layers_continuous() {
        let atm = Atmosphere::default();
        for base in LAYER_BASE.iter().skip(1).take(6) {
            let below = atm.at_geopotential(base - 1e-6);
            let above = atm.at_geopotential(base + 1e-6);
            assert_relative_eq!(below.pressure, above.pressure, max_relative = 1e-9);
            assert_relative_eq!(below.temperature, above.temperature, epsilon = 1e-6);
        }
        let top = atm.at_geopotential(84_852.0);
        assert_relative_eq!(top.temperature, 186.946, epsilon = 1e-6);
        assert_relative_eq!(top.pressure, 0.3734, epsilon = 1e-3);
        assert_eq!(atm.at_geopotential(120_000.0), top);
    }

    #[test]
    fn hot_day_offsets_temperature() {
        let atm = Atmosphere {
            sea_level_temperature: 303.15,
            sea_level_pressure: 100_000.0,
        };
        let s = atm.at_geopotential(1_000.0);
        let std = Atmosphere::default().at_geopotential(1_000.0);
        assert_relative_eq!(s.temperature - std.temperature, 15.0, epsilon = 1e-9);
        assert_relative_eq!(s.pressure / std.pressure, 100_000.0 / 101_325.0, epsilon = 1e-12);
        assert!(s.density < std.density);
    }

    #[test]
    fn normal_gravity_equator_and_pole() {
        assert_relative_eq!(normal_gravity(0.0, 0.0), 9.780_325, epsilon = 1e-6);
        assert_relative_eq!(
            normal_gravity(std::f64::consts::FRAC_PI_2, 0.0),
            9.832_185,
            epsilon = 1e-5
        );
        assert!(normal_gravity(0.7, 10_000.0) < normal_gravity(0.7, 0.0));
    }

    #[test]
    fn wind_from_north_blows_south() {
        let w = wind_ned(0.0, 10.0);
        assert_relative_eq!(w.x, -10.0);
        assert_relative_eq!(w.y, 0.0);
        let w = wind_ned(std::f64::consts::FRAC_PI_2, 5.0);
        assert_relative_eq!(w.y, -5.0, epsilon = 1e-12);
    }

    #[test]
    fn environment_follows_bus_inputs() {
        let mut bus = DataBus::new();
        let mut env = Environment::new(&EnvironmentDef::default(), &mut bus).unwrap();
        bus.set_value("input/environment/sea_level_temperature", 273.15).unwrap();
        bus.set_value("input/environment/wind_speed", 8.0).unwrap();
        env.update(&bus);
        assert_relative_eq!(env.atmosphere().at_altitude(0.0).temperature, 273.15);
        assert_relative_eq!(env.wind().x, -8.0);

        bus.set_value("input/environment/sea_level_pressure", 0.0).unwrap();
        env.update(&bus);
        assert_relative_eq!(env.atmosphere().sea_level_pressure, 101_325.0);
    }
}
