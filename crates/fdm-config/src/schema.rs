//! Aircraft configuration schema.
//!
//! Units are SI throughout (m, kg, s, N, W, K, Pa, rad) unless a field name
//! says otherwise (`_deg`, `_rpm`). Body axes are x forward, y right, z down,
//! measured from the aircraft reference point.

use fdm_controls::ElementSpec;
use fdm_core::{FdmResult, Table1D, Table2D};
use fdm_sim::IntegratorKind;
use serde::{Deserialize, Serialize};

/// Maximum engines carried by the flat input/output snapshots.
pub const MAX_ENGINES: usize = 4;
/// Maximum variable-mass stations carried by the flat snapshots.
pub const MAX_MASS_STATIONS: usize = 8;
/// Maximum wheels carried by the flat snapshots.
pub const MAX_WHEELS: usize = 8;

pub type Vec3 = [f64; 3];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AircraftDef {
    pub name: String,
    /// Base integration step (s).
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    #[serde(default)]
    pub integrator: IntegratorKind,
    #[serde(default)]
    pub navigation: NavigationFrame,
    #[serde(default)]
    pub environment: EnvironmentDef,
    pub mass: MassDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aerodynamics: Option<AeroDef>,
    #[serde(default)]
    pub propulsion: PropulsionDef,
    #[serde(default)]
    pub landing_gear: LandingGearDef,
    #[serde(default)]
    pub controls: ControlsDef,
    #[serde(default)]
    pub limits: LimitsDef,
}

fn default_time_step() -> f64 {
    0.01
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NavigationFrame {
    /// Local-level NED plane anchored at the initial position, non-rotating.
    #[default]
    Flat,
    /// Earth-centred Earth-fixed position on the WGS-84 ellipsoid, rotating earth.
    Wgs84,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentDef {
    #[serde(default = "default_sl_temperature")]
    pub sea_level_temperature: f64,
    #[serde(default = "default_sl_pressure")]
    pub sea_level_pressure: f64,
    #[serde(default)]
    pub gravity: GravityDef,
    /// Terrain elevation above mean sea level (m).
    #[serde(default)]
    pub terrain_elevation: f64,
    #[serde(default)]
    pub wind: WindDef,
}

impl Default for EnvironmentDef {
    fn default() -> Self {
        Self {
            sea_level_temperature: default_sl_temperature(),
            sea_level_pressure: default_sl_pressure(),
            gravity: GravityDef::default(),
            terrain_elevation: 0.0,
            wind: WindDef::default(),
        }
    }
}

fn default_sl_temperature() -> f64 {
    288.15
}

fn default_sl_pressure() -> f64 {
    101_325.0
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum GravityDef {
    /// WGS-84 normal gravity (Somigliana) with altitude correction.
    #[default]
    Wgs84,
    /// Constant magnitude (m/s^2).
    Constant(f64),
    Disabled,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WindDef {
    /// Direction the wind blows from (deg, true).
    #[serde(default)]
    pub direction_deg: f64,
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MassDef {
    pub empty_mass: f64,
    /// Empty-aircraft centre of gravity.
    #[serde(default)]
    pub cg: Vec3,
    /// Empty-aircraft inertia about its own centre of gravity.
    pub inertia: InertiaDef,
    #[serde(default)]
    pub stations: Vec<MassStationDef>,
    /// Point at which the pilot g-force is evaluated; defaults to the CG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pilot_position: Option<Vec3>,
}

/// Inertia tensor entries; products are defined as `ixy = ∫ x y dm`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InertiaDef {
    pub ixx: f64,
    pub iyy: f64,
    pub izz: f64,
    #[serde(default)]
    pub ixy: f64,
    #[serde(default)]
    pub ixz: f64,
    #[serde(default)]
    pub iyz: f64,
}

/// Variable point mass bound to `input/masses/station_<n>`, `n` being its
/// 1-based position in the list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MassStationDef {
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub initial: f64,
    pub max: f64,
    /// Fuel tanks are drained by engine fuel flow.
    #[serde(default)]
    pub fuel_tank: bool,
}

/// Reference geometry and coefficient model.
///
/// Force coefficients are in stability axes, moment coefficients in body
/// axes about `moment_reference`. Coefficient tables are functions of the
/// angle of attack (rad).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AeroDef {
    pub wing_area: f64,
    pub wing_span: f64,
    pub mean_chord: f64,
    #[serde(default)]
    pub moment_reference: Vec3,
    pub lift: TableDef,
    pub drag: TableDef,
    pub pitch_moment: TableDef,
    #[serde(default)]
    pub derivatives: AeroDerivatives,
}

/// Linear coefficient increments. Surface deflections are in rad, flaps,
/// gear and airbrake as normalized positions, rates non-dimensional.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AeroDerivatives {
    pub lift_elevator: f64,
    pub lift_q: f64,
    pub lift_flaps: f64,
    pub drag_elevator: f64,
    pub drag_flaps: f64,
    pub drag_gear: f64,
    pub drag_airbrake: f64,
    pub drag_beta2: f64,
    pub side_beta: f64,
    pub side_rudder: f64,
    pub side_p: f64,
    pub side_r: f64,
    pub roll_beta: f64,
    pub roll_p: f64,
    pub roll_r: f64,
    pub roll_aileron: f64,
    pub roll_rudder: f64,
    pub pitch_elevator: f64,
    pub pitch_q: f64,
    pub pitch_flaps: f64,
    pub yaw_beta: f64,
    pub yaw_p: f64,
    pub yaw_r: f64,
    pub yaw_aileron: f64,
    pub yaw_rudder: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PropulsionDef {
    #[serde(default)]
    pub engines: Vec<EngineDef>,
}

/// One engine, bound to `input/engine_<n>/...` by its 1-based list position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineDef {
    Piston(PistonDef),
    Turbojet(TurbojetDef),
}

impl EngineDef {
    pub fn name(&self) -> &str {
        match self {
            EngineDef::Piston(p) => &p.name,
            EngineDef::Turbojet(t) => &t.name,
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            EngineDef::Piston(p) => p.position,
            EngineDef::Turbojet(t) => t.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PistonDef {
    pub name: String,
    pub position: Vec3,
    /// Sea-level rated shaft power (W).
    pub max_power: f64,
    /// Fraction of rated power delivered at closed throttle.
    #[serde(default = "default_idle_power_fraction")]
    pub idle_power_fraction: f64,
    pub rpm_idle: f64,
    pub rpm_max: f64,
    /// Engine plus propeller polar moment of inertia (kg m^2).
    pub inertia: f64,
    /// Viscous friction torque per rad/s.
    #[serde(default = "default_friction")]
    pub friction: f64,
    #[serde(default = "default_starter_torque")]
    pub starter_torque: f64,
    /// Brake-specific fuel consumption (kg/J).
    #[serde(default = "default_piston_sfc")]
    pub specific_fuel_consumption: f64,
    pub propeller: PropellerDef,
}

fn default_idle_power_fraction() -> f64 {
    0.05
}

fn default_friction() -> f64 {
    0.05
}

fn default_starter_torque() -> f64 {
    80.0
}

fn default_piston_sfc() -> f64 {
    // about 0.5 lb/(hp h)
    8.4e-8
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PropellerDef {
    pub diameter: f64,
    /// +1 for clockwise seen from behind, -1 otherwise.
    #[serde(default = "default_rotation")]
    pub rotation: f64,
    #[serde(default)]
    pub pitch_min_deg: f64,
    #[serde(default)]
    pub pitch_max_deg: f64,
    /// Thrust coefficient over advance ratio (rows) and blade pitch in deg (columns).
    pub thrust_coefficient: Table2DDef,
    /// Power coefficient over advance ratio (rows) and blade pitch in deg (columns).
    pub power_coefficient: Table2DDef,
    /// Constant-speed governor driving blade pitch; fixed pitch if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governor: Option<GovernorDef>,
}

fn default_rotation() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GovernorDef {
    pub rpm_min: f64,
    pub rpm_max: f64,
    /// Pitch (deg) per rpm of overspeed.
    pub kp: f64,
    #[serde(default)]
    pub ki: f64,
    #[serde(default)]
    pub kd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TurbojetDef {
    pub name: String,
    pub position: Vec3,
    /// Sea-level static thrust at full throttle (N).
    pub max_thrust: f64,
    /// Thrust lapse factor over altitude in m (rows) and Mach (columns).
    pub thrust_lapse: Table2DDef,
    /// Spool-up time constant (s).
    pub spool_time_constant: f64,
    /// Spool speed at idle as a fraction of maximum.
    #[serde(default = "default_idle_spool")]
    pub idle_spool: f64,
    /// Spool speed reached with the starter alone.
    #[serde(default = "default_starter_spool")]
    pub starter_spool: f64,
    /// Thrust-specific fuel consumption (kg/(N s)).
    #[serde(default = "default_tsfc")]
    pub thrust_specific_fuel_consumption: f64,
    /// Spool speed at 100 % (rpm), for output only.
    #[serde(default = "default_turbojet_rpm")]
    pub rpm_max: f64,
}

fn default_idle_spool() -> f64 {
    0.55
}

fn default_starter_spool() -> f64 {
    0.25
}

fn default_tsfc() -> f64 {
    2.5e-5
}

fn default_turbojet_rpm() -> f64 {
    16_000.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LandingGearDef {
    #[serde(default)]
    pub wheels: Vec<WheelDef>,
    /// Name of the steerable wheel, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steering_wheel: Option<String>,
    #[serde(default = "default_max_steering_deg")]
    pub max_steering_deg: f64,
    /// Wheels only carry load when `controls/landing_gear` is down.
    #[serde(default)]
    pub retractable: bool,
}

fn default_max_steering_deg() -> f64 {
    30.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WheelDef {
    pub name: String,
    /// Strut attachment point.
    pub attach: Vec3,
    /// Unloaded strut length along body z.
    pub length: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub max_compression: f64,
    #[serde(default = "default_mu_rolling")]
    pub friction_rolling: f64,
    #[serde(default = "default_mu_side")]
    pub friction_side: f64,
    #[serde(default = "default_mu_braking")]
    pub friction_braking: f64,
    #[serde(default)]
    pub brake: BrakeGroup,
}

fn default_mu_rolling() -> f64 {
    0.02
}

fn default_mu_side() -> f64 {
    0.8
}

fn default_mu_braking() -> f64 {
    0.6
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BrakeGroup {
    #[default]
    None,
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ControlsDef {
    #[serde(default)]
    pub channels: Vec<ChannelDef>,
}

/// One control channel: summed weighted inputs, optional shaping table,
/// optional element chain, optional limits, written to `output`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChannelDef {
    pub name: String,
    pub inputs: Vec<ChannelInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableDef>,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<[f64; 2]>,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChannelInput {
    pub path: String,
    #[serde(default = "default_gain")]
    pub gain: f64,
}

fn default_gain() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsDef {
    /// Never-exceed true airspeed (m/s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vne: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_factor_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_factor_max: Option<f64>,
}

/// 1D breakpoint table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableDef {
    pub keys: Vec<f64>,
    pub values: Vec<f64>,
}

impl TableDef {
    pub fn to_table(&self) -> FdmResult<Table1D> {
        Table1D::new(self.keys.clone(), self.values.clone())
    }
}

/// 2D breakpoint table, `values[row][col]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Table2DDef {
    pub rows: Vec<f64>,
    pub cols: Vec<f64>,
    pub values: Vec<Vec<f64>>,
}

impl Table2DDef {
    pub fn to_table(&self) -> FdmResult<Table2D> {
        Table2D::from_rows(self.rows.clone(), self.cols.clone(), &self.values)
    }
}
