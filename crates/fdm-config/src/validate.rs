//! Aircraft configuration validation.
//!
//! Every error names the offending element by its path in the document,
//! e.g. `landing_gear.wheels[2].stiffness`.

use std::collections::HashSet;

use crate::schema::{
    AeroDef, AircraftDef, ChannelDef, EngineDef, GravityDef, LandingGearDef, MassDef,
    PistonDef, TurbojetDef, MAX_ENGINES, MAX_MASS_STATIONS, MAX_WHEELS,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate name: '{name}' in {element}")]
    DuplicateName { name: String, element: String },

    #[error("Missing reference: '{name}' in {element}")]
    MissingReference { name: String, element: String },

    #[error("Invalid value: {element} = {value} ({reason})")]
    InvalidValue {
        element: String,
        value: String,
        reason: String,
    },

    #[error("Too many entries in {element}: {found} (at most {max})")]
    TooMany {
        element: String,
        found: usize,
        max: usize,
    },
}

impl ValidationError {
    /// Document path of the offending element.
    pub fn element(&self) -> &str {
        match self {
            ValidationError::DuplicateName { element, .. }
            | ValidationError::MissingReference { element, .. }
            | ValidationError::InvalidValue { element, .. }
            | ValidationError::TooMany { element, .. } => element,
        }
    }
}

type Check = Result<(), ValidationError>;

fn invalid(element: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        element: element.into(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn positive(element: &str, v: f64) -> Check {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(element, v, "must be positive"))
    }
}

fn non_negative(element: &str, v: f64) -> Check {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(element, v, "must be non-negative"))
    }
}

fn finite3(element: &str, v: &[f64; 3]) -> Check {
    if v.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(invalid(element, format!("{v:?}"), "must be finite"))
    }
}

fn at_most(element: &str, found: usize, max: usize) -> Check {
    if found > max {
        Err(ValidationError::TooMany {
            element: element.to_string(),
            found,
            max,
        })
    } else {
        Ok(())
    }
}

fn unique<'a>(element: &str, names: impl IntoIterator<Item = &'a str>) -> Check {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateName {
                name: name.to_string(),
                element: element.to_string(),
            });
        }
    }
    Ok(())
}

/// Slash separated path with no empty segment.
fn bus_path(element: &str, path: &str) -> Check {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() || trimmed.split('/').any(str::is_empty) {
        Err(invalid(element, format!("'{path}'"), "not a valid data-bus path"))
    } else {
        Ok(())
    }
}

pub fn validate_aircraft(def: &AircraftDef) -> Check {
    if def.name.trim().is_empty() {
        return Err(invalid("name", "''", "must not be empty"));
    }
    positive("time_step", def.time_step)?;

    let env = &def.environment;
    positive("environment.sea_level_temperature", env.sea_level_temperature)?;
    positive("environment.sea_level_pressure", env.sea_level_pressure)?;
    if !env.terrain_elevation.is_finite() {
        return Err(invalid(
            "environment.terrain_elevation",
            env.terrain_elevation,
            "must be finite",
        ));
    }
    non_negative("environment.wind.speed", env.wind.speed)?;
    if let GravityDef::Constant(g) = env.gravity {
        non_negative("environment.gravity.constant", g)?;
    }

    validate_mass(&def.mass)?;
    if let Some(aero) = &def.aerodynamics {
        validate_aero(aero)?;
    }

    let engines = &def.propulsion.engines;
    at_most("propulsion.engines", engines.len(), MAX_ENGINES)?;
    unique("propulsion.engines", engines.iter().map(EngineDef::name))?;
    for (i, engine) in engines.iter().enumerate() {
        let element = format!("propulsion.engines[{i}]");
        match engine {
            EngineDef::Piston(p) => validate_piston(&element, p)?,
            EngineDef::Turbojet(t) => validate_turbojet(&element, t)?,
        }
    }

    validate_gear(&def.landing_gear)?;

    let channels = &def.controls.channels;
    unique("controls.channels", channels.iter().map(|c| c.name.as_str()))?;
    unique(
        "controls.channels output",
        channels.iter().map(|c| c.output.as_str()),
    )?;
    for (i, channel) in channels.iter().enumerate() {
        validate_channel(&format!("controls.channels[{i}]"), channel, def.time_step)?;
    }

    let limits = &def.limits;
    if let Some(vne) = limits.vne {
        positive("limits.vne", vne)?;
    }
    if let (Some(lo), Some(hi)) = (limits.load_factor_min, limits.load_factor_max) {
        if !(lo < hi) {
            return Err(invalid(
                "limits.load_factor_min",
                lo,
                format!("must be less than load_factor_max = {hi}"),
            ));
        }
    }

    Ok(())
}

fn validate_mass(mass: &MassDef) -> Check {
    positive("mass.empty_mass", mass.empty_mass)?;
    finite3("mass.cg", &mass.cg)?;
    let i = &mass.inertia;
    positive("mass.inertia.ixx", i.ixx)?;
    positive("mass.inertia.iyy", i.iyy)?;
    positive("mass.inertia.izz", i.izz)?;
    for (name, v) in [("ixy", i.ixy), ("ixz", i.ixz), ("iyz", i.iyz)] {
        if !v.is_finite() {
            return Err(invalid(format!("mass.inertia.{name}"), v, "must be finite"));
        }
    }
    // principal moments of a physical body satisfy the triangle inequality
    if i.ixx + i.iyy < i.izz || i.iyy + i.izz < i.ixx || i.izz + i.ixx < i.iyy {
        return Err(invalid(
            "mass.inertia",
            format!("[{}, {}, {}]", i.ixx, i.iyy, i.izz),
            "diagonal entries violate the triangle inequality",
        ));
    }
    if let Some(p) = &mass.pilot_position {
        finite3("mass.pilot_position", p)?;
    }

    at_most("mass.stations", mass.stations.len(), MAX_MASS_STATIONS)?;
    unique("mass.stations", mass.stations.iter().map(|s| s.name.as_str()))?;
    for (k, s) in mass.stations.iter().enumerate() {
        let element = format!("mass.stations[{k}]");
        finite3(&format!("{element}.position"), &s.position)?;
        non_negative(&format!("{element}.max"), s.max)?;
        non_negative(&format!("{element}.initial"), s.initial)?;
        if s.initial > s.max {
            return Err(invalid(
                format!("{element}.initial"),
                s.initial,
                format!("exceeds max = {}", s.max),
            ));
        }
    }
    Ok(())
}

fn validate_aero(aero: &AeroDef) -> Check {
    positive("aerodynamics.wing_area", aero.wing_area)?;
    positive("aerodynamics.wing_span", aero.wing_span)?;
    positive("aerodynamics.mean_chord", aero.mean_chord)?;
    finite3("aerodynamics.moment_reference", &aero.moment_reference)?;
    for (name, table) in [
        ("lift", &aero.lift),
        ("drag", &aero.drag),
        ("pitch_moment", &aero.pitch_moment),
    ] {
        table
            .to_table()
            .map_err(|e| invalid(format!("aerodynamics.{name}"), "table", e.to_string()))?;
    }
    Ok(())
}

fn validate_piston(element: &str, p: &PistonDef) -> Check {
    finite3(&format!("{element}.position"), &p.position)?;
    positive(&format!("{element}.max_power"), p.max_power)?;
    positive(&format!("{element}.rpm_idle"), p.rpm_idle)?;
    positive(&format!("{element}.inertia"), p.inertia)?;
    non_negative(&format!("{element}.friction"), p.friction)?;
    non_negative(&format!("{element}.starter_torque"), p.starter_torque)?;
    non_negative(
        &format!("{element}.specific_fuel_consumption"),
        p.specific_fuel_consumption,
    )?;
    if !(0.0..=1.0).contains(&p.idle_power_fraction) {
        return Err(invalid(
            format!("{element}.idle_power_fraction"),
            p.idle_power_fraction,
            "must lie in [0, 1]",
        ));
    }
    if !(p.rpm_max > p.rpm_idle) {
        return Err(invalid(
            format!("{element}.rpm_max"),
            p.rpm_max,
            format!("must exceed rpm_idle = {}", p.rpm_idle),
        ));
    }

    let prop = &p.propeller;
    let prop_el = format!("{element}.propeller");
    positive(&format!("{prop_el}.diameter"), prop.diameter)?;
    if prop.rotation != 1.0 && prop.rotation != -1.0 {
        return Err(invalid(format!("{prop_el}.rotation"), prop.rotation, "must be 1 or -1"));
    }
    if !(prop.pitch_min_deg <= prop.pitch_max_deg) {
        return Err(invalid(
            format!("{prop_el}.pitch_min_deg"),
            prop.pitch_min_deg,
            format!("must not exceed pitch_max_deg = {}", prop.pitch_max_deg),
        ));
    }
    prop.thrust_coefficient.to_table().map_err(|e| {
        invalid(format!("{prop_el}.thrust_coefficient"), "table", e.to_string())
    })?;
    prop.power_coefficient.to_table().map_err(|e| {
        invalid(format!("{prop_el}.power_coefficient"), "table", e.to_string())
    })?;
    if let Some(gov) = &prop.governor {
        let gov_el = format!("{prop_el}.governor");
        positive(&format!("{gov_el}.rpm_min"), gov.rpm_min)?;
        if !(gov.rpm_max > gov.rpm_min) {
            return Err(invalid(
                format!("{gov_el}.rpm_max"),
                gov.rpm_max,
                format!("must exceed rpm_min = {}", gov.rpm_min),
            ));
        }
        if !(prop.pitch_min_deg < prop.pitch_max_deg) {
            return Err(invalid(
                format!("{prop_el}.pitch_max_deg"),
                prop.pitch_max_deg,
                "a governed propeller needs a pitch range",
            ));
        }
        for (name, v) in [("kp", gov.kp), ("ki", gov.ki), ("kd", gov.kd)] {
            if !v.is_finite() {
                return Err(invalid(format!("{gov_el}.{name}"), v, "must be finite"));
            }
        }
    }
    Ok(())
}

fn validate_turbojet(element: &str, t: &TurbojetDef) -> Check {
    finite3(&format!("{element}.position"), &t.position)?;
    positive(&format!("{element}.max_thrust"), t.max_thrust)?;
    positive(&format!("{element}.spool_time_constant"), t.spool_time_constant)?;
    positive(&format!("{element}.rpm_max"), t.rpm_max)?;
    non_negative(
        &format!("{element}.thrust_specific_fuel_consumption"),
        t.thrust_specific_fuel_consumption,
    )?;
    for (name, v) in [("idle_spool", t.idle_spool), ("starter_spool", t.starter_spool)] {
        if !(v > 0.0 && v < 1.0) {
            return Err(invalid(format!("{element}.{name}"), v, "must lie in (0, 1)"));
        }
    }
    t.thrust_lapse
        .to_table()
        .map_err(|e| invalid(format!("{element}.thrust_lapse"), "table", e.to_string()))?;
    Ok(())
}

fn validate_gear(gear: &LandingGearDef) -> Check {
    at_most("landing_gear.wheels", gear.wheels.len(), MAX_WHEELS)?;
    unique("landing_gear.wheels", gear.wheels.iter().map(|w| w.name.as_str()))?;
    for (k, w) in gear.wheels.iter().enumerate() {
        let element = format!("landing_gear.wheels[{k}]");
        finite3(&format!("{element}.attach"), &w.attach)?;
        non_negative(&format!("{element}.length"), w.length)?;
        positive(&format!("{element}.stiffness"), w.stiffness)?;
        non_negative(&format!("{element}.damping"), w.damping)?;
        positive(&format!("{element}.max_compression"), w.max_compression)?;
        non_negative(&format!("{element}.friction_rolling"), w.friction_rolling)?;
        non_negative(&format!("{element}.friction_side"), w.friction_side)?;
        non_negative(&format!("{element}.friction_braking"), w.friction_braking)?;
    }
    if let Some(name) = &gear.steering_wheel {
        if !gear.wheels.iter().any(|w| &w.name == name) {
            return Err(ValidationError::MissingReference {
                name: name.clone(),
                element: "landing_gear.steering_wheel".to_string(),
            });
        }
    }
    non_negative("landing_gear.max_steering_deg", gear.max_steering_deg)?;
    Ok(())
}

fn validate_channel(element: &str, channel: &ChannelDef, dt: f64) -> Check {
    if channel.name.trim().is_empty() {
        return Err(invalid(format!("{element}.name"), "''", "must not be empty"));
    }
    if channel.inputs.is_empty() {
        return Err(invalid(format!("{element}.inputs"), "[]", "needs at least one input"));
    }
    for (k, input) in channel.inputs.iter().enumerate() {
        bus_path(&format!("{element}.inputs[{k}].path"), &input.path)?;
        if !input.gain.is_finite() {
            return Err(invalid(
                format!("{element}.inputs[{k}].gain"),
                input.gain,
                "must be finite",
            ));
        }
    }
    bus_path(&format!("{element}.output"), &channel.output)?;
    let output = channel.output.trim_start_matches('/');
    if output.starts_with("input/") {
        return Err(invalid(
            format!("{element}.output"),
            format!("'{}'", channel.output),
            "channels must not write into the input group",
        ));
    }
    if let Some(table) = &channel.table {
        table
            .to_table()
            .map_err(|e| invalid(format!("{element}.table"), "table", e.to_string()))?;
    }
    for (k, spec) in channel.elements.iter().enumerate() {
        let el = format!("{element}.elements[{k}]");
        spec.validate()
            .and_then(|_| spec.check_dt(dt))
            .map_err(|e| invalid(el, spec.kind_name(), e.to_string()))?;
    }
    if let Some([lo, hi]) = channel.limits {
        if !(lo < hi) {
            return Err(invalid(
                format!("{element}.limits"),
                format!("[{lo}, {hi}]"),
                "min must be less than max",
            ));
        }
    }
    Ok(())
}
