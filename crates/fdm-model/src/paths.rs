//! Data-bus path protocol.
//!
//! Inputs live under `input/`, actuator positions produced by the control
//! channels under `controls/`, telemetry under `output/`. Engines, mass
//! stations and wheels are numbered from 1.

/// Pilot control inputs, `input/controls/<name>`.
pub const CONTROL_INPUTS: [&str; 12] = [
    "roll",
    "pitch",
    "yaw",
    "roll_trim",
    "pitch_trim",
    "yaw_trim",
    "brake_left",
    "brake_right",
    "nose_wheel_steering",
    "landing_gear",
    "flaps",
    "airbrake",
];

/// Per-engine inputs, `input/engine_<n>/<name>`.
pub const ENGINE_INPUTS: [&str; 6] = ["throttle", "mixture", "propeller", "fuel", "ignition", "starter"];

/// Environment inputs, `input/environment/<name>`.
pub const ENVIRONMENT_INPUTS: [&str; 4] = [
    "sea_level_temperature",
    "sea_level_pressure",
    "wind_direction",
    "wind_speed",
];

/// Actuator positions read by the force models, `controls/<name>`.
pub const ACTUATORS: [&str; 9] = [
    "aileron",
    "elevator",
    "rudder",
    "flaps",
    "airbrake",
    "landing_gear",
    "brake_left",
    "brake_right",
    "nose_wheel_steering",
];

pub fn control_input(name: &str) -> String {
    format!("input/controls/{name}")
}

pub fn engine_input(index: usize, name: &str) -> String {
    format!("input/engine_{}/{name}", index + 1)
}

pub fn mass_station_input(index: usize) -> String {
    format!("input/masses/station_{}", index + 1)
}

pub fn environment_input(name: &str) -> String {
    format!("input/environment/{name}")
}

pub fn actuator(name: &str) -> String {
    format!("controls/{name}")
}

pub fn flight_output(name: &str) -> String {
    format!("output/flight/{name}")
}

pub fn engine_output(index: usize, name: &str) -> String {
    format!("output/engine_{}/{name}", index + 1)
}

pub fn wheel_output(index: usize, name: &str) -> String {
    format!("output/gear/wheel_{}/{name}", index + 1)
}

pub fn mass_output(name: &str) -> String {
    format!("output/mass/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_starts_at_one() {
        assert_eq!(engine_input(0, "throttle"), "input/engine_1/throttle");
        assert_eq!(mass_station_input(3), "input/masses/station_4");
        assert_eq!(wheel_output(1, "wow"), "output/gear/wheel_2/wow");
    }
}
