//! fdm-model: subsystem models and the composed aircraft.
//!
//! Contains:
//! - paths (data-bus path protocol)
//! - environment (US-1976 atmosphere, gravity, wind)
//! - nav (WGS-84 geodesy, flat and rotating-earth frames)
//! - air_data, aerodynamics, propulsion, landing_gear, mass, controls
//! - traits (capability interfaces the subsystems implement)
//! - dynamics (equations of motion as a `DerivativeModel`)
//! - aircraft (state vector, tick logic, crash detection)
//! - io (`DataInp` / `DataOut` snapshots)

pub mod aerodynamics;
pub mod air_data;
pub mod aircraft;
pub mod controls;
pub mod dynamics;
pub mod environment;
pub mod io;
pub mod landing_gear;
pub mod mass;
pub mod nav;
pub mod paths;
pub mod propulsion;
pub mod traits;

pub use aircraft::Aircraft;
pub use dynamics::{AircraftModel, Snapshot};
pub use io::{
    ControlsInp, ControlsOut, Crash, DataInp, DataOut, EngineInp, EngineOut, EnvironmentInp, EnvironmentOut,
    FlightOut, InitialConditions, MassOut, Phase, WheelOut,
};
pub use traits::{ControlChannelMapper, ExtraStates, ForceContext, ForceContributor, ForceMoment, Subsystem};
