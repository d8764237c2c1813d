//! Simulation service layer shared by the command line front end.
//!
//! [`SimulationManager`] owns the aircraft and drives it through the
//! simulation phases one tick at a time. [`RealTimeWorker`] runs a manager
//! on a dedicated thread at a fixed cadence.

pub mod error;
pub mod logging;
pub mod manager;
pub mod worker;

pub use error::{AppError, AppResult};
pub use manager::{MAX_TIME_COEF, MIN_TIME_COEF, SimulationManager};
pub use worker::RealTimeWorker;
