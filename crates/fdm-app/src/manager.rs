//! Phase state machine around a single [`Aircraft`].
//!
//! The host writes a [`DataInp`] (its `phase` field is the requested phase)
//! and calls [`SimulationManager::tick`] once per base time step. Each tick
//! first applies the requested transition, then performs the action of the
//! resulting phase and leaves a [`DataOut`] describing the completed tick.
//!
//! | phase    | per-tick action                                            |
//! |----------|------------------------------------------------------------|
//! | `Idle`   | nothing; no aircraft exists                                |
//! | `Init`   | inputs copied, outputs refreshed, state held at the start  |
//! | `Work`   | inputs copied, state advanced by `dt * time_coef`          |
//! | `Freeze` | inputs copied, outputs refreshed, state held               |
//! | `Pause`  | nothing; last output kept with only its phase changed      |
//! | `Stop`   | aircraft released and the manager returns to `Idle`        |
//!
//! A requested phase of `Idle` asks for no transition. A refused request
//! (failed `Init`, `Work` after a crash, ...) is logged and attempted once;
//! it is tried again only after the host requests something else.

use fdm_config::AircraftDef;
use fdm_core::{FdmError, FdmResult, ResultExt};
use fdm_model::{Aircraft, DataInp, DataOut, Phase};
use tracing::{info, warn};

pub const MIN_TIME_COEF: f64 = 0.1;
pub const MAX_TIME_COEF: f64 = 10.0;

#[derive(Debug)]
pub struct SimulationManager {
    def: AircraftDef,
    dt: f64,
    phase: Phase,
    aircraft: Option<Aircraft>,
    input: DataInp,
    output: DataOut,
    last_error: Option<FdmError>,
    init_failures: u64,
    refused: Option<Phase>,
    work_ticks: u64,
}

impl SimulationManager {
    /// Manager for `def` ticking at the configured time step.
    pub fn new(def: AircraftDef) -> Self {
        let input = DataInp::for_aircraft(&def);
        Self {
            dt: def.time_step,
            def,
            phase: Phase::Idle,
            aircraft: None,
            input,
            output: DataOut::default(),
            last_error: None,
            init_failures: 0,
            refused: None,
            work_ticks: 0,
        }
    }

    pub fn definition(&self) -> &AircraftDef {
        &self.def
    }

    /// Base tick length (s).
    pub fn time_step(&self) -> f64 {
        self.dt
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn aircraft(&self) -> Option<&Aircraft> {
        self.aircraft.as_ref()
    }

    pub fn input(&self) -> &DataInp {
        &self.input
    }

    /// Snapshot of the last completed tick.
    pub fn output(&self) -> &DataOut {
        &self.output
    }

    /// Most recent initialization failure, cleared by a successful `Init`.
    pub fn last_error(&self) -> Option<&FdmError> {
        self.last_error.as_ref()
    }

    /// Failed initialization attempts since construction.
    pub fn init_failures(&self) -> u64 {
        self.init_failures
    }

    /// Ticks spent in `Work` since the last `Init`.
    pub fn work_ticks(&self) -> u64 {
        self.work_ticks
    }

    /// Replace the input snapshot used from the next tick on.
    pub fn set_input(&mut self, input: DataInp) {
        self.input = input;
    }

    /// Run one tick and return its output.
    pub fn tick(&mut self) -> &DataOut {
        self.transition(self.input.phase);
        match self.phase {
            Phase::Idle => {
                self.output.phase = Phase::Idle;
            }
            Phase::Init | Phase::Freeze => {
                let phase = self.phase;
                let (dt, input) = (self.dt, self.input);
                if let Some(aircraft) = self.aircraft.as_mut() {
                    aircraft.set_inputs(&input);
                    aircraft.refresh(dt);
                    self.output = aircraft.output(phase);
                }
            }
            Phase::Work => self.work(),
            Phase::Pause => {
                self.output.phase = Phase::Pause;
            }
            Phase::Stop => {
                self.aircraft = None;
                self.output = DataOut::default();
                self.set_phase(Phase::Idle);
            }
        }
        &self.output
    }

    fn transition(&mut self, requested: Phase) {
        if self.refused.is_some_and(|r| r != requested) {
            self.refused = None;
        }
        let current = self.phase;
        if requested == Phase::Idle || requested == current || self.refused == Some(requested) {
            return;
        }
        let accepted = match (current, requested) {
            (_, Phase::Stop) => {
                self.set_phase(Phase::Stop);
                true
            }
            (Phase::Stop, _) => {
                warn!(?requested, "transition rejected while stopping");
                false
            }
            (_, Phase::Init) => self.initialize(),
            (Phase::Idle, Phase::Work) => {
                let ok = self.initialize();
                if ok {
                    self.set_phase(Phase::Work);
                }
                ok
            }
            (Phase::Init | Phase::Freeze | Phase::Pause, Phase::Work) => {
                if self.output.crash.is_crash() {
                    warn!(crash = ?self.output.crash, "work rejected after crash; reinitialize first");
                    false
                } else {
                    self.set_phase(Phase::Work);
                    true
                }
            }
            (Phase::Idle, Phase::Freeze | Phase::Pause) => {
                warn!(?requested, "transition rejected: no aircraft initialized");
                false
            }
            (_, Phase::Freeze | Phase::Pause) => {
                self.set_phase(requested);
                true
            }
            (_, Phase::Idle | Phase::Work) => {
                warn!(?current, ?requested, "transition rejected");
                false
            }
        };
        if !accepted {
            self.refused = Some(requested);
        }
    }

    /// Build (or rebuild) the aircraft. On failure the error is kept and the
    /// manager is left in `Idle`.
    fn initialize(&mut self) -> bool {
        match self.build() {
            Ok(()) => {
                self.last_error = None;
                self.work_ticks = 0;
                self.set_phase(Phase::Init);
                true
            }
            Err(err) => {
                warn!(aircraft = %self.def.name, error = %err, "initialization failed");
                self.init_failures += 1;
                self.aircraft = None;
                self.last_error = Some(err);
                self.output = DataOut::default();
                self.set_phase(Phase::Idle);
                false
            }
        }
    }

    fn build(&mut self) -> FdmResult<()> {
        match self.aircraft.as_mut() {
            Some(aircraft) => aircraft.reinitialize(&self.input),
            None => {
                let aircraft = Aircraft::new(&self.def, &self.input)
                    .with_context(|| format!("initializing aircraft '{}'", self.def.name))?;
                self.aircraft = Some(aircraft);
            }
        }
        if let Some(aircraft) = self.aircraft.as_ref() {
            self.output = aircraft.output(Phase::Init);
        }
        Ok(())
    }

    fn work(&mut self) {
        let Some(aircraft) = self.aircraft.as_mut() else {
            self.set_phase(Phase::Idle);
            return;
        };
        let (n, h) = substeps(self.dt, self.input.time_coef);
        aircraft.set_inputs(&self.input);
        for _ in 0..n {
            aircraft.step(h);
            if aircraft.crash().is_crash() {
                break;
            }
        }
        self.work_ticks += 1;

        let crash = aircraft.crash();
        let next = if crash.is_crash() { Phase::Freeze } else { Phase::Work };
        self.output = aircraft.output(next);
        if next != Phase::Work {
            warn!(?crash, sim_time = self.output.sim_time, "crash detected, freezing");
            self.set_phase(next);
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if phase != self.phase {
            info!(from = ?self.phase, to = ?phase, "phase transition");
            self.phase = phase;
        }
        self.output.phase = phase;
    }
}

/// Number of integration substeps and their length for one tick of base
/// length `dt`. No substep exceeds `dt`.
pub(crate) fn substeps(dt: f64, time_coef: f64) -> (usize, f64) {
    let coef = if time_coef.is_finite() {
        time_coef.clamp(MIN_TIME_COEF, MAX_TIME_COEF)
    } else {
        1.0
    };
    let n = (coef.ceil() as usize).max(1);
    let h = dt * coef / n as f64;
    (n, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn substeps_never_exceed_base_step() {
        let dt = 0.01;
        for coef in [0.1, 0.5, 1.0, 1.5, 2.5, 10.0] {
            let (n, h) = substeps(dt, coef);
            assert!(h <= dt + 1e-15, "coef {coef}: h = {h}");
            assert_relative_eq!(n as f64 * h, dt * coef, epsilon = 1e-15);
        }
        assert_eq!(substeps(dt, 2.5).0, 3);
    }

    #[test]
    fn time_coef_is_clamped() {
        let dt = 0.01;
        assert_eq!(substeps(dt, 100.0).0, 10);
        assert_relative_eq!(substeps(dt, 0.0).1, dt * MIN_TIME_COEF);
        assert_eq!(substeps(dt, f64::NAN), (1, dt));
    }
}
