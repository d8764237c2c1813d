//! Propulsion: engines with one spin state each.
//!
//! Every engine owns one slot of the state vector (shaft speed for piston
//! engines, spool fraction for turbojets) integrated with the rigid body.
//! Running/stopped transitions and governors are discrete and advance once
//! per tick in [`Propulsion::post_step`].

pub mod piston;
pub mod turbojet;

use fdm_config::EngineDef;
use fdm_core::{DataBus, DataRef, FdmResult, ResultExt};
use nalgebra::Vector3;
use tracing::debug;

use crate::paths;
use crate::traits::{ExtraStates, ForceContext, ForceContributor, ForceMoment, Subsystem};

pub use piston::PistonEngine;
pub use turbojet::Turbojet;

/// Snapshot of one engine's input group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineInputs {
    pub throttle: f64,
    pub mixture: f64,
    pub propeller: f64,
    pub fuel: bool,
    pub ignition: bool,
    pub starter: bool,
}

/// Engine status of the last evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineStatus {
    pub running: bool,
    pub rpm: f64,
    /// N
    pub thrust: f64,
    /// Shaft power (W); zero for turbojets.
    pub power: f64,
    /// Shaft torque (N m); zero for turbojets.
    pub torque: f64,
    /// kg/s
    pub fuel_flow: f64,
    /// Blade pitch (deg); zero for turbojets.
    pub pitch: f64,
}

/// One engine model, evaluated against its own spin state `x`.
pub trait EngineModel: std::fmt::Debug + Send {
    fn kind(&self) -> &'static str;

    fn position(&self) -> Vector3<f64>;

    /// Force and moment about the body origin, and the spin state rate.
    fn evaluate(&mut self, ctx: &ForceContext<'_>, inputs: &EngineInputs, x: f64) -> (ForceMoment, f64);

    /// Discrete update once per tick after integration.
    fn post_step(&mut self, dt: f64, inputs: &EngineInputs, x: f64, fuel_available: bool);

    /// Mark the engine running and return the matching spin state.
    fn start_running(&mut self) -> f64;

    fn clamp_state(&self, x: f64) -> f64 {
        x.max(0.0)
    }

    fn status(&self) -> EngineStatus;

    fn reinitialize(&mut self);
}

#[derive(Debug, Clone, Copy)]
struct InputRefs {
    throttle: DataRef,
    mixture: DataRef,
    propeller: DataRef,
    fuel: DataRef,
    ignition: DataRef,
    starter: DataRef,
}

impl InputRefs {
    fn bind(index: usize, bus: &mut DataBus) -> FdmResult<Self> {
        let mut bind = |name: &str| bus.add_value(&paths::engine_input(index, name));
        Ok(Self {
            throttle: bind("throttle")?,
            mixture: bind("mixture")?,
            propeller: bind("propeller")?,
            fuel: bind("fuel")?,
            ignition: bind("ignition")?,
            starter: bind("starter")?,
        })
    }

    fn read(&self, bus: &DataBus) -> EngineInputs {
        let on = |r: DataRef| bus.get(r) > 0.5;
        EngineInputs {
            throttle: bus.get(self.throttle).clamp(0.0, 1.0),
            mixture: bus.get(self.mixture).clamp(0.0, 1.0),
            propeller: bus.get(self.propeller).clamp(0.0, 1.0),
            fuel: on(self.fuel),
            ignition: on(self.ignition),
            starter: on(self.starter),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OutputRefs {
    running: DataRef,
    rpm: DataRef,
    thrust: DataRef,
    power: DataRef,
    fuel_flow: DataRef,
    pitch: DataRef,
}

impl OutputRefs {
    fn bind(index: usize, bus: &mut DataBus) -> FdmResult<Self> {
        let mut bind = |name: &str| bus.add_value(&paths::engine_output(index, name));
        Ok(Self {
            running: bind("running")?,
            rpm: bind("rpm")?,
            thrust: bind("thrust")?,
            power: bind("power")?,
            fuel_flow: bind("fuel_flow")?,
            pitch: bind("pitch")?,
        })
    }
}

#[derive(Debug)]
struct EngineSlot {
    model: Box<dyn EngineModel>,
    inputs: InputRefs,
    outputs: OutputRefs,
    rate: f64,
}

#[derive(Debug, Default)]
pub struct Propulsion {
    engines: Vec<EngineSlot>,
    last_load: ForceMoment,
}

impl Propulsion {
    pub fn new(defs: &[EngineDef], bus: &mut DataBus) -> FdmResult<Self> {
        let mut engines = Vec::with_capacity(defs.len());
        for (k, def) in defs.iter().enumerate() {
            let slot = Self::build_slot(k, def, bus)
                .with_context(|| format!("building engine '{}'", def.name()))?;
            debug!(index = k + 1, kind = slot.model.kind(), name = def.name(), "engine bound");
            engines.push(slot);
        }
        Ok(Self {
            engines,
            last_load: ForceMoment::zero(),
        })
    }

    fn build_slot(index: usize, def: &EngineDef, bus: &mut DataBus) -> FdmResult<EngineSlot> {
        let model: Box<dyn EngineModel> = match def {
            EngineDef::Piston(p) => Box::new(PistonEngine::new(p)?),
            EngineDef::Turbojet(t) => Box::new(Turbojet::new(t)?),
        };
        Ok(EngineSlot {
            model,
            inputs: InputRefs::bind(index, bus)?,
            outputs: OutputRefs::bind(index, bus)?,
            rate: 0.0,
        })
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn statuses(&self) -> impl Iterator<Item = EngineStatus> + '_ {
        self.engines.iter().map(|e| e.model.status())
    }

    /// Total fuel flow of the last evaluation (kg/s).
    pub fn fuel_flow(&self) -> f64 {
        self.statuses().map(|s| s.fuel_flow).sum()
    }

    pub fn last_load(&self) -> ForceMoment {
        self.last_load
    }

    /// Start every engine; `out` receives the matching spin states.
    pub fn start_all(&mut self, out: &mut [f64]) {
        for (slot, x) in self.engines.iter_mut().zip(out.iter_mut()) {
            *x = slot.model.start_running();
        }
    }

    pub fn post_step(&mut self, dt: f64, extra: &[f64], bus: &DataBus, fuel_available: bool) {
        for (slot, &x) in self.engines.iter_mut().zip(extra) {
            let inputs = slot.inputs.read(bus);
            slot.model.post_step(dt, &inputs, x, fuel_available);
        }
    }
}

impl ForceContributor for Propulsion {
    fn compute_force_and_moment(&mut self, ctx: &ForceContext<'_>, bus: &DataBus) -> ForceMoment {
        let mut total = ForceMoment::zero();
        for (slot, &x) in self.engines.iter_mut().zip(ctx.extra) {
            let inputs = slot.inputs.read(bus);
            let (load, rate) = slot.model.evaluate(ctx, &inputs, x);
            slot.rate = rate;
            total += load;
        }
        self.last_load = total;
        total
    }
}

impl ExtraStates for Propulsion {
    fn extra_count(&self) -> usize {
        self.engines.len()
    }

    fn initial_extra(&self, out: &mut [f64]) {
        out.iter_mut().for_each(|x| *x = 0.0);
    }

    fn extra_derivatives(&self, out: &mut [f64]) {
        for (slot, d) in self.engines.iter().zip(out.iter_mut()) {
            *d = slot.rate;
        }
    }

    fn project_extra(&self, x: &mut [f64]) {
        for (slot, v) in self.engines.iter().zip(x.iter_mut()) {
            *v = slot.model.clamp_state(*v);
        }
    }
}

impl Subsystem for Propulsion {
    fn name(&self) -> &'static str {
        "propulsion"
    }

    fn reinitialize(&mut self) {
        for slot in &mut self.engines {
            slot.model.reinitialize();
            slot.rate = 0.0;
        }
        self.last_load = ForceMoment::zero();
    }

    fn publish(&self, bus: &mut DataBus) {
        for slot in &self.engines {
            let s = slot.model.status();
            let o = &slot.outputs;
            bus.set(o.running, if s.running { 1.0 } else { 0.0 });
            bus.set(o.rpm, s.rpm);
            bus.set(o.thrust, s.thrust);
            bus.set(o.power, s.power);
            bus.set(o.fuel_flow, s.fuel_flow);
            bus.set(o.pitch, s.pitch);
        }
    }
}
