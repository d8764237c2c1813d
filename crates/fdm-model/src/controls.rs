//! Control channels: pilot inputs to actuator positions.
//!
//! Each channel sums its weighted inputs, passes the sum through an optional
//! shaping table and element chain, clamps it to optional limits and writes
//! the result to its output path. Channels run in configuration order, so a
//! channel may read the output of an earlier one.
//!
//! Input paths must already exist on the bus when the channels are built;
//! only the output path is created here.

use fdm_config::ChannelDef;
use fdm_controls::Element;
use fdm_core::{DataBus, DataRef, FdmResult, ResultExt, Table1D};
use tracing::debug;

use crate::traits::{ControlChannelMapper, Subsystem};

#[derive(Debug)]
struct Channel {
    name: String,
    inputs: Vec<(DataRef, f64)>,
    table: Option<Table1D>,
    elements: Vec<Box<dyn Element>>,
    limits: Option<(f64, f64)>,
    output: DataRef,
}

impl Channel {
    fn raw_input(&self, bus: &DataBus) -> f64 {
        let sum: f64 = self.inputs.iter().map(|&(r, gain)| gain * bus.get(r)).sum();
        match &self.table {
            Some(table) => table.value(sum),
            None => sum,
        }
    }

    fn limit(&self, v: f64) -> f64 {
        match self.limits {
            Some((lo, hi)) => v.max(lo).min(hi),
            None => v,
        }
    }

    fn evaluate(&mut self, dt: f64, bus: &DataBus) -> f64 {
        let mut v = self.raw_input(bus);
        for element in &mut self.elements {
            element.update(dt, v);
            v = element.value();
        }
        self.limit(v)
    }

    /// Put every element in steady state for the current input.
    fn prime(&mut self, bus: &DataBus) -> f64 {
        let mut v = self.raw_input(bus);
        for element in &mut self.elements {
            v = element.prime(v);
        }
        self.limit(v)
    }
}

#[derive(Debug, Default)]
pub struct Controls {
    channels: Vec<Channel>,
}

impl Controls {
    pub fn new(defs: &[ChannelDef], bus: &mut DataBus) -> FdmResult<Self> {
        let mut channels = Vec::with_capacity(defs.len());
        for def in defs {
            channels.push(
                Self::build_channel(def, bus)
                    .with_context(|| format!("building control channel '{}'", def.name))?,
            );
        }
        debug!(channels = channels.len(), "control channels bound");
        Ok(Self { channels })
    }

    fn build_channel(def: &ChannelDef, bus: &mut DataBus) -> FdmResult<Channel> {
        let mut inputs = Vec::with_capacity(def.inputs.len());
        for input in &def.inputs {
            inputs.push((bus.get_ref(&input.path)?, input.gain));
        }
        let table = def.table.as_ref().map(|t| t.to_table()).transpose()?;
        let mut elements = Vec::with_capacity(def.elements.len());
        for spec in &def.elements {
            elements.push(spec.build().map_err(fdm_core::FdmError::from)?);
        }
        Ok(Channel {
            name: def.name.clone(),
            inputs,
            table,
            elements,
            limits: def.limits.map(|[lo, hi]| (lo, hi)),
            output: bus.add_value(&def.output)?,
        })
    }

    /// Set every channel output to the steady-state value of its current
    /// input, without dynamics.
    pub fn prime(&mut self, bus: &mut DataBus) {
        for channel in &mut self.channels {
            let v = channel.prime(bus);
            bus.set(channel.output, v);
        }
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl ControlChannelMapper for Controls {
    fn map_channels(&mut self, dt: f64, bus: &mut DataBus) {
        for channel in &mut self.channels {
            let v = channel.evaluate(dt, bus);
            bus.set(channel.output, v);
        }
    }
}

impl Subsystem for Controls {
    fn name(&self) -> &'static str {
        "controls"
    }

    fn reinitialize(&mut self) {
        for channel in &mut self.channels {
            for element in &mut channel.elements {
                element.reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdm_config::{ChannelInput, TableDef};
    use fdm_controls::ElementSpec;
    use fdm_core::FdmError;

    fn bus_with(paths: &[&str]) -> DataBus {
        let mut bus = DataBus::new();
        for path in paths {
            bus.add_value(path).unwrap();
        }
        bus
    }

    fn channel(name: &str, inputs: &[(&str, f64)], output: &str) -> ChannelDef {
        ChannelDef {
            name: name.to_string(),
            inputs: inputs
                .iter()
                .map(|&(path, gain)| ChannelInput {
                    path: path.to_string(),
                    gain,
                })
                .collect(),
            table: None,
            elements: vec![],
            limits: None,
            output: output.to_string(),
        }
    }

    #[test]
    fn weighted_sum_with_limits() {
        let mut def = channel(
            "elevator",
            &[("input/controls/pitch", -0.4), ("input/controls/pitch_trim", -0.4)],
            "controls/elevator",
        );
        def.limits = Some([-0.4, 0.3]);
        let mut bus = bus_with(&["input/controls/pitch", "input/controls/pitch_trim"]);
        let mut controls = Controls::new(&[def], &mut bus).unwrap();

        bus.set_value("input/controls/pitch", 0.5).unwrap();
        bus.set_value("input/controls/pitch_trim", 0.25).unwrap();
        controls.map_channels(0.01, &mut bus);
        assert!((bus.get_value("controls/elevator").unwrap() + 0.3).abs() < 1e-12);

        bus.set_value("input/controls/pitch", 1.0).unwrap();
        controls.map_channels(0.01, &mut bus);
        assert_eq!(bus.get_value("controls/elevator").unwrap(), -0.4);
    }

    #[test]
    fn table_then_elements() {
        let mut def = channel("flaps", &[("input/controls/flaps", 1.0)], "controls/flaps");
        def.table = Some(TableDef {
            keys: vec![0.0, 1.0],
            values: vec![0.0, 2.0],
        });
        def.elements = vec![ElementSpec::RateLimiter { rate: 1.0 }];
        let mut bus = bus_with(&["input/controls/flaps"]);
        let mut controls = Controls::new(&[def], &mut bus).unwrap();

        bus.set_value("input/controls/flaps", 1.0).unwrap();
        for _ in 0..10 {
            controls.map_channels(0.1, &mut bus);
        }
        let v = bus.get_value("controls/flaps").unwrap();
        assert!((v - 1.0).abs() < 1e-9, "{v}");
    }

    #[test]
    fn later_channels_see_earlier_outputs() {
        let damper = channel("damper", &[("output/flight/r", 0.5)], "controls/yaw_damper");
        let rudder = channel(
            "rudder",
            &[("input/controls/yaw", 1.0), ("controls/yaw_damper", 1.0)],
            "controls/rudder",
        );
        let mut bus = bus_with(&["output/flight/r", "input/controls/yaw"]);
        let mut controls = Controls::new(&[damper, rudder], &mut bus).unwrap();
        bus.set_value("output/flight/r", 0.2).unwrap();
        controls.map_channels(0.01, &mut bus);
        assert!((bus.get_value("controls/rudder").unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn prime_skips_transients_and_reinitialize_clears() {
        let mut def = channel("aileron", &[("input/controls/roll", 1.0)], "controls/aileron");
        def.elements = vec![ElementSpec::Lag { tc: 1.0 }];
        let mut bus = bus_with(&["input/controls/roll"]);
        let mut controls = Controls::new(&[def], &mut bus).unwrap();

        bus.set_value("input/controls/roll", 0.5).unwrap();
        controls.prime(&mut bus);
        controls.map_channels(0.01, &mut bus);
        assert!((bus.get_value("controls/aileron").unwrap() - 0.5).abs() < 1e-12);

        controls.reinitialize();
        controls.map_channels(0.01, &mut bus);
        assert!(bus.get_value("controls/aileron").unwrap() < 0.01);
    }

    #[test]
    fn prime_carries_dc_gain_through_the_chain() {
        let mut def = channel("pitch_damper", &[("input/controls/pitch", 1.0)], "controls/elevator");
        def.elements = vec![
            ElementSpec::LeadLag {
                c1: 0.2,
                c2: 1.0,
                c3: 0.5,
                c4: 2.0,
            },
            ElementSpec::Lag { tc: 0.3 },
        ];
        let mut bus = bus_with(&["input/controls/pitch"]);
        let mut controls = Controls::new(&[def], &mut bus).unwrap();

        bus.set_value("input/controls/pitch", 0.8).unwrap();
        controls.prime(&mut bus);
        assert!((bus.get_value("controls/elevator").unwrap() - 0.4).abs() < 1e-12);
        controls.map_channels(0.01, &mut bus);
        assert!((bus.get_value("controls/elevator").unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn unknown_input_path_is_null_pointer() {
        let def = channel("aileron", &[("input/controls/rol", 1.0)], "controls/aileron");
        let mut bus = bus_with(&["input/controls/roll"]);
        let err = Controls::new(&[def], &mut bus).unwrap_err();

        assert!(matches!(err.root_cause(), FdmError::NullPointer { .. }));
        assert!(err.to_string().contains("aileron"));
        assert!(bus.get_node("input/controls/rol").is_none());
    }

    #[test]
    fn input_may_not_name_a_later_channel_output() {
        let rudder = channel("rudder", &[("controls/yaw_damper", 1.0)], "controls/rudder");
        let damper = channel("damper", &[("output/flight/r", 0.5)], "controls/yaw_damper");
        let mut bus = bus_with(&["output/flight/r"]);
        assert!(Controls::new(&[rudder, damper], &mut bus).is_err());
    }
}
