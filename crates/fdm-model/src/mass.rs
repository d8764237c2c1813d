//! Variable mass, centre of gravity and inertia.
//!
//! The empty aircraft is combined with point-mass stations whose values are
//! read from `input/masses/station_<n>`. Fuel tank stations are additionally
//! drained by the engines; an input value only overrides a tank when the
//! input itself changes.

use fdm_config::{InertiaDef, MassDef};
use fdm_core::{DataBus, DataRef, FdmResult, ResultExt};
use nalgebra::{Matrix3, Vector3};
use tracing::debug;

use crate::paths;
use crate::traits::Subsystem;

#[derive(Debug, Clone)]
struct Station {
    position: Vector3<f64>,
    max: f64,
    fuel_tank: bool,
    mass: f64,
    initial: f64,
    last_input: f64,
    input: DataRef,
}

#[derive(Debug, Clone, Copy)]
struct MassOutputs {
    total: DataRef,
    fuel: DataRef,
    cg_x: DataRef,
    cg_y: DataRef,
    cg_z: DataRef,
}

/// Inertia tensor from its entries, products of inertia taken as `∫ x y dm`.
pub fn inertia_matrix(i: &InertiaDef) -> Matrix3<f64> {
    Matrix3::new(
        i.ixx, -i.ixy, -i.ixz, //
        -i.ixy, i.iyy, -i.iyz, //
        -i.ixz, -i.iyz, i.izz,
    )
}

/// Inertia of a point mass `m` at offset `d` about the reference point.
fn point_inertia(m: f64, d: &Vector3<f64>) -> Matrix3<f64> {
    (Matrix3::identity() * d.norm_squared() - d * d.transpose()) * m
}

#[derive(Debug, Clone)]
pub struct Mass {
    empty_mass: f64,
    empty_cg: Vector3<f64>,
    empty_inertia: Matrix3<f64>,
    stations: Vec<Station>,
    pilot_position: Option<Vector3<f64>>,
    outputs: MassOutputs,

    total: f64,
    cg: Vector3<f64>,
    inertia: Matrix3<f64>,
    inertia_inv: Matrix3<f64>,
}

impl Mass {
    pub fn new(def: &MassDef, bus: &mut DataBus) -> FdmResult<Self> {
        let mut stations = Vec::with_capacity(def.stations.len());
        for (k, s) in def.stations.iter().enumerate() {
            let path = paths::mass_station_input(k);
            let input = bus
                .add_value(&path)
                .with_context(|| format!("binding mass station '{}'", s.name))?;
            bus.set(input, s.initial);
            stations.push(Station {
                position: Vector3::from(s.position),
                max: s.max,
                fuel_tank: s.fuel_tank,
                mass: s.initial,
                initial: s.initial,
                last_input: s.initial,
                input,
            });
        }
        let mut out = |name: &str| {
            bus.add_value(&paths::mass_output(name))
                .with_context(|| format!("binding mass output '{name}'"))
        };
        let outputs = MassOutputs {
            total: out("total")?,
            fuel: out("fuel")?,
            cg_x: out("cg_x")?,
            cg_y: out("cg_y")?,
            cg_z: out("cg_z")?,
        };

        let mut mass = Self {
            empty_mass: def.empty_mass,
            empty_cg: Vector3::from(def.cg),
            empty_inertia: inertia_matrix(&def.inertia),
            stations,
            pilot_position: def.pilot_position.map(Vector3::from),
            outputs,
            total: def.empty_mass,
            cg: Vector3::from(def.cg),
            inertia: Matrix3::zeros(),
            inertia_inv: Matrix3::zeros(),
        };
        mass.recombine();
        debug!(
            total = mass.total,
            stations = mass.stations.len(),
            "mass properties bound"
        );
        Ok(mass)
    }

    /// Read station inputs and recombine mass properties.
    pub fn update(&mut self, bus: &DataBus) {
        for s in &mut self.stations {
            let v = bus.get(s.input);
            if v != s.last_input && v.is_finite() {
                s.mass = v.max(0.0).min(s.max);
                s.last_input = v;
            }
        }
        self.recombine();
    }

    fn recombine(&mut self) {
        let mut total = self.empty_mass;
        let mut moment = self.empty_cg * self.empty_mass;
        for s in &self.stations {
            total += s.mass;
            moment += s.position * s.mass;
        }
        let cg = if total > 0.0 { moment / total } else { self.empty_cg };

        let mut inertia = self.empty_inertia + point_inertia(self.empty_mass, &(self.empty_cg - cg));
        for s in &self.stations {
            inertia += point_inertia(s.mass, &(s.position - cg));
        }

        self.total = total;
        self.cg = cg;
        self.inertia = inertia;
        self.inertia_inv = inertia.try_inverse().unwrap_or_else(Matrix3::zeros);
    }

    /// Write the current station masses to their bus inputs.
    pub fn write_inputs(&mut self, bus: &mut DataBus) {
        for s in &mut self.stations {
            bus.set(s.input, s.mass);
            s.last_input = s.mass;
        }
    }

    /// Remove `amount` kg of fuel, spread evenly over the tanks that still
    /// hold fuel. Returns the mass actually removed.
    pub fn drain_fuel(&mut self, amount: f64) -> f64 {
        let mut remaining = amount.max(0.0);
        let mut removed = 0.0;
        // spreading repeatedly handles tanks running dry mid-drain
        for _ in 0..self.stations.len() {
            let tanks = self
                .stations
                .iter()
                .filter(|s| s.fuel_tank && s.mass > 0.0)
                .count();
            if tanks == 0 || remaining <= 0.0 {
                break;
            }
            let share = remaining / tanks as f64;
            for s in self.stations.iter_mut().filter(|s| s.fuel_tank && s.mass > 0.0) {
                let take = share.min(s.mass);
                s.mass -= take;
                remaining -= take;
                removed += take;
            }
        }
        if removed > 0.0 {
            self.recombine();
        }
        removed
    }

    /// Fuel on board (kg).
    pub fn fuel(&self) -> f64 {
        self.stations.iter().filter(|s| s.fuel_tank).map(|s| s.mass).sum()
    }

    /// Aircraft without fuel tanks are treated as having unlimited fuel.
    pub fn fuel_available(&self) -> bool {
        !self.stations.iter().any(|s| s.fuel_tank) || self.fuel() > 0.0
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn cg(&self) -> Vector3<f64> {
        self.cg
    }

    /// Inertia about the centre of gravity.
    pub fn inertia(&self) -> &Matrix3<f64> {
        &self.inertia
    }

    pub fn inertia_inv(&self) -> &Matrix3<f64> {
        &self.inertia_inv
    }

    /// Point at which the pilot g-force is evaluated.
    pub fn pilot_position(&self) -> Vector3<f64> {
        self.pilot_position.unwrap_or(self.cg)
    }

    pub fn station_mass(&self, index: usize) -> Option<f64> {
        self.stations.get(index).map(|s| s.mass)
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }
}

impl Subsystem for Mass {
    fn name(&self) -> &'static str {
        "mass"
    }

    fn reinitialize(&mut self) {
        for s in &mut self.stations {
            s.mass = s.initial;
            s.last_input = s.initial;
        }
        self.recombine();
    }

    fn publish(&self, bus: &mut DataBus) {
        let o = &self.outputs;
        bus.set(o.total, self.total);
        bus.set(o.fuel, self.fuel());
        bus.set(o.cg_x, self.cg.x);
        bus.set(o.cg_y, self.cg.y);
        bus.set(o.cg_z, self.cg.z);
    }
}
