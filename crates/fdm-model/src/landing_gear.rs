//! Landing gear ground contact.
//!
//! Each wheel is a spring-damper strut along body z ending in a contact
//! point. Penetration of the contact point below the terrain produces a
//! normal force `N = max(0, k s + c ds/dt)`; rolling, braking and side
//! friction are proportional to `N` and saturate linearly with the contact
//! point's ground speed.

use fdm_config::{BrakeGroup, LandingGearDef, WheelDef};
use fdm_core::{DataBus, DataRef, FdmError, FdmResult, ResultExt};
use nalgebra::{UnitQuaternion, Vector3};
use tracing::debug;

use crate::paths;
use crate::traits::{ForceContext, ForceContributor, ForceMoment, Subsystem};

/// Contact-point speed (m/s) at which friction reaches its full value.
const FRICTION_SATURATION_SPEED: f64 = 0.1;
/// Gear position above which retractable gear is locked down.
const GEAR_DOWN_LOCKED: f64 = 0.99;

#[derive(Debug, Clone, Copy)]
struct WheelOutputs {
    wow: DataRef,
    compression: DataRef,
    normal_force: DataRef,
}

/// Contact result of the last evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelState {
    pub compression: f64,
    pub normal_force: f64,
    pub wow: bool,
}

#[derive(Debug, Clone)]
struct Wheel {
    name: String,
    tip: Vector3<f64>,
    stiffness: f64,
    damping: f64,
    max_compression: f64,
    friction_rolling: f64,
    friction_side: f64,
    friction_braking: f64,
    brake: BrakeGroup,
    steerable: bool,
    outputs: WheelOutputs,
    state: WheelState,
}

impl Wheel {
    fn new(index: usize, def: &WheelDef, steerable: bool, bus: &mut DataBus) -> FdmResult<Self> {
        let mut out = |name: &str| bus.add_value(&paths::wheel_output(index, name));
        let outputs = WheelOutputs {
            wow: out("wow")?,
            compression: out("compression")?,
            normal_force: out("normal_force")?,
        };
        Ok(Self {
            name: def.name.clone(),
            tip: Vector3::from(def.attach) + Vector3::z() * def.length,
            stiffness: def.stiffness,
            damping: def.damping,
            max_compression: def.max_compression,
            friction_rolling: def.friction_rolling,
            friction_side: def.friction_side,
            friction_braking: def.friction_braking,
            brake: def.brake,
            steerable,
            outputs,
            state: WheelState::default(),
        })
    }

    /// Penetration of the contact point below the terrain for a body origin
    /// `agl` above it.
    fn penetration(&self, q_bn: &UnitQuaternion<f64>, agl: f64) -> f64 {
        let tip_n = q_bn * self.tip;
        tip_n.z - agl
    }
}

#[derive(Debug, Clone, Copy)]
struct GearRefs {
    brake_left: DataRef,
    brake_right: DataRef,
    steering: DataRef,
    position: DataRef,
}

#[derive(Debug, Clone)]
pub struct LandingGear {
    wheels: Vec<Wheel>,
    max_steering: f64,
    retractable: bool,
    refs: GearRefs,
    last_load: ForceMoment,
}

fn saturate(v: f64) -> f64 {
    (v / FRICTION_SATURATION_SPEED).max(-1.0).min(1.0)
}

impl LandingGear {
    pub fn new(def: &LandingGearDef, bus: &mut DataBus) -> FdmResult<Self> {
        if let Some(name) = &def.steering_wheel {
            if !def.wheels.iter().any(|w| &w.name == name) {
                return Err(FdmError::unknown_lookup(format!(
                    "obtaining wheels failed: steering wheel '{name}' not defined"
                )));
            }
        }
        let mut wheels = Vec::with_capacity(def.wheels.len());
        for (k, w) in def.wheels.iter().enumerate() {
            let steerable = def.steering_wheel.as_deref() == Some(w.name.as_str());
            wheels.push(
                Wheel::new(k, w, steerable, bus)
                    .with_context(|| format!("binding wheel '{}'", w.name))?,
            );
        }
        let mut bind = |name: &str| {
            bus.add_value(&paths::actuator(name))
                .with_context(|| format!("binding landing gear to '{name}'"))
        };
        let refs = GearRefs {
            brake_left: bind("brake_left")?,
            brake_right: bind("brake_right")?,
            steering: bind("nose_wheel_steering")?,
            position: bind("landing_gear")?,
        };
        debug!(wheels = wheels.len(), retractable = def.retractable, "landing gear bound");
        Ok(Self {
            wheels,
            max_steering: def.max_steering_deg.to_radians(),
            retractable: def.retractable,
            refs,
            last_load: ForceMoment::zero(),
        })
    }

    pub fn wheel_count(&self) -> usize {
        self.wheels.len()
    }

    pub fn wheel_name(&self, index: usize) -> Option<&str> {
        self.wheels.get(index).map(|w| w.name.as_str())
    }

    pub fn wheel_states(&self) -> impl Iterator<Item = WheelState> + '_ {
        self.wheels.iter().map(|w| w.state)
    }

    pub fn weight_on_wheels(&self) -> bool {
        self.wheels.iter().any(|w| w.state.wow)
    }

    /// Some strut was compressed beyond its travel.
    pub fn bottomed(&self) -> bool {
        self.wheels.iter().any(|w| w.state.compression > w.max_compression)
    }

    pub fn last_load(&self) -> ForceMoment {
        self.last_load
    }

    /// Largest depth of a contact point below the body origin at attitude `q_bn`.
    pub fn max_tip_depth(&self, q_bn: &UnitQuaternion<f64>) -> Option<f64> {
        self.wheels
            .iter()
            .map(|w| (q_bn * w.tip).z)
            .reduce(f64::max)
    }

    /// Total spring force of the struts with the body origin `agl` above the
    /// terrain, at rest.
    pub fn static_normal_force(&self, q_bn: &UnitQuaternion<f64>, agl: f64) -> f64 {
        self.wheels
            .iter()
            .map(|w| w.stiffness * w.penetration(q_bn, agl).max(0.0))
            .sum()
    }

    fn gear_down(&self, bus: &DataBus) -> bool {
        !self.retractable || bus.get(self.refs.position) >= GEAR_DOWN_LOCKED
    }
}

impl ForceContributor for LandingGear {
    fn compute_force_and_moment(&mut self, ctx: &ForceContext<'_>, bus: &DataBus) -> ForceMoment {
        let mut total = ForceMoment::zero();
        let down = self.gear_down(bus);
        let brake_left = bus.get(self.refs.brake_left).clamp(0.0, 1.0);
        let brake_right = bus.get(self.refs.brake_right).clamp(0.0, 1.0);
        let steering = bus.get(self.refs.steering).clamp(-1.0, 1.0) * self.max_steering;

        for wheel in &mut self.wheels {
            let penetration = wheel.penetration(&ctx.q_bn, ctx.altitude_agl);
            if !down || penetration <= 0.0 {
                wheel.state = WheelState::default();
                continue;
            }

            let v_tip = ctx.q_bn * (ctx.velocity + ctx.omega.cross(&wheel.tip));
            let normal = (wheel.stiffness * penetration + wheel.damping * v_tip.z).max(0.0);

            let angle = if wheel.steerable { steering } else { 0.0 };
            let heading_n = ctx.q_bn * Vector3::new(angle.cos(), angle.sin(), 0.0);
            let mut force_n = Vector3::new(0.0, 0.0, -normal);
            let horizontal = Vector3::new(heading_n.x, heading_n.y, 0.0);
            if let Some(forward) = horizontal.try_normalize(1e-6) {
                let side = Vector3::new(-forward.y, forward.x, 0.0);
                let brake = match wheel.brake {
                    BrakeGroup::None => 0.0,
                    BrakeGroup::Left => brake_left,
                    BrakeGroup::Right => brake_right,
                    BrakeGroup::Both => brake_left.max(brake_right),
                };
                let mu_long =
                    wheel.friction_rolling + brake * (wheel.friction_braking - wheel.friction_rolling);
                force_n -= forward * (mu_long * normal * saturate(v_tip.dot(&forward)));
                force_n -= side * (wheel.friction_side * normal * saturate(v_tip.dot(&side)));
            }

            let force_b = ctx.q_bn.inverse_transform_vector(&force_n);
            total += ForceMoment::at_point(force_b, &wheel.tip);
            wheel.state = WheelState {
                compression: penetration,
                normal_force: normal,
                wow: normal > 0.0,
            };
        }
        self.last_load = total;
        total
    }
}

impl Subsystem for LandingGear {
    fn name(&self) -> &'static str {
        "landing_gear"
    }

    fn reinitialize(&mut self) {
        for wheel in &mut self.wheels {
            wheel.state = WheelState::default();
        }
        self.last_load = ForceMoment::zero();
    }

    fn publish(&self, bus: &mut DataBus) {
        for wheel in &self.wheels {
            let o = &wheel.outputs;
            bus.set(o.wow, if wheel.state.wow { 1.0 } else { 0.0 });
            bus.set(o.compression, wheel.state.compression);
            bus.set(o.normal_force, wheel.state.normal_force);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air_data::AirData;
    use crate::environment::Atmosphere;
    use approx::assert_relative_eq;

    fn wheel(name: &str, attach: [f64; 3], brake: BrakeGroup) -> WheelDef {
        WheelDef {
            name: name.to_string(),
            attach,
            length: 0.5,
            stiffness: 10_000.0,
            damping: 1_000.0,
            max_compression: 0.2,
            friction_rolling: 0.02,
            friction_side: 0.8,
            friction_braking: 0.6,
            brake,
        }
    }

    fn gear() -> LandingGearDef {
        LandingGearDef {
            wheels: vec![
                wheel("nose", [1.0, 0.0, 0.5], BrakeGroup::None),
                wheel("left", [-0.5, -1.0, 0.5], BrakeGroup::Left),
                wheel("right", [-0.5, 1.0, 0.5], BrakeGroup::Right),
            ],
            steering_wheel: Some("nose".to_string()),
            max_steering_deg: 30.0,
            retractable: false,
        }
    }

    fn evaluate(gear: &mut LandingGear, bus: &DataBus, agl: f64, velocity: Vector3<f64>) -> ForceMoment {
        let atmosphere = Atmosphere::default().at_altitude(0.0);
        let air = AirData::default();
        let ctx = ForceContext {
            air: &air,
            atmosphere: &atmosphere,
            q_bn: UnitQuaternion::identity(),
            velocity,
            omega: Vector3::zeros(),
            cg: Vector3::zeros(),
            altitude_asl: agl,
            altitude_agl: agl,
            extra: &[],
            fuel_available: true,
        };
        gear.compute_force_and_moment(&ctx, bus)
    }

    #[test]
    fn missing_steering_wheel_is_unknown_lookup() {
        let mut def = gear();
        def.steering_wheel = Some("tail".to_string());
        let err = LandingGear::new(&def, &mut DataBus::new()).unwrap_err();
        assert_eq!(
            err,
            FdmError::unknown_lookup("obtaining wheels failed: steering wheel 'tail' not defined")
        );
    }

    #[test]
    fn airborne_wheels_carry_nothing() {
        let mut bus = DataBus::new();
        let mut g = LandingGear::new(&gear(), &mut bus).unwrap();
        let fm = evaluate(&mut g, &bus, 2.0, Vector3::zeros());
        assert_eq!(fm, ForceMoment::zero());
        assert!(!g.weight_on_wheels());
    }

    #[test]
    fn compressed_struts_push_up() {
        let mut bus = DataBus::new();
        let mut g = LandingGear::new(&gear(), &mut bus).unwrap();
        let fm = evaluate(&mut g, &bus, 0.9, Vector3::zeros());
        assert_relative_eq!(fm.force.z, -3.0 * 10_000.0 * 0.1, epsilon = 1e-9);
        assert!(g.weight_on_wheels());
        assert!(!g.bottomed());
        assert_relative_eq!(g.static_normal_force(&UnitQuaternion::identity(), 0.9), 3_000.0, epsilon = 1e-9);

        evaluate(&mut g, &bus, 0.7, Vector3::zeros());
        assert!(g.bottomed());
    }

    #[test]
    fn rolling_friction_opposes_motion_and_brakes_add() {
        let mut bus = DataBus::new();
        let mut g = LandingGear::new(&gear(), &mut bus).unwrap();
        let free = evaluate(&mut g, &bus, 0.9, Vector3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(free.force.x, -0.02 * 3_000.0, epsilon = 1e-9);

        bus.set_value("controls/brake_left", 1.0).unwrap();
        bus.set_value("controls/brake_right", 1.0).unwrap();
        let braked = evaluate(&mut g, &bus, 0.9, Vector3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(braked.force.x, -(0.02 + 0.6 + 0.6) * 1_000.0, epsilon = 1e-9);
    }

    #[test]
    fn steering_turns_nose_wheel_side_force() {
        let mut bus = DataBus::new();
        let mut g = LandingGear::new(&gear(), &mut bus).unwrap();
        bus.set_value("controls/nose_wheel_steering", 1.0).unwrap();
        let fm = evaluate(&mut g, &bus, 0.9, Vector3::new(5.0, 0.0, 0.0));
        // nose wheel steered right while rolling straight drifts left in its
        // own frame, so the ground pushes it right and yaws the nose right
        assert!(fm.force.y > 0.0);
        assert!(fm.moment.z > 0.0);
    }

    #[test]
    fn retracted_gear_carries_nothing() {
        let mut def = gear();
        def.retractable = true;
        let mut bus = DataBus::new();
        let mut g = LandingGear::new(&def, &mut bus).unwrap();
        let fm = evaluate(&mut g, &bus, 0.9, Vector3::zeros());
        assert_eq!(fm, ForceMoment::zero());

        bus.set_value("controls/landing_gear", 1.0).unwrap();
        let fm = evaluate(&mut g, &bus, 0.9, Vector3::zeros());
        assert!(fm.force.z < 0.0);
    }
}
