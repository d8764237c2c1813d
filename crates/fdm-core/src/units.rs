// fdm-core/src/units.rs

use uom::si::angle::{degree, radian};
use uom::si::f64::{
    Angle as UomAngle, Length as UomLength, Pressure as UomPressure, Velocity as UomVelocity,
};
use uom::si::length::{foot, meter};
use uom::si::pressure::{hectopascal, pascal};
use uom::si::velocity::{foot_per_minute, knot, meter_per_second};

// Public canonical unit types (SI, f64)
pub type Angle = UomAngle;
pub type Length = UomLength;
pub type Pressure = UomPressure;
pub type Velocity = UomVelocity;

// Constructors (keeps call sites terse)
#[inline]
pub fn m(v: f64) -> Length {
    Length::new::<meter>(v)
}
#[inline]
pub fn ft(v: f64) -> Length {
    Length::new::<foot>(v)
}
#[inline]
pub fn mps(v: f64) -> Velocity {
    Velocity::new::<meter_per_second>(v)
}
#[inline]
pub fn kts(v: f64) -> Velocity {
    Velocity::new::<knot>(v)
}
#[inline]
pub fn pa(v: f64) -> Pressure {
    Pressure::new::<pascal>(v)
}
#[inline]
pub fn rad(v: f64) -> Angle {
    Angle::new::<radian>(v)
}
#[inline]
pub fn deg(v: f64) -> Angle {
    Angle::new::<degree>(v)
}

// Scalar conversions used where engine state is stored as raw SI f64.
pub fn m_to_ft(v: f64) -> f64 {
    m(v).get::<foot>()
}
pub fn ft_to_m(v: f64) -> f64 {
    ft(v).get::<meter>()
}
pub fn mps_to_kts(v: f64) -> f64 {
    mps(v).get::<knot>()
}
pub fn kts_to_mps(v: f64) -> f64 {
    kts(v).get::<meter_per_second>()
}
pub fn mps_to_fpm(v: f64) -> f64 {
    mps(v).get::<foot_per_minute>()
}
pub fn pa_to_hpa(v: f64) -> f64 {
    pa(v).get::<hectopascal>()
}
pub fn rad_to_deg(v: f64) -> f64 {
    rad(v).get::<degree>()
}
pub fn deg_to_rad(v: f64) -> f64 {
    deg(v).get::<radian>()
}

/// Reduce an angle to [0, 2π).
pub fn wrap_two_pi(angle: f64) -> f64 {
    angle.rem_euclid(std::f64::consts::TAU)
}

/// Reduce an angle to (-π, π].
pub fn wrap_pi(angle: f64) -> f64 {
    let a = wrap_two_pi(angle);
    if a > std::f64::consts::PI {
        a - std::f64::consts::TAU
    } else {
        a
    }
}
