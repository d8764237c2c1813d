//! Air-relative flight quantities.

use nalgebra::Vector3;

use crate::environment::{AtmosphereState, STD_SL_DENSITY, STD_SL_PRESSURE, STD_SL_SPEED_OF_SOUND};

/// Below this true airspeed (m/s) flow angles and non-dimensional rates are
/// reported as zero.
pub const MIN_AIRSPEED: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AirData {
    /// Velocity relative to the air mass, body axes (m/s).
    pub velocity: Vector3<f64>,
    pub true_airspeed: f64,
    /// rad
    pub alpha: f64,
    /// rad
    pub beta: f64,
    /// Pa
    pub dynamic_pressure: f64,
    pub mach: f64,
    /// `p b / 2V`
    pub p_hat: f64,
    /// `q c / 2V`
    pub q_hat: f64,
    /// `r b / 2V`
    pub r_hat: f64,
}

impl AirData {
    /// Air data for body velocity `velocity` relative to the air mass and
    /// body rates `omega`, normalized with span `span` and chord `chord`.
    pub fn compute(
        velocity: Vector3<f64>,
        omega: &Vector3<f64>,
        atmosphere: &AtmosphereState,
        span: f64,
        chord: f64,
    ) -> Self {
        let tas = velocity.norm();
        if !(tas > MIN_AIRSPEED) {
            return Self {
                velocity,
                true_airspeed: tas,
                ..Self::default()
            };
        }
        let alpha = velocity.z.atan2(velocity.x);
        let beta = (velocity.y / tas).clamp(-1.0, 1.0).asin();
        let two_v = 2.0 * tas;
        Self {
            velocity,
            true_airspeed: tas,
            alpha,
            beta,
            dynamic_pressure: 0.5 * atmosphere.density * tas * tas,
            mach: tas / atmosphere.speed_of_sound,
            p_hat: omega.x * span / two_v,
            q_hat: omega.y * chord / two_v,
            r_hat: omega.z * span / two_v,
        }
    }

    /// Equivalent airspeed (m/s).
    pub fn equivalent_airspeed(&self, atmosphere: &AtmosphereState) -> f64 {
        self.true_airspeed * (atmosphere.density / STD_SL_DENSITY).sqrt()
    }

    /// Indicated airspeed (m/s) from the subsonic compressible impact pressure.
    pub fn indicated_airspeed(&self, atmosphere: &AtmosphereState) -> f64 {
        indicated_airspeed(self.mach, atmosphere.pressure)
    }
}

/// Impact pressure for Mach `mach` at static pressure `p` (subsonic isentropic).
pub fn impact_pressure(mach: f64, p: f64) -> f64 {
    p * ((1.0 + 0.2 * mach * mach).powf(3.5) - 1.0)
}

/// Calibrated airspeed that reads the impact pressure of `mach` at `p`.
pub fn indicated_airspeed(mach: f64, p: f64) -> f64 {
    let qc = impact_pressure(mach, p);
    STD_SL_SPEED_OF_SOUND * (5.0 * ((qc / STD_SL_PRESSURE + 1.0).powf(2.0 / 7.0) - 1.0)).max(0.0).sqrt()
}
