//! PID controller with anti-windup.
//!
//! The integral term is accumulated in output units and only integrates the
//! part of the error that did not end up clipped by the last saturation:
//!
//! ```text
//! i += ki * (e - delta) * dt      delta = raw_output - saturated_output
//! d  = (e - e_prev) / dt
//! y  = sat(kp*e + i + kd*d)
//! ```

use crate::clamp;
use crate::element::Element;
use crate::error::{ControlError, ControlResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    saturation: Option<(f64, f64)>,
    integral: f64,
    error_prev: f64,
    derivative: f64,
    delta: f64,
    y: f64,
}

impl Pid {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            saturation: None,
            integral: 0.0,
            error_prev: 0.0,
            derivative: 0.0,
            delta: 0.0,
            y: 0.0,
        }
    }

    /// Enable output saturation to `[min, max]`.
    ///
    /// # Errors
    ///
    /// Fails if `min` is not strictly less than `max`.
    pub fn with_saturation(mut self, min: f64, max: f64) -> ControlResult<Self> {
        if !(min < max) {
            return Err(ControlError::InvalidArg {
                what: "pid min must be less than max",
            });
        }
        self.saturation = Some((min, max));
        Ok(self)
    }

    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    pub fn saturation(&self) -> Option<(f64, f64)> {
        self.saturation
    }

    /// Integral term, in output units.
    pub fn integral(&self) -> f64 {
        self.integral
    }
}

impl Element for Pid {
    /// `u` is the control error.
    fn update(&mut self, dt: f64, u: f64) {
        if !(dt > 0.0) {
            return;
        }
        let e = u;
        self.integral += self.ki * (e - self.delta) * dt;
        self.derivative = (e - self.error_prev) / dt;
        self.error_prev = e;

        let raw = self.kp * e + self.integral + self.kd * self.derivative;
        match self.saturation {
            Some((min, max)) => {
                self.y = clamp(raw, min, max);
                self.delta = raw - self.y;
            }
            None => {
                self.y = raw;
                self.delta = 0.0;
            }
        }
    }

    fn value(&self) -> f64 {
        self.y
    }

    fn set_value(&mut self, y: f64) {
        self.integral = y;
        self.error_prev = 0.0;
        self.derivative = 0.0;
        self.delta = 0.0;
        self.y = y;
    }

    fn reset(&mut self) {
        self.integral = 0.0;
        self.error_prev = 0.0;
        self.derivative = 0.0;
        self.delta = 0.0;
        self.y = 0.0;
    }

    /// Keeps the integral and seeds the error history with `u`, so the next
    /// update under the same error has no derivative kick.
    fn prime(&mut self, u: f64) -> f64 {
        self.error_prev = u;
        self.derivative = 0.0;
        let raw = self.kp * u + self.integral;
        self.y = match self.saturation {
            Some((min, max)) => clamp(raw, min, max),
            None => raw,
        };
        self.delta = raw - self.y;
        self.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_only() {
        let mut pid = Pid::new(2.0, 0.0, 0.0);
        pid.update(0.1, 0.25);
        assert_eq!(pid.value(), 0.5);
    }

    #[test]
    fn integral_accumulates_constant_error() {
        let mut pid = Pid::new(0.0, 1.0, 0.0);
        for _ in 0..10 {
            pid.update(0.1, 1.0);
        }
        assert!((pid.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_of_consecutive_errors() {
        let mut pid = Pid::new(0.0, 0.0, 0.5);
        pid.update(0.1, 0.0);
        pid.update(0.1, 1.0);
        assert!((pid.value() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn anti_windup_limits_integral_growth() {
        let mut clipped = Pid::new(1.0, 1.0, 0.0).with_saturation(-1.0, 1.0).unwrap();
        let mut free = Pid::new(1.0, 1.0, 0.0);
        for _ in 0..100 {
            clipped.update(0.1, 5.0);
            free.update(0.1, 5.0);
        }
        assert_eq!(clipped.value(), 1.0);
        assert!(clipped.integral() < free.integral());

        // Recovers promptly once the error reverses.
        for _ in 0..20 {
            clipped.update(0.1, -1.0);
        }
        assert!(clipped.value() < 0.0);
    }

    #[test]
    fn set_value_then_zero_error_returns_exactly() {
        let mut pid = Pid::new(1.3, 0.7, 0.2).with_saturation(-10.0, 10.0).unwrap();
        for k in 0..25 {
            pid.update(0.02, (k as f64 * 0.3).sin() * 20.0);
        }
        pid.set_value(0.123_456_789);
        pid.update(0.02, 0.0);
        assert_eq!(pid.value(), 0.123_456_789);
    }

    #[test]
    fn invalid_saturation_rejected() {
        assert!(Pid::new(1.0, 0.0, 0.0).with_saturation(1.0, 1.0).is_err());
        assert!(Pid::new(1.0, 0.0, 0.0).with_saturation(f64::NAN, 1.0).is_err());
    }
}
