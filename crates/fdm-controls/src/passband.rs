//! First-order low-pass and high-pass filters parameterized by cutoff.

use std::f64::consts::TAU;

use crate::element::Element;
use crate::lag::Lag;

/// Low-pass `omega / (s + omega)`, a [`Lag`] with `tc = 1/omega`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lpf {
    omega: f64,
    lag: Lag,
}

impl Lpf {
    pub fn new(omega: f64) -> Self {
        Self {
            omega,
            lag: Lag::new(1.0 / omega),
        }
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn set_omega(&mut self, omega: f64) {
        self.omega = omega;
        self.lag.set_time_constant(1.0 / omega);
    }

    pub fn set_cutoff_freq(&mut self, hz: f64) {
        self.set_omega(TAU * hz);
    }
}

impl Element for Lpf {
    fn update(&mut self, dt: f64, u: f64) {
        self.lag.update(dt, u);
    }

    fn value(&self) -> f64 {
        self.lag.value()
    }

    fn set_value(&mut self, y: f64) {
        self.lag.set_value(y);
    }

    fn reset(&mut self) {
        self.lag.reset();
    }
}

/// High-pass `s / (s + omega)`, computed as `u - LPF(u)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hpf {
    lpf: Lpf,
    y: f64,
}

impl Hpf {
    pub fn new(omega: f64) -> Self {
        Self {
            lpf: Lpf::new(omega),
            y: 0.0,
        }
    }

    pub fn omega(&self) -> f64 {
        self.lpf.omega()
    }

    pub fn set_omega(&mut self, omega: f64) {
        self.lpf.set_omega(omega);
    }

    pub fn set_cutoff_freq(&mut self, hz: f64) {
        self.lpf.set_cutoff_freq(hz);
    }
}

impl Element for Hpf {
    fn update(&mut self, dt: f64, u: f64) {
        if !(dt > 0.0) {
            return;
        }
        self.lpf.update(dt, u);
        self.y = u - self.lpf.value();
    }

    fn value(&self) -> f64 {
        self.y
    }

    /// Sets the output only; the low-pass memory keeps tracking the input.
    fn set_value(&mut self, y: f64) {
        self.y = y;
    }

    fn reset(&mut self) {
        self.lpf.reset();
        self.y = 0.0;
    }

    fn prime(&mut self, u: f64) -> f64 {
        self.lpf.set_value(u);
        self.y = 0.0;
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_setters_are_equivalent() {
        let mut a = Lpf::new(1.0);
        let mut b = Lpf::new(1.0);
        a.set_cutoff_freq(2.0);
        b.set_omega(TAU * 2.0);
        assert_eq!(a.omega(), b.omega());
        for _ in 0..10 {
            a.update(0.01, 1.0);
            b.update(0.01, 1.0);
        }
        assert_eq!(a.value(), b.value());
    }

    #[test]
    fn high_pass_complements_low_pass() {
        let mut lpf = Lpf::new(3.0);
        let mut hpf = Hpf::new(3.0);
        for k in 0..50 {
            let u = (k as f64 * 0.1).sin();
            lpf.update(0.02, u);
            hpf.update(0.02, u);
            assert!((lpf.value() + hpf.value() - u).abs() < 1e-12);
        }
    }

    #[test]
    fn high_pass_rejects_constant_input() {
        let mut hpf = Hpf::new(5.0);
        hpf.update(0.01, 1.0);
        assert!(hpf.value() > 0.9);
        for _ in 0..1000 {
            hpf.update(0.01, 1.0);
        }
        assert!(hpf.value().abs() < 1e-9);
    }
}
