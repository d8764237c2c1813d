//! First- and second-order lags.

use crate::element::Element;

/// First-order lag `1 / (tc*s + 1)` with the exact exponential update
/// `y += (1 - exp(-dt/tc)) * (u - y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lag {
    tc: f64,
    y: f64,
}

impl Lag {
    pub fn new(tc: f64) -> Self {
        Self { tc, y: 0.0 }
    }

    pub fn time_constant(&self) -> f64 {
        self.tc
    }

    pub fn set_time_constant(&mut self, tc: f64) {
        self.tc = tc;
    }
}

impl Element for Lag {
    fn update(&mut self, dt: f64, u: f64) {
        if !(dt > 0.0) {
            return;
        }
        let k = 1.0 - (-dt / self.tc).exp();
        self.y += k * (u - self.y);
    }

    fn value(&self) -> f64 {
        self.y
    }

    fn set_value(&mut self, y: f64) {
        self.y = y;
    }

    fn reset(&mut self) {
        self.y = 0.0;
    }
}

/// Two cascaded first-order lags with independent time constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Lag2 {
    first: Lag,
    second: Lag,
}

impl Lag2 {
    pub fn new(tc1: f64, tc2: f64) -> Self {
        Self {
            first: Lag::new(tc1),
            second: Lag::new(tc2),
        }
    }
}

impl Element for Lag2 {
    fn update(&mut self, dt: f64, u: f64) {
        if !(dt > 0.0) {
            return;
        }
        self.first.update(dt, u);
        self.second.update(dt, self.first.value());
    }

    fn value(&self) -> f64 {
        self.second.value()
    }

    fn set_value(&mut self, y: f64) {
        self.first.set_value(y);
        self.second.set_value(y);
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lag_converges_to_input() {
        let mut lag = Lag::new(0.2);
        for _ in 0..500 {
            lag.update(0.01, 3.0);
        }
        assert_relative_eq!(lag.value(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn non_positive_dt_is_noop() {
        let mut lag = Lag::new(0.2);
        lag.set_value(1.5);
        lag.update(0.0, 10.0);
        lag.update(-0.1, 10.0);
        lag.update(f64::NAN, 10.0);
        assert_eq!(lag.value(), 1.5);
    }

    #[test]
    fn zero_time_constant_passes_input_through() {
        let mut lag = Lag::new(0.0);
        lag.update(0.01, 2.0);
        assert_eq!(lag.value(), 2.0);
    }

    #[test]
    fn lag2_is_slower_than_either_stage() {
        let mut single = Lag::new(0.5);
        let mut double = Lag2::new(0.5, 0.5);
        for _ in 0..10 {
            single.update(0.05, 1.0);
            double.update(0.05, 1.0);
        }
        assert!(double.value() < single.value());
        assert!(double.value() > 0.0);

        double.set_value(0.7);
        double.update(0.05, 0.7);
        assert_relative_eq!(double.value(), 0.7, epsilon = 1e-12);
        double.reset();
        assert_eq!(double.value(), 0.0);
    }
}
