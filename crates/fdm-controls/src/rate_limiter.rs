use crate::clamp;
use crate::element::Element;

/// Output follows the input with `|dy/dt| <= rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimiter {
    rate: f64,
    y: f64,
}

impl RateLimiter {
    pub fn new(rate: f64) -> Self {
        Self { rate, y: 0.0 }
    }
}

impl Element for RateLimiter {
    fn update(&mut self, dt: f64, u: f64) {
        if !(dt > 0.0) {
            return;
        }
        let step = self.rate * dt;
        self.y += clamp(u - self.y, -step, step);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slews_at_rate_then_tracks() {
        let mut rl = RateLimiter::new(2.0);
        rl.update(0.1, 1.0);
        assert!((rl.value() - 0.2).abs() < 1e-12);
        for _ in 0..10 {
            rl.update(0.1, 1.0);
        }
        assert_eq!(rl.value(), 1.0);
        rl.update(0.1, 0.95);
        assert!((rl.value() - 0.95).abs() < 1e-12);
    }
}
