//! Lead `tc*s + 1`.

use crate::element::Element;
use crate::lead_lag::LeadLag;

/// Ratio of the roll-off pole time constant to the lead time constant.
pub const LEAD_ROLL_OFF: f64 = 0.1;

/// Lead term realized as the Tustin lead-lag
/// `(tc*s + 1) / (LEAD_ROLL_OFF*tc*s + 1)`.
///
/// The pure lead is improper and its bilinear form has a pole at `z = -1`,
/// so the gain is rolled off a decade above `1/tc`. A zero `tc` passes the
/// input through.
#[derive(Debug, Clone, PartialEq)]
pub struct Lead {
    tc: f64,
    filter: LeadLag,
    y: f64,
}

impl Lead {
    pub fn new(tc: f64) -> Self {
        Self {
            tc,
            filter: LeadLag::new(tc, 1.0, LEAD_ROLL_OFF * tc, 1.0),
            y: 0.0,
        }
    }

    pub fn time_constant(&self) -> f64 {
        self.tc
    }
}

impl Element for Lead {
    fn update(&mut self, dt: f64, u: f64) {
        if !(dt > 0.0) {
            return;
        }
        if self.tc > 0.0 {
            self.filter.update(dt, u);
            self.y = self.filter.value();
        } else {
            self.y = u;
        }
    }

    fn value(&self) -> f64 {
        self.y
    }

    fn set_value(&mut self, y: f64) {
        self.filter.set_value(y);
        self.y = y;
    }

    fn reset(&mut self) {
        self.filter.reset();
        self.y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_input_is_advanced_by_the_net_lead() {
        let mut lead = Lead::new(0.5);
        let dt = 0.1;
        for k in 1..=20 {
            lead.update(dt, k as f64 * dt);
        }
        // ramp of slope 1: y = u + tc * (1 - LEAD_ROLL_OFF)
        assert!((lead.value() - (2.0 + 0.45)).abs() < 1e-12);
    }

    #[test]
    fn step_kicks_then_settles_to_unity() {
        let (tc, dt) = (0.5, 0.01);
        let mut lead = Lead::new(tc);
        lead.update(dt, 1.0);
        let first = (2.0 * tc + dt) / (2.0 * LEAD_ROLL_OFF * tc + dt);
        assert!((lead.value() - first).abs() < 1e-12);

        for _ in 0..300 {
            lead.update(dt, 1.0);
        }
        assert!((lead.value() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_input_after_set_value() {
        let mut lead = Lead::new(2.0);
        lead.set_value(4.0);
        lead.update(0.02, 4.0);
        assert!((lead.value() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn zero_time_constant_passes_input() {
        let mut lead = Lead::new(0.0);
        lead.update(0.01, 3.0);
        assert_eq!(lead.value(), 3.0);
        lead.update(0.0, 5.0);
        assert_eq!(lead.value(), 3.0);
    }
}
