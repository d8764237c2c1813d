//! Lead-lag `(c1*s + c2) / (c3*s + c4)`.

use crate::element::Element;

/// Bilinear (Tustin) realization of a first-order lead-lag.
///
/// With `den = 2*c3 + dt*c4`:
///
/// ```text
/// y = (u*(2*c1 + dt*c2) + u_prev*(dt*c2 - 2*c1) + y_prev*(2*c3 - dt*c4)) / den
/// ```
///
/// A zero `den` is not guarded: the output becomes `inf`/`NaN`. Use
/// [`LeadLag::is_degenerate`] to reject such a combination up front.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadLag {
    c1: f64,
    c2: f64,
    c3: f64,
    c4: f64,
    u_prev: f64,
    y: f64,
}

impl LeadLag {
    pub fn new(c1: f64, c2: f64, c3: f64, c4: f64) -> Self {
        Self {
            c1,
            c2,
            c3,
            c4,
            u_prev: 0.0,
            y: 0.0,
        }
    }

    pub fn coefficients(&self) -> [f64; 4] {
        [self.c1, self.c2, self.c3, self.c4]
    }

    /// True if the discrete denominator vanishes (or is not finite) at `dt`.
    pub fn is_degenerate(&self, dt: f64) -> bool {
        let a = 2.0 * self.c3;
        let b = dt * self.c4;
        let den = a + b;
        !den.is_finite() || den.abs() <= 1e-12 * (a.abs() + b.abs())
    }
}

impl Element for LeadLag {
    fn update(&mut self, dt: f64, u: f64) {
        if !(dt > 0.0) {
            return;
        }
        let den = 2.0 * self.c3 + dt * self.c4;
        let num = u * (2.0 * self.c1 + dt * self.c2)
            + self.u_prev * (dt * self.c2 - 2.0 * self.c1)
            + self.y * (2.0 * self.c3 - dt * self.c4);
        self.y = num / den;
        self.u_prev = u;
    }

    fn value(&self) -> f64 {
        self.y
    }

    /// Places the element at the steady state producing `y`.
    fn set_value(&mut self, y: f64) {
        self.y = y;
        self.u_prev = if self.c2 != 0.0 {
            y * self.c4 / self.c2
        } else {
            0.0
        };
    }

    fn reset(&mut self) {
        self.u_prev = 0.0;
        self.y = 0.0;
    }

    /// Output `u * c2/c4`; a zero `c4` keeps the current output.
    fn prime(&mut self, u: f64) -> f64 {
        if self.c4 != 0.0 {
            self.y = u * self.c2 / self.c4;
        }
        self.u_prev = u;
        self.y
    }
}
