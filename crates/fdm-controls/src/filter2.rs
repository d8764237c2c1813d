//! General second-order filter `(c1*s^2 + c2*s + c3) / (c4*s^2 + c5*s + c6)`.

use crate::element::Element;

/// Discrete coefficients after the bilinear substitution `s = K*(z-1)/(z+1)`,
/// `K = 2/dt`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Discrete {
    b0: f64,
    b1: f64,
    b2: f64,
    a0: f64,
    a1: f64,
    a2: f64,
}

/// Tustin realization of a second-order transfer function with two steps of
/// input and output history.
///
/// The discrete coefficients are cached for the last `dt` seen, so a fixed
/// rate loop pays for them once. A zero leading denominator coefficient
/// yields `inf`/`NaN` outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter2 {
    c: [f64; 6],
    cached: Option<(f64, Discrete)>,
    u1: f64,
    u2: f64,
    y1: f64,
    y2: f64,
}

impl Filter2 {
    pub fn new(c1: f64, c2: f64, c3: f64, c4: f64, c5: f64, c6: f64) -> Self {
        Self {
            c: [c1, c2, c3, c4, c5, c6],
            cached: None,
            u1: 0.0,
            u2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.c
    }

    fn discretize(&self, dt: f64) -> Discrete {
        let [c1, c2, c3, c4, c5, c6] = self.c;
        let k = 2.0 / dt;
        let k2 = k * k;
        Discrete {
            b0: c1 * k2 + c2 * k + c3,
            b1: -2.0 * c1 * k2 + 2.0 * c3,
            b2: c1 * k2 - c2 * k + c3,
            a0: c4 * k2 + c5 * k + c6,
            a1: -2.0 * c4 * k2 + 2.0 * c6,
            a2: c4 * k2 - c5 * k + c6,
        }
    }

    fn discrete(&mut self, dt: f64) -> Discrete {
        match self.cached {
            Some((cached_dt, d)) if cached_dt == dt => d,
            _ => {
                let d = self.discretize(dt);
                self.cached = Some((dt, d));
                d
            }
        }
    }

    /// True if the leading discrete denominator vanishes (or is not finite) at `dt`.
    pub fn is_degenerate(&self, dt: f64) -> bool {
        let [_, _, _, c4, c5, c6] = self.c;
        let k = 2.0 / dt;
        let terms = [c4 * k * k, c5 * k, c6];
        let a0: f64 = terms.iter().sum();
        let scale: f64 = terms.iter().map(|t| t.abs()).sum();
        !a0.is_finite() || a0.abs() <= 1e-12 * scale
    }

    fn dc_gain(&self) -> Option<f64> {
        let (c3, c6) = (self.c[2], self.c[5]);
        (c3 != 0.0 && c6 != 0.0).then(|| c3 / c6)
    }
}

impl Element for Filter2 {
    fn update(&mut self, dt: f64, u: f64) {
        if !(dt > 0.0) {
            return;
        }
        let d = self.discrete(dt);
        let y = (d.b0 * u + d.b1 * self.u1 + d.b2 * self.u2 - d.a1 * self.y1 - d.a2 * self.y2)
            / d.a0;
        self.u2 = self.u1;
        self.u1 = u;
        self.y2 = self.y1;
        self.y1 = y;
    }

    fn value(&self) -> f64 {
        self.y1
    }

    /// Places the element at the steady state producing `y` when the DC
    /// gain is finite and non-zero; otherwise only the output history is set.
    fn set_value(&mut self, y: f64) {
        let u = self.dc_gain().map_or(0.0, |g| y / g);
        self.u1 = u;
        self.u2 = u;
        self.y1 = y;
        self.y2 = y;
    }

    fn reset(&mut self) {
        self.u1 = 0.0;
        self.u2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Output `u * c3/c6`; a zero `c6` keeps the current output.
    fn prime(&mut self, u: f64) -> f64 {
        let c6 = self.c[5];
        let y = if c6 != 0.0 { u * self.c[2] / c6 } else { self.y1 };
        self.u1 = u;
        self.u2 = u;
        self.y1 = y;
        self.y2 = y;
        y
    }
}
