//! The common element interface and its serializable description.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::f64::consts::TAU;

use crate::error::{ControlError, ControlResult};
use crate::{Filter2, Hpf, Lag, Lag2, Lead, LeadLag, Lpf, Pid, RateLimiter};

/// Stateful single-input/single-output transfer element.
pub trait Element: std::fmt::Debug + Send {
    /// Advance the element by `dt` seconds with input `u`. No-op when `dt <= 0`.
    fn update(&mut self, dt: f64, u: f64);

    /// Current output.
    fn value(&self) -> f64;

    /// Force the output to `y` and re-synchronize the internal memory so the
    /// element continues smoothly from there.
    fn set_value(&mut self, y: f64);

    /// Clear all internal memory back to the freshly constructed state.
    fn reset(&mut self);

    /// Settle on a constant input `u` and return the resulting output.
    ///
    /// The default suits unity DC gain elements.
    fn prime(&mut self, u: f64) -> f64 {
        self.set_value(u);
        u
    }
}

/// Cutoff of a first-order pass-band filter, written `{ omega: .. }` or
/// `{ hz: .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    /// Angular frequency (rad/s).
    Omega(f64),
    /// Frequency (Hz).
    Hz(f64),
}

// Always a one-entry map: YAML enum tags cannot be read back from inside
// the internally tagged `ElementSpec`.
impl Serialize for Cutoff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match *self {
            Cutoff::Omega(w) => map.serialize_entry("omega", &w)?,
            Cutoff::Hz(f) => map.serialize_entry("hz", &f)?,
        }
        map.end()
    }
}

impl Cutoff {
    pub fn omega(self) -> f64 {
        match self {
            Cutoff::Omega(w) => w,
            Cutoff::Hz(f) => TAU * f,
        }
    }
}

/// Serializable description of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementSpec {
    Lag {
        tc: f64,
    },
    Lag2 {
        tc1: f64,
        tc2: f64,
    },
    Lead {
        tc: f64,
    },
    LeadLag {
        c1: f64,
        c2: f64,
        c3: f64,
        c4: f64,
    },
    Filter2 {
        c1: f64,
        c2: f64,
        c3: f64,
        c4: f64,
        c5: f64,
        c6: f64,
    },
    Lpf {
        cutoff: Cutoff,
    },
    Hpf {
        cutoff: Cutoff,
    },
    Pid {
        kp: f64,
        #[serde(default)]
        ki: f64,
        #[serde(default)]
        kd: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    RateLimiter {
        rate: f64,
    },
}

impl ElementSpec {
    /// Short element name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ElementSpec::Lag { .. } => "lag",
            ElementSpec::Lag2 { .. } => "lag2",
            ElementSpec::Lead { .. } => "lead",
            ElementSpec::LeadLag { .. } => "lead_lag",
            ElementSpec::Filter2 { .. } => "filter2",
            ElementSpec::Lpf { .. } => "lpf",
            ElementSpec::Hpf { .. } => "hpf",
            ElementSpec::Pid { .. } => "pid",
            ElementSpec::RateLimiter { .. } => "rate_limiter",
        }
    }

    /// Check coefficient ranges that make an element meaningless regardless
    /// of the timestep.
    pub fn validate(&self) -> ControlResult<()> {
        let all_finite = |vals: &[f64]| vals.iter().all(|v| v.is_finite());
        match *self {
            ElementSpec::Lag { tc } => positive(tc, "lag time constant must be positive"),
            ElementSpec::Lag2 { tc1, tc2 } => {
                positive(tc1, "lag2 time constants must be positive")?;
                positive(tc2, "lag2 time constants must be positive")
            }
            ElementSpec::Lead { tc } => {
                if tc.is_finite() && tc >= 0.0 {
                    Ok(())
                } else {
                    Err(ControlError::InvalidArg {
                        what: "lead time constant must be non-negative",
                    })
                }
            }
            ElementSpec::LeadLag { c1, c2, c3, c4 } => {
                if !all_finite(&[c1, c2, c3, c4]) {
                    return Err(ControlError::InvalidArg {
                        what: "lead-lag coefficients must be finite",
                    });
                }
                if c3 == 0.0 && c4 == 0.0 {
                    return Err(ControlError::InvalidArg {
                        what: "lead-lag denominator is identically zero",
                    });
                }
                Ok(())
            }
            ElementSpec::Filter2 {
                c1,
                c2,
                c3,
                c4,
                c5,
                c6,
            } => {
                if !all_finite(&[c1, c2, c3, c4, c5, c6]) {
                    return Err(ControlError::InvalidArg {
                        what: "filter2 coefficients must be finite",
                    });
                }
                if c4 == 0.0 && c5 == 0.0 && c6 == 0.0 {
                    return Err(ControlError::InvalidArg {
                        what: "filter2 denominator is identically zero",
                    });
                }
                Ok(())
            }
            ElementSpec::Lpf { cutoff } | ElementSpec::Hpf { cutoff } => {
                positive(cutoff.omega(), "filter cutoff must be positive")
            }
            ElementSpec::Pid {
                kp,
                ki,
                kd,
                min,
                max,
            } => {
                if !all_finite(&[kp, ki, kd]) {
                    return Err(ControlError::InvalidArg {
                        what: "pid gains must be finite",
                    });
                }
                match (min, max) {
                    (Some(lo), Some(hi)) if !(lo < hi) => Err(ControlError::InvalidArg {
                        what: "pid min must be less than max",
                    }),
                    (Some(_), None) | (None, Some(_)) => Err(ControlError::InvalidArg {
                        what: "pid saturation needs both min and max",
                    }),
                    _ => Ok(()),
                }
            }
            ElementSpec::RateLimiter { rate } => {
                positive(rate, "rate limit must be positive")
            }
        }
    }

    /// Check that the discretization is well defined at timestep `dt`.
    pub fn check_dt(&self, dt: f64) -> ControlResult<()> {
        let degenerate = match *self {
            ElementSpec::LeadLag { c1, c2, c3, c4 } => {
                LeadLag::new(c1, c2, c3, c4).is_degenerate(dt)
            }
            ElementSpec::Filter2 {
                c1,
                c2,
                c3,
                c4,
                c5,
                c6,
            } => Filter2::new(c1, c2, c3, c4, c5, c6).is_degenerate(dt),
            _ => false,
        };
        if degenerate {
            Err(ControlError::Degenerate {
                element: self.kind_name(),
                dt,
            })
        } else {
            Ok(())
        }
    }

    /// Validate and instantiate the element.
    pub fn build(&self) -> ControlResult<Box<dyn Element>> {
        self.validate()?;
        let element: Box<dyn Element> = match *self {
            ElementSpec::Lag { tc } => Box::new(Lag::new(tc)),
            ElementSpec::Lag2 { tc1, tc2 } => Box::new(Lag2::new(tc1, tc2)),
            ElementSpec::Lead { tc } => Box::new(Lead::new(tc)),
            ElementSpec::LeadLag { c1, c2, c3, c4 } => Box::new(LeadLag::new(c1, c2, c3, c4)),
            ElementSpec::Filter2 {
                c1,
                c2,
                c3,
                c4,
                c5,
                c6,
            } => Box::new(Filter2::new(c1, c2, c3, c4, c5, c6)),
            ElementSpec::Lpf { cutoff } => Box::new(Lpf::new(cutoff.omega())),
            ElementSpec::Hpf { cutoff } => Box::new(Hpf::new(cutoff.omega())),
            ElementSpec::Pid {
                kp,
                ki,
                kd,
                min,
                max,
            } => {
                let pid = Pid::new(kp, ki, kd);
                match (min, max) {
                    (Some(lo), Some(hi)) => Box::new(pid.with_saturation(lo, hi)?),
                    _ => Box::new(pid),
                }
            }
            ElementSpec::RateLimiter { rate } => Box::new(RateLimiter::new(rate)),
        };
        Ok(element)
    }
}

fn positive(v: f64, what: &'static str) -> ControlResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ControlError::InvalidArg { what })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hz_and_omega_agree() {
        assert_eq!(Cutoff::Hz(1.0).omega(), TAU);
        assert_eq!(Cutoff::Omega(3.0).omega(), 3.0);
    }

    #[test]
    fn builds_every_kind() {
        let specs = [
            ElementSpec::Lag { tc: 0.5 },
            ElementSpec::Lag2 { tc1: 0.5, tc2: 1.0 },
            ElementSpec::Lead { tc: 0.1 },
            ElementSpec::LeadLag {
                c1: 1.0,
                c2: 1.0,
                c3: 0.5,
                c4: 1.0,
            },
            ElementSpec::Filter2 {
                c1: 0.0,
                c2: 0.0,
                c3: 4.0,
                c4: 1.0,
                c5: 2.0,
                c6: 4.0,
            },
            ElementSpec::Lpf {
                cutoff: Cutoff::Hz(2.0),
            },
            ElementSpec::Hpf {
                cutoff: Cutoff::Omega(1.0),
            },
            ElementSpec::Pid {
                kp: 1.0,
                ki: 0.1,
                kd: 0.0,
                min: Some(-1.0),
                max: Some(1.0),
            },
            ElementSpec::RateLimiter { rate: 2.0 },
        ];
        for spec in &specs {
            let mut e = spec.build().unwrap();
            e.update(0.01, 1.0);
            assert!(e.value().is_finite(), "{} produced {}", spec.kind_name(), e.value());
        }
    }

    #[test]
    fn rejects_bad_coefficients() {
        assert!(ElementSpec::Lag { tc: 0.0 }.build().is_err());
        assert!(
            ElementSpec::Pid {
                kp: 1.0,
                ki: 0.0,
                kd: 0.0,
                min: Some(1.0),
                max: Some(-1.0)
            }
            .build()
            .is_err()
        );
        assert!(
            ElementSpec::Lpf {
                cutoff: Cutoff::Hz(-1.0)
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn degenerate_lead_lag_flagged_for_dt() {
        // den = 2*c3 + dt*c4 = 2*0.05 - 0.1*1.0 = 0
        let spec = ElementSpec::LeadLag {
            c1: 1.0,
            c2: 1.0,
            c3: 0.05,
            c4: -1.0,
        };
        assert!(spec.validate().is_ok());
        assert!(matches!(
            spec.check_dt(0.1),
            Err(ControlError::Degenerate { element: "lead_lag", .. })
        ));
        assert!(spec.check_dt(0.01).is_ok());
    }

    #[test]
    fn spec_from_yaml() {
        let yaml = "type: pid\nkp: 2.0\nki: 0.5\nmin: -1.0\nmax: 1.0\n";
        let spec: ElementSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            spec,
            ElementSpec::Pid {
                kp: 2.0,
                ki: 0.5,
                kd: 0.0,
                min: Some(-1.0),
                max: Some(1.0)
            }
        );

        let yaml = "type: lpf\ncutoff:\n  hz: 5.0\n";
        let spec: ElementSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            spec,
            ElementSpec::Lpf {
                cutoff: Cutoff::Hz(5.0)
            }
        );
    }

    #[test]
    fn cutoff_survives_yaml_inside_spec() {
        let specs = vec![
            ElementSpec::Hpf {
                cutoff: Cutoff::Omega(0.5),
            },
            ElementSpec::Lpf {
                cutoff: Cutoff::Hz(5.0),
            },
        ];
        let text = serde_yaml::to_string(&specs).unwrap();
        assert!(text.contains("hz: 5.0"), "{text}");
        assert!(!text.contains('!'), "{text}");
        let back: Vec<ElementSpec> = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, specs);
    }

    #[test]
    fn prime_is_a_steady_state_for_every_filter() {
        let specs = [
            ElementSpec::Lag { tc: 0.5 },
            ElementSpec::Lag2 { tc1: 0.5, tc2: 1.0 },
            ElementSpec::Lead { tc: 0.1 },
            ElementSpec::LeadLag {
                c1: 1.0,
                c2: 3.0,
                c3: 0.5,
                c4: 2.0,
            },
            ElementSpec::Filter2 {
                c1: 0.0,
                c2: 0.0,
                c3: 2.0,
                c4: 1.0,
                c5: 2.0,
                c6: 4.0,
            },
            ElementSpec::Hpf {
                cutoff: Cutoff::Omega(1.0),
            },
            ElementSpec::RateLimiter { rate: 2.0 },
        ];
        for spec in &specs {
            let mut e = spec.build().unwrap();
            let y = e.prime(2.0);
            e.update(0.01, 2.0);
            assert!((e.value() - y).abs() < 1e-9, "{}: {} vs {}", spec.kind_name(), e.value(), y);
        }
    }

    #[test]
    fn primed_pid_holds_without_derivative_kick() {
        let mut e = ElementSpec::Pid {
            kp: 2.0,
            ki: 0.0,
            kd: 5.0,
            min: Some(-1.0),
            max: Some(1.0),
        }
        .build()
        .unwrap();
        assert_eq!(e.prime(0.25), 0.5);
        e.update(0.01, 0.25);
        assert!((e.value() - 0.5).abs() < 1e-12);
        assert_eq!(e.prime(3.0), 1.0);
    }
}
