//! Control-element library for the flight dynamics engine.
//!
//! Every element is a small single-input/single-output value type that owns
//! its coefficients and one or two steps of memory. Elements are advanced once
//! per fixed timestep through the [`Element`] trait:
//!
//! - a call with `dt <= 0` leaves the element untouched
//! - no element panics or returns an error while updating; degenerate
//!   coefficients yield IEEE `inf`/`NaN` outputs that configuration validation
//!   is expected to rule out beforehand
//!
//! [`ElementSpec`] is the serializable description used by aircraft
//! configuration files and builds boxed elements on demand.

pub mod element;
pub mod error;
pub mod filter2;
pub mod lag;
pub mod lead;
pub mod lead_lag;
pub mod passband;
pub mod pid;
pub mod rate_limiter;

pub use element::{Cutoff, Element, ElementSpec};
pub use error::{ControlError, ControlResult};
pub use filter2::Filter2;
pub use lag::{Lag, Lag2};
pub use lead::{LEAD_ROLL_OFF, Lead};
pub use lead_lag::LeadLag;
pub use passband::{Hpf, Lpf};
pub use pid::Pid;
pub use rate_limiter::RateLimiter;

/// Clamp without the panicking preconditions of `f64::clamp`.
#[inline]
pub(crate) fn clamp(x: f64, min: f64, max: f64) -> f64 {
    x.max(min).min(max)
}
