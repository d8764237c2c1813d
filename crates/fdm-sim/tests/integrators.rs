use fdm_sim::{DerivativeModel, FnModel, Integrator, IntegratorKind, StateVector};
use proptest::prelude::*;

const KINDS: [IntegratorKind; 3] = [IntegratorKind::Euler, IntegratorKind::Rk2, IntegratorKind::Rk4];

/// Harmonic oscillator x'' = -x, used to check the schemes stay on the
/// analytic trajectory for a short horizon.
struct Oscillator {
    calls: usize,
}

impl DerivativeModel for Oscillator {
    fn derivative(&mut self, x: &StateVector) -> StateVector {
        self.calls += 1;
        StateVector::from_slice(&[x[1], -x[0]])
    }
}

#[test]
fn oscillator_tracks_cosine() {
    for kind in [IntegratorKind::Rk2, IntegratorKind::Rk4] {
        let mut integ = Integrator::new(kind, Oscillator { calls: 0 });
        let mut x = StateVector::from_slice(&[1.0, 0.0]);
        let dt = 0.001;
        for _ in 0..1000 {
            integ.integrate(dt, &mut x);
        }
        assert!((x[0] - 1.0f64.cos()).abs() < 1e-5, "{kind:?}: {}", x[0]);
        assert!((x[1] + 1.0f64.sin()).abs() < 1e-5, "{kind:?}: {}", x[1]);
        assert_eq!(integ.model().calls, 1000 * kind.derivative_calls());
    }
}

#[test]
fn switching_scheme_keeps_model() {
    let mut integ = Integrator::new(IntegratorKind::Euler, Oscillator { calls: 0 });
    let mut x = StateVector::from_slice(&[1.0, 0.0]);
    integ.integrate(0.01, &mut x);
    integ.set_kind(IntegratorKind::Rk4);
    integ.integrate(0.01, &mut x);
    assert_eq!(integ.into_model().calls, 5);
}

proptest! {
    #[test]
    fn zero_derivative_leaves_state_unchanged(
        values in prop::collection::vec(-1e6f64..1e6, 1..32),
        dt in prop_oneof![Just(-1.0), Just(0.0), 1e-6f64..1e3],
        kind_idx in 0usize..3,
    ) {
        let mut integ = Integrator::new(
            KINDS[kind_idx],
            FnModel(|x: &StateVector| StateVector::zeros(x.len())),
        );
        let mut x = StateVector::from_slice(&values);
        let before = x.clone();
        for _ in 0..5 {
            integ.integrate(dt, &mut x);
        }
        prop_assert_eq!(x, before);
    }
}
