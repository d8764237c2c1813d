use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use fdm_app::SimulationManager;
use fdm_config::{AircraftDef, EngineDef, GravityDef, from_yaml_str, load_yaml};
use fdm_model::{Crash, DataInp, Phase};

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

fn trainer() -> AircraftDef {
    load_yaml(&data_dir().join("trainer.yaml")).unwrap()
}

fn request(manager: &mut SimulationManager, phase: Phase) {
    let mut inp = *manager.input();
    inp.phase = phase;
    manager.set_input(inp);
}

fn ticks(manager: &mut SimulationManager, n: usize) {
    for _ in 0..n {
        manager.tick();
    }
}

#[test]
fn init_failure_never_reaches_work() {
    let mut def = trainer();
    if let EngineDef::Piston(piston) = &mut def.propulsion.engines[0] {
        piston.inertia = 0.0;
    }
    let mut manager = SimulationManager::new(def);
    request(&mut manager, Phase::Work);
    ticks(&mut manager, 5);

    assert_eq!(manager.phase(), Phase::Idle);
    assert_eq!(manager.output().phase, Phase::Idle);
    assert!(manager.aircraft().is_none());
    assert_eq!(manager.work_ticks(), 0);
    assert_eq!(manager.init_failures(), 1);
    let err = manager.last_error().expect("init error recorded");
    assert!(err.to_string().contains("initializing aircraft 'trainer'"), "{err}");
}

#[test]
fn failed_init_is_retried_only_after_a_new_request() {
    let mut def = trainer();
    def.mass.stations[1].max = -1.0;
    let mut manager = SimulationManager::new(def);
    request(&mut manager, Phase::Work);
    ticks(&mut manager, 50);

    assert_eq!(manager.phase(), Phase::Idle);
    assert_eq!(manager.init_failures(), 1);
    assert_eq!(manager.work_ticks(), 0);
    let err = manager.last_error().expect("init error recorded");
    assert!(err.to_string().contains("max"), "{err}");

    request(&mut manager, Phase::Idle);
    manager.tick();
    request(&mut manager, Phase::Work);
    ticks(&mut manager, 10);
    assert_eq!(manager.init_failures(), 2);
    assert_eq!(manager.phase(), Phase::Idle);
}

#[test]
fn init_then_work_advances_time() {
    let mut manager = SimulationManager::new(trainer());
    request(&mut manager, Phase::Init);
    ticks(&mut manager, 3);
    assert_eq!(manager.phase(), Phase::Init);
    assert_eq!(manager.output().sim_time, 0.0);

    request(&mut manager, Phase::Work);
    ticks(&mut manager, 10);
    assert_eq!(manager.phase(), Phase::Work);
    assert_eq!(manager.output().phase, Phase::Work);
    assert_eq!(manager.work_ticks(), 10);
    assert_relative_eq!(manager.output().sim_time, 0.1, epsilon = 1e-12);
}

#[test]
fn time_coef_splits_tick_into_substeps() {
    let mut manager = SimulationManager::new(trainer());
    let mut inp = DataInp::for_aircraft(manager.definition());
    inp.phase = Phase::Work;
    inp.time_coef = 2.5;
    manager.set_input(inp);
    manager.tick();
    assert_relative_eq!(manager.output().sim_time, 0.025, epsilon = 1e-12);

    inp.time_coef = 50.0;
    manager.set_input(inp);
    manager.tick();
    assert_relative_eq!(manager.output().sim_time, 0.125, epsilon = 1e-12);
}

#[test]
fn pause_consumes_no_ticks() {
    let mut manager = SimulationManager::new(trainer());
    request(&mut manager, Phase::Work);
    ticks(&mut manager, 10);
    let before = *manager.output();
    let state = manager.aircraft().unwrap().state().clone();

    let mut inp = *manager.input();
    inp.phase = Phase::Pause;
    inp.controls.pitch = 1.0;
    manager.set_input(inp);
    ticks(&mut manager, 20);

    let paused = *manager.output();
    assert_eq!(manager.phase(), Phase::Pause);
    assert_eq!(paused.phase, Phase::Pause);
    assert_eq!(manager.work_ticks(), 10);
    assert_eq!(paused.sim_time, before.sim_time);
    assert_eq!(paused.flight, before.flight);
    assert_eq!(paused.controls, before.controls);
    assert_eq!(manager.aircraft().unwrap().state().max_abs_diff(&state), 0.0);

    request(&mut manager, Phase::Work);
    manager.tick();
    assert_relative_eq!(manager.output().sim_time, before.sim_time + 0.01, epsilon = 1e-12);
}

#[test]
fn freeze_holds_state_but_follows_inputs() {
    let mut manager = SimulationManager::new(trainer());
    request(&mut manager, Phase::Work);
    ticks(&mut manager, 10);
    let sim_time = manager.output().sim_time;
    let state = manager.aircraft().unwrap().state().clone();

    let mut inp = *manager.input();
    inp.phase = Phase::Freeze;
    inp.controls.pitch = 1.0;
    manager.set_input(inp);
    ticks(&mut manager, 20);

    let out = manager.output();
    assert_eq!(out.phase, Phase::Freeze);
    assert_eq!(out.sim_time, sim_time);
    assert_eq!(manager.aircraft().unwrap().state().max_abs_diff(&state), 0.0);
    assert!(out.controls.elevator < -0.3, "elevator {}", out.controls.elevator);
}

#[test]
fn stop_releases_aircraft_and_work_restarts() {
    let mut manager = SimulationManager::new(trainer());
    request(&mut manager, Phase::Work);
    ticks(&mut manager, 5);

    request(&mut manager, Phase::Stop);
    manager.tick();
    assert_eq!(manager.phase(), Phase::Idle);
    assert!(manager.aircraft().is_none());

    request(&mut manager, Phase::Freeze);
    manager.tick();
    assert_eq!(manager.phase(), Phase::Idle);

    request(&mut manager, Phase::Work);
    ticks(&mut manager, 2);
    assert_eq!(manager.phase(), Phase::Work);
    assert_relative_eq!(manager.output().sim_time, 0.02, epsilon = 1e-12);
}

#[test]
fn crash_freezes_until_reinitialized() {
    let mut def = from_yaml_str(
        "name: body\nmass:\n  empty_mass: 300.0\n  inertia: { ixx: 800.0, iyy: 400.0, izz: 1100.0 }\n",
        "body.yaml",
    )
    .unwrap();
    def.environment.gravity = GravityDef::Constant(9.81);
    let mut manager = SimulationManager::new(def);
    let mut inp = *manager.input();
    inp.initial.altitude_agl = 0.5;
    inp.phase = Phase::Work;
    manager.set_input(inp);
    ticks(&mut manager, 100);

    assert_eq!(manager.phase(), Phase::Freeze);
    assert_eq!(manager.output().crash, Crash::Collision);
    let crashed_at = manager.output().sim_time;
    assert!(crashed_at < 0.5);

    // still requesting work: rejected while the crash flag is set
    ticks(&mut manager, 5);
    assert_eq!(manager.phase(), Phase::Freeze);
    assert_eq!(manager.output().sim_time, crashed_at);

    request(&mut manager, Phase::Init);
    manager.tick();
    assert_eq!(manager.phase(), Phase::Init);
    assert_eq!(manager.output().crash, Crash::None);
    assert_eq!(manager.output().sim_time, 0.0);
}
