use std::path::Path;
use std::time::{Duration, Instant};

use fdm_app::{RealTimeWorker, SimulationManager};
use fdm_config::load_yaml;
use fdm_model::{DataInp, Phase};

fn manager() -> SimulationManager {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/trainer.yaml");
    SimulationManager::new(load_yaml(&path).unwrap())
}

#[test]
fn worker_runs_ticks_and_hands_manager_back() {
    let manager = manager();
    let mut inp = DataInp::for_aircraft(manager.definition());
    inp.phase = Phase::Work;
    let worker = RealTimeWorker::spawn(manager, Duration::from_millis(1), 64).unwrap();
    assert!(worker.send_input(inp));

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut working = false;
    while Instant::now() < deadline {
        if let Ok(out) = worker.outputs().recv_timeout(Duration::from_millis(100)) {
            if out.phase == Phase::Work && out.sim_time > 0.05 {
                working = true;
                break;
            }
        }
    }
    assert!(working, "worker never reached work");

    let manager = worker.shutdown().unwrap();
    assert_eq!(manager.phase(), Phase::Work);
    assert!(manager.work_ticks() > 0);
}

#[test]
fn slow_consumer_does_not_block_worker() {
    let manager = manager();
    let mut inp = DataInp::for_aircraft(manager.definition());
    inp.phase = Phase::Work;
    let worker = RealTimeWorker::spawn(manager, Duration::from_millis(1), 2).unwrap();
    worker.send_input(inp);
    std::thread::sleep(Duration::from_millis(100));

    assert!(worker.outputs().len() <= 2);
    let manager = worker.shutdown().unwrap();
    // ticks kept running while the queue was full
    assert!(manager.work_ticks() > 2);
}

#[test]
fn zero_period_is_rejected() {
    assert!(RealTimeWorker::spawn(manager(), Duration::ZERO, 1).is_err());
}
