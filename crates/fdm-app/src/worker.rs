//! Fixed-cadence worker thread driving a [`SimulationManager`].

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded, select, tick, unbounded};
use fdm_model::{DataInp, DataOut};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::manager::SimulationManager;

/// Runs a manager on its own thread, one tick per `period`.
///
/// Inputs sent between two ticks are coalesced: only the latest is applied.
/// Outputs are queued on a bounded channel; when the host falls behind the
/// newest snapshot is dropped and the drop is logged.
#[derive(Debug)]
pub struct RealTimeWorker {
    inputs: Sender<DataInp>,
    outputs: Receiver<DataOut>,
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<SimulationManager>>,
}

impl RealTimeWorker {
    pub fn spawn(manager: SimulationManager, period: Duration, capacity: usize) -> AppResult<Self> {
        if period.is_zero() {
            return Err(AppError::InvalidInput("worker period must be positive".to_string()));
        }
        let (input_tx, input_rx) = unbounded();
        let (output_tx, output_rx) = bounded(capacity.max(1));
        let (shutdown_tx, shutdown_rx) = bounded(1);

        let handle = thread::Builder::new()
            .name("fdm-worker".to_string())
            .spawn(move || run(manager, period, input_rx, output_tx, shutdown_rx))?;
        info!(period_ms = period.as_secs_f64() * 1e3, capacity, "real-time worker started");

        Ok(Self {
            inputs: input_tx,
            outputs: output_rx,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Queue an input for the next tick. Returns `false` once the worker
    /// has exited.
    pub fn send_input(&self, input: DataInp) -> bool {
        self.inputs.send(input).is_ok()
    }

    pub fn outputs(&self) -> &Receiver<DataOut> {
        &self.outputs
    }

    /// Drain the output queue, keeping the newest snapshot.
    pub fn latest_output(&self) -> Option<DataOut> {
        self.outputs.try_iter().last()
    }

    /// Stop after the current tick and hand the manager back.
    pub fn shutdown(mut self) -> AppResult<SimulationManager> {
        self.stop_and_join().ok_or(AppError::WorkerPanicked)
    }

    fn stop_and_join(&mut self) -> Option<SimulationManager> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let handle = self.handle.take()?;
        handle.join().ok()
    }
}

impl Drop for RealTimeWorker {
    fn drop(&mut self) {
        if self.handle.is_some() && self.stop_and_join().is_none() {
            warn!("real-time worker panicked");
        }
    }
}

fn run(
    mut manager: SimulationManager,
    period: Duration,
    inputs: Receiver<DataInp>,
    outputs: Sender<DataOut>,
    shutdown: Receiver<()>,
) -> SimulationManager {
    let ticker = tick(period);
    let mut dropped: u64 = 0;
    loop {
        select! {
            recv(shutdown) -> _ => break,
            recv(ticker) -> _ => {
                match shutdown.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }
                if let Some(input) = inputs.try_iter().last() {
                    manager.set_input(input);
                }
                let out = *manager.tick();
                match outputs.try_send(out) {
                    Ok(()) => {
                        if dropped > 0 {
                            debug!(dropped, "output consumer caught up");
                            dropped = 0;
                        }
                    }
                    Err(TrySendError::Full(_)) => {
                        dropped += 1;
                        if dropped == 1 {
                            warn!(sim_time = out.sim_time, "output queue full, dropping snapshots");
                        }
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
        }
    }
    info!(phase = ?manager.phase(), sim_time = manager.output().sim_time, "real-time worker stopped");
    manager
}
