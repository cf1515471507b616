//! Scheduler task
//!
//! One tokio task owns the [`Simulation`] and is its only writer. Commands
//! arrive over a bounded queue and are answered through a oneshot channel;
//! ticks fire from a single timer. A step is applied in full before the next
//! command or tick is looked at, so observers never see a partial step.
//!
//! Timing: after every tick the next one is scheduled `report.next_delay`
//! later, which is the base tick plus any simulated pause, divided by the
//! speed multiplier. A manual step that holds the timeline pushes the pending
//! tick back the same way.

use crate::error::{DriverError, DriverResult};
use crate::handle::{DriverStats, SimulationHandle};
use heapsim::{Command, SimConfig, Simulation, Snapshot, StepReport};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};

/// Default capacity of the command queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Job submitted to the driver
pub(crate) enum Job {
    /// Apply a command and answer with the resulting snapshot
    Command {
        command: Command,
        response: oneshot::Sender<Snapshot>,
    },
    /// Stop the driver task
    Shutdown,
}

/// Spawn a driver for `simulation` on the current tokio runtime
///
/// The simulation keeps its running flag: a running simulation starts
/// ticking one base interval after spawn.
pub fn spawn(simulation: Simulation) -> (SimulationHandle, JoinHandle<()>) {
    spawn_with_capacity(simulation, DEFAULT_QUEUE_CAPACITY)
}

/// Spawn a driver with an explicit command queue capacity
pub fn spawn_with_capacity(
    simulation: Simulation,
    queue_capacity: usize,
) -> (SimulationHandle, JoinHandle<()>) {
    let (job_tx, job_rx) = mpsc::channel(queue_capacity.max(1));
    let (snapshot_tx, snapshot_rx) = watch::channel(simulation.snapshot());
    let stats = Arc::new(DriverStats::new());

    let task = tokio::spawn(run_driver(simulation, job_rx, snapshot_tx, stats.clone()));
    let handle = SimulationHandle::new(job_tx, snapshot_rx, stats);
    (handle, task)
}

/// Build a simulation from `config` and spawn a driver for it
pub fn spawn_with_config(config: SimConfig) -> DriverResult<(SimulationHandle, JoinHandle<()>)> {
    let simulation = Simulation::new(config).map_err(DriverError::from)?;
    Ok(spawn(simulation))
}

/// Next tick deadline after a command was applied
fn reschedule(
    sim: &Simulation,
    command: Command,
    report: Option<StepReport>,
    was_running: bool,
    pending: Option<Instant>,
) -> Option<Instant> {
    if !sim.is_running() {
        return None;
    }
    match (was_running, command, pending) {
        (true, Command::SetSpeed(_), _) | (false, _, _) | (_, _, None) => {
            Some(Instant::now() + sim.tick_interval())
        }
        (true, _, Some(at)) => match report {
            Some(report) if !report.delay.is_zero() => {
                Some(at.max(Instant::now() + report.next_delay))
            }
            _ => Some(at),
        },
    }
}

async fn run_driver(
    mut sim: Simulation,
    mut jobs: mpsc::Receiver<Job>,
    snapshots: watch::Sender<Snapshot>,
    stats: Arc<DriverStats>,
) {
    debug!(target: "heapsim::driver", mode = %sim.mode(), "Driver starting");

    let mut next_tick = sim
        .is_running()
        .then(|| Instant::now() + sim.tick_interval());

    loop {
        let deadline = next_tick;
        let timer = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            job = jobs.recv() => match job {
                Some(Job::Command { command, response }) => {
                    trace!(target: "heapsim::driver", ?command, "Applying command");
                    let was_running = sim.is_running();
                    let report = sim.apply(command);
                    next_tick = reschedule(&sim, command, report, was_running, next_tick);

                    let snapshot = sim.snapshot();
                    snapshots.send_replace(snapshot.clone());
                    stats.commands_completed.fetch_add(1, Ordering::Relaxed);
                    // Caller may have given up waiting
                    let _ = response.send(snapshot);
                }
                Some(Job::Shutdown) => {
                    debug!(target: "heapsim::driver", "Driver shutdown requested");
                    break;
                }
                None => {
                    debug!(target: "heapsim::driver", "Command channel closed");
                    break;
                }
            },

            _ = timer => {
                let report = sim.tick();
                stats.ticks.fetch_add(1, Ordering::Relaxed);
                trace!(
                    target: "heapsim::driver",
                    phase = ?report.phase,
                    next_delay_ms = report.next_delay.as_millis() as u64,
                    "Tick"
                );
                next_tick = sim.is_running().then(|| Instant::now() + report.next_delay);
                snapshots.send_replace(sim.snapshot());
            }
        }
    }

    debug!(target: "heapsim::driver", "Driver stopped");
}
