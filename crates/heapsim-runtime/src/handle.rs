//! Handle for controlling a running simulation driver

use crate::driver::Job;
use crate::error::{DriverError, DriverResult};
use heapsim::{Command, GcMode, Snapshot, Speed};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Statistics about driver operation
///
/// All counters are atomic and can be read at any time without locking.
#[derive(Debug, Default)]
pub struct DriverStats {
    /// Commands submitted through any handle
    pub commands_submitted: AtomicU64,
    /// Commands applied by the driver
    pub commands_completed: AtomicU64,
    /// Scheduled ticks executed
    pub ticks: AtomicU64,
}

impl DriverStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands submitted but not applied yet
    pub fn commands_in_flight(&self) -> u64 {
        let submitted = self.commands_submitted.load(Ordering::Relaxed);
        let completed = self.commands_completed.load(Ordering::Relaxed);
        submitted.saturating_sub(completed)
    }
}

/// Cloneable handle to a simulation driver
///
/// Every control method waits until the driver has applied the command and
/// returns the snapshot taken right after it.
#[derive(Clone)]
pub struct SimulationHandle {
    job_tx: mpsc::Sender<Job>,
    snapshot_rx: watch::Receiver<Snapshot>,
    stats: Arc<DriverStats>,
}

impl SimulationHandle {
    pub(crate) fn new(
        job_tx: mpsc::Sender<Job>,
        snapshot_rx: watch::Receiver<Snapshot>,
        stats: Arc<DriverStats>,
    ) -> Self {
        Self {
            job_tx,
            snapshot_rx,
            stats,
        }
    }

    /// Submit a command and wait for the resulting snapshot
    pub async fn send(&self, command: Command) -> DriverResult<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.stats.commands_submitted.fetch_add(1, Ordering::Relaxed);
        self.job_tx
            .send(Job::Command {
                command,
                response: tx,
            })
            .await
            .map_err(|_| DriverError::Closed)?;

        rx.await.map_err(|_| DriverError::DroppedResponse)
    }

    /// Start or stop scheduled ticks; stopping cancels the pending tick
    pub async fn set_running(&self, running: bool) -> DriverResult<Snapshot> {
        self.send(Command::SetRunning(running)).await
    }

    /// Change the speed multiplier
    pub async fn set_speed(&self, speed: Speed) -> DriverResult<Snapshot> {
        self.send(Command::SetSpeed(speed)).await
    }

    /// Switch collector; stops and resets the simulation
    pub async fn set_mode(&self, mode: GcMode) -> DriverResult<Snapshot> {
        self.send(Command::SetMode(mode)).await
    }

    /// Stop and clear the simulation
    pub async fn reset(&self) -> DriverResult<Snapshot> {
        self.send(Command::Reset).await
    }

    /// Run a single phase step
    pub async fn step(&self) -> DriverResult<Snapshot> {
        self.send(Command::RunPhaseStep).await
    }

    /// Allocate once in the active mode
    pub async fn allocate(&self) -> DriverResult<Snapshot> {
        self.send(Command::Allocate).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified after every command and tick
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Ask the driver to stop
    ///
    /// Pending commands queued before this one are still applied.
    pub async fn shutdown(&self) -> DriverResult<()> {
        self.job_tx
            .send(Job::Shutdown)
            .await
            .map_err(|_| DriverError::Closed)
    }

    /// Driver statistics
    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    /// Check if the driver is still accepting commands
    pub fn is_connected(&self) -> bool {
        !self.job_tx.is_closed()
    }
}
