//! Simulation state owner
//!
//! [`Simulation`] holds the heap, phase, statistics, log and clock, and is the
//! only place a collector step is committed. It is synchronous and has no
//! timers; `heapsim-runtime` drives it on a real schedule.

use crate::clock::VirtualClock;
use crate::collector::{Collector, Step, StepContext, for_mode};
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::heap::{Heap, Region};
use crate::log::{EventLog, LogEntry};
use crate::phase::{GcMode, Phase, Speed};
use crate::rng::{Policy, RandomPolicy};
use crate::stats::SimulationStats;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A request against the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// One allocation in the active mode, outside the tick cadence
    Allocate,
    /// One collector step for the current phase
    RunPhaseStep,
    /// Stop and clear everything
    Reset,
    /// Switch collector (stops and resets)
    SetMode(GcMode),
    /// Change the speed multiplier
    SetSpeed(Speed),
    /// Start or stop the scheduler
    SetRunning(bool),
}

/// Outcome of a committed step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Phase after the step
    pub phase: Phase,
    /// Simulated time the step held the timeline (pauses and holds)
    pub delay: Duration,
    /// Real time to wait before the next tick at the current speed
    pub next_delay: Duration,
}

/// Read-only view of the simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Active collector
    pub mode: GcMode,
    /// Current phase
    pub phase: Phase,
    /// Whether the scheduler is running
    pub running: bool,
    /// Speed multiplier
    pub speed: Speed,
    /// Heap grid in index order
    pub regions: Vec<Region>,
    /// Derived statistics
    pub stats: SimulationStats,
    /// Log entries, newest first
    pub logs: Vec<LogEntry>,
    /// Simulated time since reset
    pub clock: VirtualClock,
}

impl Snapshot {
    /// Render as JSON
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The simulation: heap, phase, statistics, log and the active collector
pub struct Simulation {
    config: SimConfig,
    mode: GcMode,
    collector: Box<dyn Collector>,
    policy: Box<dyn Policy>,
    heap: Heap,
    phase: Phase,
    stats: SimulationStats,
    log: EventLog,
    clock: VirtualClock,
    running: bool,
    speed: Speed,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("running", &self.running)
            .field("speed", &self.speed)
            .field("stats", &self.stats)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Create a stopped generational simulation with entropy-seeded randomness
    pub fn new(config: SimConfig) -> SimResult<Self> {
        Self::with_policy(config, RandomPolicy::from_entropy())
    }

    /// Create a simulation with a specific decision policy
    pub fn with_policy(config: SimConfig, policy: impl Policy + 'static) -> SimResult<Self> {
        config.validate()?;
        let mode = GcMode::default();
        Ok(Self {
            heap: Heap::new(config.grid.total_regions()),
            config,
            mode,
            collector: for_mode(mode),
            policy: Box::new(policy),
            phase: Phase::Idle,
            stats: SimulationStats::default(),
            log: EventLog::new(),
            clock: VirtualClock::new(),
            running: false,
            speed: Speed::default(),
        })
    }

    /// Run one step of the current phase and commit it
    pub fn tick(&mut self) -> StepReport {
        let mut cx = StepContext::new(self.heap.clone(), &self.config, self.policy.as_mut());
        let next = self.collector.step(self.phase, &mut cx);
        let step = cx.finish(next);
        self.commit(step)
    }

    /// Allocate once in the active mode without advancing the phase machine
    ///
    /// Nothing is allocated while a stop-the-world phase is pending.
    pub fn allocate(&mut self) -> StepReport {
        let mut cx = StepContext::new(self.heap.clone(), &self.config, self.policy.as_mut());
        let next = self.collector.allocate(self.phase, &mut cx);
        let step = cx.finish(next);
        self.commit(step)
    }

    /// Execute a command; steps return their report
    pub fn apply(&mut self, command: Command) -> Option<StepReport> {
        match command {
            Command::Allocate => Some(self.allocate()),
            Command::RunPhaseStep => Some(self.tick()),
            Command::Reset => {
                self.reset();
                None
            }
            Command::SetMode(mode) => {
                self.set_mode(mode);
                None
            }
            Command::SetSpeed(speed) => {
                self.set_speed(speed);
                None
            }
            Command::SetRunning(running) => {
                self.set_running(running);
                None
            }
        }
    }

    /// Apply a finished step: heap, phase, counters, log, then clock
    fn commit(&mut self, step: Step) -> StepReport {
        if step.phase != self.phase {
            tracing::debug!(
                target: "heapsim::gc",
                from = ?self.phase,
                to = ?step.phase,
                "Phase transition"
            );
        }

        self.heap = step.heap;
        self.phase = step.phase;
        self.stats.apply(&step.stats);
        self.stats.memory_usage = self.heap.usage();
        for event in step.events {
            self.log.record(event);
        }

        let held = self.config.grid.tick + step.delay;
        self.clock.advance(held);

        StepReport {
            phase: self.phase,
            delay: step.delay,
            next_delay: self.speed.scale(held),
        }
    }

    /// Stop, free every region, zero the statistics, empty the log
    ///
    /// The reset event goes to `tracing` diagnostics, not to the event log,
    /// so the log is empty afterwards.
    pub fn reset(&mut self) {
        self.running = false;
        self.heap = Heap::new(self.config.grid.total_regions());
        self.phase = Phase::Idle;
        self.stats = SimulationStats::default();
        self.log.clear();
        self.clock.reset();
        tracing::info!(target: "heapsim::gc", mode = %self.mode, "Simulation reset");
    }

    /// Switch collector; always stops and resets
    pub fn set_mode(&mut self, mode: GcMode) {
        if mode != self.mode {
            tracing::info!(target: "heapsim::gc", from = %self.mode, to = %mode, "Collector mode switched");
        }
        self.mode = mode;
        self.collector = for_mode(mode);
        self.reset();
    }

    /// Start or stop the scheduler
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Change the speed multiplier
    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    /// Real time until the next tick when no step delay is pending
    pub fn tick_interval(&self) -> Duration {
        self.speed.scale(self.config.grid.tick)
    }

    /// Capture the view-layer state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            mode: self.mode,
            phase: self.phase,
            running: self.running,
            speed: self.speed,
            regions: self.heap.regions().to_vec(),
            stats: self.stats.clone(),
            logs: self.log.to_vec(),
            clock: self.clock,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Active collector mode
    pub fn mode(&self) -> GcMode {
        self.mode
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the scheduler should be ticking
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Speed multiplier
    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Heap grid
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Mutable heap grid, for seeding a scenario
    ///
    /// The grid length cannot change through this handle.
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// Derived statistics
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Event log
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Virtual clock
    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }
}
