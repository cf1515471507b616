//! Collector strategy interface
//!
//! A collector step is a pure transition over a working copy of the heap:
//! `step(heap, phase) -> (heap', phase', stats delta, log events, delay)`.
//! Nothing here touches shared state; [`crate::Simulation`] decides when a
//! finished step is committed.

use crate::config::SimConfig;
use crate::heap::Heap;
use crate::log::{LogEvent, LogLevel};
use crate::phase::{GcMode, Phase};
use crate::rng::Policy;
use crate::stats::StatsDelta;
use std::time::Duration;

/// Mutable state handed to a collector for one step
pub struct StepContext<'a> {
    /// Working copy of the heap
    pub heap: Heap,
    /// Active configuration
    pub config: &'a SimConfig,
    /// Random decisions
    pub policy: &'a mut dyn Policy,
    stats: StatsDelta,
    events: Vec<LogEvent>,
    delay: Duration,
}

impl<'a> StepContext<'a> {
    /// Start a step over `heap`
    pub fn new(heap: Heap, config: &'a SimConfig, policy: &'a mut dyn Policy) -> Self {
        Self {
            heap,
            config,
            policy,
            stats: StatsDelta::default(),
            events: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    /// Queue a log message
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.events.push(LogEvent::new(level, message));
    }

    /// Record a stop-the-world pause
    pub fn stall(&mut self, duration: Duration) {
        self.stats.pause += duration;
        self.delay += duration;
    }

    /// Record concurrent pacing that delays the next tick
    pub fn hold(&mut self, duration: Duration) {
        self.delay += duration;
    }

    /// Counter changes accumulated so far
    pub fn stats_mut(&mut self) -> &mut StatsDelta {
        &mut self.stats
    }

    /// Close the step with its next phase
    pub fn finish(self, phase: Phase) -> Step {
        Step {
            heap: self.heap,
            phase,
            stats: self.stats,
            events: self.events,
            delay: self.delay,
        }
    }
}

/// Result of one collector step, ready to be committed
#[derive(Debug, Clone)]
pub struct Step {
    /// Heap after the step
    pub heap: Heap,
    /// Next phase
    pub phase: Phase,
    /// Counter changes
    pub stats: StatsDelta,
    /// Log messages in emission order
    pub events: Vec<LogEvent>,
    /// Simulated time the step held the timeline
    pub delay: Duration,
}

/// A collector's phase-transition policy
pub trait Collector: Send {
    /// Mode this collector implements
    fn mode(&self) -> GcMode;

    /// Run one step of `phase` and return the next phase
    fn step(&self, phase: Phase, cx: &mut StepContext<'_>) -> Phase;

    /// Run one allocation outside the tick cadence, returning the next phase
    fn allocate(&self, phase: Phase, cx: &mut StepContext<'_>) -> Phase;
}

/// Build the collector for a mode
pub fn for_mode(mode: GcMode) -> Box<dyn Collector> {
    match mode {
        GcMode::Generational => Box::new(crate::generational::GenerationalCollector),
        GcMode::Concurrent => Box::new(crate::concurrent::ConcurrentCollector),
    }
}

/// Run a single step against a copy of `heap`
pub fn run_step(
    collector: &dyn Collector,
    heap: &Heap,
    phase: Phase,
    config: &SimConfig,
    policy: &mut dyn Policy,
) -> Step {
    let mut cx = StepContext::new(heap.clone(), config, policy);
    let next = collector.step(phase, &mut cx);
    cx.finish(next)
}
