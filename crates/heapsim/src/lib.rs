//! # heapsim
//!
//! Step-by-step simulation of two garbage collectors over a fixed grid of
//! heap regions.
//!
//! ## Design
//!
//! - **Generational**: Eden/Survivor/Old regions, stop-the-world young
//!   evacuation with age-based promotion, concurrent marking and mixed
//!   collections of garbage-rich old regions
//! - **Concurrent**: page-based mark and relocate spread over many ticks,
//!   bounded by two short pauses
//! - **Virtual time**: steps never sleep; pauses are reported as delays and
//!   the driver decides how long to wait

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod allocator;
pub mod clock;
pub mod collector;
pub mod concurrent;
pub mod config;
pub mod error;
pub mod generational;
pub mod heap;
pub mod log;
pub mod phase;
pub mod rng;
pub mod simulation;
pub mod stats;

pub use clock::VirtualClock;
pub use collector::{Collector, Step, StepContext};
pub use concurrent::ConcurrentCollector;
pub use config::{
    ConcurrentConfig, GenerationalConfig, GridConfig, PacingConfig, SimConfig, TICK_RATE,
    TOTAL_REGIONS,
};
pub use error::{CollectError, ConfigError, SimError, SimResult};
pub use generational::GenerationalCollector;
pub use heap::{Heap, Region, RegionKind};
pub use log::{EventLog, LogEntry, LogLevel, MAX_LOG_ENTRIES};
pub use phase::{GcMode, Phase, Speed};
pub use rng::{Policy, RandomPolicy, Xorshift64};
pub use simulation::{Command, Simulation, Snapshot, StepReport};
pub use stats::SimulationStats;
