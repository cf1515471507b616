//! Derived simulation statistics

use serde::Serialize;
use std::time::Duration;

/// Running counters shown alongside the grid
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStats {
    /// Regions allocated since reset
    pub allocations: u64,
    /// Completed young collections
    pub minor_collections: u64,
    /// Completed mixed collections, or completed page-collector cycles
    pub major_collections: u64,
    /// Non-free regions as a percentage of the grid
    pub memory_usage: f64,
    /// Mean simulated stop-the-world pause (ms)
    pub avg_pause_time: f64,
    /// Stop-the-world pauses recorded
    pub pause_count: u64,
    /// Sum of simulated stop-the-world pauses (ms)
    pub total_pause_time: f64,
}

impl SimulationStats {
    /// Fold a step's delta into the running counters
    pub fn apply(&mut self, delta: &StatsDelta) {
        self.allocations += delta.allocations;
        self.minor_collections += delta.minor_collections;
        self.major_collections += delta.major_collections;
        if !delta.pause.is_zero() {
            self.pause_count += 1;
            self.total_pause_time += delta.pause.as_secs_f64() * 1000.0;
            self.avg_pause_time = self.total_pause_time / self.pause_count as f64;
        }
    }
}

/// Counter changes produced by a single step
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StatsDelta {
    /// Regions allocated
    pub allocations: u64,
    /// Young collections completed
    pub minor_collections: u64,
    /// Mixed collections or cycles completed
    pub major_collections: u64,
    /// Stop-the-world pause taken by the step
    pub pause: Duration,
}
