//! Collector phases, modes and speed multipliers

use serde::Serialize;
use std::fmt;

/// Which collector drives the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GcMode {
    /// Region-based generational collector with stop-the-world evacuation
    #[default]
    Generational,
    /// Page-based concurrent collector with brief pauses
    Concurrent,
}

impl fmt::Display for GcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcMode::Generational => f.write_str("generational"),
            GcMode::Concurrent => f.write_str("concurrent"),
        }
    }
}

/// Active step of whichever collector is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Application allocating
    #[default]
    Idle,
    /// Young collection (stop-the-world evacuation of Eden + Survivor)
    MinorGc,
    /// Concurrent marking (both collectors)
    ConcurrentMark,
    /// Mixed collection (young + garbage-rich old regions)
    MajorGc,
    /// Page collector initial pause
    MarkStart,
    /// Page collector final marking pause
    MarkEnd,
    /// Page collector relocation
    ConcurrentRelocate,
}

impl Phase {
    /// Check if the phase models a stop-the-world pause
    pub fn is_stop_the_world(self) -> bool {
        matches!(
            self,
            Phase::MinorGc | Phase::MajorGc | Phase::MarkStart | Phase::MarkEnd
        )
    }

    /// Check if the phase runs alongside the application
    pub fn is_concurrent(self) -> bool {
        matches!(self, Phase::ConcurrentMark | Phase::ConcurrentRelocate)
    }

    /// Check if the phase is valid for the given mode
    pub fn belongs_to(self, mode: GcMode) -> bool {
        match self {
            Phase::Idle | Phase::ConcurrentMark => true,
            Phase::MinorGc | Phase::MajorGc => mode == GcMode::Generational,
            Phase::MarkStart | Phase::MarkEnd | Phase::ConcurrentRelocate => {
                mode == GcMode::Concurrent
            }
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "Allocating",
            Phase::MinorGc => "Young GC (Stop-The-World)",
            Phase::ConcurrentMark => "Concurrent Marking",
            Phase::MajorGc => "Mixed GC (Evacuation)",
            Phase::MarkStart => "Mark Start (STW)",
            Phase::MarkEnd => "Mark End (STW)",
            Phase::ConcurrentRelocate => "Concurrent Relocate",
        };
        f.write_str(name)
    }
}

/// Speed multiplier dividing the base tick interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Speed {
    /// 0.5x
    #[serde(rename = "0.5")]
    Half,
    /// 1x
    #[default]
    #[serde(rename = "1")]
    Normal,
    /// 2x
    #[serde(rename = "2")]
    Double,
    /// 4x
    #[serde(rename = "4")]
    Quadruple,
}

impl Speed {
    /// All selectable multipliers, slowest first
    pub const ALL: [Speed; 4] = [Speed::Half, Speed::Normal, Speed::Double, Speed::Quadruple];

    /// Numeric multiplier
    pub fn multiplier(self) -> f64 {
        match self {
            Speed::Half => 0.5,
            Speed::Normal => 1.0,
            Speed::Double => 2.0,
            Speed::Quadruple => 4.0,
        }
    }

    /// Look up a multiplier; only the fixed set is accepted
    pub fn from_multiplier(multiplier: f64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| (s.multiplier() - multiplier).abs() < f64::EPSILON)
    }

    /// Scale a simulated duration to wall-clock time at this speed
    pub fn scale(self, duration: std::time::Duration) -> std::time::Duration {
        match self {
            Speed::Half => duration * 2,
            Speed::Normal => duration,
            Speed::Double => duration / 2,
            Speed::Quadruple => duration / 4,
        }
    }
}
