//! Error types for the simulation engine

use thiserror::Error;

/// Invalid simulation configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Grid has no regions
    #[error("heap grid must contain at least one region")]
    EmptyGrid,

    /// Base tick is zero
    #[error("base tick interval must be non-zero")]
    ZeroTick,

    /// A count that must be positive is zero
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// A percentage outside its valid range
    #[error("{name} must be a percentage in 0..=100, got {value}")]
    Percentage {
        /// Config field name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// A probability outside [0, 1]
    #[error("{name} must be a probability in 0..=1, got {value}")]
    Probability {
        /// Config field name
        name: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Conditions raised and recovered inside a collector step
///
/// These never leave the collector that detected them; the step logs the
/// condition, clears the grid and returns to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CollectError {
    /// Allocation found no free region
    #[error("heap exhausted: no free region to allocate")]
    HeapExhausted,

    /// Not enough free regions to host the evacuated data
    #[error("evacuation failure: {needed} regions needed, {available} free")]
    EvacuationFailure {
        /// Destination regions required
        needed: usize,
        /// Free regions available
        available: usize,
    },
}

/// Public simulation errors
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Snapshot could not be serialized
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for simulation operations
pub type SimResult<T> = Result<T, SimError>;
