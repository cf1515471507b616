//! Error types for heapsim-runtime

use heapsim::SimError;
use thiserror::Error;

/// Errors that can occur while talking to the driver
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver task has stopped
    #[error("Simulation driver shut down")]
    Closed,

    /// Driver dropped the response channel before answering
    #[error("Simulation driver dropped response")]
    DroppedResponse,

    /// Simulation could not be built
    #[error(transparent)]
    Sim(#[from] SimError),
}

/// Result type alias for driver operations
pub type DriverResult<T> = Result<T, DriverError>;
