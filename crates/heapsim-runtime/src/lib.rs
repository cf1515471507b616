//! # heapsim-runtime
//!
//! Drives a [`heapsim::Simulation`] on a tokio timer.
//!
//! # Example
//!
//! ```no_run
//! use heapsim::{SimConfig, Speed};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (handle, task) = heapsim_runtime::spawn_with_config(SimConfig::default()).unwrap();
//!
//!     handle.set_speed(Speed::Double).await.unwrap();
//!     handle.set_running(true).await.unwrap();
//!
//!     let mut updates = handle.subscribe();
//!     updates.changed().await.unwrap();
//!     println!("{}", updates.borrow().phase);
//!
//!     handle.shutdown().await.unwrap();
//!     task.await.unwrap();
//! }
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod driver;
pub mod error;
pub mod handle;

pub use driver::{DEFAULT_QUEUE_CAPACITY, spawn, spawn_with_capacity, spawn_with_config};
pub use error::{DriverError, DriverResult};
pub use handle::{DriverStats, SimulationHandle};
