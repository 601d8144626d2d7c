//! Task scheduler backends and the convergence driver for Cadence.
//!
//! This crate provides:
//! - The [`TaskScheduler`] trait the driver talks to
//! - A [`Converger`] that validates, compiles and compares schedules, then
//!   creates or updates tasks only when they drifted
//! - Status-guarded direct actions (run, end, enable, disable, delete)
//! - In-memory and JSON-file backed schedulers

mod backend;
mod converger;
mod error;
mod file;
mod memory;
mod store;
mod types;

pub use backend::TaskScheduler;
pub use converger::Converger;
pub use error::SchedulerError;
pub use file::FileScheduler;
pub use memory::MemoryScheduler;
pub use types::{Account, ConvergenceResult, Principal, TaskDefinition, TaskSettings};
