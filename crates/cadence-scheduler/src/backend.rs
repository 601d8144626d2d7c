//! The scheduler the convergence driver talks to.

use cadence_core::TaskState;

use crate::{Account, SchedulerError, TaskDefinition};

/// A native task scheduler.
///
/// Task names are path-style (`\name`). Implementations report state the way
/// the native scheduler does; the driver never caches it between calls.
pub trait TaskScheduler {
    /// Whether a task with this name is installed.
    fn exists(&self, name: &str) -> Result<bool, SchedulerError>;

    /// Load the current state of a task. Absent tasks load with `exists == false`.
    fn load(&self, name: &str) -> Result<TaskState, SchedulerError>;

    /// Install a new task.
    fn create(
        &mut self,
        name: &str,
        definition: &TaskDefinition,
        account: &Account,
    ) -> Result<(), SchedulerError>;

    /// Replace the definition and account of an installed task.
    fn update(
        &mut self,
        name: &str,
        definition: &TaskDefinition,
        account: &Account,
    ) -> Result<(), SchedulerError>;

    fn run(&mut self, name: &str) -> Result<(), SchedulerError>;

    fn stop(&mut self, name: &str) -> Result<(), SchedulerError>;

    fn enable(&mut self, name: &str) -> Result<(), SchedulerError>;

    fn disable(&mut self, name: &str) -> Result<(), SchedulerError>;

    fn delete(&mut self, name: &str) -> Result<(), SchedulerError>;
}
