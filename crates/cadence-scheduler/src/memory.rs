//! In-process scheduler.

use cadence_core::{TaskState, TaskStatus};
use tracing::debug;

use crate::store::TaskStore;
use crate::{Account, SchedulerError, TaskDefinition, TaskScheduler};

/// A scheduler that keeps tasks in memory.
///
/// Counts mutating calls and can be told to fail the next call of a given
/// operation, which makes it useful for exercising the driver.
#[derive(Debug, Default)]
pub struct MemoryScheduler {
    store: TaskStore,
    mutations: usize,
    fail_next: Option<&'static str>,
}

impl MemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating calls that succeeded.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    /// Number of installed tasks.
    pub fn task_count(&self) -> usize {
        self.store.len()
    }

    /// Make the next call to `operation` (e.g. `"create"`) fail.
    pub fn fail_next(&mut self, operation: &'static str) {
        self.fail_next = Some(operation);
    }

    /// Change a task's status out of band, as if it started or finished on its own.
    pub fn set_status(&mut self, name: &str, status: TaskStatus) -> Result<(), SchedulerError> {
        self.store.set_status(name, status)
    }

    fn check_failure(&mut self, operation: &'static str, name: &str) -> Result<(), SchedulerError> {
        if self.fail_next == Some(operation) {
            self.fail_next = None;
            return Err(SchedulerError::operation(
                operation,
                name,
                "injected failure",
            ));
        }
        Ok(())
    }

    fn mutate(
        &mut self,
        operation: &'static str,
        name: &str,
        apply: impl FnOnce(&mut TaskStore) -> Result<(), SchedulerError>,
    ) -> Result<(), SchedulerError> {
        self.check_failure(operation, name)?;
        apply(&mut self.store)?;
        self.mutations += 1;
        debug!(operation, task = name, "scheduler mutation");
        Ok(())
    }
}

impl TaskScheduler for MemoryScheduler {
    fn exists(&self, name: &str) -> Result<bool, SchedulerError> {
        Ok(self.store.contains(name))
    }

    fn load(&self, name: &str) -> Result<TaskState, SchedulerError> {
        Ok(self.store.report(name))
    }

    fn create(
        &mut self,
        name: &str,
        definition: &TaskDefinition,
        account: &Account,
    ) -> Result<(), SchedulerError> {
        self.mutate("create", name, |store| {
            store.create(name, definition, account)
        })
    }

    fn update(
        &mut self,
        name: &str,
        definition: &TaskDefinition,
        account: &Account,
    ) -> Result<(), SchedulerError> {
        self.mutate("update", name, |store| {
            store.update(name, definition, account)
        })
    }

    fn run(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.mutate("run", name, |store| {
            store.set_status(name, TaskStatus::Running)
        })
    }

    fn stop(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.mutate("stop", name, |store| store.set_status(name, TaskStatus::Ready))
    }

    fn enable(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.mutate("enable", name, |store| {
            store.set_status(name, TaskStatus::Ready)
        })
    }

    fn disable(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.mutate("disable", name, |store| {
            store.set_status(name, TaskStatus::Disabled)
        })
    }

    fn delete(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.mutate("delete", name, |store| store.delete(name))
    }
}
