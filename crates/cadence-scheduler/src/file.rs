//! Scheduler persisted as a JSON document.

use std::path::{Path, PathBuf};

use cadence_core::{TaskState, TaskStatus};
use tracing::debug;

use crate::store::TaskStore;
use crate::{Account, SchedulerError, TaskDefinition, TaskScheduler};

/// A scheduler whose tasks live in a pretty-printed JSON file.
///
/// The file is re-read for every call and rewritten after every mutation, so
/// separate processes pointed at the same path see each other's changes.
#[derive(Debug, Clone)]
pub struct FileScheduler {
    path: PathBuf,
}

impl FileScheduler {
    /// Use the store at `path`. A missing file is an empty store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<TaskStore, SchedulerError> {
        if !self.path.exists() {
            return Ok(TaskStore::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(TaskStore::default());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write(&self, store: &TaskStore) -> Result<(), SchedulerError> {
        let json = serde_json::to_string_pretty(store)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), tasks = store.len(), "wrote task store");
        Ok(())
    }

    fn mutate(
        &mut self,
        apply: impl FnOnce(&mut TaskStore) -> Result<(), SchedulerError>,
    ) -> Result<(), SchedulerError> {
        let mut store = self.read()?;
        apply(&mut store)?;
        self.write(&store)
    }
}

impl TaskScheduler for FileScheduler {
    fn exists(&self, name: &str) -> Result<bool, SchedulerError> {
        Ok(self.read()?.contains(name))
    }

    fn load(&self, name: &str) -> Result<TaskState, SchedulerError> {
        Ok(self.read()?.report(name))
    }

    fn create(
        &mut self,
        name: &str,
        definition: &TaskDefinition,
        account: &Account,
    ) -> Result<(), SchedulerError> {
        self.mutate(|store| store.create(name, definition, account))
    }

    fn update(
        &mut self,
        name: &str,
        definition: &TaskDefinition,
        account: &Account,
    ) -> Result<(), SchedulerError> {
        self.mutate(|store| store.update(name, definition, account))
    }

    fn run(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.mutate(|store| store.set_status(name, TaskStatus::Running))
    }

    fn stop(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.mutate(|store| store.set_status(name, TaskStatus::Ready))
    }

    fn enable(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.mutate(|store| store.set_status(name, TaskStatus::Ready))
    }

    fn disable(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.mutate(|store| store.set_status(name, TaskStatus::Disabled))
    }

    fn delete(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.mutate(|store| store.delete(name))
    }
}
