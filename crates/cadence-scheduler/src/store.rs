//! Task model shared by the in-memory and file-backed schedulers.

use std::collections::BTreeMap;

use cadence_core::{CompiledTrigger, ReportedTrigger, Scalar, TaskState, TaskStatus};
use serde::{Deserialize, Serialize};

use crate::{Account, SchedulerError, TaskDefinition};

/// One installed task. Passwords are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredTask {
    pub definition: TaskDefinition,
    pub user: String,
    #[serde(default)]
    pub interactive: bool,
    pub status: TaskStatus,
}

/// Installed tasks keyed by path-style name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct TaskStore {
    tasks: BTreeMap<String, StoredTask>,
}

impl TaskStore {
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Report a task the way the native scheduler does.
    pub fn report(&self, name: &str) -> TaskState {
        let Some(task) = self.tasks.get(name) else {
            return TaskState::absent(name);
        };
        TaskState {
            name: name.to_string(),
            exists: true,
            application_name: Some(task.definition.command.clone()),
            account: Some(task.user.clone()),
            run_level: task.definition.principal.run_level,
            idle_duration: task.definition.settings.idle_duration.clone(),
            execution_time_limit: task.definition.settings.execution_time_limit.clone(),
            trigger: task.definition.trigger.as_ref().map(native_trigger),
            status: task.status,
        }
    }

    pub fn create(
        &mut self,
        name: &str,
        definition: &TaskDefinition,
        account: &Account,
    ) -> Result<(), SchedulerError> {
        if self.contains(name) {
            return Err(SchedulerError::operation(
                "create",
                name,
                "task already exists",
            ));
        }
        let status = if definition.settings.enabled {
            TaskStatus::Ready
        } else {
            TaskStatus::Disabled
        };
        self.tasks.insert(
            name.to_string(),
            StoredTask {
                definition: definition.clone(),
                user: account.user.clone(),
                interactive: account.interactive,
                status,
            },
        );
        Ok(())
    }

    pub fn update(
        &mut self,
        name: &str,
        definition: &TaskDefinition,
        account: &Account,
    ) -> Result<(), SchedulerError> {
        let task = self.get_mut(name)?;
        task.definition = definition.clone();
        task.user = account.user.clone();
        task.interactive = account.interactive;
        Ok(())
    }

    pub fn set_status(&mut self, name: &str, status: TaskStatus) -> Result<(), SchedulerError> {
        self.get_mut(name)?.status = status;
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<(), SchedulerError> {
        self.tasks
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut StoredTask, SchedulerError> {
        self.tasks
            .get_mut(name)
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))
    }
}

/// Native schedulers report start fields as zero-padded strings.
fn native_trigger(trigger: &CompiledTrigger) -> ReportedTrigger {
    let padded = |n: u32| Scalar::Text(format!("{n:02}"));
    ReportedTrigger {
        start_year: Scalar::Text(trigger.start_year.to_string()),
        start_month: padded(trigger.start_month),
        start_day: padded(trigger.start_day),
        start_hour: padded(trigger.start_hour),
        start_minute: padded(trigger.start_minute),
        random_minutes_interval: Scalar::Text(trigger.random_minutes_interval.to_string()),
        ..ReportedTrigger::from(trigger)
    }
}
