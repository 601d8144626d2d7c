//! Scheduler types.

use std::fmt;

use cadence_core::duration::format_minutes;
use cadence_core::{CompiledTrigger, RunLevel, ScheduleSpec, TaskState};
use serde::{Deserialize, Serialize};

/// Task-level settings submitted alongside the trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSettings {
    /// ISO-8601 execution time limit.
    pub execution_time_limit: Option<String>,
    pub enabled: bool,
    /// ISO-8601 idle duration for on-idle tasks.
    pub idle_duration: Option<String>,
    pub run_only_if_idle: bool,
}

impl TaskSettings {
    pub fn from_spec(spec: &ScheduleSpec) -> Self {
        Self {
            execution_time_limit: spec.execution_time_limit.map(format_minutes),
            enabled: true,
            idle_duration: spec.idle_time.map(format_minutes),
            run_only_if_idle: spec.idle_time.is_some(),
        }
    }
}

/// Security principal settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub run_level: RunLevel,
}

/// Everything submitted to the scheduler when creating or updating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Command line the task runs.
    pub command: String,
    /// Trigger, or `None` for on-demand tasks.
    pub trigger: Option<CompiledTrigger>,
    pub settings: TaskSettings,
    pub principal: Principal,
}

impl TaskDefinition {
    /// Build the full definition for `spec` with an already compiled trigger.
    pub fn from_spec(spec: &ScheduleSpec, trigger: Option<CompiledTrigger>) -> Self {
        Self {
            command: spec.command.clone().unwrap_or_default(),
            trigger,
            settings: TaskSettings::from_spec(spec),
            principal: Principal {
                run_level: spec.run_level,
            },
        }
    }
}

/// Credentials the task runs under.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub user: String,
    pub password: Option<String>,
    pub interactive: bool,
}

impl Account {
    pub fn from_spec(spec: &ScheduleSpec) -> Self {
        Self {
            user: spec.user.clone(),
            password: spec.password.clone(),
            interactive: spec.interactive_enabled,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("interactive", &self.interactive)
            .finish()
    }
}

/// Outcome of converging a schedule or running a direct action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvergenceResult {
    /// Whether any mutating call was made.
    pub changed: bool,
    /// Task state after the pass.
    pub task_state: TaskState,
}

impl ConvergenceResult {
    pub fn changed(task_state: TaskState) -> Self {
        Self {
            changed: true,
            task_state,
        }
    }

    pub fn unchanged(task_state: TaskState) -> Self {
        Self {
            changed: false,
            task_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::Frequency;

    #[test]
    fn test_idle_settings() {
        let spec = ScheduleSpec::builder("t", "cmd")
            .frequency(Frequency::OnIdle)
            .idle_time(20)
            .build();
        let settings = TaskSettings::from_spec(&spec);
        assert_eq!(settings.idle_duration.as_deref(), Some("PT20M"));
        assert!(settings.run_only_if_idle);
        assert_eq!(settings.execution_time_limit.as_deref(), Some("PT72H"));
        assert!(settings.enabled);
    }

    #[test]
    fn test_no_idle_settings_by_default() {
        let settings = TaskSettings::from_spec(&ScheduleSpec::builder("t", "cmd").build());
        assert_eq!(settings.idle_duration, None);
        assert!(!settings.run_only_if_idle);
    }

    #[test]
    fn test_account_debug_hides_password() {
        let spec = ScheduleSpec::builder("t", "cmd")
            .user("Administrator")
            .password("hunter2")
            .build();
        let debug = format!("{:?}", Account::from_spec(&spec));
        assert!(debug.contains("Administrator"));
        assert!(!debug.contains("hunter2"));
    }
}
