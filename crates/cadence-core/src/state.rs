//! Installed task state as reported by the scheduler.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schedule::{RunLevel, Scalar};
use crate::trigger::{CompiledTrigger, TriggerPayload, TriggerType};

/// Runtime status of an installed task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Ready,
    Running,
    Queued,
    #[serde(rename = "not scheduled")]
    Disabled,
    #[default]
    Unknown,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Ready => "ready",
            TaskStatus::Running => "running",
            TaskStatus::Queued => "queued",
            TaskStatus::Disabled => "not scheduled",
            TaskStatus::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// A trigger read back from the scheduler.
///
/// Schedulers report start fields and the random delay as either integers or
/// zero-padded strings, so those are kept as [`Scalar`]s and coerced when
/// compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedTrigger {
    pub trigger_type: TriggerType,
    pub start_year: Scalar,
    pub start_month: Scalar,
    pub start_day: Scalar,
    pub start_hour: Scalar,
    pub start_minute: Scalar,
    pub random_minutes_interval: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_duration: Option<u32>,
    #[serde(default)]
    pub payload: TriggerPayload,
}

impl From<&CompiledTrigger> for ReportedTrigger {
    fn from(trigger: &CompiledTrigger) -> Self {
        Self {
            trigger_type: trigger.trigger_type,
            start_year: Scalar::Int(i64::from(trigger.start_year)),
            start_month: Scalar::from(trigger.start_month),
            start_day: Scalar::from(trigger.start_day),
            start_hour: Scalar::from(trigger.start_hour),
            start_minute: Scalar::from(trigger.start_minute),
            random_minutes_interval: Scalar::from(trigger.random_minutes_interval),
            minutes_interval: trigger.minutes_interval,
            minutes_duration: trigger.minutes_duration,
            payload: trigger.payload,
        }
    }
}

/// Everything the scheduler reports about one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    /// Path-style task name.
    pub name: String,
    pub exists: bool,
    #[serde(default)]
    pub application_name: Option<String>,
    /// Account the task runs as.
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub run_level: RunLevel,
    /// ISO-8601 idle duration, e.g. `PT20M`.
    #[serde(default)]
    pub idle_duration: Option<String>,
    /// ISO-8601 execution time limit, e.g. `PT72H`.
    #[serde(default)]
    pub execution_time_limit: Option<String>,
    /// First trigger, if any.
    #[serde(default)]
    pub trigger: Option<ReportedTrigger>,
    #[serde(default)]
    pub status: TaskStatus,
}

impl TaskState {
    /// State of a task that is not installed.
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists: false,
            application_name: None,
            account: None,
            run_level: RunLevel::default(),
            idle_duration: None,
            execution_time_limit: None,
            trigger: None,
            status: TaskStatus::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_serializes_as_not_scheduled() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Disabled).unwrap(),
            "\"not scheduled\""
        );
        let status: TaskStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(status, TaskStatus::Running);
    }

    #[test]
    fn test_reported_trigger_accepts_padded_strings() {
        let trigger: ReportedTrigger = serde_json::from_str(
            r#"{
                "trigger_type": "daily",
                "start_year": "2017",
                "start_month": "09",
                "start_day": "20",
                "start_hour": "09",
                "start_minute": "05",
                "random_minutes_interval": 0,
                "payload": {"kind": "daily", "days_interval": 1}
            }"#,
        )
        .unwrap();
        assert_eq!(trigger.start_hour.as_int(), Some(9));
        assert_eq!(trigger.random_minutes_interval.as_int(), Some(0));
        assert_eq!(trigger.minutes_interval, None);
    }

    #[test]
    fn test_absent_state() {
        let state = TaskState::absent("\\backup");
        assert!(!state.exists);
        assert_eq!(state.trigger, None);
        assert_eq!(state.status, TaskStatus::Unknown);
    }
}
