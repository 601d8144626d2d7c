//! Decide whether an installed task has drifted from its schedule.
//!
//! Start date, start time and any day-of-week mask derived from a defaulted
//! start day are recomputed from the clock on every pass, so they only take
//! part in the comparison when the schedule states them explicitly.

use std::fmt;

use crate::duration::{from_minutes, parse_iso8601};
use crate::schedule::{Scalar, ScheduleSpec};
use crate::state::{ReportedTrigger, TaskState};
use crate::trigger::CompiledTrigger;

/// The first property found to differ between desired and installed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Drift {
    /// A trigger is wanted but none is installed.
    TriggerMissing,
    /// No trigger is wanted but one is installed.
    TriggerUnexpected,
    TriggerType,
    StartDate,
    StartTime,
    Payload,
    RandomDelay,
    MinutesInterval,
    MinutesDuration,
    Account,
    ApplicationName,
    RunLevel,
    IdleDuration,
    ExecutionTimeLimit,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Drift::TriggerMissing => "trigger missing",
            Drift::TriggerUnexpected => "unexpected trigger",
            Drift::TriggerType => "trigger type",
            Drift::StartDate => "start date",
            Drift::StartTime => "start time",
            Drift::Payload => "trigger schedule",
            Drift::RandomDelay => "random delay",
            Drift::MinutesInterval => "minutes interval",
            Drift::MinutesDuration => "minutes duration",
            Drift::Account => "account",
            Drift::ApplicationName => "command",
            Drift::RunLevel => "run level",
            Drift::IdleDuration => "idle duration",
            Drift::ExecutionTimeLimit => "execution time limit",
        };
        write!(f, "{s}")
    }
}

/// Compare `desired` (compiled from `spec`) against the installed `current` state.
///
/// Returns the first drifted property, or `None` when no update is needed.
pub fn detect_drift(
    spec: &ScheduleSpec,
    desired: Option<&CompiledTrigger>,
    current: &TaskState,
) -> Option<Drift> {
    if let Some(drift) = trigger_drift(spec, desired, current.trigger.as_ref()) {
        return Some(drift);
    }

    if current.account.as_deref() != Some(spec.user.as_str()) {
        return Some(Drift::Account);
    }
    if current.application_name != spec.command {
        return Some(Drift::ApplicationName);
    }
    if current.run_level != spec.run_level {
        return Some(Drift::RunLevel);
    }

    if let Some(idle) = spec.idle_time {
        if !same_duration(current.idle_duration.as_deref(), idle) {
            return Some(Drift::IdleDuration);
        }
    }
    if let Some(limit) = spec.execution_time_limit {
        if !same_duration(current.execution_time_limit.as_deref(), limit) {
            return Some(Drift::ExecutionTimeLimit);
        }
    }

    None
}

/// Whether the installed task must be updated to match `spec`.
pub fn needs_update(
    spec: &ScheduleSpec,
    desired: Option<&CompiledTrigger>,
    current: &TaskState,
) -> bool {
    detect_drift(spec, desired, current).is_some()
}

fn trigger_drift(
    spec: &ScheduleSpec,
    desired: Option<&CompiledTrigger>,
    current: Option<&ReportedTrigger>,
) -> Option<Drift> {
    let (desired, current) = match (desired, current) {
        (None, None) => return None,
        (Some(_), None) => return Some(Drift::TriggerMissing),
        (None, Some(_)) => return Some(Drift::TriggerUnexpected),
        (Some(desired), Some(current)) => (desired, current),
    };

    if current.trigger_type != desired.trigger_type {
        return Some(Drift::TriggerType);
    }

    if spec.start_day.is_some()
        && !(same_int(&current.start_year, i64::from(desired.start_year))
            && same_int(&current.start_month, i64::from(desired.start_month))
            && same_int(&current.start_day, i64::from(desired.start_day)))
    {
        return Some(Drift::StartDate);
    }

    if spec.start_time.is_some()
        && !(same_int(&current.start_hour, i64::from(desired.start_hour))
            && same_int(&current.start_minute, i64::from(desired.start_minute)))
    {
        return Some(Drift::StartTime);
    }

    let derived_weekdays = spec.day.is_none() && spec.start_day.is_none();
    let desired_payload = match current.payload.days_of_week() {
        Some(installed) if derived_weekdays => desired.payload.with_days_of_week(installed),
        _ => desired.payload,
    };
    if current.payload != desired_payload {
        return Some(Drift::Payload);
    }

    if !same_int(
        &current.random_minutes_interval,
        i64::from(desired.random_minutes_interval),
    ) {
        return Some(Drift::RandomDelay);
    }

    if current.minutes_interval != desired.minutes_interval {
        return Some(Drift::MinutesInterval);
    }

    if spec.minutes_duration.is_some() && current.minutes_duration != desired.minutes_duration {
        return Some(Drift::MinutesDuration);
    }

    None
}

fn same_int(reported: &Scalar, expected: i64) -> bool {
    reported.as_int() == Some(expected)
}

fn same_duration(reported: Option<&str>, minutes: u32) -> bool {
    reported
        .and_then(|raw| parse_iso8601(raw).ok())
        .is_some_and(|duration| duration == from_minutes(minutes))
}
