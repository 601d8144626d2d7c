//! Schedule validation.
//!
//! Rules run in a fixed order and the first violation is returned. Every
//! message names the offending property and the values it accepts.

use std::fmt;

use crate::encoder::encode;
use crate::schedule::{
    parse_start_day, parse_start_time, Frequency, MonthlyPattern, ScheduleSpec,
};
use crate::symbols::{DayOfMonth, DayOfWeek, Month, Symbol};

/// Accounts that may run a task without a password.
pub const PASSWORDLESS_USERS: [&str; 6] = [
    "NT AUTHORITY\\SYSTEM",
    "SYSTEM",
    "NT AUTHORITY\\LOCALSERVICE",
    "NT AUTHORITY\\NETWORKSERVICE",
    "BUILTIN\\USERS",
    "USERS",
];

/// Largest accepted idle time in minutes.
pub const MAX_IDLE_TIME: u32 = 999;

/// A schedule property that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending property.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

type Check = Result<(), ValidationError>;

/// Validate a schedule before it is compiled or sent anywhere.
pub fn validate(spec: &ScheduleSpec) -> Check {
    check_required(spec)?;
    check_start_day_frequency(spec)?;
    check_credentials(spec)?;
    check_frequency_modifier(spec)?;
    check_months(spec)?;
    check_idle_time(spec)?;
    check_once_start_time(spec)?;
    check_random_delay(spec)?;
    check_day(spec)?;
    check_start_formats(spec)?;
    check_repetition(spec)?;
    check_execution_time_limit(spec)
}

/// Whether `user` may run a task without a password.
pub fn is_passwordless_user(user: &str) -> bool {
    PASSWORDLESS_USERS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(user.trim()))
}

fn check_required(spec: &ScheduleSpec) -> Check {
    let mut missing = Vec::new();
    if spec.command.as_deref().is_none_or(|c| c.trim().is_empty()) {
        missing.push(("command", "Command"));
    }
    if spec.task_name.trim().is_empty() {
        missing.push(("task_name", "Task Name"));
    }
    match missing.first() {
        None => Ok(()),
        Some(&(field, _)) => {
            let labels: Vec<&str> = missing.iter().map(|(_, label)| *label).collect();
            Err(ValidationError::new(
                field,
                format!("Value for '{}' option cannot be empty", labels.join(", ")),
            ))
        }
    }
}

fn check_start_day_frequency(spec: &ScheduleSpec) -> Check {
    if spec.start_day.is_some() && spec.frequency == Frequency::OnStart {
        return Err(ValidationError::new(
            "start_day",
            "`start_day` property is not supported with frequency: onstart",
        ));
    }
    Ok(())
}

fn check_credentials(spec: &ScheduleSpec) -> Check {
    if spec.password.is_some() {
        return Ok(());
    }
    if !is_passwordless_user(&spec.user) {
        let allowed = PASSWORDLESS_USERS
            .iter()
            .map(|u| format!("'{u}'"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ValidationError::new(
            "user",
            format!(
                "Cannot specify a user other than the system users without specifying a password!. Valid passwordless users: {allowed}"
            ),
        ));
    }
    if spec.interactive_enabled {
        return Err(ValidationError::new(
            "interactive_enabled",
            "Please provide the password when attempting to set interactive/non-interactive.",
        ));
    }
    Ok(())
}

fn check_frequency_modifier(spec: &ScheduleSpec) -> Check {
    let modifier = &spec.frequency_modifier;
    let max = match spec.frequency {
        Frequency::Minute => 1439,
        Frequency::Hourly => 23,
        Frequency::Daily => 365,
        Frequency::Weekly => 52,
        Frequency::Monthly => {
            if MonthlyPattern::from_modifier(modifier).is_some() {
                return Ok(());
            }
            return Err(ValidationError::new(
                "frequency_modifier",
                format!(
                    "frequency_modifier value {modifier} is invalid. Valid values for :monthly frequency are 1 - 12, 'FIRST', 'SECOND', 'THIRD', 'FOURTH', 'LAST', 'LASTDAY'."
                ),
            ));
        }
        Frequency::OnIdle | Frequency::OnStart | Frequency::OnLogon | Frequency::None => {
            if modifier.as_int() == Some(1) {
                return Ok(());
            }
            return Err(ValidationError::new(
                "frequency_modifier",
                format!(
                    "frequency_modifier property not supported with frequency :{}",
                    spec.frequency
                ),
            ));
        }
        Frequency::Once => return Ok(()),
    };
    match modifier.as_int() {
        Some(n) if (1..=max).contains(&n) => Ok(()),
        _ => Err(ValidationError::new(
            "frequency_modifier",
            format!(
                "frequency_modifier value {modifier} is invalid. Valid values for :{} frequency are 1 - {max}.",
                spec.frequency
            ),
        )),
    }
}

fn check_months(spec: &ScheduleSpec) -> Check {
    let Some(months) = spec.months.as_deref() else {
        return Ok(());
    };
    if spec.frequency != Frequency::Monthly {
        return Err(ValidationError::new(
            "months",
            "months property is only valid for tasks that run monthly",
        ));
    }
    check_vocabulary::<Month>("months", months)
}

fn check_idle_time(spec: &ScheduleSpec) -> Check {
    match (spec.frequency, spec.idle_time) {
        (Frequency::OnIdle, None) => Err(ValidationError::new(
            "idle_time",
            "idle_time value should be set for :on_idle frequency.",
        )),
        (Frequency::OnIdle, Some(minutes)) if !(1..=MAX_IDLE_TIME).contains(&minutes) => {
            Err(ValidationError::new(
                "idle_time",
                format!(
                    "idle_time value {minutes} is invalid. Valid values for :on_idle frequency are 1 - {MAX_IDLE_TIME}."
                ),
            ))
        }
        (Frequency::OnIdle, Some(_)) | (_, None) => Ok(()),
        (_, Some(_)) => Err(ValidationError::new(
            "idle_time",
            "idle_time property is only valid for tasks that run on_idle",
        )),
    }
}

fn check_once_start_time(spec: &ScheduleSpec) -> Check {
    if spec.frequency == Frequency::Once && spec.start_time.is_none() {
        return Err(ValidationError::new(
            "start_time",
            "`start_time` needs to be provided with `frequency :once`",
        ));
    }
    Ok(())
}

fn check_random_delay(spec: &ScheduleSpec) -> Check {
    if spec.random_delay.is_none() {
        return Ok(());
    }
    if !spec.frequency.supports_random_delay() {
        return Err(ValidationError::new(
            "random_delay",
            "`random_delay` property is supported only for frequency :once, :minute, :hourly, :daily, :weekly and :monthly",
        ));
    }
    if spec.random_delay_seconds().is_none() {
        return Err(ValidationError::new(
            "random_delay",
            "Invalid value passed for `random_delay`. Please pass seconds as an Integer (e.g. 60) or a String with numeric values only (e.g. '60').",
        ));
    }
    Ok(())
}

fn check_day(spec: &ScheduleSpec) -> Check {
    let Some(day) = spec.day.as_deref() else {
        return Ok(());
    };
    match spec.frequency {
        Frequency::Weekly => check_vocabulary::<DayOfWeek>("day", day),
        Frequency::Monthly => match spec.monthly_pattern() {
            Some(MonthlyPattern::Weeks(_)) => check_vocabulary::<DayOfWeek>("day", day),
            _ => check_vocabulary::<DayOfMonth>("day", day),
        },
        _ => Err(ValidationError::new(
            "day",
            "day property is only valid for tasks that run monthly or weekly",
        )),
    }
}

fn check_start_formats(spec: &ScheduleSpec) -> Check {
    if spec
        .start_day
        .as_deref()
        .is_some_and(|raw| parse_start_day(raw).is_none())
    {
        return Err(ValidationError::new(
            "start_day",
            "`start_day` property must be in the MM/DD/YYYY format.",
        ));
    }
    if spec
        .start_time
        .as_deref()
        .is_some_and(|raw| parse_start_time(raw).is_none())
    {
        return Err(ValidationError::new(
            "start_time",
            "`start_time` property must be in the HH:mm format.",
        ));
    }
    Ok(())
}

fn check_repetition(spec: &ScheduleSpec) -> Check {
    if spec.frequency.supports_repetition() {
        return Ok(());
    }
    for (field, value) in [
        ("minutes_interval", spec.minutes_interval),
        ("minutes_duration", spec.minutes_duration),
    ] {
        if value.is_some() {
            return Err(ValidationError::new(
                field,
                format!("{field} property is only valid for tasks that run once, every minute or hourly"),
            ));
        }
    }
    Ok(())
}

fn check_execution_time_limit(spec: &ScheduleSpec) -> Check {
    if spec.execution_time_limit == Some(0) {
        return Err(ValidationError::new(
            "execution_time_limit",
            "execution_time_limit value 0 is invalid. Valid values are 1 minute or more.",
        ));
    }
    Ok(())
}

fn check_vocabulary<S: Symbol>(field: &'static str, input: &str) -> Check {
    encode::<S>(input).map(|_| ()).map_err(|_| {
        ValidationError::new(
            field,
            format!(
                "{field} property invalid. Only valid values are: {}. Multiple values must be separated by a comma.",
                S::VOCABULARY
            ),
        )
    })
}
