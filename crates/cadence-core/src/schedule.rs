//! Desired-state description of a scheduled task.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::encoder::encode;
use crate::symbols::WeekOfMonth;

/// Default execution time limit in minutes (72 hours).
pub const DEFAULT_EXECUTION_TIME_LIMIT: u32 = 72 * 60;

/// Account used when none is given.
pub const DEFAULT_USER: &str = "SYSTEM";

/// Date format accepted for `start_day`.
pub const START_DAY_FORMAT: &str = "%m/%d/%Y";

/// Time format accepted for `start_time`.
pub const START_TIME_FORMAT: &str = "%H:%M";

/// How often the task recurs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Once,
    Minute,
    #[default]
    Hourly,
    Daily,
    Weekly,
    Monthly,
    OnIdle,
    #[serde(rename = "onstart")]
    OnStart,
    OnLogon,
    /// On demand only; the task has no trigger.
    None,
}

impl Frequency {
    /// Frequencies that accept a `random_delay`.
    pub fn supports_random_delay(self) -> bool {
        matches!(
            self,
            Frequency::Once
                | Frequency::Minute
                | Frequency::Hourly
                | Frequency::Daily
                | Frequency::Weekly
                | Frequency::Monthly
        )
    }

    /// Frequencies that repeat within a single trigger activation.
    pub fn supports_repetition(self) -> bool {
        matches!(self, Frequency::Once | Frequency::Minute | Frequency::Hourly)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Once => "once",
            Frequency::Minute => "minute",
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::OnIdle => "on_idle",
            Frequency::OnStart => "onstart",
            Frequency::OnLogon => "on_logon",
            Frequency::None => "none",
        };
        write!(f, "{s}")
    }
}

/// Privilege level the task runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLevel {
    Highest,
    #[default]
    Limited,
}

impl RunLevel {
    /// Native run level code.
    pub fn code(self) -> u32 {
        match self {
            RunLevel::Highest => 1,
            RunLevel::Limited => 0,
        }
    }
}

/// A value that may arrive either as an integer or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    /// Integer view of the value; numeric strings are parsed.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Int(_) => None,
            Scalar::Text(s) => Some(s.trim()),
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Int(1)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(i64::from(n))
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Scalar::Int(i64::from(n))
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

/// How a monthly `frequency_modifier` selects days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthlyPattern {
    /// Numeric modifier: fire on calendar dates.
    Date,
    /// `LASTDAY`: fire on the last day of each selected month.
    LastDay,
    /// Week tokens: fire on weekdays within the given weeks (mask).
    Weeks(u32),
}

impl MonthlyPattern {
    /// Interpret a monthly modifier, or `None` when it is not valid for monthly tasks.
    pub fn from_modifier(modifier: &Scalar) -> Option<Self> {
        if let Some(n) = modifier.as_int() {
            return (1..=12).contains(&n).then_some(MonthlyPattern::Date);
        }
        let text = modifier.as_text()?;
        if text.eq_ignore_ascii_case("LASTDAY") {
            return Some(MonthlyPattern::LastDay);
        }
        encode::<WeekOfMonth>(text).ok().map(MonthlyPattern::Weeks)
    }
}

/// Desired state of one scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSpec {
    /// Name of the task in the scheduler.
    pub task_name: String,
    /// Command line the task executes.
    pub command: Option<String>,
    pub frequency: Frequency,
    /// Interval for minute/hourly/daily/weekly tasks, or the week selector for monthly ones.
    pub frequency_modifier: Scalar,
    /// Comma-separated days of the week, or days of the month for monthly tasks.
    pub day: Option<String>,
    /// Comma-separated months; monthly tasks only.
    pub months: Option<String>,
    /// First run date as `MM/DD/YYYY`.
    pub start_day: Option<String>,
    /// First run time as `HH:MM`.
    pub start_time: Option<String>,
    /// Idle period in minutes before an on-idle task starts.
    pub idle_time: Option<u32>,
    /// Maximum run time in minutes.
    pub execution_time_limit: Option<u32>,
    /// Random delay in seconds.
    pub random_delay: Option<Scalar>,
    pub minutes_interval: Option<u32>,
    pub minutes_duration: Option<u32>,
    pub run_level: RunLevel,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub interactive_enabled: bool,
    /// Re-submit the task even when nothing drifted.
    pub force: bool,
}

impl Default for ScheduleSpec {
    fn default() -> Self {
        Self {
            task_name: String::new(),
            command: None,
            frequency: Frequency::default(),
            frequency_modifier: Scalar::default(),
            day: None,
            months: None,
            start_day: None,
            start_time: None,
            idle_time: None,
            execution_time_limit: Some(DEFAULT_EXECUTION_TIME_LIMIT),
            random_delay: None,
            minutes_interval: None,
            minutes_duration: None,
            run_level: RunLevel::default(),
            user: DEFAULT_USER.to_string(),
            password: None,
            interactive_enabled: false,
            force: false,
        }
    }
}

impl ScheduleSpec {
    /// Start building a spec for `task_name` running `command`.
    pub fn builder(task_name: impl Into<String>, command: impl Into<String>) -> ScheduleSpecBuilder {
        ScheduleSpecBuilder::new(task_name, command)
    }

    /// Scheduler path for this task (always with a leading backslash).
    pub fn task_path(&self) -> String {
        task_path(&self.task_name)
    }

    /// How the monthly modifier should be interpreted, if this is a valid monthly task.
    pub fn monthly_pattern(&self) -> Option<MonthlyPattern> {
        MonthlyPattern::from_modifier(&self.frequency_modifier)
    }

    /// Random delay in seconds, or 0 when unset. `None` if the value is not a non-negative integer.
    pub fn random_delay_seconds(&self) -> Option<u32> {
        match &self.random_delay {
            None => Some(0),
            Some(value) => value.as_int().and_then(|n| u32::try_from(n).ok()),
        }
    }
}

/// Normalise a task name to the scheduler's path form.
pub fn task_path(name: &str) -> String {
    if name.starts_with('\\') {
        name.to_string()
    } else {
        format!("\\{name}")
    }
}

/// Parse a `MM/DD/YYYY` start day.
pub fn parse_start_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), START_DAY_FORMAT).ok()
}

/// Parse an `HH:MM` start time.
pub fn parse_start_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), START_TIME_FORMAT).ok()
}

/// Fluent builder for [`ScheduleSpec`].
#[derive(Debug, Clone)]
pub struct ScheduleSpecBuilder {
    spec: ScheduleSpec,
}

impl ScheduleSpecBuilder {
    pub fn new(task_name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            spec: ScheduleSpec {
                task_name: task_name.into(),
                command: Some(command.into()),
                ..ScheduleSpec::default()
            },
        }
    }

    #[must_use]
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.spec.frequency = frequency;
        self
    }

    #[must_use]
    pub fn frequency_modifier(mut self, modifier: impl Into<Scalar>) -> Self {
        self.spec.frequency_modifier = modifier.into();
        self
    }

    #[must_use]
    pub fn day(mut self, day: impl Into<String>) -> Self {
        self.spec.day = Some(day.into());
        self
    }

    #[must_use]
    pub fn months(mut self, months: impl Into<String>) -> Self {
        self.spec.months = Some(months.into());
        self
    }

    #[must_use]
    pub fn start_day(mut self, start_day: impl Into<String>) -> Self {
        self.spec.start_day = Some(start_day.into());
        self
    }

    #[must_use]
    pub fn start_time(mut self, start_time: impl Into<String>) -> Self {
        self.spec.start_time = Some(start_time.into());
        self
    }

    #[must_use]
    pub fn idle_time(mut self, minutes: u32) -> Self {
        self.spec.idle_time = Some(minutes);
        self
    }

    #[must_use]
    pub fn execution_time_limit(mut self, minutes: u32) -> Self {
        self.spec.execution_time_limit = Some(minutes);
        self
    }

    #[must_use]
    pub fn random_delay(mut self, seconds: impl Into<Scalar>) -> Self {
        self.spec.random_delay = Some(seconds.into());
        self
    }

    #[must_use]
    pub fn minutes_interval(mut self, minutes: u32) -> Self {
        self.spec.minutes_interval = Some(minutes);
        self
    }

    #[must_use]
    pub fn minutes_duration(mut self, minutes: u32) -> Self {
        self.spec.minutes_duration = Some(minutes);
        self
    }

    #[must_use]
    pub fn run_level(mut self, run_level: RunLevel) -> Self {
        self.spec.run_level = run_level;
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.spec.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.spec.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn interactive_enabled(mut self, enabled: bool) -> Self {
        self.spec.interactive_enabled = enabled;
        self
    }

    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.spec.force = force;
        self
    }

    pub fn build(self) -> ScheduleSpec {
        self.spec
    }
}
