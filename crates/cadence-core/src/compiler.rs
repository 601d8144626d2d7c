//! Compile a validated schedule into a native trigger.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::debug;

use crate::encoder::{
    days_of_month_or_first, days_of_week_or_start, months_or_every, UnknownToken,
};
use crate::schedule::{parse_start_day, parse_start_time, Frequency, MonthlyPattern, ScheduleSpec};
use crate::symbols::{DayOfMonth, Symbol};
use crate::trigger::{CompiledTrigger, TriggerPayload, TriggerType};
use crate::validator::{validate, ValidationError};
use crate::CoreError;

/// Compiles schedules into [`CompiledTrigger`]s.
pub struct TriggerCompiler;

impl TriggerCompiler {
    /// Compile `spec`, filling absent start fields from `now`.
    ///
    /// The schedule is validated first. Returns `Ok(None)` for on-demand
    /// schedules, which install no trigger at all.
    pub fn compile(
        spec: &ScheduleSpec,
        now: NaiveDateTime,
    ) -> Result<Option<CompiledTrigger>, CoreError> {
        validate(spec)?;

        let trigger_type = match Self::trigger_type(spec)? {
            Some(trigger_type) => trigger_type,
            None => return Ok(None),
        };
        let start = Self::start(spec, now)?;
        let payload = Self::payload(spec, trigger_type, start.date())?;

        let mut minutes_interval = match spec.frequency {
            Frequency::Minute => Some(Self::modifier(spec)?),
            Frequency::Hourly => Some(Self::modifier(spec)? * 60),
            _ => None,
        };
        if spec.minutes_interval.is_some() {
            minutes_interval = spec.minutes_interval;
        }

        let random_minutes_interval = spec.random_delay_seconds().ok_or_else(|| {
            ValidationError {
                field: "random_delay",
                message: format!("random_delay {:?} is not a whole number", spec.random_delay),
            }
        })?;

        let trigger = CompiledTrigger {
            trigger_type,
            start_year: start.year(),
            start_month: start.month(),
            start_day: start.day(),
            start_hour: start.hour(),
            start_minute: start.minute(),
            random_minutes_interval,
            minutes_interval,
            minutes_duration: spec.minutes_duration,
            payload,
        };

        debug!(
            task = %spec.task_name,
            trigger_type = %trigger.trigger_type,
            "compiled trigger"
        );
        Ok(Some(trigger))
    }

    /// The trigger kind a schedule compiles to, or `None` for on-demand tasks.
    pub fn trigger_type(spec: &ScheduleSpec) -> Result<Option<TriggerType>, CoreError> {
        let trigger_type = match spec.frequency {
            Frequency::Once | Frequency::Minute | Frequency::Hourly => TriggerType::Once,
            Frequency::Daily => TriggerType::Daily,
            Frequency::Weekly => TriggerType::Weekly,
            Frequency::Monthly => match Self::monthly_pattern(spec)? {
                MonthlyPattern::Weeks(_) => TriggerType::MonthlyDow,
                MonthlyPattern::Date | MonthlyPattern::LastDay => TriggerType::MonthlyDate,
            },
            Frequency::OnIdle => TriggerType::OnIdle,
            Frequency::OnStart => TriggerType::OnSystemStart,
            Frequency::OnLogon => TriggerType::OnLogon,
            Frequency::None => return Ok(None),
        };
        Ok(Some(trigger_type))
    }

    fn payload(
        spec: &ScheduleSpec,
        trigger_type: TriggerType,
        start_day: NaiveDate,
    ) -> Result<TriggerPayload, CoreError> {
        let day = spec.day.as_deref();
        let payload = match trigger_type {
            TriggerType::Daily => TriggerPayload::Daily {
                days_interval: Self::modifier(spec)?,
            },
            TriggerType::Weekly => TriggerPayload::Weekly {
                weeks_interval: Self::modifier(spec)?,
                days_of_week: days_of_week_or_start(day, start_day).map_err(invalid("day"))?,
            },
            TriggerType::MonthlyDate => {
                let months = months_or_every(spec.months.as_deref()).map_err(invalid("months"))?;
                let days_of_month = match Self::monthly_pattern(spec)? {
                    // LASTDAY selects the last day, plus any explicit dates.
                    MonthlyPattern::LastDay => match day {
                        Some(_) => {
                            days_of_month_or_first(day).map_err(invalid("day"))?
                                | DayOfMonth::Last.flag()
                        }
                        None => DayOfMonth::Last.flag(),
                    },
                    _ => days_of_month_or_first(day).map_err(invalid("day"))?,
                };
                TriggerPayload::MonthlyDate {
                    months,
                    days_of_month,
                }
            }
            TriggerType::MonthlyDow => {
                let MonthlyPattern::Weeks(weeks_of_month) = Self::monthly_pattern(spec)? else {
                    return Err(modifier_error(spec).into());
                };
                TriggerPayload::MonthlyDow {
                    months: months_or_every(spec.months.as_deref()).map_err(invalid("months"))?,
                    days_of_week: days_of_week_or_start(day, start_day).map_err(invalid("day"))?,
                    weeks_of_month,
                }
            }
            TriggerType::Once
            | TriggerType::OnIdle
            | TriggerType::OnSystemStart
            | TriggerType::OnLogon => TriggerPayload::Empty,
        };
        Ok(payload)
    }

    fn start(spec: &ScheduleSpec, now: NaiveDateTime) -> Result<NaiveDateTime, CoreError> {
        let date = match spec.start_day.as_deref() {
            Some(raw) => parse_start_day(raw).ok_or_else(|| ValidationError {
                field: "start_day",
                message: "`start_day` property must be in the MM/DD/YYYY format.".to_string(),
            })?,
            None => now.date(),
        };
        let time = match spec.start_time.as_deref() {
            Some(raw) => parse_start_time(raw).ok_or_else(|| ValidationError {
                field: "start_time",
                message: "`start_time` property must be in the HH:mm format.".to_string(),
            })?,
            None => NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(now.time()),
        };
        Ok(date.and_time(time))
    }

    fn monthly_pattern(spec: &ScheduleSpec) -> Result<MonthlyPattern, ValidationError> {
        spec.monthly_pattern().ok_or_else(|| modifier_error(spec))
    }

    fn modifier(spec: &ScheduleSpec) -> Result<u32, ValidationError> {
        spec.frequency_modifier
            .as_int()
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| modifier_error(spec))
    }
}

fn modifier_error(spec: &ScheduleSpec) -> ValidationError {
    ValidationError {
        field: "frequency_modifier",
        message: format!(
            "frequency_modifier value {} is invalid for :{} frequency.",
            spec.frequency_modifier, spec.frequency
        ),
    }
}

fn invalid(field: &'static str) -> impl Fn(UnknownToken) -> ValidationError {
    move |err| ValidationError {
        field,
        message: err.to_string(),
    }
}
