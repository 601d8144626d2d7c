//! Normalized trigger representation shared with the native scheduler.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Native trigger kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Once,
    Daily,
    Weekly,
    MonthlyDate,
    MonthlyDow,
    OnIdle,
    OnSystemStart,
    OnLogon,
}

impl TriggerType {
    /// Native trigger type code.
    pub fn code(self) -> u32 {
        match self {
            TriggerType::Once => 1,
            TriggerType::Daily => 2,
            TriggerType::Weekly => 3,
            TriggerType::MonthlyDate => 4,
            TriggerType::MonthlyDow => 5,
            TriggerType::OnIdle => 6,
            TriggerType::OnSystemStart => 8,
            TriggerType::OnLogon => 9,
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerType::Once => "once",
            TriggerType::Daily => "daily",
            TriggerType::Weekly => "weekly",
            TriggerType::MonthlyDate => "monthly_date",
            TriggerType::MonthlyDow => "monthly_dow",
            TriggerType::OnIdle => "on_idle",
            TriggerType::OnSystemStart => "on_system_start",
            TriggerType::OnLogon => "on_logon",
        };
        write!(f, "{s}")
    }
}

/// Type-specific recurrence fields. Set fields are bitmasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerPayload {
    #[default]
    Empty,
    Daily {
        days_interval: u32,
    },
    Weekly {
        weeks_interval: u32,
        days_of_week: u32,
    },
    MonthlyDate {
        months: u32,
        days_of_month: u32,
    },
    MonthlyDow {
        months: u32,
        days_of_week: u32,
        weeks_of_month: u32,
    },
}

impl TriggerPayload {
    /// The days-of-week mask, for payloads that carry one.
    pub fn days_of_week(&self) -> Option<u32> {
        match self {
            TriggerPayload::Weekly { days_of_week, .. }
            | TriggerPayload::MonthlyDow { days_of_week, .. } => Some(*days_of_week),
            _ => None,
        }
    }

    /// Copy of this payload with the days-of-week mask replaced.
    #[must_use]
    pub fn with_days_of_week(self, mask: u32) -> Self {
        match self {
            TriggerPayload::Weekly { weeks_interval, .. } => TriggerPayload::Weekly {
                weeks_interval,
                days_of_week: mask,
            },
            TriggerPayload::MonthlyDow {
                months,
                weeks_of_month,
                ..
            } => TriggerPayload::MonthlyDow {
                months,
                days_of_week: mask,
                weeks_of_month,
            },
            other => other,
        }
    }
}

/// A trigger compiled from a schedule, ready to submit to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompiledTrigger {
    pub trigger_type: TriggerType,
    pub start_year: i32,
    pub start_month: u32,
    pub start_day: u32,
    pub start_hour: u32,
    pub start_minute: u32,
    pub random_minutes_interval: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_duration: Option<u32>,
    pub payload: TriggerPayload,
}
