//! Encode comma-separated symbol sets into a single bitmask.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::symbols::{DayOfMonth, DayOfWeek, Month, Symbol};

/// A token that is not part of the domain being encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown token '{token}', expected one of: {vocabulary}")]
pub struct UnknownToken {
    pub token: String,
    pub vocabulary: &'static str,
}

/// OR together the flags of every comma-separated token in `input`.
///
/// Tokens are trimmed and matched case-insensitively. Order and duplicates
/// do not affect the result. Empty tokens are rejected.
pub fn encode<S: Symbol>(input: &str) -> Result<u32, UnknownToken> {
    input.split(',').map(str::trim).try_fold(0u32, |mask, token| {
        if token == "*" {
            if let Some(every) = S::WILDCARD {
                return Ok(mask | every);
            }
        }
        S::parse(token)
            .map(|symbol| mask | symbol.flag())
            .ok_or_else(|| UnknownToken {
                token: token.to_string(),
                vocabulary: S::VOCABULARY,
            })
    })
}

/// Months mask, defaulting to every month.
pub fn months_or_every(months: Option<&str>) -> Result<u32, UnknownToken> {
    months.map_or(Ok(Month::EVERY), encode::<Month>)
}

/// Days-of-month mask, defaulting to the first day of the month.
pub fn days_of_month_or_first(day: Option<&str>) -> Result<u32, UnknownToken> {
    day.map_or(Ok(DayOfMonth::Day(1).flag()), encode::<DayOfMonth>)
}

/// Days-of-week mask, defaulting to the weekday `start` falls on.
pub fn days_of_week_or_start(day: Option<&str>, start: NaiveDate) -> Result<u32, UnknownToken> {
    day.map_or_else(
        || Ok(DayOfWeek::from(start.weekday()).flag()),
        encode::<DayOfWeek>,
    )
}
