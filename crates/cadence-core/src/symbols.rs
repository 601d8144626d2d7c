//! Symbol tables for the scheduler's bitmask set fields.
//!
//! Each symbolic domain maps its tokens onto distinct powers of two, using the
//! same bit layout as the native task scheduler's trigger fields.

use serde::{Deserialize, Serialize};

/// A symbolic value that occupies exactly one bit of a set field.
pub trait Symbol: Copy + Sized {
    /// Accepted tokens, as listed in validation messages.
    const VOCABULARY: &'static str;

    /// Mask selected by the `*` token, or `None` when the domain has no wildcard.
    const WILDCARD: Option<u32>;

    /// Look up a single, already trimmed token (case-insensitive).
    fn parse(token: &str) -> Option<Self>;

    /// The flag this symbol contributes to a mask.
    fn flag(self) -> u32;
}

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Three-letter token for this day.
    pub fn token(self) -> &'static str {
        match self {
            DayOfWeek::Sunday => "SUN",
            DayOfWeek::Monday => "MON",
            DayOfWeek::Tuesday => "TUE",
            DayOfWeek::Wednesday => "WED",
            DayOfWeek::Thursday => "THU",
            DayOfWeek::Friday => "FRI",
            DayOfWeek::Saturday => "SAT",
        }
    }
}

impl Symbol for DayOfWeek {
    const VOCABULARY: &'static str = "MON, TUE, WED, THU, FRI, SAT, SUN, *";
    const WILDCARD: Option<u32> = Some(0x7F);

    fn parse(token: &str) -> Option<Self> {
        DayOfWeek::ALL
            .into_iter()
            .find(|day| day.token().eq_ignore_ascii_case(token))
    }

    fn flag(self) -> u32 {
        match self {
            DayOfWeek::Sunday => 0x01,
            DayOfWeek::Monday => 0x02,
            DayOfWeek::Tuesday => 0x04,
            DayOfWeek::Wednesday => 0x08,
            DayOfWeek::Thursday => 0x10,
            DayOfWeek::Friday => 0x20,
            DayOfWeek::Saturday => 0x40,
        }
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
            chrono::Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// Month of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Mask covering every month.
    pub const EVERY: u32 = 0x0FFF;

    /// Three-letter token for this month.
    pub fn token(self) -> &'static str {
        match self {
            Month::January => "JAN",
            Month::February => "FEB",
            Month::March => "MAR",
            Month::April => "APR",
            Month::May => "MAY",
            Month::June => "JUN",
            Month::July => "JUL",
            Month::August => "AUG",
            Month::September => "SEP",
            Month::October => "OCT",
            Month::November => "NOV",
            Month::December => "DEC",
        }
    }
}

impl Symbol for Month {
    const VOCABULARY: &'static str =
        "JAN, FEB, MAR, APR, MAY, JUN, JUL, AUG, SEP, OCT, NOV, DEC, *";
    const WILDCARD: Option<u32> = Some(Month::EVERY);

    fn parse(token: &str) -> Option<Self> {
        Month::ALL
            .into_iter()
            .find(|month| month.token().eq_ignore_ascii_case(token))
    }

    fn flag(self) -> u32 {
        // Calendar order, one bit per month starting at JAN = 0x1.
        1 << (self as u32)
    }
}

/// Week of the month, used by day-of-week monthly triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekOfMonth {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl WeekOfMonth {
    pub const ALL: [WeekOfMonth; 5] = [
        WeekOfMonth::First,
        WeekOfMonth::Second,
        WeekOfMonth::Third,
        WeekOfMonth::Fourth,
        WeekOfMonth::Last,
    ];

    pub fn token(self) -> &'static str {
        match self {
            WeekOfMonth::First => "FIRST",
            WeekOfMonth::Second => "SECOND",
            WeekOfMonth::Third => "THIRD",
            WeekOfMonth::Fourth => "FOURTH",
            WeekOfMonth::Last => "LAST",
        }
    }
}

impl Symbol for WeekOfMonth {
    const VOCABULARY: &'static str = "'FIRST', 'SECOND', 'THIRD', 'FOURTH', 'LAST'";
    const WILDCARD: Option<u32> = None;

    fn parse(token: &str) -> Option<Self> {
        WeekOfMonth::ALL
            .into_iter()
            .find(|week| week.token().eq_ignore_ascii_case(token))
    }

    fn flag(self) -> u32 {
        1 << (self as u32)
    }
}

/// Day of the month: a calendar day 1-31, or the last day whatever its number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfMonth {
    Day(u8),
    Last,
}

impl DayOfMonth {
    /// Flag reserved for "last day of the month".
    pub const LAST_FLAG: u32 = 0x8000_0000;

    /// Every day token in ascending order, followed by `Last`.
    pub fn all() -> impl Iterator<Item = DayOfMonth> {
        (1..=31)
            .map(DayOfMonth::Day)
            .chain(std::iter::once(DayOfMonth::Last))
    }
}

impl Symbol for DayOfMonth {
    const VOCABULARY: &'static str = "1-31, LAST, *";
    const WILDCARD: Option<u32> = Some(0x7FFF_FFFF);

    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("last") {
            return Some(DayOfMonth::Last);
        }
        match token.parse::<u8>() {
            Ok(day @ 1..=31) => Some(DayOfMonth::Day(day)),
            _ => None,
        }
    }

    fn flag(self) -> u32 {
        match self {
            DayOfMonth::Day(day) => 1 << (u32::from(day) - 1),
            DayOfMonth::Last => Self::LAST_FLAG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_week_flags_match_native_layout() {
        assert_eq!(DayOfWeek::Sunday.flag(), 1);
        assert_eq!(DayOfWeek::Monday.flag(), 2);
        assert_eq!(DayOfWeek::Friday.flag(), 32);
        assert_eq!(DayOfWeek::Saturday.flag(), 64);
    }

    #[test]
    fn test_month_flags_are_calendar_ordered() {
        assert_eq!(Month::January.flag(), 0x1);
        assert_eq!(Month::May.flag(), 0x10);
        assert_eq!(Month::December.flag(), 0x800);
        let every = Month::ALL.iter().fold(0, |mask, m| mask | m.flag());
        assert_eq!(every, Month::EVERY);
    }

    #[test]
    fn test_week_of_month_flags() {
        let flags: Vec<u32> = WeekOfMonth::ALL.iter().map(|w| w.flag()).collect();
        assert_eq!(flags, vec![1, 2, 4, 8, 16]);
    }

    #[test]
    fn test_day_of_month_flags() {
        assert_eq!(DayOfMonth::Day(1).flag(), 1);
        assert_eq!(DayOfMonth::Day(3).flag(), 4);
        assert_eq!(DayOfMonth::Day(31).flag(), 0x4000_0000);
        assert_eq!(DayOfMonth::Last.flag(), 0x8000_0000);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(DayOfWeek::parse("mon"), Some(DayOfWeek::Monday));
        assert_eq!(DayOfWeek::parse("Fri"), Some(DayOfWeek::Friday));
        assert_eq!(Month::parse("sep"), Some(Month::September));
        assert_eq!(WeekOfMonth::parse("Last"), Some(WeekOfMonth::Last));
        assert_eq!(DayOfMonth::parse("LAST"), Some(DayOfMonth::Last));
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        assert_eq!(DayOfWeek::parse("Monday"), None);
        assert_eq!(Month::parse("xyz"), None);
        assert_eq!(WeekOfMonth::parse("fifth"), None);
        assert_eq!(DayOfMonth::parse("0"), None);
        assert_eq!(DayOfMonth::parse("32"), None);
    }

    #[test]
    fn test_weekday_conversion() {
        assert_eq!(DayOfWeek::from(chrono::Weekday::Fri), DayOfWeek::Friday);
        assert_eq!(DayOfWeek::from(chrono::Weekday::Sun), DayOfWeek::Sunday);
    }
}
