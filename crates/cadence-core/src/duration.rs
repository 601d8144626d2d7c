//! ISO-8601 duration handling for idle and execution-time settings.
//!
//! Resources express these settings in minutes while the scheduler reports
//! them as ISO-8601 strings (`PT20M`, `PT72H`). Both sides are normalised to
//! [`chrono::Duration`] before comparison.

use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;

use crate::CoreError;

static ISO8601_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").unwrap()
});

/// Parse an ISO-8601 duration limited to days, hours, minutes and seconds.
pub fn parse_iso8601(raw: &str) -> Result<Duration, CoreError> {
    let raw = raw.trim();
    let invalid = || CoreError::Duration(raw.to_string());

    // "P" and "PT" match the pattern but carry no components.
    if raw == "P" || raw.ends_with('T') {
        return Err(invalid());
    }
    let caps = ISO8601_DURATION.captures(raw).ok_or_else(invalid)?;

    let component = |index: usize| -> Result<i64, CoreError> {
        caps.get(index)
            .map_or(Ok(0), |m| m.as_str().parse::<i64>().map_err(|_| invalid()))
    };

    // Components that leave chrono's range are as unusable as malformed ones.
    [
        Duration::try_days(component(1)?),
        Duration::try_hours(component(2)?),
        Duration::try_minutes(component(3)?),
        Duration::try_seconds(component(4)?),
    ]
    .into_iter()
    .try_fold(Duration::zero(), |total, part| total.checked_add(&part?))
    .ok_or_else(invalid)
}

/// Duration of `minutes` minutes.
pub fn from_minutes(minutes: u32) -> Duration {
    Duration::minutes(i64::from(minutes))
}

/// Render `minutes` the way the scheduler reports it (`PT20M`, `PT72H`, `PT1H30M`).
pub fn format_minutes(minutes: u32) -> String {
    if minutes == 0 {
        return "PT0S".to_string();
    }
    let (hours, minutes) = (minutes / 60, minutes % 60);
    let mut out = String::from("PT");
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_common_forms() {
        assert_eq!(parse_iso8601("PT20M").unwrap(), Duration::minutes(20));
        assert_eq!(parse_iso8601("PT72H").unwrap(), Duration::hours(72));
        assert_eq!(parse_iso8601("P3D").unwrap(), Duration::days(3));
        assert_eq!(parse_iso8601("PT0S").unwrap(), Duration::zero());
        assert_eq!(
            parse_iso8601("P1DT2H3M4S").unwrap(),
            Duration::seconds(86_400 + 7_200 + 180 + 4)
        );
    }

    #[test]
    fn test_equivalent_spellings_normalise() {
        assert_eq!(
            parse_iso8601("PT72H").unwrap(),
            parse_iso8601("PT4320M").unwrap()
        );
        assert_eq!(parse_iso8601("P3D").unwrap(), from_minutes(4320));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "P", "PT", "20M", "PT20", "PT-5M", "PT1.5H", "72 hours"] {
            assert!(parse_iso8601(raw).is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        for raw in [
            "P999999999999D",
            "PT999999999999999H",
            "PT99999999999999999999S",
            "P100000000DT2562047788015H",
        ] {
            assert!(
                matches!(parse_iso8601(raw), Err(CoreError::Duration(_))),
                "{raw} should be out of range"
            );
        }
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(20), "PT20M");
        assert_eq!(format_minutes(4320), "PT72H");
        assert_eq!(format_minutes(90), "PT1H30M");
        assert_eq!(format_minutes(0), "PT0S");
    }

    proptest! {
        // Formatting then parsing recovers the same span of time
        #[test]
        fn format_parse_preserves_duration(minutes in 0u32..100_000) {
            let parsed = parse_iso8601(&format_minutes(minutes)).unwrap();
            prop_assert_eq!(parsed, from_minutes(minutes));
        }
    }
}
