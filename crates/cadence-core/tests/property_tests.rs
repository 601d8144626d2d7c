//! Property tests for compilation and drift detection.
//!
//! A task installed from a schedule must not be reported as drifted when the
//! same schedule is compiled again later, and any single-bit change to an
//! installed set field must be.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use cadence_core::duration::format_minutes;
use cadence_core::{
    detect_drift, validate, CompiledTrigger, Frequency, ReportedTrigger, ScheduleSpec, TaskState,
    TaskStatus, TriggerCompiler, TriggerPayload, TriggerType,
};

fn base_instant() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 9, 20)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn installed(spec: &ScheduleSpec, trigger: Option<&CompiledTrigger>) -> TaskState {
    TaskState {
        name: spec.task_path(),
        exists: true,
        application_name: spec.command.clone(),
        account: Some(spec.user.clone()),
        run_level: spec.run_level,
        idle_duration: spec.idle_time.map(format_minutes),
        execution_time_limit: spec.execution_time_limit.map(format_minutes),
        trigger: trigger.map(ReportedTrigger::from),
        status: TaskStatus::Ready,
    }
}

fn day_set() -> impl Strategy<Value = String> {
    prop::sample::subsequence(vec!["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"], 1..=7)
        .prop_map(|days| days.join(","))
}

fn month_set() -> impl Strategy<Value = String> {
    prop::sample::subsequence(
        vec![
            "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
        ],
        1..=12,
    )
    .prop_map(|months| months.join(", "))
}

fn date_set() -> impl Strategy<Value = String> {
    prop::collection::btree_set(1u8..=31, 1..8).prop_map(|days| {
        days.iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",")
    })
}

/// Valid schedules without explicit start fields.
fn schedule() -> impl Strategy<Value = ScheduleSpec> {
    prop_oneof![
        (1i64..=1439).prop_map(|m| ScheduleSpec::builder("task", "cmd")
            .frequency(Frequency::Minute)
            .frequency_modifier(m)
            .build()),
        (1i64..=23).prop_map(|m| ScheduleSpec::builder("task", "cmd")
            .frequency(Frequency::Hourly)
            .frequency_modifier(m)
            .build()),
        (1i64..=365).prop_map(|m| ScheduleSpec::builder("task", "cmd")
            .frequency(Frequency::Daily)
            .frequency_modifier(m)
            .build()),
        (1i64..=52, prop::option::of(day_set())).prop_map(|(m, day)| {
            let mut spec = ScheduleSpec::builder("task", "cmd")
                .frequency(Frequency::Weekly)
                .frequency_modifier(m)
                .build();
            spec.day = day;
            spec
        }),
        (date_set(), month_set()).prop_map(|(day, months)| ScheduleSpec::builder("task", "cmd")
            .frequency(Frequency::Monthly)
            .day(day)
            .months(months)
            .build()),
        (
            prop::sample::select(vec!["first", "second", "third", "fourth", "last"]),
            prop::option::of(day_set())
        )
            .prop_map(|(week, day)| {
                let mut spec = ScheduleSpec::builder("task", "cmd")
                    .frequency(Frequency::Monthly)
                    .frequency_modifier(week)
                    .build();
                spec.day = day;
                spec
            }),
        (1u32..=999).prop_map(|idle| ScheduleSpec::builder("task", "cmd")
            .frequency(Frequency::OnIdle)
            .idle_time(idle)
            .build()),
        Just(ScheduleSpec::builder("task", "cmd").frequency(Frequency::OnStart).build()),
        Just(ScheduleSpec::builder("task", "cmd").frequency(Frequency::OnLogon).build()),
        Just(ScheduleSpec::builder("task", "cmd").frequency(Frequency::None).build()),
    ]
}

/// Flip `bit` in every set field of `payload` it lands in. The weekday mask
/// only counts when the schedule names its days.
fn flip_bit(payload: TriggerPayload, bit: u32, weekdays_explicit: bool) -> Option<TriggerPayload> {
    let flag = 1u32 << bit;
    let weekday_flag = if weekdays_explicit { flag & 0x7F } else { 0 };
    let flipped = match payload {
        TriggerPayload::MonthlyDate {
            months,
            days_of_month,
        } => TriggerPayload::MonthlyDate {
            months,
            days_of_month: days_of_month ^ flag,
        },
        TriggerPayload::MonthlyDow {
            months,
            days_of_week,
            weeks_of_month,
        } => TriggerPayload::MonthlyDow {
            months: months ^ (flag & 0x0FFF),
            days_of_week: days_of_week ^ weekday_flag,
            weeks_of_month: weeks_of_month ^ (flag & 0x1F),
        },
        TriggerPayload::Weekly {
            weeks_interval,
            days_of_week,
        } => TriggerPayload::Weekly {
            weeks_interval,
            days_of_week: days_of_week ^ weekday_flag,
        },
        TriggerPayload::Daily { days_interval } => TriggerPayload::Daily {
            days_interval: days_interval ^ flag,
        },
        TriggerPayload::Empty => return None,
    };
    Some(flipped).filter(|flipped| *flipped != payload)
}

proptest! {
    // Generated schedules are all valid
    #[test]
    fn generated_schedules_validate(spec in schedule()) {
        prop_assert!(validate(&spec).is_ok(), "rejected: {:?}", validate(&spec));
    }

    // Re-compiling an unchanged schedule later never reports drift
    #[test]
    fn unchanged_schedule_needs_no_update(
        spec in schedule(),
        later_minutes in 0i64..(60 * 24 * 400),
    ) {
        let first = TriggerCompiler::compile(&spec, base_instant()).unwrap();
        let current = installed(&spec, first.as_ref());

        let later = base_instant() + Duration::minutes(later_minutes);
        let second = TriggerCompiler::compile(&spec, later).unwrap();

        let drift = detect_drift(&spec, second.as_ref(), &current);
        prop_assert!(drift.is_none(), "unexpected drift {:?} for {:?}", drift, spec.frequency);
    }

    // Flipping one bit of an installed set field is always detected
    #[test]
    fn single_bit_payload_change_needs_update(spec in schedule(), bit in 0u32..32) {
        let desired = TriggerCompiler::compile(&spec, base_instant()).unwrap();
        let Some(trigger) = desired else {
            return Ok(());
        };
        let weekdays_explicit = spec.day.is_some() || spec.start_day.is_some();
        let Some(flipped) = flip_bit(trigger.payload, bit, weekdays_explicit) else {
            return Ok(());
        };

        let mut current = installed(&spec, Some(&trigger));
        if let Some(reported) = current.trigger.as_mut() {
            reported.payload = flipped;
        }
        prop_assert!(detect_drift(&spec, Some(&trigger), &current).is_some());
    }

    // Week tokens always produce a day-of-week monthly trigger
    #[test]
    fn monthly_week_tokens_select_dow(
        weeks in prop::sample::subsequence(vec!["FIRST", "SECOND", "THIRD", "FOURTH", "LAST"], 1..=5),
    ) {
        let spec = ScheduleSpec::builder("task", "cmd")
            .frequency(Frequency::Monthly)
            .frequency_modifier(weeks.join(",").as_str())
            .build();
        let trigger = TriggerCompiler::compile(&spec, base_instant()).unwrap().unwrap();
        prop_assert_eq!(trigger.trigger_type, TriggerType::MonthlyDow);
    }
}
