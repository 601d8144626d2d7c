//! Recurrence compiler and idempotency comparator for scheduled tasks.
//!
//! This crate provides functionality to:
//! - Encode day, month and week selections as scheduler bitmasks
//! - Validate a [`ScheduleSpec`] against frequency-specific rules
//! - Compile a schedule into a native [`CompiledTrigger`]
//! - Decide whether an installed [`TaskState`] has drifted from its schedule

mod clock;
mod comparator;
mod compiler;
pub mod duration;
pub mod encoder;
mod error;
mod schedule;
mod state;
pub mod symbols;
mod trigger;
mod validator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use comparator::{detect_drift, needs_update, Drift};
pub use compiler::TriggerCompiler;
pub use error::{CoreError, Result};
pub use schedule::{
    parse_start_day, parse_start_time, task_path, Frequency, MonthlyPattern, RunLevel, Scalar,
    ScheduleSpec, ScheduleSpecBuilder, DEFAULT_EXECUTION_TIME_LIMIT, DEFAULT_USER,
};
pub use state::{ReportedTrigger, TaskState, TaskStatus};
pub use trigger::{CompiledTrigger, TriggerPayload, TriggerType};
pub use validator::{is_passwordless_user, validate, ValidationError, PASSWORDLESS_USERS};
