//! Convergence driver and direct task actions.

use cadence_core::{
    detect_drift, task_path, validate, Clock, ScheduleSpec, SystemClock, TaskState, TaskStatus,
    TriggerCompiler,
};
use tracing::{debug, info, warn};

use crate::{Account, ConvergenceResult, SchedulerError, TaskDefinition, TaskScheduler};

/// Drives a [`TaskScheduler`] towards the state described by a schedule.
pub struct Converger<S, C = SystemClock> {
    scheduler: S,
    clock: C,
}

impl<S: TaskScheduler> Converger<S> {
    /// Create a driver that defaults start fields from the host clock.
    pub fn new(scheduler: S) -> Self {
        Self::with_clock(scheduler, SystemClock)
    }
}

impl<S: TaskScheduler, C: Clock> Converger<S, C> {
    pub fn with_clock(scheduler: S, clock: C) -> Self {
        Self { scheduler, clock }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn into_inner(self) -> S {
        self.scheduler
    }

    /// Create the task if it is missing, or update it if it drifted from `spec`.
    ///
    /// The schedule is validated before the scheduler is contacted.
    #[tracing::instrument(skip(self, spec), fields(task = %spec.task_name, frequency = %spec.frequency))]
    pub fn converge(&mut self, spec: &ScheduleSpec) -> Result<ConvergenceResult, SchedulerError> {
        validate(spec)?;
        let name = spec.task_path();
        let account = Account::from_spec(spec);

        if !self.scheduler.exists(&name)? {
            let trigger = TriggerCompiler::compile(spec, self.clock.now())?;
            let definition = TaskDefinition::from_spec(spec, trigger);
            self.scheduler.create(&name, &definition, &account)?;
            info!(task = %name, "task created");
            return Ok(ConvergenceResult::changed(self.reload(&name)?));
        }

        debug!(task = %name, "task exists");
        let current = self.scheduler.load(&name)?;
        let trigger = TriggerCompiler::compile(spec, self.clock.now())?;

        match detect_drift(spec, trigger.as_ref(), &current) {
            Some(drift) => info!(task = %name, %drift, "task drifted"),
            None if spec.force => info!(task = %name, "no drift, updating because force is set"),
            None => {
                info!(
                    task = %name,
                    "task does not need updating and force is not specified - nothing to do"
                );
                return Ok(ConvergenceResult::unchanged(current));
            }
        }

        let definition = TaskDefinition::from_spec(spec, trigger);
        self.scheduler.update(&name, &definition, &account)?;
        info!(task = %name, "task updated");
        Ok(ConvergenceResult::changed(self.reload(&name)?))
    }

    /// Start the task unless it is already running.
    #[tracing::instrument(skip(self))]
    pub fn run(&mut self, task_name: &str) -> Result<ConvergenceResult, SchedulerError> {
        let Some(current) = self.existing(task_name)? else {
            return Ok(ConvergenceResult::unchanged(TaskState::absent(task_path(task_name))));
        };
        if current.status == TaskStatus::Running {
            info!(task = %current.name, "task is currently running, skipping run");
            return Ok(ConvergenceResult::unchanged(current));
        }
        self.scheduler.run(&current.name)?;
        info!(task = %current.name, "task started");
        Ok(ConvergenceResult::changed(self.reload(&current.name)?))
    }

    /// Stop the task if it is running.
    #[tracing::instrument(skip(self))]
    pub fn end(&mut self, task_name: &str) -> Result<ConvergenceResult, SchedulerError> {
        let Some(current) = self.existing(task_name)? else {
            return Ok(ConvergenceResult::unchanged(TaskState::absent(task_path(task_name))));
        };
        if current.status != TaskStatus::Running {
            debug!(task = %current.name, "task is not running - nothing to do");
            return Ok(ConvergenceResult::unchanged(current));
        }
        self.scheduler.stop(&current.name)?;
        info!(task = %current.name, "task ended");
        Ok(ConvergenceResult::changed(self.reload(&current.name)?))
    }

    /// Enable the task if it is disabled.
    #[tracing::instrument(skip(self))]
    pub fn enable(&mut self, task_name: &str) -> Result<ConvergenceResult, SchedulerError> {
        let Some(current) = self.existing(task_name)? else {
            return Ok(ConvergenceResult::unchanged(TaskState::absent(task_path(task_name))));
        };
        if current.status != TaskStatus::Disabled {
            debug!(task = %current.name, "task already enabled - nothing to do");
            return Ok(ConvergenceResult::unchanged(current));
        }
        self.scheduler.enable(&current.name)?;
        info!(task = %current.name, "task enabled");
        Ok(ConvergenceResult::changed(self.reload(&current.name)?))
    }

    /// Disable the task if it is ready or running.
    #[tracing::instrument(skip(self))]
    pub fn disable(&mut self, task_name: &str) -> Result<ConvergenceResult, SchedulerError> {
        let Some(current) = self.existing(task_name)? else {
            return Ok(ConvergenceResult::unchanged(TaskState::absent(task_path(task_name))));
        };
        if !matches!(current.status, TaskStatus::Ready | TaskStatus::Running) {
            warn!(task = %current.name, status = %current.status, "task already disabled - nothing to do");
            return Ok(ConvergenceResult::unchanged(current));
        }
        self.scheduler.disable(&current.name)?;
        info!(task = %current.name, "task disabled");
        Ok(ConvergenceResult::changed(self.reload(&current.name)?))
    }

    /// Delete the task if it exists, then confirm it is gone.
    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, task_name: &str) -> Result<ConvergenceResult, SchedulerError> {
        let Some(current) = self.existing(task_name)? else {
            return Ok(ConvergenceResult::unchanged(TaskState::absent(task_path(task_name))));
        };
        self.scheduler.delete(&current.name)?;
        if self.scheduler.exists(&current.name)? {
            return Err(SchedulerError::operation(
                "delete",
                current.name,
                "task still present after delete",
            ));
        }
        info!(task = %current.name, "task deleted");
        Ok(ConvergenceResult::changed(TaskState::absent(current.name)))
    }

    /// Load the task if it is installed, warning when it is not.
    fn existing(&self, task_name: &str) -> Result<Option<TaskState>, SchedulerError> {
        let name = task_path(task_name);
        if !self.scheduler.exists(&name)? {
            warn!(task = %name, "task does not exist - nothing to do");
            return Ok(None);
        }
        Ok(Some(self.scheduler.load(&name)?))
    }

    /// Re-read a task that was just created or updated.
    fn reload(&self, name: &str) -> Result<TaskState, SchedulerError> {
        let state = self.scheduler.load(name)?;
        if !state.exists {
            return Err(SchedulerError::NotFound(name.to_string()));
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryScheduler;
    use cadence_core::{FixedClock, Frequency, RunLevel, Scalar};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;

    fn instant() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 9, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn converger() -> Converger<MemoryScheduler, FixedClock> {
        Converger::with_clock(MemoryScheduler::new(), FixedClock(instant()))
    }

    fn spec() -> ScheduleSpec {
        ScheduleSpec::builder("sample_task", "dir").build()
    }

    // === Converge ===

    #[test]
    fn test_creates_missing_task() {
        let mut driver = converger();
        let result = driver.converge(&spec()).unwrap();

        assert!(result.changed);
        let state = result.task_state;
        assert_eq!(state.name, "\\sample_task");
        assert!(state.exists);
        assert_eq!(state.application_name.as_deref(), Some("dir"));
        assert_eq!(state.account.as_deref(), Some("SYSTEM"));
        assert_eq!(state.execution_time_limit.as_deref(), Some("PT72H"));
        let trigger = state.trigger.unwrap();
        assert_eq!(trigger.minutes_interval, Some(60));
        assert_eq!(trigger.start_hour, Scalar::Text("09".to_string()));
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let mut driver = converger();
        driver.converge(&spec()).unwrap();

        driver.clock = FixedClock(instant() + Duration::hours(30));
        let result = driver.converge(&spec()).unwrap();

        assert!(!result.changed);
        assert_eq!(driver.scheduler().mutations(), 1);
    }

    #[test]
    fn test_drift_triggers_update() {
        let mut driver = converger();
        driver.converge(&spec()).unwrap();

        let elevated = ScheduleSpec::builder("sample_task", "dir")
            .run_level(RunLevel::Highest)
            .build();
        let result = driver.converge(&elevated).unwrap();

        assert!(result.changed);
        assert_eq!(result.task_state.run_level, RunLevel::Highest);
        assert_eq!(driver.scheduler().mutations(), 2);
    }

    #[test]
    fn test_force_updates_without_drift() {
        let mut driver = converger();
        driver.converge(&spec()).unwrap();

        let forced = ScheduleSpec::builder("sample_task", "dir").force(true).build();
        assert!(driver.converge(&forced).unwrap().changed);
        assert_eq!(driver.scheduler().mutations(), 2);
    }

    #[test]
    fn test_invalid_spec_never_reaches_scheduler() {
        let mut driver = converger();
        let invalid = ScheduleSpec::builder("sample_task", "dir")
            .frequency(Frequency::Minute)
            .frequency_modifier(1450)
            .build();

        let err = driver.converge(&invalid).unwrap_err();
        assert!(matches!(err, SchedulerError::Validation(ref v) if v.field == "frequency_modifier"));
        assert_eq!(driver.scheduler().task_count(), 0);
        assert_eq!(driver.scheduler().mutations(), 0);
    }

    #[test]
    fn test_create_failure_propagates() {
        let mut driver = converger();
        driver.scheduler_mut().fail_next("create");

        let err = driver.converge(&spec()).unwrap_err();
        assert!(matches!(err, SchedulerError::Operation { operation: "create", .. }));
        assert_eq!(driver.scheduler().task_count(), 0);
    }

    #[test]
    fn test_update_failure_propagates() {
        let mut driver = converger();
        driver.converge(&spec()).unwrap();
        driver.scheduler_mut().fail_next("update");

        let changed = ScheduleSpec::builder("sample_task", "other.exe").build();
        assert!(driver.converge(&changed).is_err());
        // The installed task is untouched.
        let state = driver.scheduler().load("\\sample_task").unwrap();
        assert_eq!(state.application_name.as_deref(), Some("dir"));
    }

    #[test]
    fn test_on_demand_task_drops_installed_trigger() {
        let mut driver = converger();
        driver.converge(&spec()).unwrap();

        let on_demand = ScheduleSpec::builder("sample_task", "dir")
            .frequency(Frequency::None)
            .build();
        let result = driver.converge(&on_demand).unwrap();
        assert!(result.changed);
        assert_eq!(result.task_state.trigger, None);

        assert!(!driver.converge(&on_demand).unwrap().changed);
    }

    // === Direct actions ===

    #[test]
    fn test_run_and_end() {
        let mut driver = converger();
        driver.converge(&spec()).unwrap();

        let result = driver.run("sample_task").unwrap();
        assert!(result.changed);
        assert_eq!(result.task_state.status, TaskStatus::Running);

        assert!(!driver.run("sample_task").unwrap().changed);

        let result = driver.end("\\sample_task").unwrap();
        assert!(result.changed);
        assert_eq!(result.task_state.status, TaskStatus::Ready);

        assert!(!driver.end("sample_task").unwrap().changed);
    }

    #[test]
    fn test_enable_and_disable() {
        let mut driver = converger();
        driver.converge(&spec()).unwrap();

        assert!(!driver.enable("sample_task").unwrap().changed);

        let result = driver.disable("sample_task").unwrap();
        assert!(result.changed);
        assert_eq!(result.task_state.status, TaskStatus::Disabled);
        assert!(!driver.disable("sample_task").unwrap().changed);

        let result = driver.enable("sample_task").unwrap();
        assert!(result.changed);
        assert_eq!(result.task_state.status, TaskStatus::Ready);
    }

    #[test]
    fn test_disable_running_task() {
        let mut driver = converger();
        driver.converge(&spec()).unwrap();
        driver.run("sample_task").unwrap();
        assert!(driver.disable("sample_task").unwrap().changed);
    }

    #[test]
    fn test_queued_task_is_not_disabled() {
        let mut driver = converger();
        driver.converge(&spec()).unwrap();
        driver
            .scheduler_mut()
            .set_status("\\sample_task", TaskStatus::Queued)
            .unwrap();
        assert!(!driver.disable("sample_task").unwrap().changed);
    }

    #[test]
    fn test_delete() {
        let mut driver = converger();
        driver.converge(&spec()).unwrap();

        let result = driver.delete("sample_task").unwrap();
        assert!(result.changed);
        assert!(!result.task_state.exists);
        assert_eq!(driver.scheduler().task_count(), 0);

        assert!(!driver.delete("sample_task").unwrap().changed);
    }

    #[test]
    fn test_actions_on_missing_task_are_no_ops() {
        let mut driver = converger();
        for result in [
            driver.run("ghost"),
            driver.end("ghost"),
            driver.enable("ghost"),
            driver.disable("ghost"),
            driver.delete("ghost"),
        ] {
            let result = result.unwrap();
            assert!(!result.changed);
            assert_eq!(result.task_state.name, "\\ghost");
        }
        assert_eq!(driver.scheduler().mutations(), 0);
    }
}
