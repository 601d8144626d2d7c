//! Cadence: declarative scheduled tasks
//!
//! Main binary with subcommands:
//! - `validate`: Check a task resource without touching the scheduler
//! - `compile`: Print the trigger a resource compiles to
//! - `converge`: Create or update a task to match its resource
//! - `run`, `end`, `enable`, `disable`, `delete`: Direct task actions
//! - `show`: Print the installed state of a task

use std::path::{Path, PathBuf};

use cadence_core::{validate, Clock, ScheduleSpec, SystemClock, TriggerCompiler};
use cadence_scheduler::{
    Converger, ConvergenceResult, FileScheduler, SchedulerError, TaskScheduler,
};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use miette::Result;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Format accepted by `--now`.
const NOW_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parse a `--now` override such as `2017-09-20T17:00`.
fn parse_now(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, NOW_FORMAT)
        .map_err(|e| format!("invalid instant '{}', expected YYYY-MM-DDTHH:MM: {}", s, e))
}

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Declarative scheduled-task convergence", long_about = None)]
struct Cli {
    /// JSON file holding installed tasks
    #[arg(
        long,
        global = true,
        env = "CADENCE_STATE_FILE",
        default_value = "cadence-tasks.json"
    )]
    state_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a task resource
    Validate {
        /// Task resource (JSON)
        #[arg(value_name = "RESOURCE")]
        resource: PathBuf,
    },

    /// Print the trigger a task resource compiles to
    Compile {
        /// Task resource (JSON)
        #[arg(value_name = "RESOURCE")]
        resource: PathBuf,

        /// Instant used for absent start fields (defaults to the local clock)
        #[arg(long, value_parser = parse_now)]
        now: Option<NaiveDateTime>,
    },

    /// Create or update a task so it matches its resource
    Converge {
        /// Task resource (JSON)
        #[arg(value_name = "RESOURCE")]
        resource: PathBuf,

        /// Update even when nothing drifted
        #[arg(long)]
        force: bool,
    },

    /// Start a task unless it is already running
    Run {
        #[arg(value_name = "TASK")]
        task: String,
    },

    /// Stop a running task
    End {
        #[arg(value_name = "TASK")]
        task: String,
    },

    /// Enable a disabled task
    Enable {
        #[arg(value_name = "TASK")]
        task: String,
    },

    /// Disable a ready or running task
    Disable {
        #[arg(value_name = "TASK")]
        task: String,
    },

    /// Delete a task
    Delete {
        #[arg(value_name = "TASK")]
        task: String,
    },

    /// Print the installed state of a task
    Show {
        #[arg(value_name = "TASK")]
        task: String,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "cadence=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let scheduler = FileScheduler::new(&cli.state_file);

    match cli.command {
        Commands::Validate { resource } => {
            let spec = load_resource(&resource)?;
            validate(&spec).map_err(|e| miette::miette!("{}", e))?;
            println!("{} is valid", spec.task_path());
            Ok(())
        }

        Commands::Compile { resource, now } => {
            let spec = load_resource(&resource)?;
            let now = now.unwrap_or_else(|| SystemClock.now());
            let trigger = TriggerCompiler::compile(&spec, now)
                .map_err(|e| miette::miette!("{}", e))?;
            print_json(&trigger)
        }

        Commands::Converge { resource, force } => {
            let mut spec = load_resource(&resource)?;
            spec.force |= force;
            let mut driver = Converger::new(scheduler);
            let result = driver
                .converge(&spec)
                .map_err(|e| miette::miette!("{}", e))?;
            report(&result)
        }

        Commands::Run { task } => action(scheduler, |driver| driver.run(&task)),
        Commands::End { task } => action(scheduler, |driver| driver.end(&task)),
        Commands::Enable { task } => action(scheduler, |driver| driver.enable(&task)),
        Commands::Disable { task } => action(scheduler, |driver| driver.disable(&task)),
        Commands::Delete { task } => action(scheduler, |driver| driver.delete(&task)),

        Commands::Show { task } => {
            let state = scheduler
                .load(&cadence_core::task_path(&task))
                .map_err(|e| miette::miette!("{}", e))?;
            print_json(&state)
        }
    }
}

/// Read a task resource from a JSON file.
fn load_resource(path: &Path) -> Result<ScheduleSpec> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw)
        .map_err(|e| miette::miette!("failed to parse {}: {}", path.display(), e))
}

fn action(
    scheduler: FileScheduler,
    apply: impl FnOnce(&mut Converger<FileScheduler>) -> Result<ConvergenceResult, SchedulerError>,
) -> Result<()> {
    let mut driver = Converger::new(scheduler);
    let result = apply(&mut driver).map_err(|e| miette::miette!("{}", e))?;
    report(&result)
}

fn report(result: &ConvergenceResult) -> Result<()> {
    info!(
        task = %result.task_state.name,
        changed = result.changed,
        "pass complete"
    );
    print_json(result)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| miette::miette!("failed to serialize output: {}", e))?;
    println!("{}", json);
    Ok(())
}
