use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use log::warn;

use orca_display::{
    render::frame::status_line, BlockOutcome, DisplayConfig, DisplayCoordinator, StdoutTerminal,
    TaskSpec,
};

/// Run commands concurrently and show their latest output in place.
#[derive(Debug, Parser)]
#[command(name = "orca-display", version)]
pub struct Cli {
    /// Commands to run, each through `sh -c`
    #[arg(required = true)]
    pub commands: Vec<String>,

    /// Redraw interval in milliseconds
    #[arg(long, default_value_t = 200, value_parser = clap::value_parser!(u64).range(10..=5000))]
    pub tick_ms: u64,

    /// Output lines kept on screen per task
    #[arg(long, default_value_t = 3)]
    pub lines: usize,

    /// Per-task timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seconds between SIGTERM and SIGKILL when stopping tasks
    #[arg(long, default_value_t = 2)]
    pub grace: u64,

    /// Working directory for every task
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Redraw as soon as a task finishes
    #[arg(long)]
    pub eager: bool,

    /// Log filter, e.g. `info` or `orca_display=debug`
    #[arg(long, default_value = "error")]
    pub log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn display_config(&self) -> DisplayConfig {
        DisplayConfig {
            tick: Duration::from_millis(self.tick_ms),
            window_capacity: self.lines,
            grace: Duration::from_secs(self.grace),
            eager_render: self.eager,
        }
    }

    pub fn task_specs(&self) -> Vec<TaskSpec> {
        self.commands
            .iter()
            .map(|command| {
                let mut spec = TaskSpec::shell(command.as_str());
                if let Some(dir) = &self.cwd {
                    spec = spec.with_cwd(dir);
                }
                if let Some(secs) = self.timeout {
                    spec = spec.with_timeout(Duration::from_secs(secs));
                }
                spec
            })
            .collect()
    }
}

pub fn run_cli(cli: Cli) -> ExitCode {
    let coordinator = DisplayCoordinator::new(cli.display_config(), Box::new(StdoutTerminal));
    let cancel = coordinator.cancel_handle();
    if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let outcome = coordinator.run(cli.task_specs());
    report(&outcome);

    if outcome.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report(outcome: &BlockOutcome) {
    for line in summary(outcome) {
        println!("{}", line);
    }
}

/// Lines printed after the block. Failure reasons live in the status lines,
/// so without a live frame they are repeated here.
fn summary(outcome: &BlockOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    if !outcome.rendered {
        lines.extend(outcome.tasks.iter().map(status_line));
    }
    lines.push(if outcome.cancelled {
        "Cancelled.".to_string()
    } else {
        "All tasks finished.".to_string()
    });
    lines
}
