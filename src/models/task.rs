use std::{fmt, path::PathBuf, time::Duration};

/// Why a task ended up `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Code(i32),
    Signal(i32),
    SpawnError,
    StreamError,
    Timeout,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Code(code) => write!(f, "{code}"),
            ExitReason::Signal(signal) => write!(f, "signal {signal}"),
            ExitReason::SpawnError => f.write_str("spawn-error"),
            ExitReason::StreamError => f.write_str("stream-error"),
            ExitReason::Timeout => f.write_str("timeout"),
        }
    }
}

/// Lifecycle of a task: `Pending -> Running -> {Succeeded, Failed, Cancelled}`.
///
/// A task that never starts may go straight from `Pending` to a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed(ExitReason),
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed(_) | TaskStatus::Cancelled
        )
    }

    pub fn exit_reason(self) -> Option<ExitReason> {
        match self {
            TaskStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Running => "Processing...",
            TaskStatus::Succeeded => "Finished ✓",
            TaskStatus::Failed(_) => "Failed ✗",
            TaskStatus::Cancelled => "Cancelled",
        }
    }
}

/// What to run for one row of the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl TaskSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let program = program.into();
        Self {
            name: program.clone(),
            program,
            args,
            cwd: None,
            timeout: None,
        }
    }

    /// Runs `command` through `sh -c`, named after the command text.
    pub fn shell(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            name: command.clone(),
            program: "sh".to_string(),
            args: vec!["-c".to_string(), command],
            cwd: None,
            timeout: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
