use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::task::TaskStatus;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task '{name}' was already finalized as {current:?}")]
    AlreadyFinalized { name: String, current: TaskStatus },
    #[error("task '{name}' cannot be finalized with non-terminal status {status:?}")]
    NotTerminal { name: String, status: TaskStatus },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("stdout is not a terminal")]
    NotATerminal,
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid log filter: {0}")]
    LogFilter(String),
    #[error("failed to open log file {path}: {source}")]
    LogFile { path: PathBuf, source: io::Error },
    #[error("failed to install logger: {0}")]
    Logger(String),
}
