use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::TaskError;
use crate::models::task::{ExitReason, TaskStatus};
use crate::models::window::OutputWindow;

/// Shared state of one task.
///
/// Written only by the task's own collector; the renderer reads it through
/// [`TaskRecord::snapshot`], which copies everything out under a short lock.
#[derive(Debug)]
pub struct TaskRecord {
    name: String,
    start_order: usize,
    state: Mutex<RecordState>,
}

#[derive(Debug)]
struct RecordState {
    status: TaskStatus,
    window: OutputWindow,
}

/// Immutable copy of a [`TaskRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub name: String,
    pub start_order: usize,
    pub status: TaskStatus,
    pub lines: Vec<String>,
    pub overflow: u64,
}

impl TaskSnapshot {
    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.status.exit_reason()
    }
}

impl TaskRecord {
    pub fn new(name: impl Into<String>, start_order: usize, window_capacity: usize) -> Self {
        Self {
            name: name.into(),
            start_order,
            state: Mutex::new(RecordState {
                status: TaskStatus::Pending,
                window: OutputWindow::new(window_capacity),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TaskStatus {
        self.lock().status
    }

    /// `Pending -> Running`. Returns false if the task already left `Pending`.
    pub fn mark_running(&self) -> bool {
        let mut state = self.lock();
        if state.status != TaskStatus::Pending {
            return false;
        }
        state.status = TaskStatus::Running;
        true
    }

    /// Appends a line to the output window. Ignored once the task is terminal.
    pub fn append_line(&self, text: impl Into<String>) -> bool {
        let mut state = self.lock();
        if state.status.is_terminal() {
            return false;
        }
        state.window.push(text.into());
        true
    }

    /// Moves the task to its terminal status. Only the first call wins.
    pub fn finalize(&self, status: TaskStatus) -> Result<(), TaskError> {
        if !status.is_terminal() {
            return Err(TaskError::NotTerminal {
                name: self.name.clone(),
                status,
            });
        }
        let mut state = self.lock();
        if state.status.is_terminal() {
            return Err(TaskError::AlreadyFinalized {
                name: self.name.clone(),
                current: state.status,
            });
        }
        state.status = status;
        Ok(())
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        let state = self.lock();
        TaskSnapshot {
            name: self.name.clone(),
            start_order: self.start_order,
            status: state.status,
            lines: state.window.to_vec(),
            overflow: state.window.evicted(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
