use std::{
    io::{self, Read},
    process::ExitStatus,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crossbeam_channel::Sender;
use log::{debug, error, info, warn};

use crate::models::{
    message::CollectorMessage,
    record::TaskRecord,
    task::{ExitReason, TaskSpec, TaskStatus},
};
use crate::worker::{lines::LineSplitter, process};

const READ_CHUNK: usize = 4096;

/// Stop requests from the coordinator to one collector.
#[derive(Debug, Default)]
pub struct TaskControl {
    cancelled: AtomicBool,
    timed_out: AtomicBool,
}

impl TaskControl {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn time_out(&self) {
        self.timed_out.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    pub fn is_stopping(&self) -> bool {
        self.is_cancelled() || self.is_timed_out()
    }
}

/// Bridges one task's output pipe into its [`TaskRecord`].
pub struct Collector {
    index: usize,
    spec: TaskSpec,
    record: Arc<TaskRecord>,
    control: Arc<TaskControl>,
    sender: Sender<CollectorMessage>,
}

impl Collector {
    pub fn new(
        index: usize,
        spec: TaskSpec,
        record: Arc<TaskRecord>,
        control: Arc<TaskControl>,
        sender: Sender<CollectorMessage>,
    ) -> Self {
        Self {
            index,
            spec,
            record,
            control,
            sender,
        }
    }

    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("collector-{}", self.index))
            .spawn(move || self.run())
    }

    /// Runs the task to completion. Finalizes the record exactly once.
    pub fn run(self) {
        if self.control.is_stopping() {
            self.finish(TaskStatus::Cancelled);
            return;
        }

        info!("Starting task '{}'.", self.record.name());
        let (mut child, reader) = match process::spawn(&self.spec) {
            Ok(spawned) => spawned,
            Err(e) => {
                warn!("Failed to spawn task '{}': {}", self.record.name(), e);
                self.finish(TaskStatus::Failed(ExitReason::SpawnError));
                return;
            }
        };

        let pid = child.id();
        if !self.record.mark_running() || self.control.is_stopping() {
            process::kill(pid);
        }
        // the coordinator may already be gone during shutdown
        let _ = self.sender.send(CollectorMessage::Started {
            index: self.index,
            pid,
        });

        let stream_failed = self.pump(reader).is_err();
        let status = match child.wait() {
            Ok(exit) => self.classify(exit, stream_failed),
            Err(e) => {
                error!("Failed to wait for task '{}': {}", self.record.name(), e);
                TaskStatus::Failed(ExitReason::StreamError)
            }
        };
        self.finish(status);
    }

    fn pump(&self, mut reader: impl Read) -> io::Result<()> {
        let mut splitter = LineSplitter::default();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let read = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    if let Some(line) = splitter.finish() {
                        self.deliver(line);
                    }
                    warn!("Output of task '{}' failed: {}", self.record.name(), e);
                    self.record.append_line(format!("error reading output: {e}"));
                    return Err(e);
                }
            };
            splitter.feed(&buf[..read], |line| self.deliver(line));
        }
        if let Some(line) = splitter.finish() {
            self.deliver(line);
        }
        Ok(())
    }

    fn deliver(&self, line: String) {
        if !self.control.is_stopping() {
            self.record.append_line(line);
        }
    }

    fn classify(&self, exit: ExitStatus, stream_failed: bool) -> TaskStatus {
        // a stop request outranks however the process chose to exit
        if self.control.is_timed_out() {
            return TaskStatus::Failed(ExitReason::Timeout);
        }
        if self.control.is_cancelled() {
            return TaskStatus::Cancelled;
        }
        match process::exit_reason(exit) {
            None if stream_failed => TaskStatus::Failed(ExitReason::StreamError),
            None => TaskStatus::Succeeded,
            Some(reason) => TaskStatus::Failed(reason),
        }
    }

    fn finish(&self, status: TaskStatus) {
        match self.record.finalize(status) {
            Ok(()) => info!("Task '{}' finished: {:?}", self.record.name(), status),
            Err(e) => debug!("{}", e),
        }
        let _ = self
            .sender
            .send(CollectorMessage::Finished { index: self.index });
    }
}
