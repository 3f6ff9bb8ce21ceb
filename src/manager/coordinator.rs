use std::{
    sync::Arc,
    thread::JoinHandle,
    time::{Duration, Instant},
};

use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender};
use log::{error, info, warn};

use crate::models::{
    message::CollectorMessage,
    record::{TaskRecord, TaskSnapshot},
    task::{ExitReason, TaskSpec, TaskStatus},
    window::DEFAULT_WINDOW_CAPACITY,
};
use crate::render::{renderer::Renderer, terminal::Terminal};
use crate::worker::{
    collector::{Collector, TaskControl},
    process,
};

/// How long to wait for collectors after SIGKILL before giving up on them.
const KILL_WAIT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    pub tick: Duration,
    pub window_capacity: usize,
    /// Time between SIGTERM and SIGKILL.
    pub grace: Duration,
    /// Redraw as soon as a task finishes instead of waiting for the next tick.
    pub eager_render: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            grace: Duration::from_secs(2),
            eager_render: false,
        }
    }
}

/// Asks a running coordinator to cancel its block. Safe to call from a signal
/// handler thread and more than once.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Sender<()>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.sender.try_send(());
    }
}

/// Final state of every task in start order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutcome {
    pub tasks: Vec<TaskSnapshot>,
    pub cancelled: bool,
    /// False when the live display had to be turned off.
    pub rendered: bool,
}

impl BlockOutcome {
    pub fn success(&self) -> bool {
        !self.cancelled
            && self
                .tasks
                .iter()
                .all(|task| task.status == TaskStatus::Succeeded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    None,
    Requested { escalate_at: Instant },
    Killed,
}

struct Slot {
    record: Arc<TaskRecord>,
    control: Arc<TaskControl>,
    timeout: Option<Duration>,
    started_at: Option<Instant>,
    pid: Option<u32>,
    termination: Termination,
    handle: Option<JoinHandle<()>>,
    finished: bool,
}

impl Slot {
    fn request_stop(&mut self, grace: Duration) {
        let Some(pid) = self.pid else {
            return;
        };
        if self.termination == Termination::None {
            process::terminate(pid);
            self.termination = Termination::Requested {
                escalate_at: Instant::now() + grace,
            };
        }
    }

    fn escalate(&mut self, now: Instant) {
        if let Termination::Requested { escalate_at } = self.termination {
            if now >= escalate_at {
                warn!("Task '{}' ignored SIGTERM, killing it.", self.record.name());
                self.force_kill();
            }
        }
    }

    fn force_kill(&mut self) {
        if let Some(pid) = self.pid {
            if self.termination != Termination::Killed {
                process::kill(pid);
                self.termination = Termination::Killed;
            }
        }
    }
}

/// Runs one block of tasks concurrently and keeps their rows up to date.
pub struct DisplayCoordinator {
    config: DisplayConfig,
    renderer: Renderer,
    cancel_tx: Sender<()>,
    cancel_rx: Receiver<()>,
}

impl DisplayCoordinator {
    pub fn new(config: DisplayConfig, terminal: Box<dyn Terminal>) -> Self {
        let (cancel_tx, cancel_rx) = bounded(1);
        DisplayCoordinator {
            config,
            renderer: Renderer::new(terminal),
            cancel_tx,
            cancel_rx,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            sender: self.cancel_tx.clone(),
        }
    }

    /// Blocks until every task is terminal, or until cancellation has stopped
    /// them. No task is left `Pending` or `Running` on return.
    pub fn run(self, specs: Vec<TaskSpec>) -> BlockOutcome {
        // cancel_tx stays alive so cancel_rx never reports a disconnect
        let DisplayCoordinator {
            config,
            mut renderer,
            cancel_tx: _cancel_tx,
            cancel_rx,
        } = self;

        let (sender, receiver) = unbounded();
        let mut slots = start_collectors(specs, &config, &sender);
        drop(sender);
        info!("Running block of {} task(s).", slots.len());

        let ticker = tick(config.tick);
        let mut cancelled = false;
        renderer.render(&snapshot_all(&slots));

        while slots.iter().any(|slot| !slot.finished) {
            select! {
                recv(receiver) -> message => match message {
                    Ok(message) => {
                        let finished = handle_message(&mut slots, message, config.grace);
                        if finished && config.eager_render {
                            renderer.render(&snapshot_all(&slots));
                        }
                    }
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    enforce_deadlines(&mut slots, config.grace);
                    renderer.render(&snapshot_all(&slots));
                }
                recv(cancel_rx) -> _ => {
                    cancelled = true;
                    shutdown(&mut slots, &receiver, config.grace);
                    break;
                }
            }
        }

        settle(&mut slots);
        let tasks = snapshot_all(&slots);
        renderer.render(&tasks);
        info!("Block finished (cancelled: {}).", cancelled);

        BlockOutcome {
            tasks,
            cancelled,
            rendered: renderer.is_enabled(),
        }
    }
}

fn start_collectors(
    specs: Vec<TaskSpec>,
    config: &DisplayConfig,
    sender: &Sender<CollectorMessage>,
) -> Vec<Slot> {
    specs
        .into_iter()
        .enumerate()
        .map(|(order, spec)| {
            let record = Arc::new(TaskRecord::new(
                spec.name.clone(),
                order,
                config.window_capacity,
            ));
            let control = Arc::new(TaskControl::default());
            let timeout = spec.timeout;
            let collector = Collector::new(
                order,
                spec,
                Arc::clone(&record),
                Arc::clone(&control),
                sender.clone(),
            );
            let handle = match collector.spawn() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    error!("Failed to start collector for '{}': {}", record.name(), e);
                    let _ = record.finalize(TaskStatus::Failed(ExitReason::SpawnError));
                    None
                }
            };
            Slot {
                record,
                control,
                timeout,
                started_at: None,
                pid: None,
                termination: Termination::None,
                finished: handle.is_none(),
                handle,
            }
        })
        .collect()
}

/// Returns true when the message marks a task as finished.
fn handle_message(slots: &mut [Slot], message: CollectorMessage, grace: Duration) -> bool {
    match message {
        CollectorMessage::Started { index, pid } => {
            if let Some(slot) = slots.get_mut(index) {
                slot.pid = Some(pid);
                slot.started_at = Some(Instant::now());
                // started after a stop was already requested
                if slot.control.is_stopping() {
                    slot.request_stop(grace);
                }
            }
            false
        }
        CollectorMessage::Finished { index } => {
            if let Some(slot) = slots.get_mut(index) {
                slot.finished = true;
            }
            true
        }
    }
}

fn enforce_deadlines(slots: &mut [Slot], grace: Duration) {
    let now = Instant::now();
    for slot in slots.iter_mut().filter(|slot| !slot.finished) {
        if let (Some(timeout), Some(started_at)) = (slot.timeout, slot.started_at) {
            if now.duration_since(started_at) >= timeout && !slot.control.is_stopping() {
                warn!(
                    "Task '{}' timed out after {:?}.",
                    slot.record.name(),
                    timeout
                );
                slot.control.time_out();
                slot.request_stop(grace);
            }
        }
        slot.escalate(now);
    }
}

fn shutdown(slots: &mut [Slot], receiver: &Receiver<CollectorMessage>, grace: Duration) {
    let running = slots.iter().filter(|slot| !slot.finished).count();
    warn!("Cancellation requested, stopping {} task(s).", running);
    for slot in slots.iter_mut().filter(|slot| !slot.finished) {
        slot.control.cancel();
        slot.request_stop(grace);
    }
    drain_until(slots, receiver, Instant::now() + grace, grace);

    for slot in slots.iter_mut().filter(|slot| !slot.finished) {
        warn!("Task '{}' still running, killing it.", slot.record.name());
        slot.force_kill();
    }
    drain_until(slots, receiver, Instant::now() + KILL_WAIT, grace);
}

fn drain_until(
    slots: &mut [Slot],
    receiver: &Receiver<CollectorMessage>,
    deadline: Instant,
    grace: Duration,
) {
    while slots.iter().any(|slot| !slot.finished) {
        match receiver.recv_deadline(deadline) {
            Ok(message) => {
                handle_message(slots, message, grace);
            }
            Err(_) => break,
        }
    }
}

/// Joins finished collectors and cancels any record a collector never
/// finalized.
fn settle(slots: &mut [Slot]) {
    for slot in slots.iter_mut() {
        if !slot.record.status().is_terminal() {
            warn!(
                "Task '{}' did not report back, marking it cancelled.",
                slot.record.name()
            );
            let _ = slot.record.finalize(TaskStatus::Cancelled);
        }
        if !slot.finished {
            // detached: the thread may still be blocked on an orphaned pipe
            continue;
        }
        if let Some(handle) = slot.handle.take() {
            if handle.join().is_err() {
                error!("Collector for task '{}' panicked.", slot.record.name());
            }
        }
    }
}

fn snapshot_all(slots: &[Slot]) -> Vec<TaskSnapshot> {
    slots.iter().map(|slot| slot.record.snapshot()).collect()
}
