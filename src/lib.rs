//! Live, in-place terminal status for a block of concurrently running tasks.
//!
//! A [`DisplayCoordinator`] starts one output collector thread per task, keeps a
//! bounded window of each task's latest output lines and redraws only the rows
//! that changed on every tick.

pub mod error;
pub mod manager;
pub mod models;
pub mod render;
pub mod worker;

pub use manager::coordinator::{BlockOutcome, CancelHandle, DisplayConfig, DisplayCoordinator};
pub use models::record::{TaskRecord, TaskSnapshot};
pub use models::task::{ExitReason, TaskSpec, TaskStatus};
pub use render::terminal::{MemoryTerminal, StdoutTerminal, Terminal};
