/// Sent by output collectors to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorMessage {
    Started { index: usize, pid: u32 },
    Finished { index: usize },
}
