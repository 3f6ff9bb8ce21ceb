use std::{
    io::{self, IsTerminal, Write},
    sync::{Arc, Mutex, PoisonError},
};

/// Where rendered frames go.
pub trait Terminal: Send {
    fn is_terminal(&self) -> bool;
    /// Sampled on every tick; `None` disables truncation.
    fn width(&self) -> Option<u16>;
    /// Writes one batch and flushes it.
    fn write_batch(&mut self, batch: &[u8]) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutTerminal;

impl Terminal for StdoutTerminal {
    fn is_terminal(&self) -> bool {
        io::stdout().is_terminal()
    }

    fn width(&self) -> Option<u16> {
        crossterm::terminal::size().ok().map(|(columns, _)| columns)
    }

    fn write_batch(&mut self, batch: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(batch)?;
        out.flush()
    }
}

/// In-memory terminal for headless runs and tests. Clones share the recorded
/// batches.
#[derive(Debug, Clone)]
pub struct MemoryTerminal {
    width: Option<u16>,
    fail_after: Option<usize>,
    batches: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemoryTerminal {
    pub fn new(width: Option<u16>) -> Self {
        Self {
            width,
            fail_after: None,
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Accepts `count` batches, then fails every write.
    pub fn failing_after(count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Self::new(None)
        }
    }

    pub fn batches(&self) -> Vec<Vec<u8>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Everything written so far, lossily decoded.
    pub fn output(&self) -> String {
        self.batches()
            .iter()
            .map(|batch| String::from_utf8_lossy(batch).into_owned())
            .collect()
    }
}

impl Default for MemoryTerminal {
    fn default() -> Self {
        Self::new(Some(80))
    }
}

impl Terminal for MemoryTerminal {
    fn is_terminal(&self) -> bool {
        true
    }

    fn width(&self) -> Option<u16> {
        self.width
    }

    fn write_batch(&mut self, batch: &[u8]) -> io::Result<()> {
        let mut batches = self.batches.lock().unwrap_or_else(PoisonError::into_inner);
        if self.fail_after.is_some_and(|limit| batches.len() >= limit) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal went away"));
        }
        batches.push(batch.to_vec());
        Ok(())
    }
}
