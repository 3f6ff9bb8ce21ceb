use log::{debug, error};

use crate::error::RenderError;
use crate::models::record::TaskSnapshot;
use crate::render::{diff::FrameState, frame::build_frame, terminal::Terminal};

/// Draws snapshots onto a terminal, one batched write per call.
///
/// The first terminal failure is logged and turns rendering off for good;
/// the tasks keep running regardless.
pub struct Renderer {
    terminal: Box<dyn Terminal>,
    state: FrameState,
    enabled: bool,
    checked: bool,
}

impl Renderer {
    pub fn new(terminal: Box<dyn Terminal>) -> Self {
        Self {
            terminal,
            state: FrameState::new(),
            enabled: true,
            checked: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the number of rows changed on screen.
    pub fn render(&mut self, snapshots: &[TaskSnapshot]) -> usize {
        if !self.enabled {
            return 0;
        }
        if !self.checked {
            self.checked = true;
            if !self.terminal.is_terminal() {
                self.disable(RenderError::NotATerminal);
                return 0;
            }
        }

        let frame = build_frame(snapshots, self.terminal.width());
        let mut batch = Vec::new();
        let changes = match self.state.apply(frame, &mut batch) {
            Ok(changes) => changes,
            Err(e) => {
                self.disable(e.into());
                return 0;
            }
        };
        if changes == 0 {
            return 0;
        }
        if let Err(e) = self.terminal.write_batch(&batch) {
            self.disable(e.into());
            return 0;
        }
        debug!("Rendered {} changed row(s)", changes);
        changes
    }

    fn disable(&mut self, err: RenderError) {
        error!("Live display disabled: {}", err);
        self.enabled = false;
    }
}
