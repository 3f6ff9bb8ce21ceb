use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveDown, MoveToColumn, MoveUp, Show},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

/// One row mutation, indexed from the top of the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineChange {
    Write { row: usize, text: String },
    Clear { row: usize },
}

impl LineChange {
    pub fn row(&self) -> usize {
        match self {
            LineChange::Write { row, .. } | LineChange::Clear { row } => *row,
        }
    }
}

/// Rows whose text differs, then clears for rows the new frame no longer has.
pub fn diff_frames(previous: &[String], next: &[String]) -> Vec<LineChange> {
    let mut changes: Vec<LineChange> = next
        .iter()
        .enumerate()
        .filter(|(row, text)| previous.get(*row) != Some(*text))
        .map(|(row, text)| LineChange::Write {
            row,
            text: text.clone(),
        })
        .collect();
    changes.extend((next.len()..previous.len()).map(|row| LineChange::Clear { row }));
    changes
}

/// What is on screen from the last render.
///
/// Between renders the cursor rests at column 0 of the line just below the
/// block. `height` is the tallest the block has ever been: rows above it exist
/// on screen even after the frame shrinks, so growing back reuses them.
#[derive(Debug, Default)]
pub struct FrameState {
    previous: Vec<String>,
    height: usize,
}

impl FrameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Encodes the changes from the stored frame to `next` into `out` and
    /// stores `next`. Returns the number of row mutations; zero means nothing
    /// was written.
    pub fn apply(&mut self, next: Vec<String>, out: &mut impl Write) -> io::Result<usize> {
        let changes = diff_frames(&self.previous, &next);
        if changes.is_empty() {
            self.previous = next;
            return Ok(0);
        }

        queue!(out, Hide)?;
        let mut cursor = self.height;
        for change in &changes {
            let row = change.row();
            if row < self.height {
                move_rows(out, cursor, row)?;
                cursor = row;
                queue!(out, MoveToColumn(0), Clear(ClearType::UntilNewLine))?;
                if let LineChange::Write { text, .. } = change {
                    queue!(out, Print(text))?;
                }
            } else if let LineChange::Write { text, .. } = change {
                // new rows arrive in ascending order right below the block
                move_rows(out, cursor, self.height)?;
                queue!(
                    out,
                    MoveToColumn(0),
                    Clear(ClearType::UntilNewLine),
                    Print(text),
                    Print("\r\n")
                )?;
                self.height += 1;
                cursor = self.height;
            }
        }
        move_rows(out, cursor, self.height)?;
        queue!(out, MoveToColumn(0), Show)?;

        self.previous = next;
        Ok(changes.len())
    }
}

fn move_rows(out: &mut impl Write, from: usize, to: usize) -> io::Result<()> {
    if to < from {
        queue!(out, MoveUp(rows(from - to)))?;
    } else if to > from {
        queue!(out, MoveDown(rows(to - from)))?;
    }
    Ok(())
}

fn rows(count: usize) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX)
}
