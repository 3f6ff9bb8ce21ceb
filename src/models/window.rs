use std::collections::VecDeque;

pub const DEFAULT_WINDOW_CAPACITY: usize = 3;

/// Fixed-capacity window over the most recent output lines of a task.
///
/// Pushing into a full window evicts the oldest line and bumps the eviction
/// counter, so `evicted() > 0` always implies the window is full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputWindow {
    lines: VecDeque<String>,
    capacity: usize,
    evicted: u64,
}

impl OutputWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            self.evicted += 1;
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
            self.evicted += 1;
        }
        self.lines.push_back(line);
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

impl Default for OutputWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_most_recent_lines() {
        let mut window = OutputWindow::default();
        for i in 1..=5 {
            window.push(i.to_string());
        }
        assert_eq!(window.to_vec(), vec!["3", "4", "5"]);
        assert_eq!(window.evicted(), 2);
    }

    #[test]
    fn no_eviction_below_capacity() {
        let mut window = OutputWindow::new(3);
        window.push("a".to_string());
        window.push("b".to_string());
        assert_eq!(window.len(), 2);
        assert_eq!(window.evicted(), 0);
    }

    #[test]
    fn eviction_counts_every_line_after_fill() {
        let mut window = OutputWindow::new(3);
        for i in 0..3 {
            window.push(i.to_string());
        }
        assert_eq!(window.evicted(), 0);
        for step in 1..=10u64 {
            window.push("more".to_string());
            assert_eq!(window.evicted(), step);
            assert_eq!(window.len(), 3);
        }
    }

    #[test]
    fn zero_capacity_counts_everything() {
        let mut window = OutputWindow::new(0);
        window.push("x".to_string());
        assert!(window.is_empty());
        assert_eq!(window.evicted(), 1);
    }
}
