//! Bounded buffer of captured output lines.

use std::collections::VecDeque;

use super::LogLine;

/// Keeps the most recent `max_size` lines; older lines are evicted first.
#[derive(Debug)]
pub struct LogRingBuffer {
    buffer: VecDeque<LogLine>,
    max_size: usize,
}

impl LogRingBuffer {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            buffer: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
        }
    }

    pub fn push(&mut self, line: LogLine) {
        if self.buffer.len() >= self.max_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(line);
    }

    /// Up to `count` most recent lines, oldest first.
    pub fn recent(&self, count: usize) -> Vec<LogLine> {
        let start = self.buffer.len().saturating_sub(count);
        self.buffer.iter().skip(start).cloned().collect()
    }

    pub fn all(&self) -> Vec<LogLine> {
        self.buffer.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for LogRingBuffer {
    fn default() -> Self {
        Self::new(super::DEFAULT_MAX_LINES_PER_SLOT)
    }
}
