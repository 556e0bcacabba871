// SPDX-License-Identifier: MIT
//
// On-screen debug log: the last few notable events, drawn under the
// status line. Independent of tracing, which may not be writing anywhere.

use std::collections::VecDeque;

/// Bounded list of recent lines; the oldest falls off first.
#[derive(Debug, Clone)]
pub struct DebugLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl DebugLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// All lines joined with `\n`, oldest first.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }
}
