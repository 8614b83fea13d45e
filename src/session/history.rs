//! Bounded undo/redo history

/// Default number of snapshots kept per image
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Linear snapshot history with a cursor.
///
/// Pushing after an undo discards the redo tail. When the limit is reached the
/// oldest snapshot is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    entries: Vec<T>,
    index: usize,
    limit: usize,
}

impl<T: Clone> History<T> {
    pub fn new(initial: T, limit: usize) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            limit: limit.max(1),
        }
    }

    pub fn current(&self) -> &T {
        &self.entries[self.index]
    }

    /// Record a new snapshot and make it current
    pub fn push(&mut self, state: T) {
        self.entries.truncate(self.index + 1);
        self.entries.push(state);
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.index = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self) -> usize {
        self.index
    }
}
