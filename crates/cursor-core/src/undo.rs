//! Selection-only undo.
//!
//! A secondary undo history recording full multi-cursor selection snapshots,
//! independent of text-content undo. Snapshots are pushed when a command changed
//! selections without editing text; the stack is cleared as soon as a real text edit
//! happens, since the text-level undo stack supersedes it from that point on.

use crate::selection::Selection;

/// Maximum number of snapshots kept; the oldest is discarded beyond this.
pub const CURSOR_UNDO_LIMIT: usize = 50;

/// Immutable copy of all cursors' selections at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorSnapshot {
    selections: Vec<Selection>,
}

impl CursorSnapshot {
    /// Capture a snapshot from a selection list (primary first).
    pub fn new(selections: Vec<Selection>) -> Self {
        Self { selections }
    }

    /// The recorded selections, primary first.
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }
}

/// Bounded stack of cursor snapshots.
#[derive(Debug, Default)]
pub struct CursorUndoStack {
    stack: Vec<CursorSnapshot>,
}

impl CursorUndoStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` if there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Push a snapshot, discarding the oldest one beyond [`CURSOR_UNDO_LIMIT`].
    pub fn push(&mut self, snapshot: CursorSnapshot) {
        if self.stack.len() >= CURSOR_UNDO_LIMIT {
            self.stack.remove(0);
        }
        self.stack.push(snapshot);
    }

    /// Pop the most recent snapshot.
    pub fn pop(&mut self) -> Option<CursorSnapshot> {
        self.stack.pop()
    }

    /// Drop all snapshots (a text edit supersedes selection-only history).
    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Position, Selection};

    fn snapshot_at(column: usize) -> CursorSnapshot {
        CursorSnapshot::new(vec![Selection::cursor(Position::new(0, column))])
    }

    #[test]
    fn cap_discards_oldest_first() {
        let mut stack = CursorUndoStack::new();
        for i in 0..60 {
            stack.push(snapshot_at(i));
        }
        assert_eq!(stack.len(), CURSOR_UNDO_LIMIT);
        // The ten oldest snapshots (columns 0..10) were discarded.
        let first = stack.pop();
        assert_eq!(first, Some(snapshot_at(59)));
        let mut last = None;
        while let Some(s) = stack.pop() {
            last = Some(s);
        }
        assert_eq!(last, Some(snapshot_at(10)));
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let mut stack = CursorUndoStack::new();
        assert!(stack.pop().is_none());
    }
}
