//! Change notifications returned from command execution.
//!
//! Instead of a listener side channel, every command pass returns a [`CommandOutcome`]
//! describing exactly what changed. Events are only populated when true state changes
//! occurred: a command that moves nothing produces an outcome with no events.

use crate::selection::{Position, Range, Selection};

/// Why a cursor state change happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeReason {
    /// No particular reason recorded.
    #[default]
    NotSet,
    /// An explicit command moved the cursors.
    Explicit,
    /// A cursor-undo restored a previous selection set.
    Undo,
    /// A redo restored a later selection set.
    Redo,
    /// The buffer contents were replaced wholesale.
    ContentFlush,
}

/// Fired when any caret position changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionChangedEvent {
    /// The primary cursor's caret.
    pub primary: Position,
    /// Secondary carets, in cursor order.
    pub secondary: Vec<Position>,
    /// Why the change happened.
    pub reason: ChangeReason,
}

/// Fired when the selection set changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChangedEvent {
    /// The primary cursor's selection.
    pub primary: Selection,
    /// Secondary selections, in cursor order.
    pub secondary: Vec<Selection>,
    /// Why the change happened.
    pub reason: ChangeReason,
}

/// A request to bring a range into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealRange {
    /// The range to reveal (usually collapsed at the primary caret).
    pub range: Range,
    /// Whether horizontal scrolling should also be adjusted.
    pub reveal_horizontal: bool,
}

/// A request to scroll the view by a number of view lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    /// Positive scrolls down, negative scrolls up.
    pub view_lines: isize,
}

/// A buffer mutation performed during a command pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    /// The buffer version after this mutation.
    pub version: u64,
    /// Ranges of the inserted text, in post-edit coordinates.
    pub ranges: Vec<Range>,
}

/// Everything a single command execution changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Present when any caret moved.
    pub position_changed: Option<PositionChangedEvent>,
    /// Present when the selection set changed.
    pub selection_changed: Option<SelectionChangedEvent>,
    /// Present when the command wants a range revealed.
    pub reveal: Option<RevealRange>,
    /// Present when the command requests a scroll.
    pub scroll: Option<ScrollRequest>,
    /// One entry per buffer mutation (per-character typing yields one per keystroke).
    pub content_changes: Vec<ContentChange>,
}

impl CommandOutcome {
    /// Returns `true` if the command changed nothing observable.
    pub fn is_empty(&self) -> bool {
        self.position_changed.is_none()
            && self.selection_changed.is_none()
            && self.reveal.is_none()
            && self.scroll.is_none()
            && self.content_changes.is_empty()
    }
}
