//! Cursors and the ordered cursor collection.
//!
//! A [`Cursor`] owns its primary selection in buffer coordinates, a parallel selection
//! in view coordinates (kept in sync against the wrap layout), and the last-used
//! horizontal intent for vertical movement. Cursors live in a [`CursorCollection`]:
//! index 0 is the primary cursor, everything else is secondary.

use crate::buffer::TextBuffer;
use crate::layout::{ViewLayout, ViewPosition};
use crate::selection::{Position, Selection, normalize_selections};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A selection expressed in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSelection {
    /// The anchor in view coordinates.
    pub selection_start: ViewPosition,
    /// The caret in view coordinates.
    pub position: ViewPosition,
}

/// One caret plus its selection, tracked in buffer and view coordinate spaces.
#[derive(Debug, Clone)]
pub struct Cursor {
    selection: Selection,
    view_selection: ViewSelection,
    in_selection_mode: bool,
    desired_x: Option<usize>,
}

impl Cursor {
    /// Create a collapsed cursor at `position`.
    pub fn at(position: Position) -> Self {
        Self {
            selection: Selection::cursor(position),
            view_selection: ViewSelection {
                selection_start: ViewPosition::new(0, 0),
                position: ViewPosition::new(0, 0),
            },
            in_selection_mode: false,
            desired_x: None,
        }
    }

    /// Create a cursor from an existing selection.
    pub fn from_selection(selection: Selection) -> Self {
        let mut cursor = Self::at(selection.position);
        cursor.selection = selection;
        cursor.in_selection_mode = !selection.is_empty();
        cursor
    }

    /// The selection in buffer coordinates.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The caret position in buffer coordinates.
    pub fn position(&self) -> Position {
        self.selection.position
    }

    /// The selection in view coordinates (valid after the last `sync_view`).
    pub fn view_selection(&self) -> ViewSelection {
        self.view_selection
    }

    /// Whether the cursor is extending a selection.
    pub fn in_selection_mode(&self) -> bool {
        self.in_selection_mode
    }

    /// The remembered horizontal intent for vertical movement, in cells.
    pub fn desired_x(&self) -> Option<usize> {
        self.desired_x
    }

    /// Remember a horizontal intent.
    pub fn set_desired_x(&mut self, x: usize) {
        self.desired_x = Some(x);
    }

    /// Forget the horizontal intent (any horizontal movement does this).
    pub fn clear_desired_x(&mut self) {
        self.desired_x = None;
    }

    /// Move the caret. With `extend` the anchor stays where the selection started;
    /// without it the selection collapses onto the new position.
    pub fn move_to(&mut self, position: Position, extend: bool) {
        if extend {
            if !self.in_selection_mode {
                self.in_selection_mode = true;
                self.selection = Selection::new(self.selection.position, position);
            } else {
                self.selection = Selection::new(self.selection.selection_start, position);
            }
        } else {
            self.in_selection_mode = false;
            self.selection = Selection::cursor(position);
        }
    }

    /// Replace the selection outright.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.in_selection_mode = !selection.is_empty();
    }

    /// Recompute the view-coordinate selection from the buffer selection.
    pub fn sync_view(&mut self, buffer: &TextBuffer, layout: &ViewLayout) {
        self.view_selection = ViewSelection {
            selection_start: layout.buffer_to_view(buffer, self.selection.selection_start),
            position: layout.buffer_to_view(buffer, self.selection.position),
        };
    }
}

/// Serialized cursor state: exactly what session restore needs, nothing more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    /// Whether the cursor was extending a selection.
    pub in_selection_mode: bool,
    /// The selection anchor.
    pub selection_start: Position,
    /// The caret.
    pub position: Position,
}

/// The ordered cursor collection. Index 0 is the primary cursor.
#[derive(Debug)]
pub struct CursorCollection {
    cursors: Vec<Cursor>,
}

impl CursorCollection {
    /// Create a collection holding one default cursor at the buffer start.
    pub fn new() -> Self {
        Self {
            cursors: vec![Cursor::at(Position::new(0, 0))],
        }
    }

    /// Rebuild from scratch (used when the buffer is flushed).
    pub fn reset(&mut self) {
        self.cursors = vec![Cursor::at(Position::new(0, 0))];
    }

    /// Number of cursors (always at least 1).
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Returns `true` if only the primary cursor exists.
    pub fn is_single(&self) -> bool {
        self.cursors.len() == 1
    }

    /// The primary cursor.
    pub fn primary(&self) -> &Cursor {
        &self.cursors[0]
    }

    /// All cursors, primary first.
    pub fn iter(&self) -> impl Iterator<Item = &Cursor> {
        self.cursors.iter()
    }

    /// Mutable access to all cursors, primary first.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cursor> {
        self.cursors.iter_mut()
    }

    /// Cursor at `index`.
    pub fn get(&self, index: usize) -> Option<&Cursor> {
        self.cursors.get(index)
    }

    /// Mutable cursor at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Cursor> {
        self.cursors.get_mut(index)
    }

    /// All selections, primary first.
    pub fn selections(&self) -> Vec<Selection> {
        self.cursors.iter().map(|c| c.selection()).collect()
    }

    /// All caret positions, primary first.
    pub fn carets(&self) -> Vec<Position> {
        self.cursors.iter().map(|c| c.position()).collect()
    }

    /// Replace all selections. Cursor objects are reused where they exist; extra
    /// cursors are created or dropped as needed.
    pub fn set_selections(&mut self, selections: &[Selection]) {
        if selections.is_empty() {
            return;
        }
        self.cursors.truncate(selections.len());
        for (i, selection) in selections.iter().enumerate() {
            match self.cursors.get_mut(i) {
                Some(cursor) => cursor.set_selection(*selection),
                None => self.cursors.push(Cursor::from_selection(*selection)),
            }
        }
    }

    /// Add a secondary cursor; returns its index.
    pub fn add_cursor(&mut self, selection: Selection) -> usize {
        self.cursors.push(Cursor::from_selection(selection));
        self.cursors.len() - 1
    }

    /// Drop every secondary cursor.
    pub fn kill_secondary_cursors(&mut self) {
        self.cursors.truncate(1);
    }

    /// Remove the cursors at `indices` (never the primary).
    pub fn remove_indices(&mut self, indices: &BTreeSet<usize>) {
        if indices.is_empty() {
            return;
        }
        let mut i = 0usize;
        self.cursors.retain(|_| {
            let keep = i == 0 || !indices.contains(&i);
            i += 1;
            keep
        });
    }

    /// Merge overlapping/duplicate cursors. The primary survives at index 0.
    pub fn normalize(&mut self) {
        if self.cursors.len() == 1 {
            return;
        }
        let merged = normalize_selections(&self.selections(), 0);
        if merged.len() != self.cursors.len() {
            let primary_desired = self.cursors[0].desired_x;
            self.set_selections(&merged);
            self.cursors[0].desired_x = primary_desired;
        } else {
            self.set_selections(&merged);
        }
    }

    /// Recompute all view-coordinate selections.
    pub fn sync_view(&mut self, buffer: &TextBuffer, layout: &ViewLayout) {
        for cursor in &mut self.cursors {
            cursor.sync_view(buffer, layout);
        }
    }

    /// Serialize session-restorable state: one record per cursor, primary first.
    pub fn save_state(&self) -> Vec<CursorState> {
        self.cursors
            .iter()
            .map(|c| CursorState {
                in_selection_mode: c.in_selection_mode,
                selection_start: c.selection.selection_start,
                position: c.selection.position,
            })
            .collect()
    }

    /// Restore a previously saved state, clamping positions into the buffer.
    pub fn restore_state(&mut self, states: &[CursorState], buffer: &TextBuffer) {
        if states.is_empty() {
            self.reset();
            return;
        }
        let selections: Vec<Selection> = states
            .iter()
            .map(|s| {
                if s.in_selection_mode {
                    Selection::new(
                        buffer.clamp_position(s.selection_start),
                        buffer.clamp_position(s.position),
                    )
                } else {
                    Selection::cursor(buffer.clamp_position(s.position))
                }
            })
            .collect();
        self.set_selections(&selections);
        for (cursor, state) in self.cursors.iter_mut().zip(states) {
            cursor.in_selection_mode = state.in_selection_mode;
        }
    }
}

impl Default for CursorCollection {
    fn default() -> Self {
        Self::new()
    }
}
