//! Line-oriented text buffer with marker tracking.
//!
//! The buffer owns its logical lines directly so that every line can carry its own
//! ordered [`MarkerList`]. All mutation goes through three line primitives - replace,
//! split, and append - and each primitive adjusts the affected line's markers before
//! new contents become observable. An optional editable range restricts where edits
//! are permitted (read-only regions).
//!
//! # Example
//!
//! ```rust
//! use cursor_core::{Position, TextBuffer};
//!
//! let mut buffer = TextBuffer::from_text("abc");
//! let anchor = buffer.add_marker(Position::new(0, 1), false).unwrap();
//! buffer.apply_one(cursor_core::Range::collapsed(Position::new(0, 1)), "xyz", false);
//! assert_eq!(buffer.marker_position(anchor), Some(Position::new(0, 4)));
//! ```

use crate::markers::{LineMarker, MarkerId, MarkerList};
use crate::selection::{Position, Range};
use std::collections::HashMap;
use thiserror::Error;

/// Errors produced when validating or applying buffer edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// A position does not exist in the buffer.
    #[error("invalid position {position}")]
    InvalidPosition {
        /// The offending position.
        position: Position,
    },
    /// A range does not lie within the buffer.
    #[error("invalid range {range}")]
    InvalidRange {
        /// The offending range.
        range: Range,
    },
    /// An operation falls outside the buffer's editable range.
    #[error("edit {range} falls outside the editable range {editable}")]
    OutsideEditableRange {
        /// The offending range.
        range: Range,
        /// The editable range in effect.
        editable: Range,
    },
    /// Two operations in one batch overlap.
    #[error("overlapping edits {a} and {b}")]
    OverlappingEdits {
        /// First range.
        a: Range,
        /// Second range.
        b: Range,
    },
}

/// One logical line: its text plus the markers anchored to it.
#[derive(Debug, Clone, Default)]
struct BufferLine {
    text: String,
    markers: MarkerList,
}

impl BufferLine {
    fn from_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            markers: MarkerList::new(),
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// Line-array text buffer with per-line markers and an optional editable range.
#[derive(Debug)]
pub struct TextBuffer {
    lines: Vec<BufferLine>,
    marker_lines: HashMap<MarkerId, usize>,
    next_marker_id: MarkerId,
    editable_range: Option<Range>,
    version: u64,
}

impl TextBuffer {
    /// Create a buffer from initial text. An empty string yields one empty line.
    pub fn from_text(text: &str) -> Self {
        let lines = text.split('\n').map(BufferLine::from_text).collect();
        Self {
            lines,
            marker_lines: HashMap::new(),
            next_marker_id: 1,
            editable_range: None,
            version: 0,
        }
    }

    /// Replace the entire contents (a content flush). All markers are dropped and any
    /// editable range is cleared.
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(BufferLine::from_text).collect();
        self.marker_lines.clear();
        self.editable_range = None;
        self.version += 1;
    }

    /// Number of logical lines (always at least 1).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Text of line `line`, without any line terminator.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.lines.get(line).map(|l| l.text.as_str())
    }

    /// Length of line `line` in characters.
    pub fn line_len(&self, line: usize) -> Option<usize> {
        self.lines.get(line).map(|l| l.char_len())
    }

    /// The character at `pos`, if any.
    pub fn char_at(&self, pos: Position) -> Option<char> {
        self.lines.get(pos.line)?.text.chars().nth(pos.column)
    }

    /// The whole buffer, lines joined with `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&line.text);
        }
        out
    }

    /// Text covered by `range` (which must be valid).
    pub fn text_in_range(&self, range: &Range) -> String {
        if range.start.line == range.end.line {
            let text = &self.lines[range.start.line].text;
            let sb = byte_index(text, range.start.column);
            let eb = byte_index(text, range.end.column);
            return text[sb..eb].to_string();
        }
        let mut out = String::new();
        let first = &self.lines[range.start.line].text;
        out.push_str(&first[byte_index(first, range.start.column)..]);
        for line in range.start.line + 1..range.end.line {
            out.push('\n');
            out.push_str(&self.lines[line].text);
        }
        let last = &self.lines[range.end.line].text;
        out.push('\n');
        out.push_str(&last[..byte_index(last, range.end.column)]);
        out
    }

    /// The last position of the buffer.
    pub fn end_position(&self) -> Position {
        let line = self.lines.len() - 1;
        Position::new(line, self.lines[line].char_len())
    }

    /// The range covering the whole buffer.
    pub fn full_range(&self) -> Range {
        Range::new(Position::new(0, 0), self.end_position())
    }

    /// Monotonic content version, bumped on every mutation batch.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Returns `true` if `pos` names an existing line and a column within it.
    pub fn is_valid_position(&self, pos: Position) -> bool {
        self.line_len(pos.line).is_some_and(|len| pos.column <= len)
    }

    /// Clamp `pos` into the buffer.
    pub fn clamp_position(&self, pos: Position) -> Position {
        let line = pos.line.min(self.lines.len() - 1);
        let column = pos.column.min(self.lines[line].char_len());
        Position::new(line, column)
    }

    /// Validate that `range` lies within the buffer.
    pub fn validate_range(&self, range: &Range) -> Result<(), EditError> {
        if self.is_valid_position(range.start) && self.is_valid_position(range.end) {
            Ok(())
        } else {
            Err(EditError::InvalidRange { range: *range })
        }
    }

    /// Restrict edits to `range` (or lift the restriction with `None`).
    pub fn set_editable_range(&mut self, range: Option<Range>) {
        self.editable_range = range;
    }

    /// The editable range in effect: the explicit restriction, or the whole buffer.
    pub fn editable_range(&self) -> Range {
        self.editable_range.unwrap_or_else(|| self.full_range())
    }

    /// Check that `range` is contained in the editable range.
    pub fn check_editable(&self, range: &Range) -> Result<(), EditError> {
        let editable = self.editable_range();
        if editable.contains_range(range) {
            Ok(())
        } else {
            Err(EditError::OutsideEditableRange {
                range: *range,
                editable,
            })
        }
    }

    /// Register a marker at `pos`.
    pub fn add_marker(
        &mut self,
        pos: Position,
        sticks_to_previous_character: bool,
    ) -> Result<MarkerId, EditError> {
        if !self.is_valid_position(pos) {
            return Err(EditError::InvalidPosition { position: pos });
        }
        let id = self.next_marker_id;
        self.next_marker_id += 1;
        self.lines[pos.line].markers.insert(LineMarker {
            id,
            column: pos.column,
            sticks_to_previous_character,
        });
        self.marker_lines.insert(id, pos.line);
        Ok(id)
    }

    /// The live position of a marker.
    pub fn marker_position(&self, id: MarkerId) -> Option<Position> {
        let line = *self.marker_lines.get(&id)?;
        let marker = self.lines[line].markers.get(id)?;
        Some(Position::new(line, marker.column))
    }

    /// Remove a marker.
    pub fn remove_marker(&mut self, id: MarkerId) {
        if let Some(line) = self.marker_lines.remove(&id) {
            self.lines[line].markers.remove(id);
        }
    }

    /// Apply a single range replacement, decomposed into the line primitives
    /// (replace / split / append) so markers on every affected line are adjusted.
    ///
    /// Callers are expected to have validated the range; out-of-bounds columns are
    /// clamped to line ends.
    pub fn apply_one(&mut self, range: Range, text: &str, force_move_markers: bool) {
        let s = self.clamp_position(range.start);
        let e = self.clamp_position(range.end);
        let segments: Vec<&str> = text.split('\n').collect();

        if s.line == e.line && segments.len() == 1 {
            self.line_replace(s.line, s.column, e.column, segments[0], force_move_markers);
            return;
        }

        // Collapse a multi-line range onto the start line: markers inside the deleted
        // region migrate to (s.line, s.column) through the collapse-and-append chain.
        if e.line > s.line {
            let start_len = self.lines[s.line].char_len();
            self.line_replace(s.line, s.column, start_len, "", force_move_markers);
            self.line_replace(e.line, 0, e.column, "", force_move_markers);
            for line in s.line + 1..e.line {
                let len = self.lines[line].char_len();
                self.line_replace(line, 0, len, "", force_move_markers);
            }
            for _ in s.line + 1..=e.line {
                self.line_append_next(s.line);
            }
        } else if s.column != e.column {
            self.line_replace(s.line, s.column, e.column, "", force_move_markers);
        }

        // What remains is a pure insertion at the range start.
        if segments.len() == 1 {
            if !segments[0].is_empty() {
                self.line_replace(s.line, s.column, s.column, segments[0], force_move_markers);
            }
            return;
        }

        self.line_replace(s.line, s.column, s.column, segments[0], force_move_markers);
        let split_at = s.column + segments[0].chars().count();
        self.line_split(s.line, split_at);
        for (k, segment) in segments[1..segments.len() - 1].iter().enumerate() {
            self.insert_plain_line(s.line + 1 + k, segment);
        }
        let last_idx = s.line + segments.len() - 1;
        let last = segments[segments.len() - 1];
        if !last.is_empty() {
            self.line_replace(last_idx, 0, 0, last, force_move_markers);
        }
    }

    fn line_replace(
        &mut self,
        line: usize,
        start: usize,
        end: usize,
        new_text: &str,
        force_move: bool,
    ) {
        let entry = &mut self.lines[line];
        let sb = byte_index(&entry.text, start);
        let eb = byte_index(&entry.text, end);
        entry.text.replace_range(sb..eb, new_text);
        entry
            .markers
            .adjust_for_replace(start, end, new_text.chars().count(), force_move);
    }

    fn line_split(&mut self, line: usize, column: usize) {
        let entry = &mut self.lines[line];
        let split_byte = byte_index(&entry.text, column);
        let tail = entry.text.split_off(split_byte);
        let moved = entry.markers.split_off(column, false);

        for slot in self.marker_lines.values_mut() {
            if *slot > line {
                *slot += 1;
            }
        }
        let mut new_line = BufferLine::from_text(&tail);
        for marker in &moved {
            self.marker_lines.insert(marker.id, line + 1);
            new_line.markers.insert(*marker);
        }
        self.lines.insert(line + 1, new_line);
    }

    /// Append line `line + 1` onto `line`, removing it.
    fn line_append_next(&mut self, line: usize) {
        let donor = self.lines.remove(line + 1);
        let receiver = &mut self.lines[line];
        let receiver_len = receiver.char_len();
        receiver.text.push_str(&donor.text);

        let incoming: Vec<LineMarker> = donor.markers.markers().to_vec();
        for marker in &incoming {
            self.marker_lines.insert(marker.id, line);
        }
        receiver.markers.append(incoming, receiver_len);

        for slot in self.marker_lines.values_mut() {
            if *slot > line + 1 {
                *slot -= 1;
            }
        }
    }

    fn insert_plain_line(&mut self, at: usize, text: &str) {
        for slot in self.marker_lines.values_mut() {
            if *slot >= at {
                *slot += 1;
            }
        }
        self.lines.insert(at, BufferLine::from_text(text));
    }
}
