//! Edit operations: collection, tracked selections, and batch application.
//!
//! A command pass produces one [`EditOperation`] batch tagged by owning cursor. The
//! [`EditOperationBuilder`] is the guarded collection surface handed to per-cursor edit
//! logic: it drops no-op operations, numbers operations `(owner, sequence)`, and exposes
//! `track_selection` so a command can recover a selection's post-edit location through
//! buffer markers. [`apply_edits`] applies a validated batch all-or-nothing and returns
//! the inverse operations grouped per owner, which is what lets each command decide its
//! own post-edit caret placement.

use crate::buffer::{EditError, TextBuffer};
use crate::events::ContentChange;
use crate::markers::MarkerId;
use crate::selection::{Position, Range, Selection, SelectionDirection};
use std::collections::BTreeMap;
use tracing::warn;

/// A proposed range replacement, tagged by its originating cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOperation {
    /// Index of the cursor that proposed this operation (the "major" id).
    pub owner: usize,
    /// Ordering of this operation within its owner (the "minor" id).
    /// `(owner, sequence)` is unique within one command pass.
    pub sequence: usize,
    /// The range to replace.
    pub range: Range,
    /// The replacement text.
    pub text: String,
    /// When set, markers at insertion boundaries move past the inserted text even if
    /// they stick to the previous character.
    pub force_move_markers: bool,
}

/// Token returned by `track_selection`, resolvable after the batch was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedSelectionToken(usize);

#[derive(Debug, Clone, Copy)]
struct TrackedEntry {
    selection_start: MarkerId,
    position: MarkerId,
}

/// Registry of selections tracked through buffer markers for the duration of one
/// command pass. Must be disposed before the pass ends so markers do not leak.
#[derive(Debug, Default)]
pub struct TrackedSelections {
    entries: Vec<TrackedEntry>,
}

impl TrackedSelections {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register two markers (selection start, caret) for `selection`.
    ///
    /// Stickiness is derived from the selection direction: the document-order start of
    /// a forward selection does not stick to the previous character while its end does,
    /// and a reversed selection inverts both. An empty selection uses `sticky_hint`,
    /// falling back to whether the caret sits at the line's last column (sticking there
    /// avoids drifting onto text inserted at the line end).
    pub fn track(
        &mut self,
        buffer: &mut TextBuffer,
        selection: &Selection,
        sticky_hint: Option<bool>,
    ) -> Result<TrackedSelectionToken, EditError> {
        let (start_sticky, position_sticky) = if selection.is_empty() {
            let caret = selection.position;
            let at_line_end = buffer
                .line_len(caret.line)
                .is_some_and(|len| caret.column == len);
            let sticky = sticky_hint.unwrap_or(at_line_end);
            (sticky, sticky)
        } else {
            match selection.direction() {
                SelectionDirection::Forward => (false, true),
                SelectionDirection::Backward => (true, false),
            }
        };

        let selection_start = buffer.add_marker(selection.selection_start, start_sticky)?;
        let position = buffer.add_marker(selection.position, position_sticky)?;
        self.entries.push(TrackedEntry {
            selection_start,
            position,
        });
        Ok(TrackedSelectionToken(self.entries.len() - 1))
    }

    /// Resolve a token to the tracked selection's live position.
    pub fn get(&self, buffer: &TextBuffer, token: TrackedSelectionToken) -> Option<Selection> {
        let entry = self.entries.get(token.0)?;
        let selection_start = buffer.marker_position(entry.selection_start)?;
        let position = buffer.marker_position(entry.position)?;
        Some(Selection::new(selection_start, position))
    }

    /// Remove every tracked marker from the buffer.
    pub fn dispose(&mut self, buffer: &mut TextBuffer) {
        for entry in self.entries.drain(..) {
            buffer.remove_marker(entry.selection_start);
            buffer.remove_marker(entry.position);
        }
    }
}

/// The result of collecting one cursor's operations.
#[derive(Debug)]
pub struct CollectedOperations {
    /// The operations the cursor proposed (possibly empty).
    pub operations: Vec<EditOperation>,
    /// Whether the cursor registered a tracked selection.
    pub had_tracked_selection: bool,
}

/// Collection surface handed to per-cursor edit logic.
pub struct EditOperationBuilder<'a> {
    buffer: &'a mut TextBuffer,
    tracked: &'a mut TrackedSelections,
    owner: usize,
    next_sequence: usize,
    operations: Vec<EditOperation>,
    had_tracked_selection: bool,
}

impl<'a> EditOperationBuilder<'a> {
    /// Create a builder for `owner`.
    pub fn new(
        buffer: &'a mut TextBuffer,
        tracked: &'a mut TrackedSelections,
        owner: usize,
    ) -> Self {
        Self {
            buffer,
            tracked,
            owner,
            next_sequence: 0,
            operations: Vec::new(),
            had_tracked_selection: false,
        }
    }

    /// Read-only view of the buffer, for command logic that inspects line contents.
    pub fn buffer(&self) -> &TextBuffer {
        self.buffer
    }

    /// Propose replacing `range` with `text`. An empty replacement of an empty range
    /// is silently dropped.
    pub fn add_edit_operation(&mut self, range: Range, text: &str) {
        self.push_operation(range, text, false);
    }

    /// Like [`add_edit_operation`](Self::add_edit_operation), but markers at insertion
    /// boundaries are moved past the inserted text regardless of stickiness.
    pub fn add_edit_operation_force_move(&mut self, range: Range, text: &str) {
        self.push_operation(range, text, true);
    }

    fn push_operation(&mut self, range: Range, text: &str, force_move_markers: bool) {
        if range.is_empty() && text.is_empty() {
            return;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.operations.push(EditOperation {
            owner: self.owner,
            sequence,
            range,
            text: text.to_string(),
            force_move_markers,
        });
    }

    /// Track `selection` through the upcoming batch; resolve the token afterwards with
    /// [`CursorStateComputer::tracked_selection`].
    pub fn track_selection(
        &mut self,
        selection: &Selection,
        sticky_hint: Option<bool>,
    ) -> Result<TrackedSelectionToken, EditError> {
        let token = self.tracked.track(self.buffer, selection, sticky_hint)?;
        self.had_tracked_selection = true;
        Ok(token)
    }
}

/// Run `logic` for one cursor inside a guarded call.
///
/// A fault in the per-cursor logic is reported once (non-fatal) and treated as "this
/// cursor produced zero operations"; the overall command proceeds for other cursors.
pub fn collect_operations(
    buffer: &mut TextBuffer,
    tracked: &mut TrackedSelections,
    owner: usize,
    logic: impl FnOnce(&mut EditOperationBuilder<'_>) -> Result<(), EditError>,
) -> CollectedOperations {
    let mut builder = EditOperationBuilder::new(buffer, tracked, owner);
    match logic(&mut builder) {
        Ok(()) => CollectedOperations {
            operations: builder.operations,
            had_tracked_selection: builder.had_tracked_selection,
        },
        Err(error) => {
            warn!(owner, %error, "per-cursor edit logic failed; dropping its operations");
            CollectedOperations {
                operations: Vec::new(),
                had_tracked_selection: builder.had_tracked_selection,
            }
        }
    }
}

/// The inverse of one applied operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseEditOperation {
    /// The originating cursor.
    pub owner: usize,
    /// Ordering within the owner.
    pub sequence: usize,
    /// The range of the inserted text, in post-edit coordinates.
    pub range: Range,
    /// The text the operation replaced.
    pub replaced_text: String,
}

/// The result of applying a batch: inverse operations grouped per owner, plus the
/// content-change record for the batch.
#[derive(Debug)]
pub struct AppliedEdits {
    inverse_by_owner: BTreeMap<usize, Vec<ReverseEditOperation>>,
    /// The mutation record for this batch.
    pub change: ContentChange,
}

impl AppliedEdits {
    /// The inverse operations owned by `owner`, sorted by sequence.
    pub fn inverse_for(&self, owner: usize) -> &[ReverseEditOperation] {
        self.inverse_by_owner
            .get(&owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Owners that produced at least one applied operation.
    pub fn owners(&self) -> impl Iterator<Item = usize> + '_ {
        self.inverse_by_owner.keys().copied()
    }
}

fn inserted_end(start: Position, text: &str) -> Position {
    let mut segments = text.split('\n');
    let first = segments.next().unwrap_or("");
    let mut line = start.line;
    let mut column = start.column + first.chars().count();
    for segment in segments {
        line += 1;
        column = segment.chars().count();
    }
    Position::new(line, column)
}

/// Apply a batch of non-overlapping operations, all-or-nothing.
///
/// Every operation must lie within the buffer and its editable range; otherwise the
/// whole batch is rejected and the buffer is left untouched. On success the buffer
/// version is bumped once and the inverse operations are returned grouped by owner.
pub fn apply_edits(
    buffer: &mut TextBuffer,
    mut operations: Vec<EditOperation>,
) -> Result<AppliedEdits, EditError> {
    operations.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| a.range.end.cmp(&b.range.end))
    });

    for op in &operations {
        buffer.validate_range(&op.range)?;
        buffer.check_editable(&op.range)?;
    }
    for pair in operations.windows(2) {
        if pair[1].range.start < pair[0].range.end {
            return Err(EditError::OverlappingEdits {
                a: pair[0].range,
                b: pair[1].range,
            });
        }
    }

    // Inverse ranges are expressed in final coordinates: walk the batch in document
    // order, accumulating the line/column shift produced by the edits before each one.
    let mut inverse: Vec<ReverseEditOperation> = Vec::with_capacity(operations.len());
    let mut line_shift: isize = 0;
    let mut col_shift: isize = 0;
    let mut col_shift_line = usize::MAX;
    for op in &operations {
        let s = op.range.start;
        let e = op.range.end;
        let adj_line = (s.line as isize + line_shift) as usize;
        let adj_col = if s.line == col_shift_line {
            (s.column as isize + col_shift) as usize
        } else {
            s.column
        };
        let adj_start = Position::new(adj_line, adj_col);
        let end = inserted_end(adj_start, &op.text);

        inverse.push(ReverseEditOperation {
            owner: op.owner,
            sequence: op.sequence,
            range: Range::new(adj_start, end),
            replaced_text: buffer.text_in_range(&op.range),
        });

        let inserted_lines = op.text.matches('\n').count();
        line_shift += inserted_lines as isize - (e.line - s.line) as isize;
        col_shift = end.column as isize - e.column as isize;
        col_shift_line = e.line;
    }

    // Apply back-to-front so earlier ranges stay valid while later ones are rewritten.
    for op in operations.iter().rev() {
        buffer.apply_one(op.range, &op.text, op.force_move_markers);
    }
    let version = buffer.bump_version();

    let ranges = inverse.iter().map(|r| r.range).collect();
    let mut inverse_by_owner: BTreeMap<usize, Vec<ReverseEditOperation>> = BTreeMap::new();
    for rev in inverse {
        inverse_by_owner.entry(rev.owner).or_default().push(rev);
    }
    for group in inverse_by_owner.values_mut() {
        group.sort_by_key(|r| r.sequence);
    }

    Ok(AppliedEdits {
        inverse_by_owner,
        change: ContentChange { version, ranges },
    })
}

/// Accessors handed to a command when it decides a cursor's post-edit state.
pub struct CursorStateComputer<'a> {
    buffer: &'a TextBuffer,
    inverse: &'a [ReverseEditOperation],
    tracked: &'a TrackedSelections,
}

impl<'a> CursorStateComputer<'a> {
    /// Create a computer for one cursor.
    pub fn new(
        buffer: &'a TextBuffer,
        inverse: &'a [ReverseEditOperation],
        tracked: &'a TrackedSelections,
    ) -> Self {
        Self {
            buffer,
            inverse,
            tracked,
        }
    }

    /// The post-edit buffer.
    pub fn buffer(&self) -> &TextBuffer {
        self.buffer
    }

    /// This cursor's inverse operations, sorted by sequence.
    pub fn inverse_edits(&self) -> &[ReverseEditOperation] {
        self.inverse
    }

    /// Resolve a tracked selection registered during collection.
    pub fn tracked_selection(&self, token: TrackedSelectionToken) -> Option<Selection> {
        self.tracked.get(self.buffer, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_operations_are_dropped() {
        let mut buffer = TextBuffer::from_text("abc");
        let mut tracked = TrackedSelections::new();
        let collected = collect_operations(&mut buffer, &mut tracked, 0, |builder| {
            builder.add_edit_operation(Range::collapsed(Position::new(0, 1)), "");
            Ok(())
        });
        assert!(collected.operations.is_empty());
    }

    #[test]
    fn faulting_logic_yields_zero_operations() {
        let mut buffer = TextBuffer::from_text("abc");
        let mut tracked = TrackedSelections::new();
        let collected = collect_operations(&mut buffer, &mut tracked, 3, |builder| {
            builder.add_edit_operation(Range::collapsed(Position::new(0, 0)), "x");
            Err(EditError::InvalidPosition {
                position: Position::new(9, 9),
            })
        });
        assert!(collected.operations.is_empty());
    }

    #[test]
    fn inverse_ranges_use_final_coordinates() {
        let mut buffer = TextBuffer::from_text("abcdef");
        let ops = vec![
            EditOperation {
                owner: 0,
                sequence: 0,
                range: Range::new(Position::new(0, 1), Position::new(0, 2)),
                text: "XY".to_string(),
                force_move_markers: false,
            },
            EditOperation {
                owner: 1,
                sequence: 0,
                range: Range::new(Position::new(0, 4), Position::new(0, 4)),
                text: "Z".to_string(),
                force_move_markers: false,
            },
        ];
        let applied = apply_edits(&mut buffer, ops).unwrap();
        assert_eq!(buffer.text(), "aXYcdZef");
        assert_eq!(
            applied.inverse_for(0)[0].range,
            Range::new(Position::new(0, 1), Position::new(0, 3))
        );
        assert_eq!(applied.inverse_for(0)[0].replaced_text, "b");
        assert_eq!(
            applied.inverse_for(1)[0].range,
            Range::new(Position::new(0, 5), Position::new(0, 6))
        );
    }

    #[test]
    fn batch_outside_editable_range_is_rejected_untouched() {
        let mut buffer = TextBuffer::from_text("abc\ndef");
        buffer.set_editable_range(Some(Range::new(
            Position::new(0, 0),
            Position::new(0, 3),
        )));
        let ops = vec![
            EditOperation {
                owner: 0,
                sequence: 0,
                range: Range::collapsed(Position::new(0, 0)),
                text: "ok".to_string(),
                force_move_markers: false,
            },
            EditOperation {
                owner: 1,
                sequence: 0,
                range: Range::collapsed(Position::new(1, 0)),
                text: "no".to_string(),
                force_move_markers: false,
            },
        ];
        let before = buffer.text();
        assert!(apply_edits(&mut buffer, ops).is_err());
        assert_eq!(buffer.text(), before);
        assert_eq!(buffer.version(), 0);
    }

    #[test]
    fn tracked_selection_survives_surrounding_edit() {
        let mut buffer = TextBuffer::from_text("hello world");
        let mut tracked = TrackedSelections::new();
        let selection = Selection::new(Position::new(0, 6), Position::new(0, 11));
        let token = tracked.track(&mut buffer, &selection, None).unwrap();

        let ops = vec![EditOperation {
            owner: 0,
            sequence: 0,
            range: Range::collapsed(Position::new(0, 0)),
            text: ">> ".to_string(),
            force_move_markers: false,
        }];
        apply_edits(&mut buffer, ops).unwrap();

        let recovered = tracked.get(&buffer, token).unwrap();
        assert_eq!(recovered.selection_start, Position::new(0, 9));
        assert_eq!(recovered.position, Position::new(0, 14));
        tracked.dispose(&mut buffer);
    }
}
