//! Multi-cursor command orchestration.
//!
//! [`CursorController`] owns the buffer, the cursor collection, the view layout, and
//! the cursor undo stack, and runs every command through one pipeline: per-cursor
//! operation logic, edit collection, conflict resolution, batch application, and
//! post-edit cursor placement. Each call to [`CursorController::execute`] returns a
//! [`CommandOutcome`] describing exactly what changed; there is no listener channel.
//!
//! Typed text arriving from the keyboard is decomposed into one pass per character,
//! so auto-closing and indentation see every keystroke individually and the outcome
//! carries one content change per character.
//!
//! # Example
//!
//! ```
//! use cursor_core::{CommandSource, CursorCommand, CursorController};
//!
//! let mut controller = CursorController::new("hello\nworld", 0);
//! let outcome = controller.execute(
//!     CursorCommand::TypeText { text: ">> ".to_string() },
//!     CommandSource::Api,
//! )?;
//! assert_eq!(controller.text(), ">> hello\nworld");
//! assert_eq!(outcome.content_changes.len(), 1);
//! # Ok::<(), cursor_core::CursorError>(())
//! ```

use crate::buffer::TextBuffer;
use crate::commands::{self, CommandSource, CursorCommand, DesiredX, PerCursorResult};
use crate::conflicts;
use crate::cursor::{CursorCollection, CursorState};
use crate::edits::{
    apply_edits, collect_operations, CursorStateComputer, TrackedSelectionToken,
    TrackedSelections,
};
use crate::events::{
    ChangeReason, CommandOutcome, ContentChange, PositionChangedEvent, RevealRange,
    ScrollRequest, SelectionChangedEvent,
};
use crate::layout::ViewLayout;
use crate::selection::{Position, Range, Selection, SelectionDirection};
use crate::undo::{CursorSnapshot, CursorUndoStack};
use cursor_core_lang::LanguageConfig;
use thiserror::Error;
use tracing::warn;

/// Errors surfaced to callers of the controller.
///
/// Recoverable conditions (conflicting edits, ranges outside the editable region,
/// faulting per-cursor logic) never error: they produce an empty outcome and a log
/// line, so one misbehaving command cannot wedge an interactive session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    /// The controller was disposed and accepts no further commands.
    #[error("cursor controller has been disposed")]
    Disposed,
}

/// What one inner command pass changed; `execute` folds these into the outcome.
#[derive(Debug, Default)]
struct PassResult {
    content_change: Option<ContentChange>,
    reveal_caret: bool,
    scroll: Option<ScrollRequest>,
    reason: ChangeReason,
    executed_edit: bool,
}

/// Owner of the cursor state for one buffer.
pub struct CursorController {
    buffer: TextBuffer,
    cursors: CursorCollection,
    layout: ViewLayout,
    undo: CursorUndoStack,
    language: LanguageConfig,
    handling: bool,
    disposed: bool,
}

impl CursorController {
    /// Create a controller over `text` with plain-text language behavior.
    ///
    /// `viewport_width` is the soft-wrap width in cells; `0` disables wrapping.
    pub fn new(text: &str, viewport_width: usize) -> Self {
        Self::with_language(text, viewport_width, LanguageConfig::plain("plaintext"))
    }

    /// Create a controller with an explicit language configuration.
    pub fn with_language(text: &str, viewport_width: usize, language: LanguageConfig) -> Self {
        let buffer = TextBuffer::from_text(text);
        let mut cursors = CursorCollection::new();
        let layout = ViewLayout::new(viewport_width);
        cursors.sync_view(&buffer, &layout);
        Self {
            buffer,
            cursors,
            layout,
            undo: CursorUndoStack::new(),
            language,
            handling: false,
            disposed: false,
        }
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// Current buffer contents.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// All selections, primary first.
    pub fn selections(&self) -> Vec<Selection> {
        self.cursors.selections()
    }

    /// The primary cursor's selection.
    pub fn primary_selection(&self) -> Selection {
        self.cursors.primary().selection()
    }

    /// The primary cursor's caret.
    pub fn primary_position(&self) -> Position {
        self.cursors.primary().position()
    }

    /// Number of cursors.
    pub fn cursor_count(&self) -> usize {
        self.cursors.len()
    }

    /// The view layout used for vertical movement and wrapping.
    pub fn layout(&self) -> &ViewLayout {
        &self.layout
    }

    /// Change the soft-wrap width (`0` disables wrapping) and resync view positions.
    pub fn set_viewport_width(&mut self, width: usize) {
        self.layout.set_viewport_width(width);
        self.cursors.sync_view(&self.buffer, &self.layout);
    }

    /// Change the tab render width and resync view positions.
    pub fn set_tab_width(&mut self, width: usize) {
        self.layout.set_tab_width(width);
        self.cursors.sync_view(&self.buffer, &self.layout);
    }

    /// Change the page size used by page movement.
    pub fn set_page_size(&mut self, lines: usize) {
        self.layout.set_page_size(lines);
    }

    /// The active language configuration.
    pub fn language(&self) -> &LanguageConfig {
        &self.language
    }

    /// Replace the language configuration.
    pub fn set_language(&mut self, language: LanguageConfig) {
        self.language = language;
    }

    /// Restrict edits to `range`; `None` makes the whole buffer editable again.
    pub fn set_editable_range(&mut self, range: Option<Range>) {
        self.buffer.set_editable_range(range);
    }

    /// Serialize the cursor state for session restore.
    pub fn save_state(&self) -> Vec<CursorState> {
        self.cursors.save_state()
    }

    /// Restore a previously saved cursor state, clamping into the current buffer.
    pub fn restore_state(&mut self, states: &[CursorState]) -> Result<CommandOutcome, CursorError> {
        if self.disposed {
            return Err(CursorError::Disposed);
        }
        let old_selections = self.cursors.selections();
        let old_carets = self.cursors.carets();
        self.cursors.restore_state(states, &self.buffer);
        self.cursors.normalize();
        self.cursors.sync_view(&self.buffer, &self.layout);
        Ok(self.diff_outcome(&old_selections, &old_carets, ChangeReason::NotSet))
    }

    /// Replace the whole buffer contents.
    ///
    /// A flush drops all markers and the editable range, resets to a single cursor at
    /// the buffer start, and reports the change with [`ChangeReason::ContentFlush`].
    pub fn flush(&mut self, text: &str) -> Result<CommandOutcome, CursorError> {
        if self.disposed {
            return Err(CursorError::Disposed);
        }
        let old_selections = self.cursors.selections();
        let old_carets = self.cursors.carets();
        self.buffer.set_text(text);
        self.cursors.reset();
        self.cursors.sync_view(&self.buffer, &self.layout);
        self.undo.clear();
        let mut outcome = self.diff_outcome(&old_selections, &old_carets, ChangeReason::ContentFlush);
        outcome.content_changes.push(ContentChange {
            version: self.buffer.version(),
            ranges: vec![self.buffer.full_range()],
        });
        Ok(outcome)
    }

    /// Stop accepting commands. Every later call returns [`CursorError::Disposed`].
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    /// Whether [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Execute one command and report what changed.
    ///
    /// Keyboard-sourced [`CursorCommand::TypeText`] with more than one character is
    /// decomposed into one pass per character; the outcome then carries one content
    /// change per keystroke and the last keystroke decides the reveal.
    pub fn execute(
        &mut self,
        command: CursorCommand,
        source: CommandSource,
    ) -> Result<CommandOutcome, CursorError> {
        if self.disposed {
            return Err(CursorError::Disposed);
        }
        // `execute` takes `&mut self`, so a caller cannot re-enter a command pass;
        // mid-pass buffer changes are recovered through tracked markers instead of
        // nested dispatch. The flag asserts that single-pass invariant for any
        // internal path that might call back into command handling.
        debug_assert!(!self.handling, "command execution is not reentrant");
        self.handling = true;

        let old_selections = self.cursors.selections();
        let old_carets = self.cursors.carets();
        let is_cursor_undo = matches!(command, CursorCommand::CursorUndo);

        let mut content_changes = Vec::new();
        let mut totals = PassResult::default();
        match &command {
            CursorCommand::TypeText { text }
                if source == CommandSource::Keyboard && text.chars().count() > 1 =>
            {
                for ch in text.chars() {
                    let pass = self.run_pass(&CursorCommand::TypeText {
                        text: ch.to_string(),
                    });
                    content_changes.extend(pass.content_change);
                    totals.reveal_caret = pass.reveal_caret;
                    totals.scroll = pass.scroll.or(totals.scroll);
                    totals.executed_edit |= pass.executed_edit;
                    totals.reason = pass.reason;
                }
            }
            _ => {
                let pass = self.run_pass(&command);
                content_changes.extend(pass.content_change);
                totals.reveal_caret = pass.reveal_caret;
                totals.scroll = pass.scroll;
                totals.executed_edit = pass.executed_edit;
                totals.reason = pass.reason;
            }
        }

        self.cursors.normalize();
        self.cursors.sync_view(&self.buffer, &self.layout);

        let mut outcome = self.diff_outcome(&old_selections, &old_carets, totals.reason);
        let changed = outcome.position_changed.is_some() || outcome.selection_changed.is_some();

        if totals.executed_edit {
            self.undo.clear();
        } else if changed && !is_cursor_undo {
            self.undo.push(CursorSnapshot::new(old_selections));
        }

        if totals.reveal_caret && (changed || totals.executed_edit) {
            outcome.reveal = Some(RevealRange {
                range: Range::collapsed(self.cursors.primary().position()),
                reveal_horizontal: true,
            });
        }
        if changed {
            outcome.scroll = totals.scroll;
        }
        outcome.content_changes = content_changes;

        self.handling = false;
        Ok(outcome)
    }

    fn diff_outcome(
        &self,
        old_selections: &[Selection],
        old_carets: &[Position],
        reason: ChangeReason,
    ) -> CommandOutcome {
        let new_selections = self.cursors.selections();
        let new_carets = self.cursors.carets();
        let mut outcome = CommandOutcome::default();
        if new_carets != old_carets {
            outcome.position_changed = Some(PositionChangedEvent {
                primary: new_carets[0],
                secondary: new_carets[1..].to_vec(),
                reason,
            });
        }
        if new_selections != old_selections {
            outcome.selection_changed = Some(SelectionChangedEvent {
                primary: new_selections[0],
                secondary: new_selections[1..].to_vec(),
                reason,
            });
        }
        outcome
    }

    fn run_pass(&mut self, command: &CursorCommand) -> PassResult {
        use CursorCommand::*;
        match command {
            MoveTo { .. } | SelectAll | SelectLine { .. } | AddCursorAbove | AddCursorBelow
            | AddCursorAt { .. } | KillSecondaryCursors | ColumnSelect { .. } | CursorUndo => {
                self.collection_pass(command)
            }
            Paste { text } => {
                let results = self.paste_results(text);
                self.apply_edit_results(results)
            }
            TypeText { .. } | Backspace | DeleteForward | DeleteWordLeft | DeleteWordRight => {
                let results = self.per_cursor_results(command);
                self.apply_edit_results(results)
            }
            _ => {
                let results = self.per_cursor_results(command);
                self.apply_motion_results(results)
            }
        }
    }

    /// Run the per-cursor operation logic for every cursor, in cursor order.
    fn per_cursor_results(&self, command: &CursorCommand) -> Vec<PerCursorResult> {
        use CursorCommand::*;
        self.cursors
            .iter()
            .map(|cursor| {
                let selection = cursor.selection();
                match command {
                    MoveLeft { extend } => commands::move_left(selection, &self.buffer, *extend),
                    MoveRight { extend } => commands::move_right(selection, &self.buffer, *extend),
                    MoveUp { extend } => commands::move_vertical(
                        selection,
                        cursor.desired_x(),
                        &self.buffer,
                        &self.layout,
                        -1,
                        *extend,
                    ),
                    MoveDown { extend } => commands::move_vertical(
                        selection,
                        cursor.desired_x(),
                        &self.buffer,
                        &self.layout,
                        1,
                        *extend,
                    ),
                    MovePageUp { extend } => commands::move_page(
                        selection,
                        cursor.desired_x(),
                        &self.buffer,
                        &self.layout,
                        -1,
                        *extend,
                    ),
                    MovePageDown { extend } => commands::move_page(
                        selection,
                        cursor.desired_x(),
                        &self.buffer,
                        &self.layout,
                        1,
                        *extend,
                    ),
                    MoveToLineStart { extend } => commands::move_to_line_start(selection, *extend),
                    MoveToLineEnd { extend } => {
                        commands::move_to_line_end(selection, &self.buffer, *extend)
                    }
                    MoveWordLeft { extend } => {
                        commands::move_word_left(selection, &self.buffer, &self.language, *extend)
                    }
                    MoveWordRight { extend } => {
                        commands::move_word_right(selection, &self.buffer, &self.language, *extend)
                    }
                    TypeText { text } => {
                        commands::type_text(selection, &self.buffer, &self.language, text)
                    }
                    Backspace => commands::backspace(selection, &self.buffer),
                    DeleteForward => commands::delete_forward(selection, &self.buffer),
                    DeleteWordLeft => {
                        commands::delete_word_left(selection, &self.buffer, &self.language)
                    }
                    DeleteWordRight => {
                        commands::delete_word_right(selection, &self.buffer, &self.language)
                    }
                    // Collection-level commands never reach the per-cursor map.
                    _ => unreachable!("not a per-cursor command"),
                }
            })
            .collect()
    }

    /// An n-segment paste across n cursors hands one segment to each cursor in
    /// document order; any other shape pastes the whole text at every cursor.
    fn paste_results(&self, text: &str) -> Vec<PerCursorResult> {
        let n = self.cursors.len();
        let mut segments: Vec<&str> = text.split('\n').collect();
        if segments.len() > 1 && segments.last().is_some_and(|s| s.is_empty()) {
            segments.pop();
        }
        if n > 1 && segments.len() == n {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by_key(|&i| {
                self.cursors
                    .get(i)
                    .map(|c| c.selection().start())
                    .unwrap_or(Position::new(0, 0))
            });
            let mut results: Vec<Option<PerCursorResult>> = (0..n).map(|_| None).collect();
            for (segment, &cursor_index) in segments.iter().zip(&order) {
                if let Some(cursor) = self.cursors.get(cursor_index) {
                    results[cursor_index] = Some(commands::paste_segment(cursor.selection(), segment));
                }
            }
            results.into_iter().flatten().collect()
        } else {
            self.cursors
                .iter()
                .map(|cursor| commands::paste_segment(cursor.selection(), text))
                .collect()
        }
    }

    /// Apply pure-motion results: selections and horizontal intents, no buffer edits.
    fn apply_motion_results(&mut self, results: Vec<PerCursorResult>) -> PassResult {
        let mut pass = PassResult::default();
        if let Some(first) = results.first() {
            pass.reveal_caret = first.reveal_caret;
            pass.scroll = first.scroll;
            pass.reason = first.reason;
        }
        for (i, result) in results.into_iter().enumerate() {
            let Some(cursor) = self.cursors.get_mut(i) else {
                continue;
            };
            if let Some(selection) = result.selection {
                cursor.set_selection(selection);
            }
            match result.desired_x {
                DesiredX::Keep => {}
                DesiredX::Clear => cursor.clear_desired_x(),
                DesiredX::Set(x) => cursor.set_desired_x(x),
            }
        }
        pass
    }

    /// Route edit results through collection, conflict resolution and batch
    /// application, then place every surviving cursor.
    fn apply_edit_results(&mut self, results: Vec<PerCursorResult>) -> PassResult {
        if results.iter().all(|r| r.edit.is_none()) {
            return PassResult::default();
        }
        let mut pass = PassResult::default();
        if let Some(first) = results.first() {
            pass.reveal_caret = first.reveal_caret;
            pass.scroll = first.scroll;
            pass.reason = first.reason;
        }

        let n = results.len();
        let mut tracked = TrackedSelections::new();
        let mut tokens: Vec<Option<TrackedSelectionToken>> = vec![None; n];
        let mut operations = Vec::new();
        for (i, result) in results.iter().enumerate() {
            match result.edit.as_ref() {
                Some(edit) => {
                    let range = edit.range;
                    let text = edit.text.as_str();
                    let force = edit.force_move_markers;
                    let collected =
                        collect_operations(&mut self.buffer, &mut tracked, i, |builder| {
                            builder.buffer().validate_range(&range)?;
                            if force {
                                builder.add_edit_operation_force_move(range, text);
                            } else {
                                builder.add_edit_operation(range, text);
                            }
                            Ok(())
                        });
                    operations.extend(collected.operations);
                }
                None => {
                    // Cursors without an edit ride through the batch on markers so
                    // surrounding edits carry them to the right place.
                    if let Some(cursor) = self.cursors.get(i) {
                        let selection = cursor.selection();
                        tokens[i] = tracked.track(&mut self.buffer, &selection, None).ok();
                    }
                }
            }
        }

        let Some(resolution) = conflicts::resolve(operations) else {
            tracked.dispose(&mut self.buffer);
            return PassResult::default();
        };
        if resolution.operations.is_empty() {
            tracked.dispose(&mut self.buffer);
            return PassResult::default();
        }
        let applied = match apply_edits(&mut self.buffer, resolution.operations) {
            Ok(applied) => applied,
            Err(error) => {
                warn!(%error, "edit batch rejected; command dropped");
                tracked.dispose(&mut self.buffer);
                return PassResult::default();
            }
        };

        let mut new_selections = Vec::with_capacity(n);
        for (i, result) in results.iter().enumerate() {
            if resolution.losing_owners.contains(&i) {
                continue;
            }
            let Some(cursor) = self.cursors.get(i) else {
                continue;
            };
            let current = cursor.selection();
            let computer = CursorStateComputer::new(&self.buffer, applied.inverse_for(i), &tracked);
            let selection = match result.edit.as_ref() {
                Some(edit) => match computer.inverse_edits().last() {
                    // The caret lands at the end of the inserted text, optionally
                    // stepped back (into an auto-closed pair, for instance).
                    Some(last) => Selection::cursor(Position::new(
                        last.range.end.line,
                        last.range.end.column.saturating_sub(edit.caret_back),
                    )),
                    // The operation was dropped as a no-op or faulted out.
                    None => current,
                },
                None => tokens[i]
                    .and_then(|token| computer.tracked_selection(token))
                    .unwrap_or(current),
            };
            new_selections.push(selection);
        }
        tracked.dispose(&mut self.buffer);

        self.cursors.remove_indices(&resolution.losing_owners);
        self.cursors.set_selections(&new_selections);
        for cursor in self.cursors.iter_mut() {
            cursor.clear_desired_x();
        }

        pass.content_change = Some(applied.change);
        pass.executed_edit = true;
        pass
    }

    fn collection_pass(&mut self, command: &CursorCommand) -> PassResult {
        use CursorCommand::*;
        let mut pass = PassResult {
            reveal_caret: true,
            reason: ChangeReason::Explicit,
            ..PassResult::default()
        };
        match command {
            MoveTo { position, extend } => {
                let target = self.buffer.clamp_position(*position);
                self.cursors.kill_secondary_cursors();
                if let Some(primary) = self.cursors.get_mut(0) {
                    primary.move_to(target, *extend);
                    primary.clear_desired_x();
                }
            }
            SelectAll => {
                let full = self.buffer.full_range();
                self.cursors.kill_secondary_cursors();
                if let Some(primary) = self.cursors.get_mut(0) {
                    primary.set_selection(Selection::from_range(
                        full,
                        SelectionDirection::Forward,
                    ));
                }
                pass.reveal_caret = false;
            }
            SelectLine { line } => {
                let line = (*line).min(self.buffer.line_count() - 1);
                let start = Position::new(line, 0);
                let end = if line + 1 < self.buffer.line_count() {
                    Position::new(line + 1, 0)
                } else {
                    self.buffer.end_position()
                };
                self.cursors.kill_secondary_cursors();
                if let Some(primary) = self.cursors.get_mut(0) {
                    primary.set_selection(Selection::new(start, end));
                }
            }
            AddCursorAbove => self.add_cursor_vertically(-1),
            AddCursorBelow => self.add_cursor_vertically(1),
            AddCursorAt { position } => {
                let target = self.buffer.clamp_position(*position);
                self.cursors.add_cursor(Selection::cursor(target));
            }
            KillSecondaryCursors => {
                self.cursors.kill_secondary_cursors();
            }
            ColumnSelect { anchor, active } => {
                let anchor = self.buffer.clamp_position(*anchor);
                let active = self.buffer.clamp_position(*active);
                let (mut selections, active_index) =
                    commands::column_selections(&self.buffer, anchor, active);
                // The active corner's line becomes the primary cursor.
                selections.swap(0, active_index);
                self.cursors.set_selections(&selections);
            }
            CursorUndo => {
                pass.reason = ChangeReason::Undo;
                match self.undo.pop() {
                    Some(snapshot) => self.cursors.set_selections(snapshot.selections()),
                    None => pass.reveal_caret = false,
                }
            }
            _ => unreachable!("not a collection-level command"),
        }
        pass
    }

    /// Add a cursor one view line above (`-1`) or below (`1`) the outermost caret.
    fn add_cursor_vertically(&mut self, direction: isize) {
        let carets = self.cursors.carets();
        let from = if direction < 0 {
            carets.iter().min().copied()
        } else {
            carets.iter().max().copied()
        };
        let Some(from) = from else {
            return;
        };
        let view = self.layout.buffer_to_view(&self.buffer, from);
        let x = self.layout.x_at(&self.buffer, from);
        let total = self.layout.total_view_lines(&self.buffer);
        let target_view = view
            .view_line
            .saturating_add_signed(direction)
            .min(total.saturating_sub(1));
        if target_view == view.view_line {
            return;
        }
        let target = self.layout.position_for_x(&self.buffer, target_view, x);
        let index = self.cursors.add_cursor(Selection::cursor(target));
        if let Some(cursor) = self.cursors.get_mut(index) {
            cursor.set_desired_x(x);
        }
    }
}
