//! Command set and per-cursor operation logic.
//!
//! Commands form an enum-keyed dispatch table: the controller resolves each variant
//! with a `match`, so there is no stringly-typed registry to keep in sync. The
//! per-cursor functions in this module are pure with respect to the buffer - they
//! read text and return a [`PerCursorResult`] record, and the controller folds those
//! records into the final command outcome. Edits are expressed as [`ProposedEdit`]s
//! and never applied here.

use crate::buffer::TextBuffer;
use crate::events::{ChangeReason, ScrollRequest};
use crate::layout::ViewLayout;
use crate::selection::{Position, Range, Selection};
use cursor_core_lang::LanguageConfig;
use unicode_segmentation::UnicodeSegmentation;

/// The origin of a command, used to decide per-character typing decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    /// Interactive keystrokes; typed text is decomposed character by character.
    Keyboard,
    /// Pointer-driven commands.
    Mouse,
    /// Programmatic callers; typed text is applied as one blob.
    Api,
}

/// Cursor and edit commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorCommand {
    /// Collapse to a single cursor at `position` (extend keeps the primary anchor).
    MoveTo {
        /// Target position.
        position: Position,
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Move every caret one grapheme left.
    MoveLeft {
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Move every caret one grapheme right.
    MoveRight {
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Move every caret one view line up.
    MoveUp {
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Move every caret one view line down.
    MoveDown {
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Move every caret one page up and request a matching scroll.
    MovePageUp {
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Move every caret one page down and request a matching scroll.
    MovePageDown {
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Move every caret to its line start.
    MoveToLineStart {
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Move every caret to its line end.
    MoveToLineEnd {
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Move every caret to the previous word boundary.
    MoveWordLeft {
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Move every caret past the next word.
    MoveWordRight {
        /// Keep the selection anchor.
        extend: bool,
    },
    /// Select the whole buffer with a single cursor.
    SelectAll,
    /// Select one whole line (including its terminator) with a single cursor.
    SelectLine {
        /// The line to select.
        line: usize,
    },
    /// Add a secondary cursor one view line above the last cursor.
    AddCursorAbove,
    /// Add a secondary cursor one view line below the last cursor.
    AddCursorBelow,
    /// Add a secondary cursor at an explicit position.
    AddCursorAt {
        /// Caret position for the new cursor.
        position: Position,
    },
    /// Drop all secondary cursors.
    KillSecondaryCursors,
    /// Column (box) selection: one cursor per line between anchor and active.
    ColumnSelect {
        /// The fixed corner.
        anchor: Position,
        /// The moving corner.
        active: Position,
    },
    /// Type text at every cursor (selections are replaced).
    TypeText {
        /// The text to type.
        text: String,
    },
    /// Paste at every cursor; an n-line paste across n cursors is distributed.
    Paste {
        /// The pasted text.
        text: String,
    },
    /// Delete the selection, or one grapheme before each caret.
    Backspace,
    /// Delete the selection, or one grapheme after each caret.
    DeleteForward,
    /// Delete from each caret back to the previous word boundary.
    DeleteWordLeft,
    /// Delete from each caret forward past the next word.
    DeleteWordRight,
    /// Restore the previous selection set from the cursor undo stack.
    CursorUndo,
}

/// How a per-cursor operation wants the horizontal intent updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DesiredX {
    /// Leave the remembered intent alone.
    Keep,
    /// Forget it (horizontal movement).
    Clear,
    /// Remember this cell offset (vertical movement).
    Set(usize),
}

/// An edit proposed by one cursor, to be routed through collection, conflict
/// resolution, and batch application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProposedEdit {
    pub range: Range,
    pub text: String,
    /// Characters to step the caret back from the end of the inserted text
    /// (used to land inside auto-closed bracket pairs).
    pub caret_back: usize,
    pub force_move_markers: bool,
}

impl ProposedEdit {
    fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
            caret_back: 0,
            force_move_markers: false,
        }
    }
}

/// The record one per-cursor operation returns; the controller folds these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PerCursorResult {
    pub selection: Option<Selection>,
    pub edit: Option<ProposedEdit>,
    pub desired_x: DesiredX,
    pub reveal_caret: bool,
    pub scroll: Option<ScrollRequest>,
    pub reason: ChangeReason,
}

impl PerCursorResult {
    fn unchanged() -> Self {
        Self {
            selection: None,
            edit: None,
            desired_x: DesiredX::Keep,
            reveal_caret: false,
            scroll: None,
            reason: ChangeReason::NotSet,
        }
    }

    fn moved(selection: Selection) -> Self {
        Self {
            selection: Some(selection),
            edit: None,
            desired_x: DesiredX::Clear,
            reveal_caret: true,
            scroll: None,
            reason: ChangeReason::Explicit,
        }
    }

    fn edited(edit: ProposedEdit) -> Self {
        Self {
            selection: None,
            edit: Some(edit),
            desired_x: DesiredX::Clear,
            reveal_caret: true,
            scroll: None,
            reason: ChangeReason::NotSet,
        }
    }
}

/// Grapheme boundaries of `text` as character columns, including 0 and the length.
fn grapheme_columns(text: &str) -> Vec<usize> {
    let mut columns = vec![0];
    let mut column = 0;
    for grapheme in text.graphemes(true) {
        column += grapheme.chars().count();
        columns.push(column);
    }
    columns
}

fn prev_grapheme_column(text: &str, column: usize) -> usize {
    let columns = grapheme_columns(text);
    columns
        .iter()
        .copied()
        .filter(|&c| c < column)
        .next_back()
        .unwrap_or(0)
}

fn next_grapheme_column(text: &str, column: usize) -> usize {
    let columns = grapheme_columns(text);
    columns
        .iter()
        .copied()
        .find(|&c| c > column)
        .unwrap_or_else(|| text.chars().count())
}

fn line_len(buffer: &TextBuffer, line: usize) -> usize {
    buffer.line_len(line).unwrap_or(0)
}

fn caret_after_move(selection: Selection, target: Position, extend: bool) -> Selection {
    if extend {
        Selection::new(selection.selection_start, target)
    } else {
        Selection::cursor(target)
    }
}

pub(crate) fn move_left(
    cursor_selection: Selection,
    buffer: &TextBuffer,
    extend: bool,
) -> PerCursorResult {
    // Collapsing a selection leftwards lands on its start.
    if !extend && !cursor_selection.is_empty() {
        return PerCursorResult::moved(Selection::cursor(cursor_selection.start()));
    }
    let pos = cursor_selection.position;
    let target = if pos.column > 0 {
        Position::new(
            pos.line,
            prev_grapheme_column(buffer.line_text(pos.line).unwrap_or(""), pos.column),
        )
    } else if pos.line > 0 {
        Position::new(pos.line - 1, line_len(buffer, pos.line - 1))
    } else {
        pos
    };
    PerCursorResult::moved(caret_after_move(cursor_selection, target, extend))
}

pub(crate) fn move_right(
    cursor_selection: Selection,
    buffer: &TextBuffer,
    extend: bool,
) -> PerCursorResult {
    if !extend && !cursor_selection.is_empty() {
        return PerCursorResult::moved(Selection::cursor(cursor_selection.end()));
    }
    let pos = cursor_selection.position;
    let len = line_len(buffer, pos.line);
    let target = if pos.column < len {
        Position::new(
            pos.line,
            next_grapheme_column(buffer.line_text(pos.line).unwrap_or(""), pos.column),
        )
    } else if pos.line + 1 < buffer.line_count() {
        Position::new(pos.line + 1, 0)
    } else {
        pos
    };
    PerCursorResult::moved(caret_after_move(cursor_selection, target, extend))
}

pub(crate) fn move_vertical(
    cursor_selection: Selection,
    desired_x: Option<usize>,
    buffer: &TextBuffer,
    layout: &ViewLayout,
    delta_view_lines: isize,
    extend: bool,
) -> PerCursorResult {
    let pos = cursor_selection.position;
    let view = layout.buffer_to_view(buffer, pos);
    let x = desired_x.unwrap_or_else(|| layout.x_at(buffer, pos));
    let total = layout.total_view_lines(buffer);
    let target_view = view
        .view_line
        .saturating_add_signed(delta_view_lines)
        .min(total.saturating_sub(1));
    let target = layout.position_for_x(buffer, target_view, x);
    let mut result = PerCursorResult::moved(caret_after_move(cursor_selection, target, extend));
    result.desired_x = DesiredX::Set(x);
    result
}

pub(crate) fn move_page(
    cursor_selection: Selection,
    desired_x: Option<usize>,
    buffer: &TextBuffer,
    layout: &ViewLayout,
    direction: isize,
    extend: bool,
) -> PerCursorResult {
    let delta = direction * layout.page_size() as isize;
    let mut result = move_vertical(cursor_selection, desired_x, buffer, layout, delta, extend);
    result.scroll = Some(ScrollRequest { view_lines: delta });
    result
}

pub(crate) fn move_to_line_start(cursor_selection: Selection, extend: bool) -> PerCursorResult {
    let target = Position::new(cursor_selection.position.line, 0);
    PerCursorResult::moved(caret_after_move(cursor_selection, target, extend))
}

pub(crate) fn move_to_line_end(
    cursor_selection: Selection,
    buffer: &TextBuffer,
    extend: bool,
) -> PerCursorResult {
    let line = cursor_selection.position.line;
    let target = Position::new(line, line_len(buffer, line));
    PerCursorResult::moved(caret_after_move(cursor_selection, target, extend))
}

pub(crate) fn move_word_left(
    cursor_selection: Selection,
    buffer: &TextBuffer,
    config: &LanguageConfig,
    extend: bool,
) -> PerCursorResult {
    let pos = cursor_selection.position;
    let target = if pos.column == 0 {
        if pos.line > 0 {
            Position::new(pos.line - 1, line_len(buffer, pos.line - 1))
        } else {
            pos
        }
    } else {
        let text = buffer.line_text(pos.line).unwrap_or("");
        let column = config
            .word_spans(text)
            .iter()
            .rev()
            .find(|span| span.start < pos.column)
            .map(|span| span.start)
            .unwrap_or(0);
        Position::new(pos.line, column)
    };
    PerCursorResult::moved(caret_after_move(cursor_selection, target, extend))
}

pub(crate) fn move_word_right(
    cursor_selection: Selection,
    buffer: &TextBuffer,
    config: &LanguageConfig,
    extend: bool,
) -> PerCursorResult {
    let pos = cursor_selection.position;
    let len = line_len(buffer, pos.line);
    let target = if pos.column >= len {
        if pos.line + 1 < buffer.line_count() {
            Position::new(pos.line + 1, 0)
        } else {
            pos
        }
    } else {
        let text = buffer.line_text(pos.line).unwrap_or("");
        let column = config
            .word_spans(text)
            .iter()
            .find(|span| span.end > pos.column)
            .map(|span| span.end)
            .unwrap_or(len);
        Position::new(pos.line, column)
    };
    PerCursorResult::moved(caret_after_move(cursor_selection, target, extend))
}

/// Leading whitespace of `line`, as text.
fn leading_whitespace(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, ch)| !ch.is_whitespace())
        .map(|(b, _)| b)
        .unwrap_or(text.len());
    &text[..end]
}

fn enter_text(buffer: &TextBuffer, at: Position, config: &LanguageConfig) -> String {
    let line = buffer.line_text(at.line).unwrap_or("");
    let mut indent = leading_whitespace(line).to_string();
    let before_caret: String = line.chars().take(at.column).collect();
    if let Some(last) = before_caret.trim_end().chars().next_back()
        && config.increases_indent_after(last)
    {
        indent.push_str(config.indent_unit());
    }
    let mut text = String::with_capacity(indent.len() + 1);
    text.push('\n');
    text.push_str(&indent);
    text
}

pub(crate) fn type_text(
    cursor_selection: Selection,
    buffer: &TextBuffer,
    config: &LanguageConfig,
    text: &str,
) -> PerCursorResult {
    let range = cursor_selection.range();

    if text == "\n" {
        return PerCursorResult::edited(ProposedEdit::replace(
            range,
            enter_text(buffer, range.start, config),
        ));
    }

    // Auto-close a typed open bracket when the caret is not directly before word text
    // (and not before the pair's own closing character, which would double it).
    let mut chars = text.chars();
    if let (Some(ch), None) = (chars.next(), chars.next())
        && cursor_selection.is_empty()
        && let Some(pair) = config.bracket_for_open(ch)
    {
        let next = buffer.char_at(cursor_selection.position);
        let closes_cleanly =
            next.is_none_or(|n| !config.is_word_char(n) && n != pair.close);
        if closes_cleanly {
            let mut inserted = String::new();
            inserted.push(pair.open);
            inserted.push(pair.close);
            let mut edit = ProposedEdit::replace(range, inserted);
            edit.caret_back = 1;
            return PerCursorResult::edited(edit);
        }
    }

    PerCursorResult::edited(ProposedEdit::replace(range, text))
}

pub(crate) fn paste_segment(cursor_selection: Selection, text: &str) -> PerCursorResult {
    let mut edit = ProposedEdit::replace(cursor_selection.range(), text);
    edit.force_move_markers = true;
    PerCursorResult::edited(edit)
}

pub(crate) fn backspace(cursor_selection: Selection, buffer: &TextBuffer) -> PerCursorResult {
    if !cursor_selection.is_empty() {
        return PerCursorResult::edited(ProposedEdit::replace(cursor_selection.range(), ""));
    }
    let pos = cursor_selection.position;
    let range = if pos.column > 0 {
        let column = prev_grapheme_column(buffer.line_text(pos.line).unwrap_or(""), pos.column);
        Range::new(Position::new(pos.line, column), pos)
    } else if pos.line > 0 {
        Range::new(Position::new(pos.line - 1, line_len(buffer, pos.line - 1)), pos)
    } else {
        return PerCursorResult::unchanged();
    };
    PerCursorResult::edited(ProposedEdit::replace(range, ""))
}

pub(crate) fn delete_forward(cursor_selection: Selection, buffer: &TextBuffer) -> PerCursorResult {
    if !cursor_selection.is_empty() {
        return PerCursorResult::edited(ProposedEdit::replace(cursor_selection.range(), ""));
    }
    let pos = cursor_selection.position;
    let len = line_len(buffer, pos.line);
    let range = if pos.column < len {
        let column = next_grapheme_column(buffer.line_text(pos.line).unwrap_or(""), pos.column);
        Range::new(pos, Position::new(pos.line, column))
    } else if pos.line + 1 < buffer.line_count() {
        Range::new(pos, Position::new(pos.line + 1, 0))
    } else {
        return PerCursorResult::unchanged();
    };
    PerCursorResult::edited(ProposedEdit::replace(range, ""))
}

pub(crate) fn delete_word_left(
    cursor_selection: Selection,
    buffer: &TextBuffer,
    config: &LanguageConfig,
) -> PerCursorResult {
    if !cursor_selection.is_empty() {
        return PerCursorResult::edited(ProposedEdit::replace(cursor_selection.range(), ""));
    }
    let moved = move_word_left(cursor_selection, buffer, config, false);
    let target = moved.selection.map(|s| s.position).unwrap_or(cursor_selection.position);
    if target == cursor_selection.position {
        return PerCursorResult::unchanged();
    }
    PerCursorResult::edited(ProposedEdit::replace(
        Range::new(target, cursor_selection.position),
        "",
    ))
}

pub(crate) fn delete_word_right(
    cursor_selection: Selection,
    buffer: &TextBuffer,
    config: &LanguageConfig,
) -> PerCursorResult {
    if !cursor_selection.is_empty() {
        return PerCursorResult::edited(ProposedEdit::replace(cursor_selection.range(), ""));
    }
    let moved = move_word_right(cursor_selection, buffer, config, false);
    let target = moved.selection.map(|s| s.position).unwrap_or(cursor_selection.position);
    if target == cursor_selection.position {
        return PerCursorResult::unchanged();
    }
    PerCursorResult::edited(ProposedEdit::replace(
        Range::new(cursor_selection.position, target),
        "",
    ))
}

/// Expand a column (box) selection into one selection per line, clamped to line ends.
/// Returns the selections in line order plus the index of the active-corner line.
pub(crate) fn column_selections(
    buffer: &TextBuffer,
    anchor: Position,
    active: Position,
) -> (Vec<Selection>, usize) {
    let first = anchor.line.min(active.line).min(buffer.line_count() - 1);
    let last = anchor.line.max(active.line).min(buffer.line_count() - 1);
    let mut selections = Vec::with_capacity(last - first + 1);
    for line in first..=last {
        let len = line_len(buffer, line);
        let start = Position::new(line, anchor.column.min(len));
        let end = Position::new(line, active.column.min(len));
        selections.push(Selection::new(start, end));
    }
    let active_line = active.line.min(last).max(first);
    (selections, active_line - first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_collapses_selection_without_extend() {
        let buffer = TextBuffer::from_text("abcdef");
        let selection = Selection::new(Position::new(0, 2), Position::new(0, 5));
        let result = move_left(selection, &buffer, false);
        assert_eq!(result.selection, Some(Selection::cursor(Position::new(0, 2))));
    }

    #[test]
    fn horizontal_movement_is_grapheme_aware() {
        // "e" followed by a combining acute accent is one grapheme, two chars.
        let buffer = TextBuffer::from_text("e\u{301}x");
        let result = move_right(Selection::cursor(Position::new(0, 0)), &buffer, false);
        assert_eq!(result.selection.unwrap().position, Position::new(0, 2));
        let result = move_left(Selection::cursor(Position::new(0, 2)), &buffer, false);
        assert_eq!(result.selection.unwrap().position, Position::new(0, 0));
    }

    #[test]
    fn word_right_stops_at_word_ends() {
        let buffer = TextBuffer::from_text("foo bar-baz");
        let config = LanguageConfig::plain("plaintext");
        let result = move_word_right(Selection::cursor(Position::new(0, 0)), &buffer, &config, false);
        assert_eq!(result.selection.unwrap().position, Position::new(0, 3));
        let result = move_word_right(Selection::cursor(Position::new(0, 3)), &buffer, &config, false);
        assert_eq!(result.selection.unwrap().position, Position::new(0, 7));
    }

    #[test]
    fn typing_open_bracket_auto_closes_before_non_word() {
        let buffer = TextBuffer::from_text("x ");
        let config = LanguageConfig::c_like("rust");
        let result = type_text(Selection::cursor(Position::new(0, 2)), &buffer, &config, "(");
        let edit = result.edit.unwrap();
        assert_eq!(edit.text, "()");
        assert_eq!(edit.caret_back, 1);
    }

    #[test]
    fn typing_open_bracket_before_word_stays_plain() {
        let buffer = TextBuffer::from_text("word");
        let config = LanguageConfig::c_like("rust");
        let result = type_text(Selection::cursor(Position::new(0, 0)), &buffer, &config, "(");
        assert_eq!(result.edit.unwrap().text, "(");
    }

    #[test]
    fn enter_inherits_indentation_and_grows_after_brace() {
        let buffer = TextBuffer::from_text("    if x {");
        let config = LanguageConfig::c_like("rust");
        let result = type_text(Selection::cursor(Position::new(0, 10)), &buffer, &config, "\n");
        assert_eq!(result.edit.unwrap().text, "\n        ");
    }

    #[test]
    fn backspace_at_buffer_start_is_a_noop() {
        let buffer = TextBuffer::from_text("abc");
        let result = backspace(Selection::cursor(Position::new(0, 0)), &buffer);
        assert!(result.edit.is_none());
        assert!(result.selection.is_none());
    }

    #[test]
    fn column_selections_clamp_to_line_ends() {
        let buffer = TextBuffer::from_text("abcdef\nab\nabcd");
        let (selections, active_index) =
            column_selections(&buffer, Position::new(0, 1), Position::new(2, 4));
        assert_eq!(selections.len(), 3);
        assert_eq!(selections[1].selection_start, Position::new(1, 1));
        assert_eq!(selections[1].position, Position::new(1, 2));
        assert_eq!(active_index, 2);
    }
}
