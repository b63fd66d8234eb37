//! View coordinate space (soft-wrap aware).
//!
//! The cursor engine tracks every selection in two parallel spaces: buffer
//! coordinates (logical line / character column) and view coordinates (wrapped view
//! line / column within that view line). This module computes the mapping between the
//! two for a given viewport width, measuring character cells per UAX #11 with tab
//! stops.

use crate::buffer::TextBuffer;
use crate::selection::Position;
use unicode_width::UnicodeWidthChar;

/// Default tab width (in cells) used when a caller does not specify one.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Default page size (in view lines) for page movement commands.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A position in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ViewPosition {
    /// Zero-based view line (wrapped segments count individually).
    pub view_line: usize,
    /// Zero-based column in characters within the view line.
    pub column: usize,
}

impl ViewPosition {
    /// Create a view position.
    pub const fn new(view_line: usize, column: usize) -> Self {
        Self { view_line, column }
    }
}

/// Width of `ch` in cells when rendered at cell offset `x` from the line start.
pub fn cell_width_at(ch: char, x: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        tab_width - (x % tab_width)
    } else {
        UnicodeWidthChar::width(ch).unwrap_or(0)
    }
}

/// Soft-wrap layout parameters plus buffer/view coordinate conversion.
#[derive(Debug, Clone, Copy)]
pub struct ViewLayout {
    viewport_width: usize,
    tab_width: usize,
    page_size: usize,
}

impl ViewLayout {
    /// Create a layout for `viewport_width` cells. Width `0` disables wrapping.
    pub fn new(viewport_width: usize) -> Self {
        Self {
            viewport_width,
            tab_width: DEFAULT_TAB_WIDTH,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// The viewport width in cells (`0` = no wrapping).
    pub fn viewport_width(&self) -> usize {
        self.viewport_width
    }

    /// Change the viewport width.
    pub fn set_viewport_width(&mut self, width: usize) {
        self.viewport_width = width;
    }

    /// The tab width in cells.
    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    /// Change the tab width (must be greater than 0).
    pub fn set_tab_width(&mut self, width: usize) {
        if width > 0 {
            self.tab_width = width;
        }
    }

    /// The page size in view lines.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Change the page size (must be greater than 0).
    pub fn set_page_size(&mut self, lines: usize) {
        if lines > 0 {
            self.page_size = lines;
        }
    }

    /// Character indices within `text` where a new view line starts.
    pub fn wrap_points(&self, text: &str) -> Vec<usize> {
        let mut points = Vec::new();
        if self.viewport_width == 0 {
            return points;
        }
        let mut x = 0usize;
        let mut segment_start_x = 0usize;
        for (i, ch) in text.chars().enumerate() {
            let w = cell_width_at(ch, x, self.tab_width);
            if x - segment_start_x + w > self.viewport_width && x > segment_start_x {
                points.push(i);
                segment_start_x = x;
            }
            x += w;
        }
        points
    }

    /// Number of view lines `text` occupies.
    pub fn view_line_count_of(&self, text: &str) -> usize {
        self.wrap_points(text).len() + 1
    }

    /// Total view lines in the buffer.
    pub fn total_view_lines(&self, buffer: &TextBuffer) -> usize {
        (0..buffer.line_count())
            .map(|line| self.view_line_count_of(buffer.line_text(line).unwrap_or("")))
            .sum()
    }

    /// Convert a buffer position to view coordinates.
    pub fn buffer_to_view(&self, buffer: &TextBuffer, pos: Position) -> ViewPosition {
        let pos = buffer.clamp_position(pos);
        let mut view_line = 0usize;
        for line in 0..pos.line {
            view_line += self.view_line_count_of(buffer.line_text(line).unwrap_or(""));
        }
        let text = buffer.line_text(pos.line).unwrap_or("");
        let wrap_points = self.wrap_points(text);
        let segment = wrap_points.partition_point(|&w| w <= pos.column);
        let segment_start = if segment == 0 { 0 } else { wrap_points[segment - 1] };
        ViewPosition::new(view_line + segment, pos.column - segment_start)
    }

    /// Convert a view position back to buffer coordinates, clamping to valid text.
    pub fn view_to_buffer(&self, buffer: &TextBuffer, view: ViewPosition) -> Position {
        let (line, segment) = self.locate_view_line(buffer, view.view_line);
        let text = buffer.line_text(line).unwrap_or("");
        let (start, end) = self.segment_bounds(text, segment);
        Position::new(line, (start + view.column).min(end))
    }

    /// The cell offset of the caret within its view line.
    pub fn x_at(&self, buffer: &TextBuffer, pos: Position) -> usize {
        let pos = buffer.clamp_position(pos);
        let text = buffer.line_text(pos.line).unwrap_or("");
        let wrap_points = self.wrap_points(text);
        let segment = wrap_points.partition_point(|&w| w <= pos.column);
        let segment_start = if segment == 0 { 0 } else { wrap_points[segment - 1] };
        let mut x = 0usize;
        let mut segment_x = 0usize;
        for (i, ch) in text.chars().enumerate() {
            if i >= pos.column {
                break;
            }
            let w = cell_width_at(ch, x, self.tab_width);
            if i >= segment_start {
                segment_x += w;
            }
            x += w;
        }
        segment_x
    }

    /// The buffer position on view line `view_line` closest to cell offset `x`.
    pub fn position_for_x(&self, buffer: &TextBuffer, view_line: usize, x: usize) -> Position {
        let (line, segment) = self.locate_view_line(buffer, view_line);
        let text = buffer.line_text(line).unwrap_or("");
        let (start, end) = self.segment_bounds(text, segment);

        let mut abs_x = 0usize;
        let chars: Vec<char> = text.chars().collect();
        for &ch in chars.iter().take(start) {
            abs_x += cell_width_at(ch, abs_x, self.tab_width);
        }
        let mut segment_x = 0usize;
        for (i, &ch) in chars.iter().enumerate().take(end).skip(start) {
            let w = cell_width_at(ch, abs_x, self.tab_width);
            if segment_x + w > x {
                // Snap to the nearer edge of the cell.
                return Position::new(line, if x - segment_x < (segment_x + w) - x { i } else { i + 1 });
            }
            segment_x += w;
            abs_x += w;
        }
        Position::new(line, end)
    }

    /// Map a global view line to `(logical_line, segment_within_line)`, clamped.
    fn locate_view_line(&self, buffer: &TextBuffer, view_line: usize) -> (usize, usize) {
        let mut remaining = view_line;
        for line in 0..buffer.line_count() {
            let count = self.view_line_count_of(buffer.line_text(line).unwrap_or(""));
            if remaining < count {
                return (line, remaining);
            }
            remaining -= count;
        }
        let last = buffer.line_count() - 1;
        let count = self.view_line_count_of(buffer.line_text(last).unwrap_or(""));
        (last, count - 1)
    }

    /// Character bounds of `segment` within `text`.
    fn segment_bounds(&self, text: &str, segment: usize) -> (usize, usize) {
        let wrap_points = self.wrap_points(text);
        let len = text.chars().count();
        let start = if segment == 0 {
            0
        } else {
            wrap_points[(segment - 1).min(wrap_points.len() - 1)]
        };
        let end = wrap_points.get(segment).copied().unwrap_or(len);
        (start, end.min(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_wrapping_when_width_is_zero() {
        let layout = ViewLayout::new(0);
        assert!(layout.wrap_points("a very long line of text").is_empty());
    }

    #[test]
    fn wraps_at_viewport_width() {
        let layout = ViewLayout::new(4);
        assert_eq!(layout.wrap_points("abcdefghij"), vec![4, 8]);
        assert_eq!(layout.view_line_count_of("abcdefghij"), 3);
    }

    #[test]
    fn wide_characters_wrap_earlier() {
        let layout = ViewLayout::new(4);
        // CJK characters are two cells wide.
        assert_eq!(layout.wrap_points("你好世界"), vec![2]);
    }

    #[test]
    fn buffer_view_round_trip() {
        let buffer = TextBuffer::from_text("abcdefghij\nxy");
        let layout = ViewLayout::new(4);
        let view = layout.buffer_to_view(&buffer, Position::new(0, 6));
        assert_eq!(view, ViewPosition::new(1, 2));
        assert_eq!(layout.view_to_buffer(&buffer, view), Position::new(0, 6));
        // Line 1 starts after the three wrapped segments of line 0.
        let view = layout.buffer_to_view(&buffer, Position::new(1, 1));
        assert_eq!(view, ViewPosition::new(3, 1));
    }

    #[test]
    fn tab_advances_to_next_stop() {
        let layout = ViewLayout::new(0);
        let buffer = TextBuffer::from_text("\tx");
        assert_eq!(layout.x_at(&buffer, Position::new(0, 1)), 4);
        assert_eq!(layout.x_at(&buffer, Position::new(0, 2)), 5);
    }

    #[test]
    fn position_for_x_snaps_to_nearest_cell_edge() {
        let layout = ViewLayout::new(0);
        let buffer = TextBuffer::from_text("abcd");
        assert_eq!(layout.position_for_x(&buffer, 0, 2), Position::new(0, 2));
        assert_eq!(layout.position_for_x(&buffer, 0, 99), Position::new(0, 4));
    }
}
