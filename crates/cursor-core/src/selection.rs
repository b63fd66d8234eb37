//! Buffer coordinates: positions, ranges, and selections.
//!
//! All coordinates are zero-based; columns count **characters** within a logical line.
//! A [`Selection`] keeps its anchor (`selection_start`) and caret (`position`) separately,
//! so a selection made right-to-left stays distinguishable from the same range made
//! left-to-right.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Position coordinates (line and column numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
}

impl Position {
    /// Create a new logical position.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.line, self.column)
    }
}

/// A half-open range of buffer positions with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Inclusive start position.
    pub start: Position,
    /// Exclusive end position.
    pub end: Position,
}

impl Range {
    /// Create a range, swapping the endpoints if given out of order.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// A collapsed range at `position`.
    pub const fn collapsed(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Returns `true` if the range covers no text.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if `pos` lies within the range (endpoints included).
    pub fn contains_position(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Returns `true` if `other` lies entirely within this range (endpoints included).
    pub fn contains_range(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if the two ranges share more than a single boundary position.
    pub fn strictly_overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

/// Selection direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDirection {
    /// The caret sits at or after the anchor.
    Forward,
    /// The caret sits before the anchor.
    Backward,
}

/// One caret plus its selection anchor.
///
/// `selection_start` is where the selection was initiated; `position` is the caret.
/// When the two are equal the selection is an empty caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// The anchor position (where the selection started).
    pub selection_start: Position,
    /// The active position (the caret).
    pub position: Position,
}

impl Selection {
    /// Create a selection from anchor and caret.
    pub const fn new(selection_start: Position, position: Position) -> Self {
        Self {
            selection_start,
            position,
        }
    }

    /// A collapsed selection (a plain caret) at `position`.
    pub const fn cursor(position: Position) -> Self {
        Self {
            selection_start: position,
            position,
        }
    }

    /// Reconstruct a selection from an ordered range and a direction.
    pub fn from_range(range: Range, direction: SelectionDirection) -> Self {
        match direction {
            SelectionDirection::Forward => Self::new(range.start, range.end),
            SelectionDirection::Backward => Self::new(range.end, range.start),
        }
    }

    /// The direction of this selection.
    pub fn direction(&self) -> SelectionDirection {
        if self.selection_start <= self.position {
            SelectionDirection::Forward
        } else {
            SelectionDirection::Backward
        }
    }

    /// The selection as an ordered range.
    pub fn range(&self) -> Range {
        Range::new(self.selection_start, self.position)
    }

    /// The smaller of anchor and caret.
    pub fn start(&self) -> Position {
        self.selection_start.min(self.position)
    }

    /// The larger of anchor and caret.
    pub fn end(&self) -> Position {
        self.selection_start.max(self.position)
    }

    /// Returns `true` if anchor and caret coincide.
    pub fn is_empty(&self) -> bool {
        self.selection_start == self.position
    }
}

/// Merge overlapping or duplicate selections, keeping the selection at `primary_index`
/// first in the result.
///
/// Secondary selections that strictly overlap an earlier selection (or duplicate it
/// exactly) are merged into it; the merged selection spans the union and keeps the
/// earlier selection's direction. Returns the surviving selections with the primary
/// at index 0.
pub fn normalize_selections(selections: &[Selection], primary_index: usize) -> Vec<Selection> {
    if selections.is_empty() {
        return Vec::new();
    }
    let primary_index = primary_index.min(selections.len() - 1);

    // Primary first, then the rest in their existing order.
    let mut ordered: Vec<Selection> = Vec::with_capacity(selections.len());
    ordered.push(selections[primary_index]);
    for (i, sel) in selections.iter().enumerate() {
        if i != primary_index {
            ordered.push(*sel);
        }
    }

    let mut merged: Vec<Selection> = Vec::with_capacity(ordered.len());
    for sel in ordered {
        let mut absorbed = false;
        for kept in &mut merged {
            let kr = kept.range();
            let sr = sel.range();
            if kr == sr || kr.strictly_overlaps(&sr) {
                let union = Range::new(kr.start.min(sr.start), kr.end.max(sr.end));
                *kept = Selection::from_range(union, kept.direction());
                absorbed = true;
                break;
            }
            // Two carets at the same position collapse to one.
            if kr.is_empty() && sr.is_empty() && kr.start == sr.start {
                absorbed = true;
                break;
            }
        }
        if !absorbed {
            merged.push(sel);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_ordering_is_line_major() {
        assert!(Position::new(0, 10) < Position::new(1, 0));
        assert!(Position::new(2, 3) < Position::new(2, 4));
    }

    #[test]
    fn range_constructor_orders_endpoints() {
        let r = Range::new(Position::new(3, 0), Position::new(1, 5));
        assert_eq!(r.start, Position::new(1, 5));
        assert_eq!(r.end, Position::new(3, 0));
    }

    #[test]
    fn selection_direction_round_trip() {
        let sel = Selection::new(Position::new(0, 5), Position::new(0, 2));
        assert_eq!(sel.direction(), SelectionDirection::Backward);
        let rebuilt = Selection::from_range(sel.range(), sel.direction());
        assert_eq!(rebuilt, sel);
    }

    #[test]
    fn normalize_merges_overlaps_and_duplicate_carets() {
        let selections = vec![
            Selection::new(Position::new(0, 0), Position::new(0, 4)),
            Selection::new(Position::new(0, 2), Position::new(0, 6)),
            Selection::cursor(Position::new(1, 0)),
            Selection::cursor(Position::new(1, 0)),
        ];
        let merged = normalize_selections(&selections, 0);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].range(), Range::new(Position::new(0, 0), Position::new(0, 6)));
        assert!(merged[1].is_empty());
    }

    #[test]
    fn normalize_puts_primary_first() {
        let selections = vec![
            Selection::cursor(Position::new(0, 0)),
            Selection::cursor(Position::new(5, 0)),
        ];
        let merged = normalize_selections(&selections, 1);
        assert_eq!(merged[0].position, Position::new(5, 0));
    }
}
