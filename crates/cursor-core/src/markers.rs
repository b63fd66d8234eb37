//! Per-line position markers.
//!
//! A marker is a lightweight anchor inside one logical line: a character column plus a
//! stickiness flag. Markers survive arbitrary edits to the owning line; the adjustment
//! rules below are what makes tracked selections land on the right side of concurrent
//! insertions instead of "eating" or duplicating characters at cursor boundaries.
//!
//! Adjustment rules for `replace(start, end, new_len)`:
//!
//! - Pure insertion (`start == end`): markers exactly at `start` stay put when
//!   `sticks_to_previous_character` is `true` (they attach to the character on their
//!   left) and move past the inserted text when `false`. A force-move edit moves them
//!   regardless. Markers after `start` always shift right.
//! - Replacement/deletion (`start < end`): markers strictly inside the range collapse
//!   to `start`; markers at or past `end` shift by the length delta; markers at or
//!   before `start` are untouched.
//!
//! On `split(column)` markers before the split column stay (markers exactly at it stay
//! only under a force-move split), the rest move to the new line rebased by the split
//! column. On `append`, incoming markers are rebased by the receiving line's length.

/// Stable identifier for a marker, unique within one buffer.
pub type MarkerId = u64;

/// A tracked position within a single logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMarker {
    /// Identifier handed out by the owning buffer.
    pub id: MarkerId,
    /// Character column within the line.
    pub column: usize,
    /// Resolves an insertion exactly at the marker's column: `true` keeps the marker
    /// before the inserted text, `false` moves it after.
    pub sticks_to_previous_character: bool,
}

/// Ordered list of markers on one line (non-decreasing column order).
#[derive(Debug, Clone, Default)]
pub struct MarkerList {
    markers: Vec<LineMarker>,
}

impl MarkerList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// All markers, in non-decreasing column order.
    pub fn markers(&self) -> &[LineMarker] {
        &self.markers
    }

    /// Returns `true` if the list holds no markers.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Insert a marker, keeping column order. Among equal columns the new marker goes last.
    pub fn insert(&mut self, marker: LineMarker) {
        let at = self
            .markers
            .partition_point(|m| m.column <= marker.column);
        self.markers.insert(at, marker);
    }

    /// Remove a marker by id.
    pub fn remove(&mut self, id: MarkerId) -> Option<LineMarker> {
        let at = self.markers.iter().position(|m| m.id == id)?;
        Some(self.markers.remove(at))
    }

    /// Look up a marker by id.
    pub fn get(&self, id: MarkerId) -> Option<&LineMarker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Adjust markers for `replace(start, end, new_text)` on the owning line, where
    /// `new_len` is `new_text`'s length in characters.
    pub fn adjust_for_replace(
        &mut self,
        start: usize,
        end: usize,
        new_len: usize,
        force_move: bool,
    ) {
        debug_assert!(start <= end);
        if start == end {
            // Pure insertion.
            for marker in &mut self.markers {
                if marker.column > start
                    || (marker.column == start
                        && (force_move || !marker.sticks_to_previous_character))
                {
                    marker.column += new_len;
                }
            }
        } else {
            let deleted = end - start;
            for marker in &mut self.markers {
                if marker.column <= start {
                    continue;
                }
                if marker.column < end {
                    marker.column = start;
                } else {
                    marker.column = marker.column + new_len - deleted;
                }
            }
        }
        // Stickiness can reorder markers that shared the insertion column.
        self.markers.sort_by_key(|m| m.column);
    }

    /// Split the line at `split_column`: markers at or past the split move to the new
    /// line, rebased by the split column. Markers exactly at the split column stay on
    /// the original line only when `force_move` is set.
    pub fn split_off(&mut self, split_column: usize, force_move: bool) -> Vec<LineMarker> {
        let mut moved = Vec::new();
        self.markers.retain_mut(|marker| {
            let stays = marker.column < split_column
                || (marker.column == split_column && force_move);
            if stays {
                true
            } else {
                moved.push(LineMarker {
                    id: marker.id,
                    column: marker.column - split_column,
                    sticks_to_previous_character: marker.sticks_to_previous_character,
                });
                false
            }
        });
        moved
    }

    /// Take markers from a line being appended to this one, rebasing each by the
    /// receiving line's pre-append length.
    pub fn append(&mut self, incoming: Vec<LineMarker>, receiver_len: usize) {
        for mut marker in incoming {
            marker.column += receiver_len;
            self.markers.push(marker);
        }
        self.markers.sort_by_key(|m| m.column);
    }
}
