#![warn(missing_docs)]
//! Cursor Core - Headless Multi-Cursor Edit Orchestration
//!
//! # Overview
//!
//! `cursor-core` is a headless multi-cursor engine: it owns the cursor collection for
//! one text buffer and turns commands (movement, typing, deletion, paste) into
//! validated, conflict-free edit batches with deterministic cursor placement. It does
//! no rendering; the upper layer feeds it commands and consumes the returned outcome.
//!
//! # Core Features
//!
//! - **Position Anchors**: per-line markers with stickiness, so selections survive
//!   edits made around them
//! - **Concurrent Edits**: every cursor proposes operations; overlaps are resolved
//!   deterministically (the later-created cursor loses whole)
//! - **All-or-Nothing Batches**: an edit batch applies completely or not at all, and
//!   returns per-cursor inverse operations for caret placement
//! - **Per-Character Typing**: keyboard text runs one pass per character, so bracket
//!   auto-closing and indentation see every keystroke
//! - **Cursor Undo**: a bounded stack of selection snapshots, restorable with one
//!   command
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  CursorController (command orchestration)   │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Commands (per-cursor operation logic)      │  ← Movement & Edit Intents
//! ├─────────────────────────────────────────────┤
//! │  Collection → Conflicts → Batch Apply       │  ← Edit Pipeline
//! ├─────────────────────────────────────────────┤
//! │  View Layout (wrapping, tabs, wide chars)   │  ← Vertical Movement
//! ├─────────────────────────────────────────────┤
//! │  Text Buffer + Line Markers                 │  ← Storage & Anchors
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use cursor_core::{CommandSource, CursorCommand, CursorController, Position};
//!
//! let mut controller = CursorController::new("fn main() {\n}\n", 0);
//!
//! // A second cursor on the second line.
//! controller.execute(
//!     CursorCommand::AddCursorAt { position: Position::new(1, 0) },
//!     CommandSource::Api,
//! )?;
//!
//! // Both cursors type at once.
//! controller.execute(
//!     CursorCommand::TypeText { text: "// ".to_string() },
//!     CommandSource::Api,
//! )?;
//!
//! assert_eq!(controller.text(), "// fn main() {\n// }\n");
//! # Ok::<(), cursor_core::CursorError>(())
//! ```

pub mod buffer;
pub mod commands;
pub mod conflicts;
pub mod controller;
pub mod cursor;
pub mod edits;
pub mod events;
pub mod layout;
pub mod markers;
pub mod selection;
pub mod undo;

pub use buffer::{EditError, TextBuffer};
pub use commands::{CommandSource, CursorCommand};
pub use conflicts::{resolve, ConflictResolution};
pub use controller::{CursorController, CursorError};
pub use cursor::{Cursor, CursorCollection, CursorState, ViewSelection};
pub use edits::{
    apply_edits, collect_operations, AppliedEdits, CollectedOperations, CursorStateComputer,
    EditOperation, EditOperationBuilder, ReverseEditOperation, TrackedSelectionToken,
    TrackedSelections,
};
pub use events::{
    ChangeReason, CommandOutcome, ContentChange, PositionChangedEvent, RevealRange,
    ScrollRequest, SelectionChangedEvent,
};
pub use layout::{ViewLayout, ViewPosition, DEFAULT_PAGE_SIZE, DEFAULT_TAB_WIDTH};
pub use markers::{LineMarker, MarkerId, MarkerList};
pub use selection::{
    normalize_selections, Position, Range, Selection, SelectionDirection,
};
pub use undo::{CursorSnapshot, CursorUndoStack, CURSOR_UNDO_LIMIT};

// Language configuration re-exported for convenience.
pub use cursor_core_lang as lang;
