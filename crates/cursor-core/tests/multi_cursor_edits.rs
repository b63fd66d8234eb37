use cursor_core::{
    apply_edits, resolve, CommandSource, CursorCommand, CursorController, EditOperation,
    Position, Range, Selection, TextBuffer,
};
use pretty_assertions::assert_eq;

fn op(owner: usize, start: (usize, usize), end: (usize, usize), text: &str) -> EditOperation {
    EditOperation {
        owner,
        sequence: 0,
        range: Range::new(
            Position::new(start.0, start.1),
            Position::new(end.0, end.1),
        ),
        text: text.to_string(),
        force_move_markers: false,
    }
}

fn api(controller: &mut CursorController, command: CursorCommand) {
    controller.execute(command, CommandSource::Api).unwrap();
}

#[test]
fn test_overlap_purges_the_later_cursor_whole() {
    // [2,4) and [3,5) overlap on "abcdef"; the higher owner loses all operations.
    let resolution = resolve(vec![
        op(0, (0, 2), (0, 4), "X"),
        op(1, (0, 3), (0, 5), "Y"),
    ])
    .unwrap();

    assert_eq!(resolution.operations.len(), 1);
    assert_eq!(resolution.operations[0].owner, 0);
    assert!(resolution.losing_owners.contains(&1));

    let mut buffer = TextBuffer::from_text("abcdef");
    apply_edits(&mut buffer, resolution.operations).unwrap();
    assert_eq!(buffer.text(), "abXef");
}

#[test]
fn test_purging_one_owner_drops_its_non_conflicting_operations_too() {
    // Owner 1's second operation never conflicts, but a losing cursor applies
    // nothing at all.
    let resolution = resolve(vec![
        op(0, (0, 2), (0, 4), "X"),
        op(1, (0, 3), (0, 5), "Y"),
        op(1, (0, 8), (0, 9), "Z"),
    ])
    .unwrap();

    assert_eq!(resolution.operations.len(), 1);
    assert!(resolution.operations.iter().all(|o| o.owner == 0));
}

#[test]
fn test_primary_cursor_conflict_aborts_the_batch() {
    assert!(resolve(vec![
        op(0, (0, 2), (0, 4), "X"),
        op(0, (0, 3), (0, 5), "Y"),
    ])
    .is_none());
}

#[test]
fn test_losing_cursor_is_dropped_from_the_selection_set() {
    // Two carets inside the same word both delete back to the word start; the
    // ranges overlap, so the later-created cursor loses whole and does not
    // survive the command.
    let mut controller = CursorController::new("hello world", 0);
    api(&mut controller, CursorCommand::MoveTo {
        position: Position::new(0, 5),
        extend: false,
    });
    api(&mut controller, CursorCommand::AddCursorAt {
        position: Position::new(0, 3),
    });
    assert_eq!(controller.cursor_count(), 2);

    api(&mut controller, CursorCommand::DeleteWordLeft);

    assert_eq!(controller.text(), " world");
    assert_eq!(controller.cursor_count(), 1);
    assert_eq!(controller.primary_position(), Position::new(0, 0));
}

#[test]
fn test_multi_cursor_typing_inserts_at_every_caret() {
    let mut controller = CursorController::new("one\ntwo\nthree", 0);
    api(&mut controller, CursorCommand::AddCursorAt {
        position: Position::new(1, 0),
    });
    api(&mut controller, CursorCommand::AddCursorAt {
        position: Position::new(2, 0),
    });
    api(&mut controller, CursorCommand::TypeText {
        text: "# ".to_string(),
    });

    assert_eq!(controller.text(), "# one\n# two\n# three");
    assert_eq!(
        controller.selections(),
        vec![
            Selection::cursor(Position::new(0, 2)),
            Selection::cursor(Position::new(1, 2)),
            Selection::cursor(Position::new(2, 2)),
        ]
    );
}

#[test]
fn test_non_editing_cursor_rides_through_other_cursors_edits() {
    // The cursor at the buffer start cannot backspace; it must still end up in the
    // right place after the other cursors delete characters before it on its line.
    let mut controller = CursorController::new("abc\ndef", 0);
    api(&mut controller, CursorCommand::AddCursorAt {
        position: Position::new(1, 2),
    });
    api(&mut controller, CursorCommand::Backspace);

    assert_eq!(controller.text(), "abc\ndf");
    assert_eq!(
        controller.selections(),
        vec![
            Selection::cursor(Position::new(0, 0)),
            Selection::cursor(Position::new(1, 1)),
        ]
    );
}

#[test]
fn test_n_line_paste_distributes_across_n_cursors() {
    let mut controller = CursorController::new("x\ny\nz", 0);
    api(&mut controller, CursorCommand::AddCursorAt {
        position: Position::new(1, 1),
    });
    api(&mut controller, CursorCommand::AddCursorAt {
        position: Position::new(2, 1),
    });
    // Primary sits at (0,0); move it to its line end so insertions read naturally.
    api(&mut controller, CursorCommand::MoveToLineEnd { extend: false });

    api(&mut controller, CursorCommand::Paste {
        text: "1\n2\n3\n".to_string(),
    });

    assert_eq!(controller.text(), "x1\ny2\nz3");
}

#[test]
fn test_mismatched_paste_inserts_whole_text_at_every_cursor() {
    let mut controller = CursorController::new("a\nb", 0);
    api(&mut controller, CursorCommand::AddCursorAt {
        position: Position::new(1, 1),
    });
    api(&mut controller, CursorCommand::MoveToLineEnd { extend: false });

    api(&mut controller, CursorCommand::Paste {
        text: "123".to_string(),
    });

    assert_eq!(controller.text(), "a123\nb123");
}

#[test]
fn test_overlapping_selections_merge_before_editing() {
    let mut controller = CursorController::new("abcdef", 0);
    api(&mut controller, CursorCommand::MoveTo {
        position: Position::new(0, 1),
        extend: false,
    });
    api(&mut controller, CursorCommand::MoveTo {
        position: Position::new(0, 4),
        extend: true,
    });
    api(&mut controller, CursorCommand::AddCursorAt {
        position: Position::new(0, 2),
    });

    // The caret at (0,2) falls inside the primary selection and is merged away.
    assert_eq!(controller.cursor_count(), 1);

    api(&mut controller, CursorCommand::TypeText {
        text: "X".to_string(),
    });
    assert_eq!(controller.text(), "aXef");
}

#[test]
fn test_kill_secondary_cursors_keeps_the_primary() {
    let mut controller = CursorController::new("abc\ndef", 0);
    api(&mut controller, CursorCommand::AddCursorAt {
        position: Position::new(1, 1),
    });
    assert_eq!(controller.cursor_count(), 2);

    api(&mut controller, CursorCommand::KillSecondaryCursors);
    assert_eq!(controller.cursor_count(), 1);
    assert_eq!(controller.primary_position(), Position::new(0, 0));
}

#[test]
fn test_add_cursor_below_walks_down_the_buffer() {
    let mut controller = CursorController::new("aaaa\nbbbb\ncccc", 0);
    api(&mut controller, CursorCommand::MoveTo {
        position: Position::new(0, 2),
        extend: false,
    });
    api(&mut controller, CursorCommand::AddCursorBelow);
    api(&mut controller, CursorCommand::AddCursorBelow);

    let carets: Vec<Position> = controller
        .selections()
        .iter()
        .map(|s| s.position)
        .collect();
    assert_eq!(
        carets,
        vec![
            Position::new(0, 2),
            Position::new(1, 2),
            Position::new(2, 2),
        ]
    );
}
