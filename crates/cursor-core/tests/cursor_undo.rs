use cursor_core::{
    ChangeReason, CommandOutcome, CommandSource, CursorCommand, CursorController, Position,
    CURSOR_UNDO_LIMIT,
};

fn api(controller: &mut CursorController, command: CursorCommand) -> CommandOutcome {
    controller.execute(command, CommandSource::Api).unwrap()
}

fn tall_buffer() -> String {
    (0..100)
        .map(|i| format!("line{i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_cursor_undo_restores_the_previous_selection() {
    let text = tall_buffer();
    let mut controller = CursorController::new(&text, 0);
    api(&mut controller, CursorCommand::MoveDown { extend: false });
    api(&mut controller, CursorCommand::MoveDown { extend: false });
    assert_eq!(controller.primary_position(), Position::new(2, 0));

    let outcome = api(&mut controller, CursorCommand::CursorUndo);
    assert_eq!(controller.primary_position(), Position::new(1, 0));
    assert_eq!(
        outcome.selection_changed.unwrap().reason,
        ChangeReason::Undo
    );

    api(&mut controller, CursorCommand::CursorUndo);
    assert_eq!(controller.primary_position(), Position::new(0, 0));
}

#[test]
fn test_cursor_undo_restores_a_multi_cursor_set() {
    let mut controller = CursorController::new("abc\ndef", 0);
    api(&mut controller, CursorCommand::AddCursorAt {
        position: Position::new(1, 1),
    });
    assert_eq!(controller.cursor_count(), 2);

    api(&mut controller, CursorCommand::CursorUndo);
    assert_eq!(controller.cursor_count(), 1);
    assert_eq!(controller.primary_position(), Position::new(0, 0));
}

#[test]
fn test_stack_is_capped_and_drops_the_oldest_snapshots() {
    let text = tall_buffer();
    let mut controller = CursorController::new(&text, 0);
    for _ in 0..60 {
        api(&mut controller, CursorCommand::MoveDown { extend: false });
    }
    assert_eq!(controller.primary_position(), Position::new(60, 0));

    for _ in 0..CURSOR_UNDO_LIMIT {
        let outcome = api(&mut controller, CursorCommand::CursorUndo);
        assert!(outcome.selection_changed.is_some());
    }
    // 60 snapshots were pushed but only the newest 50 were kept.
    assert_eq!(controller.primary_position(), Position::new(10, 0));

    let outcome = api(&mut controller, CursorCommand::CursorUndo);
    assert!(outcome.is_empty());
    assert_eq!(controller.primary_position(), Position::new(10, 0));
}

#[test]
fn test_edits_clear_the_stack() {
    let text = tall_buffer();
    let mut controller = CursorController::new(&text, 0);
    api(&mut controller, CursorCommand::MoveDown { extend: false });
    api(&mut controller, CursorCommand::TypeText {
        text: "x".to_string(),
    });
    let caret = controller.primary_position();

    let outcome = api(&mut controller, CursorCommand::CursorUndo);
    assert!(outcome.is_empty());
    assert_eq!(controller.primary_position(), caret);
}

#[test]
fn test_noop_commands_push_nothing() {
    let mut controller = CursorController::new("abc", 0);
    // At the buffer start nothing moves, so there is nothing to undo.
    api(&mut controller, CursorCommand::MoveLeft { extend: false });
    api(&mut controller, CursorCommand::MoveUp { extend: false });

    let outcome = api(&mut controller, CursorCommand::CursorUndo);
    assert!(outcome.is_empty());
}
