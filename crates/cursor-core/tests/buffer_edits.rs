//! Batch application checked against an independent rope implementation.

use cursor_core::{apply_edits, EditOperation, Position, Range, TextBuffer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ropey::Rope;

fn position_at(text: &str, char_offset: usize) -> Position {
    let mut line = 0;
    let mut column = 0;
    for ch in text.chars().take(char_offset) {
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    Position::new(line, column)
}

fn random_text(rng: &mut StdRng) -> String {
    let lines = rng.gen_range(1..8);
    let mut text = String::new();
    for i in 0..lines {
        if i > 0 {
            text.push('\n');
        }
        let len = rng.gen_range(0..12);
        for _ in 0..len {
            text.push(rng.gen_range(b'a'..=b'z') as char);
        }
    }
    text
}

fn random_replacement(rng: &mut StdRng) -> String {
    let len = rng.gen_range(0..6);
    let mut text = String::new();
    for _ in 0..len {
        if rng.gen_bool(0.15) {
            text.push('\n');
        } else {
            text.push(rng.gen_range(b'A'..=b'Z') as char);
        }
    }
    text
}

#[test]
fn test_random_batches_agree_with_rope_oracle() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..500 {
        let text = random_text(&mut rng);
        let total = text.chars().count();
        let mut buffer = TextBuffer::from_text(&text);
        let mut rope = Rope::from_str(&text);

        // Non-overlapping ranges from distinct sorted offsets.
        let op_count = rng.gen_range(1..=4).min(total / 2 + 1);
        let mut offsets: Vec<usize> = (0..op_count * 2)
            .map(|_| rng.gen_range(0..=total))
            .collect();
        offsets.sort_unstable();
        offsets.dedup();
        let mut operations = Vec::new();
        let mut spans = Vec::new();
        for (owner, pair) in offsets.chunks(2).enumerate() {
            let (start, end) = match pair {
                [s, e] => (*s, *e),
                [s] => (*s, *s),
                _ => continue,
            };
            let replacement = random_replacement(&mut rng);
            operations.push(EditOperation {
                owner,
                sequence: 0,
                range: Range::new(position_at(&text, start), position_at(&text, end)),
                text: replacement.clone(),
                force_move_markers: false,
            });
            spans.push((start, end, replacement));
        }

        apply_edits(&mut buffer, operations).unwrap();
        for (start, end, replacement) in spans.iter().rev() {
            rope.remove(*start..*end);
            rope.insert(*start, replacement);
        }

        assert_eq!(buffer.text(), rope.to_string());
    }
}

#[test]
fn test_inverse_operations_restore_the_original_text() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let text = random_text(&mut rng);
        let total = text.chars().count();
        let mut buffer = TextBuffer::from_text(&text);

        let mut offsets: Vec<usize> = (0..4).map(|_| rng.gen_range(0..=total)).collect();
        offsets.sort_unstable();
        offsets.dedup();
        let operations: Vec<EditOperation> = offsets
            .chunks(2)
            .enumerate()
            .filter_map(|(owner, pair)| match pair {
                [s, e] => Some(EditOperation {
                    owner,
                    sequence: 0,
                    range: Range::new(position_at(&text, *s), position_at(&text, *e)),
                    text: random_replacement(&mut rng),
                    force_move_markers: false,
                }),
                _ => None,
            })
            .collect();
        if operations.is_empty() {
            continue;
        }

        let applied = apply_edits(&mut buffer, operations).unwrap();

        // Inverse ranges are expressed in post-edit coordinates, so they form a
        // valid batch against the edited buffer.
        let undo_ops: Vec<EditOperation> = applied
            .owners()
            .flat_map(|owner| applied.inverse_for(owner).to_vec())
            .map(|rev| EditOperation {
                owner: rev.owner,
                sequence: rev.sequence,
                range: rev.range,
                text: rev.replaced_text,
                force_move_markers: false,
            })
            .collect();
        apply_edits(&mut buffer, undo_ops).unwrap();

        assert_eq!(buffer.text(), text);
    }
}

#[test]
fn test_multi_line_replacement_matches_oracle() {
    let text = "alpha\nbeta\ngamma\ndelta";
    let mut buffer = TextBuffer::from_text(text);
    let mut rope = Rope::from_str(text);

    let start = 3;
    let end = 13;
    apply_edits(
        &mut buffer,
        vec![EditOperation {
            owner: 0,
            sequence: 0,
            range: Range::new(position_at(text, start), position_at(text, end)),
            text: "X\nY".to_string(),
            force_move_markers: false,
        }],
    )
    .unwrap();
    rope.remove(start..end);
    rope.insert(start, "X\nY");

    assert_eq!(buffer.text(), rope.to_string());
    assert_eq!(buffer.text(), "alpX\nYmma\ndelta");
}
