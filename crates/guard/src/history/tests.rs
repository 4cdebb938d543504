use super::*;
use crate::batch::ActionKind;

fn text(s: &str) -> Fragment {
	Fragment::Text(s.into())
}

/// Applies a user batch and records it.
fn user(doc: &mut Document, history: &mut UndoHistory, steps: Vec<Step>) {
	let batch = MutationBatch::user(steps);
	let entry = HistoryEntry::inverse_of(&batch, doc);
	let changes = doc.apply(&batch).unwrap();
	history.record(entry, &changes);
}

/// Applies an agent batch, which only shifts the log.
fn agent(doc: &mut Document, history: &mut UndoHistory, steps: Vec<Step>) {
	let changes = doc.apply(&MutationBatch::agent(ActionKind::Delete, steps)).unwrap();
	history.map_through(&changes);
}

fn undo(doc: &mut Document, history: &mut UndoHistory) {
	let batch = history.peek_undo().unwrap().to_batch();
	let inverse = HistoryEntry::inverse_of(&batch, doc);
	let changes = doc.apply(&batch).unwrap();
	history.finish_undo(inverse, &changes);
}

fn redo(doc: &mut Document, history: &mut UndoHistory) {
	let batch = history.peek_redo().unwrap().to_batch();
	let inverse = HistoryEntry::inverse_of(&batch, doc);
	let changes = doc.apply(&batch).unwrap();
	history.finish_redo(inverse, &changes);
}

#[test]
fn inverse_of_replace_restores_text() {
	let doc = Document::from_plain_text("hello world");
	let batch = MutationBatch::user(vec![Step::replace(0..5, text("hi"))]);
	let entry = HistoryEntry::inverse_of(&batch, &doc);
	assert_eq!(entry.steps(), &[Step::replace(0..2, text("hello"))]);
}

#[test]
fn inverse_uses_post_batch_coordinates() {
	let mut doc = Document::from_plain_text("abcdef");
	let batch = MutationBatch::user(vec![Step::delete(1..2), Step::insert(4, text("XY"))]);
	let entry = HistoryEntry::inverse_of(&batch, &doc);
	doc.apply(&batch).unwrap();
	assert_eq!(doc.text().to_string(), "acdXYef");
	doc.apply(&entry.to_batch()).unwrap();
	assert_eq!(doc.text().to_string(), "abcdef");
}

#[test]
fn replay_batches_are_history_exempt() {
	let entry = HistoryEntry::inverse_of(
		&MutationBatch::user(vec![Step::insert(0, text("x"))]),
		&Document::new(),
	);
	assert!(entry.to_batch().meta().history_exempt);
}

#[test]
fn undo_skips_agent_edits() {
	let mut doc = Document::from_plain_text("0123456789");
	let mut history = UndoHistory::default();

	user(&mut doc, &mut history, vec![Step::insert(0, text("A"))]);
	agent(&mut doc, &mut history, vec![Step::delete(5..7)]);
	user(&mut doc, &mut history, vec![Step::insert(9, text("B"))]);
	assert_eq!(doc.text().to_string(), "A01236789B");
	assert_eq!(history.undo_len(), 2);

	undo(&mut doc, &mut history);
	assert_eq!(doc.text().to_string(), "A01236789");
	undo(&mut doc, &mut history);
	assert_eq!(doc.text().to_string(), "01236789");
	assert!(!history.can_undo());

	redo(&mut doc, &mut history);
	assert_eq!(doc.text().to_string(), "A01236789");
}

#[test]
fn agent_insert_at_entry_edge_is_not_swallowed() {
	let mut doc = Document::from_plain_text("abc");
	let mut history = UndoHistory::default();
	user(&mut doc, &mut history, vec![Step::insert(3, text("XYZ"))]);
	agent(&mut doc, &mut history, vec![Step::insert(6, text("!!"))]);
	agent(&mut doc, &mut history, vec![Step::insert(3, text("<"))]);
	assert_eq!(doc.text().to_string(), "abc<XYZ!!");
	undo(&mut doc, &mut history);
	assert_eq!(doc.text().to_string(), "abc<!!");
}

#[test]
fn entry_collapses_when_its_text_is_gone() {
	let mut doc = Document::from_plain_text("hello");
	let mut history = UndoHistory::default();
	user(&mut doc, &mut history, vec![Step::insert(0, text("XYZ"))]);
	agent(&mut doc, &mut history, vec![Step::delete(0..5)]);
	assert!(!history.can_undo());
}

#[test]
fn new_edit_clears_redo() {
	let mut doc = Document::from_plain_text("abc");
	let mut history = UndoHistory::default();
	user(&mut doc, &mut history, vec![Step::insert(0, text("1"))]);
	undo(&mut doc, &mut history);
	assert!(history.can_redo());
	user(&mut doc, &mut history, vec![Step::insert(0, text("2"))]);
	assert!(!history.can_redo());
}

#[test]
fn size_limit_drops_oldest() {
	let mut doc = Document::new();
	let mut history = UndoHistory::new(2);
	for ch in ["a", "b", "c"] {
		let end = doc.size();
		user(&mut doc, &mut history, vec![Step::insert(end, text(ch))]);
	}
	assert_eq!(history.undo_len(), 2);
	undo(&mut doc, &mut history);
	undo(&mut doc, &mut history);
	assert_eq!(doc.text().to_string(), "a");
	assert!(!history.can_undo());
}

#[test]
fn agent_insert_inside_entry_splits_it() {
	let mut doc = Document::new();
	let mut history = UndoHistory::default();
	user(&mut doc, &mut history, vec![Step::insert(0, text("Hello"))]);
	user(&mut doc, &mut history, vec![Step::insert(5, text(" world"))]);
	agent(&mut doc, &mut history, vec![Step::insert(8, text("X"))]);
	assert_eq!(doc.text().to_string(), "Hello woXrld");
	assert_eq!(
		history.peek_undo().unwrap().steps(),
		&[Step::delete(5..8), Step::delete(9..12)]
	);

	undo(&mut doc, &mut history);
	assert_eq!(doc.text().to_string(), "HelloX");
	redo(&mut doc, &mut history);
	assert_eq!(doc.text().to_string(), "Hello woXrld");

	undo(&mut doc, &mut history);
	undo(&mut doc, &mut history);
	assert_eq!(doc.text().to_string(), "X");
	assert!(!history.can_undo());
}
