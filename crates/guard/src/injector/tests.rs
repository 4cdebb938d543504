use std::time::{Duration, Instant};

use serde_json::json;

use super::*;
use crate::document::{LockBearer, Node};
use crate::engine::{DocumentEngine, UndoOutcome};

fn engine_with(text: &str) -> DocumentEngine {
	let mut engine = DocumentEngine::default();
	engine.load_plain_text(text);
	engine
}

fn text(engine: &DocumentEngine) -> String {
	engine.document().text().to_string()
}

fn lock_at(engine: &DocumentEngine, pos: usize) -> Option<serde_json::Value> {
	engine
		.document()
		.node_at(pos)
		.and_then(|n| n.lock_attrs())
		.and_then(|a| a.get(LOCK_ID_KEY).cloned())
}

fn range(from: i64, to: i64) -> Anchor {
	Anchor::Range { from, to }
}

/// 40 characters with `L1` covering `[10, 25)`.
fn locked_engine() -> DocumentEngine {
	let attrs = json!({ "lockId": "L1" }).as_object().cloned().unwrap_or_default();
	let doc = Document::from_parts(
		&"x".repeat(40),
		vec![Node::text(0..10), Node::container(10..25, attrs), Node::text(25..40)],
	)
	.unwrap();
	DocumentEngine::with_document(doc, &crate::config::GuardConfig::default())
}

#[test]
fn inject_at_position() {
	let mut engine = engine_with(&"x".repeat(100));
	let mut injector = ContentInjector::default();
	let outcome = injector.inject_block(
		&mut engine,
		"hello",
		"L1",
		Some(&Anchor::Pos { from: 10 }),
		Some(SourceTag::AgentA),
	);

	let marked = "hello <!-- lock:L1 source:agentA -->";
	let len = marked.chars().count();
	assert_eq!(
		outcome,
		InjectOutcome::Committed {
			lock_id: Some("L1".into()),
			span: Span::new(10, 10 + len),
		}
	);
	assert_eq!(lock_at(&engine, 10), Some(json!("L1")));
	assert!(engine.registry().has("L1"));
	assert_eq!(engine.registry().source_of("L1"), Some(SourceTag::AgentA));
	assert_eq!(engine.document().slice_text(Span::new(10, 10 + len)), marked);
}

#[test]
fn unusable_anchors_fall_back_to_cursor() {
	let anchors = [
		Some(Anchor::Pos { from: 500 }),
		Some(Anchor::Pos { from: -3 }),
		Some(Anchor::LockRef {
			ref_lock_id: "L0".into(),
		}),
		None,
	];
	for (i, anchor) in anchors.iter().enumerate() {
		let mut engine = engine_with("0123456789");
		engine.set_cursor(4);
		let id = format!("L{i}");
		let outcome = ContentInjector::default().inject_block(&mut engine, "hi", &id, anchor.as_ref(), None);
		assert!(outcome.is_committed());
		assert_eq!(lock_at(&engine, 4), Some(json!(id)));
	}
}

#[test]
fn lock_reference_places_block_after_that_lock() {
	let mut engine = locked_engine();
	engine.set_cursor(3);
	let anchor = Anchor::LockRef {
		ref_lock_id: "L1".into(),
	};
	let outcome = ContentInjector::default().inject_block(&mut engine, "next", "L2", Some(&anchor), None);
	assert!(matches!(outcome, InjectOutcome::Committed { span, .. } if span.from == 25));
	assert_eq!(lock_at(&engine, 24), Some(json!("L1")));
	assert_eq!(lock_at(&engine, 25), Some(json!("L2")));
}

#[test]
fn stale_markers_are_replaced() {
	let mut engine = engine_with("");
	ContentInjector::default().inject_block(&mut engine, "hi <!-- lock:OLD -->", "L2", None, None);
	assert_eq!(text(&engine), "hi <!-- lock:L2 -->");
	assert!(!engine.registry().has("OLD"));
}

#[test]
fn blank_content_is_skipped() {
	let mut engine = engine_with("abc");
	let outcome = ContentInjector::default().inject_block(&mut engine, "  ", "L1", None, None);
	assert_eq!(outcome, InjectOutcome::Skipped(SkipReason::EmptyContent));
	assert_eq!(engine.document().version(), 0);
	assert!(!engine.registry().has("L1"));
}

#[test]
fn injected_content_is_not_undoable() {
	let mut engine = engine_with("");
	engine.type_text("draft").unwrap();
	ContentInjector::default().inject_block(&mut engine, "agent", "L1", None, None);
	assert!(matches!(engine.undo(), UndoOutcome::Applied(_)));
	assert_eq!(text(&engine), "agent <!-- lock:L1 -->");
	assert_eq!(engine.undo(), UndoOutcome::Empty);
}

#[test]
fn delete_across_a_lock_is_rejected() {
	let mut engine = locked_engine();
	let outcome = ContentInjector::default().delete_range(&mut engine, Some(&range(5, 30)));
	assert!(matches!(outcome, InjectOutcome::Rejected(ref v) if v.lock_id == "L1"));
	assert_eq!(text(&engine), "x".repeat(40));
}

#[test]
fn inverted_rewrite_range_is_a_no_op() {
	let mut engine = locked_engine();
	let outcome = ContentInjector::default().rewrite_range(&mut engine, "new", "L9", Some(&range(20, 10)), None);
	assert_eq!(outcome, InjectOutcome::Skipped(SkipReason::InvalidRange { from: 20, to: 10 }));
	assert_eq!(engine.document().version(), 0);
	assert!(!engine.registry().has("L9"));
}

#[test]
fn out_of_bounds_and_empty_ranges_are_no_ops() {
	let mut engine = engine_with("0123456789");
	let mut injector = ContentInjector::default();
	for anchor in [range(-1, 4), range(3, 11), range(4, 4)] {
		let outcome = injector.rewrite_range(&mut engine, "new", "L", Some(&anchor), None);
		assert!(matches!(outcome, InjectOutcome::Skipped(SkipReason::InvalidRange { .. })));
		let outcome = injector.delete_range(&mut engine, Some(&anchor));
		assert!(matches!(outcome, InjectOutcome::Skipped(SkipReason::InvalidRange { .. })));
	}
	assert_eq!(text(&engine), "0123456789");
}

#[test]
fn rewrite_replaces_the_range() {
	let mut engine = engine_with("keep THIS keep");
	let outcome =
		ContentInjector::default().rewrite_range(&mut engine, "that", "R1", Some(&range(5, 9)), Some(SourceTag::AgentB));
	assert!(outcome.is_committed());
	assert_eq!(text(&engine), "keep that <!-- lock:R1 source:agentB --> keep");
	assert_eq!(lock_at(&engine, 5), Some(json!("R1")));
	assert!(engine.registry().has("R1"));
}

#[test]
fn rewrite_needs_a_range() {
	let mut engine = engine_with("abc.");
	let outcome = ContentInjector::default().rewrite_range(&mut engine, "x", "L", Some(&Anchor::Pos { from: 1 }), None);
	assert_eq!(outcome, InjectOutcome::Skipped(SkipReason::UnsupportedAnchor));
}

#[test]
fn rewrite_over_another_lock_is_rejected() {
	let mut engine = locked_engine();
	let outcome = ContentInjector::default().rewrite_range(&mut engine, "new", "L2", Some(&range(20, 30)), None);
	assert!(matches!(outcome, InjectOutcome::Rejected(_)));
	assert!(!engine.registry().has("L2"));
}

#[test]
fn rewrite_without_anchor_targets_last_sentence() {
	let source = "第一句。第二句。第三句。";
	let mut engine = engine_with(source);
	engine.set_cursor(source.chars().count());
	let outcome = ContentInjector::default().rewrite_range(&mut engine, "新句。", "S1", None, None);
	assert!(outcome.is_committed());
	assert_eq!(text(&engine), "第一句。第二句。新句。 <!-- lock:S1 -->");
}

#[test]
fn rewrite_at_document_start_without_anchor_is_skipped() {
	let mut engine = engine_with("");
	let outcome = ContentInjector::default().rewrite_range(&mut engine, "x", "L", None, None);
	assert_eq!(outcome, InjectOutcome::Skipped(SkipReason::NothingToRewrite));
}

#[test]
fn delete_throttle_boundary() {
	let t0 = Instant::now();

	let mut engine = engine_with(&"x".repeat(50));
	let mut injector = ContentInjector::default();
	assert!(injector.delete_range_at(&mut engine, Some(&range(0, 2)), t0).is_committed());
	let second = injector.delete_range_at(&mut engine, Some(&range(0, 2)), t0 + Duration::from_millis(1000));
	assert!(matches!(second, InjectOutcome::Skipped(SkipReason::Throttled { .. })));
	assert_eq!(engine.document().size(), 48);

	let mut engine = engine_with(&"x".repeat(50));
	let mut injector = ContentInjector::default();
	assert!(injector.delete_range_at(&mut engine, Some(&range(0, 2)), t0).is_committed());
	assert!(
		injector
			.delete_range_at(&mut engine, Some(&range(0, 2)), t0 + Duration::from_millis(1600))
			.is_committed()
	);
	assert_eq!(engine.document().size(), 46);
}

#[test]
fn rejected_delete_does_not_start_the_throttle() {
	let t0 = Instant::now();
	let mut engine = locked_engine();
	let mut injector = ContentInjector::default();
	let rejected = injector.delete_range_at(&mut engine, Some(&range(12, 14)), t0);
	assert!(matches!(rejected, InjectOutcome::Rejected(_)));
	assert!(injector.delete_range_at(&mut engine, Some(&range(0, 2)), t0).is_committed());
}

#[test]
fn delete_creates_no_lock_and_no_history() {
	let mut engine = engine_with("0123456789");
	ContentInjector::default().delete_range(&mut engine, Some(&range(2, 4)));
	assert_eq!(text(&engine), "01456789");
	assert!(engine.registry().is_empty());
	assert!(!engine.history().can_undo());
}
