use serde_json::json;
use sigil_primitives::Span;

use super::*;
use crate::batch::{Fragment, MutationBatch, Step};

fn attrs(value: serde_json::Value) -> Attrs {
	value.as_object().cloned().unwrap_or_default()
}

fn block(text: &str, lock: &str) -> Fragment {
	Fragment::Block {
		text: text.into(),
		attrs: attrs(json!({ "lockId": lock })),
	}
}

fn spans(doc: &Document) -> Vec<Span> {
	doc.walk().map(Node::span).collect()
}

#[test]
fn plain_text_gets_one_run_per_line() {
	let doc = Document::from_plain_text("ab\n\ncd");
	assert_eq!(spans(&doc), vec![Span::new(0, 2), Span::new(4, 6)]);
}

#[test]
fn from_parts_rejects_overlapping_siblings() {
	let err = Document::from_parts("hello world", vec![Node::text(0..6), Node::text(5..11)])
		.unwrap_err();
	assert!(matches!(err, DocumentError::InvalidNode { .. }));
}

#[test]
fn from_parts_rejects_child_outside_parent() {
	let parent = Node::Container {
		span: Span::new(0, 5),
		attrs: Attrs::new(),
		children: vec![Node::text(3..8)],
	};
	assert!(Document::from_parts("hello world", vec![parent]).is_err());
}

#[test]
fn json_round_trip_keeps_attributes() {
	let doc = Document::from_parts(
		"intro LOCKED outro",
		vec![
			Node::text(0..6),
			Node::container(6..12, attrs(json!({ "lockId": "L1", "data-source": "agentA" }))),
			Node::marked(12..18, vec![Mark::new("em", Attrs::new())]),
		],
	)
	.unwrap();
	let json = doc.to_json().unwrap();
	let back = Document::from_json(&json).unwrap();
	assert_eq!(back.text().to_string(), "intro LOCKED outro");
	assert_eq!(back.nodes(), doc.nodes());
}

#[test]
fn malformed_attribute_values_survive_loading() {
	let json = r#"{"text":"abc","nodes":[{"type":"container","span":{"from":0,"to":3},"attrs":{"lockId":42}}]}"#;
	let doc = Document::from_json(json).unwrap();
	assert_eq!(doc.nodes()[0].lock_attrs().unwrap()["lockId"], json!(42));
}

#[test]
fn inserting_a_block_splits_the_surrounding_run() {
	let mut doc = Document::from_plain_text(&"x".repeat(20));
	let batch = MutationBatch::user(vec![Step::insert(10, block("NEW", "L1"))]);
	doc.apply(&batch).unwrap();
	assert_eq!(
		spans(&doc),
		vec![Span::new(0, 10), Span::new(10, 13), Span::new(13, 23)]
	);
	let at = doc.node_at(10).unwrap();
	assert_eq!(at.lock_attrs().unwrap()["lockId"], json!("L1"));
	assert_eq!(doc.version(), 1);
}

#[test]
fn block_nests_inside_a_covering_container() {
	let mut doc = Document::from_parts(
		"0123456789",
		vec![Node::Container {
			span: Span::new(0, 10),
			attrs: Attrs::new(),
			children: vec![Node::text(0..10)],
		}],
	)
	.unwrap();
	doc.apply(&MutationBatch::user(vec![Step::insert(4, block("ab", "L2"))]))
		.unwrap();
	let outer = &doc.nodes()[0];
	assert_eq!(outer.span(), Span::new(0, 12));
	let inner: Vec<_> = outer.children().iter().map(Node::span).collect();
	assert_eq!(inner, vec![Span::new(0, 4), Span::new(4, 6), Span::new(6, 12)]);
}

#[test]
fn typing_next_to_a_container_does_not_extend_it() {
	let mut doc = Document::from_parts(
		"aaaBBBccc",
		vec![
			Node::text(0..3),
			Node::container(3..6, attrs(json!({ "lockId": "L" }))),
			Node::text(6..9),
		],
	)
	.unwrap();
	let batch = MutationBatch::user(vec![
		Step::insert(3, Fragment::Text("x".into())),
		Step::insert(6, Fragment::Text("y".into())),
	]);
	doc.apply(&batch).unwrap();
	assert_eq!(doc.text().to_string(), "aaaxBBByccc");
	assert_eq!(
		spans(&doc),
		vec![Span::new(0, 4), Span::new(4, 7), Span::new(7, 11)]
	);
}

#[test]
fn deleting_a_whole_node_drops_it() {
	let mut doc = Document::from_plain_text("one\ntwo\nthree");
	doc.apply(&MutationBatch::user(vec![Step::delete(3..8)]))
		.unwrap();
	assert_eq!(doc.text().to_string(), "onethree");
	assert_eq!(spans(&doc), vec![Span::new(0, 3), Span::new(3, 8)]);
}

#[test]
fn invalid_geometry_leaves_document_untouched() {
	let mut doc = Document::from_plain_text("hello");
	let batch = MutationBatch::user(vec![Step::delete(2..9)]);
	assert!(doc.apply(&batch).is_err());
	assert_eq!(doc.text().to_string(), "hello");
	assert_eq!(doc.version(), 0);
}

#[test]
fn intersecting_descends_into_containers() {
	let doc = Document::from_parts(
		"0123456789",
		vec![Node::Container {
			span: Span::new(0, 10),
			attrs: Attrs::new(),
			children: vec![Node::text(0..4), Node::container(4..6, Attrs::new()), Node::text(6..10)],
		}],
	)
	.unwrap();
	let hit: Vec<_> = doc.intersecting(Span::new(5, 7)).map(Node::span).collect();
	assert_eq!(hit, vec![Span::new(0, 10), Span::new(4, 6), Span::new(6, 10)]);
}
