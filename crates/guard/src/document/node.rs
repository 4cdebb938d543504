//! Tree nodes and inline marks.

use serde::{Deserialize, Serialize};
use sigil_primitives::{Bias, ChangeSet, Rope, Span, span_text};

use crate::extract::{extract, marker};

/// Free-form node or mark attributes.
///
/// Values are arbitrary JSON so that malformed input (a numeric lock id, a
/// nested object where a string belongs) survives loading and is judged by
/// the extractor rather than by the deserializer.
pub type Attrs = serde_json::Map<String, serde_json::Value>;

/// An inline mark attached to a run of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
	/// Mark type, e.g. `"em"` or `"lock"`.
	pub name: String,
	/// Mark attributes.
	#[serde(default)]
	pub attrs: Attrs,
}

impl Mark {
	/// Creates a mark with the given attributes.
	pub fn new(name: impl Into<String>, attrs: Attrs) -> Self {
		Self {
			name: name.into(),
			attrs,
		}
	}
}

/// A document tree node covering a half-open character span.
///
/// Sibling spans are sorted and disjoint, and children always lie inside
/// their parent's span. Text outside every node is allowed; it simply has no
/// structure and therefore can never be locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
	/// A block node with attributes and optional nested nodes.
	Container {
		/// Covered characters.
		span: Span,
		/// Block attributes.
		#[serde(default)]
		attrs: Attrs,
		/// Nested nodes, within `span`.
		#[serde(default)]
		children: Vec<Node>,
	},
	/// A plain run of text.
	Text {
		/// Covered characters.
		span: Span,
	},
	/// A run of text carrying inline marks.
	Marked {
		/// Covered characters.
		span: Span,
		/// Marks applying to the whole run.
		marks: Vec<Mark>,
	},
}

/// Something that may carry lock attributes.
///
/// Plain text runs have no attributes of their own; their lock state can only
/// come from legacy markers in their text.
pub trait LockBearer {
	/// Returns the attribute map, if this kind of item has one.
	fn lock_attrs(&self) -> Option<&Attrs>;
}

impl LockBearer for Node {
	fn lock_attrs(&self) -> Option<&Attrs> {
		match self {
			Node::Container { attrs, .. } => Some(attrs),
			Node::Text { .. } | Node::Marked { .. } => None,
		}
	}
}

impl LockBearer for Mark {
	fn lock_attrs(&self) -> Option<&Attrs> {
		Some(&self.attrs)
	}
}

impl Node {
	/// A leaf container.
	pub fn container(span: impl Into<Span>, attrs: Attrs) -> Self {
		Node::Container {
			span: span.into(),
			attrs,
			children: Vec::new(),
		}
	}

	/// A plain text run.
	pub fn text(span: impl Into<Span>) -> Self {
		Node::Text { span: span.into() }
	}

	/// A marked text run.
	pub fn marked(span: impl Into<Span>, marks: Vec<Mark>) -> Self {
		Node::Marked {
			span: span.into(),
			marks,
		}
	}

	/// Returns the covered span.
	pub fn span(&self) -> Span {
		match self {
			Node::Container { span, .. } | Node::Text { span } | Node::Marked { span, .. } => *span,
		}
	}

	fn span_mut(&mut self) -> &mut Span {
		match self {
			Node::Container { span, .. } | Node::Text { span } | Node::Marked { span, .. } => span,
		}
	}

	/// Returns the inline marks (empty for non-marked nodes).
	pub fn marks(&self) -> &[Mark] {
		match self {
			Node::Marked { marks, .. } => marks,
			_ => &[],
		}
	}

	/// Returns the children (empty for text runs).
	pub fn children(&self) -> &[Node] {
		match self {
			Node::Container { children, .. } => children,
			_ => &[],
		}
	}

	/// Returns true for container nodes.
	pub fn is_container(&self) -> bool {
		matches!(self, Node::Container { .. })
	}

	/// Returns true if text inserted exactly at a boundary stays outside.
	///
	/// Containers are always exclusive, as are runs carrying a lock through a
	/// mark or a legacy marker in `text` (the pre-edit document): typing next
	/// to them never extends them. Plain runs are inclusive so that typing at
	/// the end of a paragraph stays in that paragraph.
	fn is_exclusive(&self, text: &Rope) -> bool {
		self.is_container()
			|| self.marks().iter().any(|mark| extract(mark.lock_attrs(), "", None).is_some())
			|| marker::find_first(&span_text(text.slice(..), self.span())).is_some()
	}

	/// Endpoint biases used when text is inserted exactly at a boundary.
	fn biases(&self, text: &Rope) -> (Bias, Bias) {
		if self.is_exclusive(text) {
			(Bias::Right, Bias::Left)
		} else {
			(Bias::Left, Bias::Right)
		}
	}

	/// Returns a copy of a text-like node over a different span.
	fn with_span(&self, span: Span) -> Node {
		let mut node = self.clone();
		*node.span_mut() = span;
		node
	}
}

/// Maps every node through `changes`, keeping the tree invariants.
///
/// `before` is the text the changes were built against.
///
/// Nodes that lose all their characters are dropped. Siblings that would
/// overlap after mapping are trimmed so that the earlier node keeps the
/// shared characters.
pub(crate) fn map_nodes(nodes: &mut Vec<Node>, changes: &ChangeSet, bounds: Span, before: &Rope) {
	for node in nodes.iter_mut() {
		let (start, end) = node.biases(before);
		let mapped = changes.map_span(node.span(), start, end);
		let from = mapped.from.clamp(bounds.from, bounds.to);
		let to = mapped.to.clamp(from, bounds.to);
		*node.span_mut() = Span { from, to };
	}

	let mut prev_end = bounds.from;
	for node in nodes.iter_mut() {
		let span = node.span_mut();
		span.from = span.from.max(prev_end);
		span.to = span.to.max(span.from);
		prev_end = span.to;
	}
	nodes.retain(|node| !node.span().is_empty());

	for node in nodes.iter_mut() {
		let span = node.span();
		if let Node::Container { children, .. } = node {
			map_nodes(children, changes, span, before);
		}
	}
}

/// Places a freshly inserted node into the tree.
///
/// The node descends into the container that covers it; text runs that
/// absorbed the insertion during mapping are split around it.
pub(crate) fn splice(nodes: &mut Vec<Node>, new: Node) {
	let span = new.span();

	if let Some(Node::Container { children, .. }) = nodes
		.iter_mut()
		.find(|n| n.is_container() && n.span().covers(span))
	{
		splice(children, new);
		return;
	}

	let mut rebuilt = Vec::with_capacity(nodes.len() + 2);
	for node in nodes.drain(..) {
		let own = node.span();
		if node.is_container() || !own.intersects(span) {
			rebuilt.push(node);
			continue;
		}
		let left = Span::new(own.from, span.from.max(own.from));
		let right = Span::new(span.to.min(own.to), own.to);
		if !left.is_empty() {
			rebuilt.push(node.with_span(left));
		}
		if !right.is_empty() {
			rebuilt.push(node.with_span(right));
		}
	}

	let at = rebuilt.partition_point(|n| n.span().to <= span.from);
	rebuilt.insert(at, new);
	*nodes = rebuilt;
}

/// Checks the tree invariants against a document of `len` characters.
pub(crate) fn validate_nodes(nodes: &[Node], bounds: Span) -> Result<(), (Span, &'static str)> {
	let mut prev_end = bounds.from;
	for node in nodes {
		let span = node.span();
		if span.from > span.to {
			return Err((span, "inverted span"));
		}
		if span.is_empty() {
			return Err((span, "empty span"));
		}
		if !bounds.covers(span) {
			return Err((span, "span escapes its parent or the document"));
		}
		if span.from < prev_end {
			return Err((span, "span overlaps its previous sibling"));
		}
		prev_end = span.to;
		validate_nodes(node.children(), span)?;
	}
	Ok(())
}

/// Pre-order traversal, optionally pruned to nodes intersecting a span.
pub struct Walk<'a> {
	stack: Vec<&'a Node>,
	filter: Option<Span>,
}

impl<'a> Walk<'a> {
	pub(crate) fn new(nodes: &'a [Node], filter: Option<Span>) -> Self {
		let mut walk = Self {
			stack: Vec::new(),
			filter,
		};
		walk.push_all(nodes);
		walk
	}

	fn push_all(&mut self, nodes: &'a [Node]) {
		for node in nodes.iter().rev() {
			if self.filter.is_none_or(|f| node.span().intersects(f)) {
				self.stack.push(node);
			}
		}
	}
}

impl<'a> Iterator for Walk<'a> {
	type Item = &'a Node;

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.stack.pop()?;
		self.push_all(node.children());
		Some(node)
	}
}
