//! The live document: a rope of characters plus a tree of nodes over it.
//!
//! Node spans are kept in sync with the text by mapping them through every
//! committed changeset, so a [`Document`] never stores absolute positions that
//! can drift. The serialized form (`{ "text", "nodes" }`) is the only place
//! locks are persisted: attribute locks live on container nodes, legacy locks
//! live as markers inside the text itself.

mod node;

#[cfg(test)]
mod tests;

pub use node::{Attrs, LockBearer, Mark, Node, Walk};
use serde::{Deserialize, Serialize};
use sigil_primitives::{CharIdx, ChangeSet, Rope, Span, Transaction, span_text};
use thiserror::Error;

use crate::batch::{BatchError, Fragment, MutationBatch};

/// Errors raised while loading or saving a document.
#[derive(Debug, Error)]
pub enum DocumentError {
	/// The JSON form could not be parsed or produced.
	#[error("document JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// A node violates the tree invariants.
	#[error("invalid node at {span}: {reason}")]
	InvalidNode {
		/// Offending span.
		span: Span,
		/// Which invariant failed.
		reason: &'static str,
	},
}

#[derive(Serialize, Deserialize)]
struct DocumentRepr {
	text: String,
	#[serde(default)]
	nodes: Vec<Node>,
}

/// Rich text with a structural node tree.
#[derive(Debug, Clone, Default)]
pub struct Document {
	text: Rope,
	nodes: Vec<Node>,
	version: u64,
}

impl Document {
	/// Creates an empty document.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a document from text and a node tree, validating the tree.
	pub fn from_parts(text: &str, nodes: Vec<Node>) -> Result<Self, DocumentError> {
		let text = Rope::from(text);
		node::validate_nodes(&nodes, Span::new(0, text.len_chars()))
			.map_err(|(span, reason)| DocumentError::InvalidNode { span, reason })?;
		Ok(Self {
			text,
			nodes,
			version: 0,
		})
	}

	/// Loads legacy plain text: one text run per non-empty line.
	///
	/// Newlines themselves stay outside every node. Locks in such a document
	/// can only be recovered from inline markers.
	pub fn from_plain_text(text: &str) -> Self {
		let mut nodes = Vec::new();
		let mut start = 0;
		for line in text.split('\n') {
			let len = line.chars().count();
			if len > 0 {
				nodes.push(Node::text(start..start + len));
			}
			start += len + 1;
		}
		Self {
			text: Rope::from(text),
			nodes,
			version: 0,
		}
	}

	/// Parses the JSON form produced by [`Document::to_json`].
	pub fn from_json(json: &str) -> Result<Self, DocumentError> {
		let repr: DocumentRepr = serde_json::from_str(json)?;
		Self::from_parts(&repr.text, repr.nodes)
	}

	/// Serializes the document, node attributes included.
	pub fn to_json(&self) -> Result<String, DocumentError> {
		let repr = DocumentRepr {
			text: self.text.to_string(),
			nodes: self.nodes.clone(),
		};
		Ok(serde_json::to_string_pretty(&repr)?)
	}

	/// Returns the text.
	pub fn text(&self) -> &Rope {
		&self.text
	}

	/// Returns the size in characters, which is also the last valid position.
	pub fn size(&self) -> CharIdx {
		self.text.len_chars()
	}

	/// Returns the top-level nodes.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Returns the version, bumped on every committed batch.
	pub fn version(&self) -> u64 {
		self.version
	}

	/// Returns the text covered by `span`.
	pub fn slice_text(&self, span: Span) -> String {
		span_text(self.text.slice(..), span)
	}

	/// Returns the text covered by `node`.
	pub fn node_text(&self, node: &Node) -> String {
		self.slice_text(node.span())
	}

	/// Pre-order traversal of every node.
	pub fn walk(&self) -> Walk<'_> {
		Walk::new(&self.nodes, None)
	}

	/// Pre-order traversal of every node sharing a character with `span`.
	pub fn intersecting(&self, span: Span) -> Walk<'_> {
		Walk::new(&self.nodes, Some(span))
	}

	/// Returns the innermost node containing the character at `pos`.
	pub fn node_at(&self, pos: CharIdx) -> Option<&Node> {
		let mut level = self.nodes.as_slice();
		let mut found = None;
		while let Some(node) = level.iter().find(|n| n.span().contains(pos)) {
			found = Some(node);
			level = node.children();
		}
		found
	}

	/// Applies a batch to text and tree, returning the committed changeset.
	///
	/// Geometry is validated before anything is touched, so an error leaves
	/// the document unchanged. Lock enforcement is not done here; callers go
	/// through the mutation filter first.
	pub(crate) fn apply(&mut self, batch: &MutationBatch) -> Result<ChangeSet, BatchError> {
		let tx = Transaction::change(
			self.text.slice(..),
			batch.steps().iter().map(|s| s.to_change()),
		)?;

		let mut blocks = Vec::new();
		let mut delta: isize = 0;
		for step in batch.steps() {
			let inserted = step.content.as_ref().map_or(0, Fragment::char_len);
			if let Some(Fragment::Block { attrs, .. }) = &step.content
				&& inserted > 0
			{
				let from = step.span.from.saturating_add_signed(delta);
				blocks.push(Node::container(from..from + inserted, attrs.clone()));
			}
			delta += inserted as isize - step.span.len() as isize;
		}

		let before = self.text.clone();
		tx.apply(&mut self.text);
		let changes = ChangeSet::from(tx);
		node::map_nodes(&mut self.nodes, &changes, Span::new(0, self.text.len_chars()), &before);
		for block in blocks {
			node::splice(&mut self.nodes, block);
		}
		self.version = self.version.wrapping_add(1);
		Ok(changes)
	}
}
