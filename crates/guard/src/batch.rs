//! Mutation batches: the atomic unit every edit is expressed as.

use sigil_primitives::{CharIdx, CharLen, Change, ChangeError, Span};
use thiserror::Error;

use crate::document::Attrs;

/// Who produced a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
	/// Typed, pasted, undone or otherwise driven by the author.
	User,
	/// Produced by an intervention directive.
	Agent,
}

/// What an agent batch does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
	/// A new locked block was inserted.
	Inject,
	/// A range was replaced by a new locked block.
	Rewrite,
	/// A range was removed.
	Delete,
}

/// Batch metadata consumed by the filter and the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchMeta {
	/// Excluded from the undo/redo timeline when set.
	pub history_exempt: bool,
	/// Producer of the batch.
	pub origin: Origin,
	/// Agent action kind; `None` for user batches.
	pub action: Option<ActionKind>,
}

impl BatchMeta {
	/// Metadata for an ordinary, undoable user edit.
	pub const USER: Self = Self {
		history_exempt: false,
		origin: Origin::User,
		action: None,
	};

	/// Metadata for an undo or redo replay: a user edit the history log
	/// already accounts for.
	pub const REPLAY: Self = Self {
		history_exempt: true,
		origin: Origin::User,
		action: None,
	};

	/// Metadata for an agent action; always history-exempt.
	pub const fn agent(action: ActionKind) -> Self {
		Self {
			history_exempt: true,
			origin: Origin::Agent,
			action: Some(action),
		}
	}
}

/// Content inserted by a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
	/// Text that joins whatever node surrounds the insertion point.
	Text(String),
	/// Text wrapped in a new container node carrying `attrs`.
	Block {
		/// Visible text of the block.
		text: String,
		/// Container attributes.
		attrs: Attrs,
	},
}

impl Fragment {
	/// Returns the inserted text.
	pub fn text(&self) -> &str {
		match self {
			Fragment::Text(text) | Fragment::Block { text, .. } => text,
		}
	}

	/// Returns the inserted length in characters.
	pub fn char_len(&self) -> CharLen {
		self.text().chars().count()
	}
}

/// One edit: replace `span` (pre-batch coordinates) with `content`.
///
/// An empty span with content is an insertion; a non-empty span without
/// content is a deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
	/// Replaced characters, in the coordinates of the pre-batch document.
	pub span: Span,
	/// Inserted content, if any.
	pub content: Option<Fragment>,
}

impl Step {
	/// Inserts `content` at `at`.
	pub fn insert(at: CharIdx, content: Fragment) -> Self {
		Self {
			span: Span::point(at),
			content: Some(content),
		}
	}

	/// Deletes `span`.
	pub fn delete(span: impl Into<Span>) -> Self {
		Self {
			span: span.into(),
			content: None,
		}
	}

	/// Replaces `span` with `content`.
	pub fn replace(span: impl Into<Span>, content: Fragment) -> Self {
		Self {
			span: span.into(),
			content: Some(content),
		}
	}

	/// Returns true if the step removes existing characters.
	pub fn is_destructive(&self) -> bool {
		!self.span.is_empty()
	}

	pub(crate) fn to_change(&self) -> Change {
		Change {
			start: self.span.from,
			end: self.span.to,
			replacement: self.content.as_ref().map(|c| c.text().to_owned()),
		}
	}
}

/// An ordered list of steps applied atomically, plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationBatch {
	steps: Vec<Step>,
	meta: BatchMeta,
}

impl MutationBatch {
	/// Creates a batch with explicit metadata.
	pub fn new(steps: Vec<Step>, meta: BatchMeta) -> Self {
		Self { steps, meta }
	}

	/// An undoable user batch.
	pub fn user(steps: Vec<Step>) -> Self {
		Self::new(steps, BatchMeta::USER)
	}

	/// A history-exempt agent batch.
	pub fn agent(action: ActionKind, steps: Vec<Step>) -> Self {
		Self::new(steps, BatchMeta::agent(action))
	}

	/// Returns the steps in order.
	pub fn steps(&self) -> &[Step] {
		&self.steps
	}

	/// Returns the metadata.
	pub fn meta(&self) -> BatchMeta {
		self.meta
	}

	/// Returns true if there is nothing to apply.
	pub fn is_empty(&self) -> bool {
		self.steps
			.iter()
			.all(|s| s.span.is_empty() && s.content.as_ref().is_none_or(|c| c.text().is_empty()))
	}

	/// Returns true if any step removes existing characters.
	pub fn is_destructive(&self) -> bool {
		self.steps.iter().any(Step::is_destructive)
	}

	/// Spans removed by destructive steps, in pre-batch coordinates.
	pub fn destructive_spans(&self) -> impl Iterator<Item = Span> + '_ {
		self.steps.iter().filter(|s| s.is_destructive()).map(|s| s.span)
	}
}

/// A batch whose geometry does not fit the document it was applied to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
	/// Steps are unsorted, overlapping, inverted or out of bounds.
	#[error("malformed batch: {0}")]
	Geometry(#[from] ChangeError),
}
