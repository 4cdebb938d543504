use crate::range::{CharIdx, CharLen};

/// Owned text carried by a change.
pub type Tendril = String;

/// Replaces `[start, end)` with `replacement`; `None` is a pure deletion.
///
/// Positions are in the coordinates of the document the change is built
/// against, never in post-edit coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
	/// The starting character index of the change.
	pub start: CharIdx,
	/// The ending character index of the change (exclusive).
	pub end: CharIdx,
	/// The replacement text, or [`None`] for deletion.
	pub replacement: Option<Tendril>,
}

impl Change {
	/// A pure insertion at `at`.
	pub fn insert(at: CharIdx, text: impl Into<Tendril>) -> Self {
		Self {
			start: at,
			end: at,
			replacement: Some(text.into()),
		}
	}

	/// A pure deletion of `[start, end)`.
	pub fn delete(start: CharIdx, end: CharIdx) -> Self {
		Self {
			start,
			end,
			replacement: None,
		}
	}
}

/// How a position sitting exactly on an insertion point is mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
	/// Position stays before insertions at the same location.
	Left,
	/// Position moves after insertions at the same location.
	Right,
}

/// Inserted text with its character length cached.
///
/// `char_len` always equals `text.chars().count()`; the fields are private so
/// that only [`Insertion::new`] can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
	text: Tendril,
	char_len: CharLen,
}

impl Insertion {
	/// Creates a new insertion, counting characters once.
	#[inline]
	pub fn new(text: Tendril) -> Self {
		let char_len = text.chars().count();
		Self { text, char_len }
	}

	/// Returns true if nothing is inserted.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.char_len == 0
	}

	/// Returns the inserted text.
	#[inline]
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Returns the cached character length.
	#[inline]
	pub fn char_len(&self) -> CharLen {
		self.char_len
	}

	/// Appends another insertion, keeping the cached length in sync.
	pub(super) fn append(&mut self, other: Insertion) {
		self.text.push_str(&other.text);
		self.char_len += other.char_len;
	}
}

/// A single operation in a changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
	/// Keep the next N characters of the source document.
	Retain(CharLen),
	/// Drop the next N characters of the source document.
	Delete(CharLen),
	/// Insert new text at the current position.
	Insert(Insertion),
}
