use super::types::{Bias, Insertion, Operation, Tendril};
use crate::Rope;
use crate::range::{CharIdx, CharLen, Span};

/// A retain/delete/insert program that rewrites one document into another.
///
/// `len` is the size of the source document and `len_after` the size of the
/// result. Consecutive operations of the same kind are merged, and an insert
/// is always ordered before an adjacent delete so that positions at the edit
/// point map deterministically.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
	pub(super) changes: Vec<Operation>,
	pub(super) len: usize,
	pub(super) len_after: usize,
}

impl ChangeSet {
	/// Returns the length of the source document.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns the length of the document after applying changes.
	pub fn len_after(&self) -> usize {
		self.len_after
	}

	/// Returns true if this changeset contains no operations.
	pub fn is_empty(&self) -> bool {
		self.changes.is_empty()
	}

	/// Returns all operations in order.
	pub fn changes(&self) -> &[Operation] {
		&self.changes
	}

	pub(crate) fn retain(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;
		self.len_after += n;

		if let Some(Operation::Retain(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Retain(n));
		}
	}

	pub(crate) fn delete(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;

		if let Some(Operation::Delete(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Delete(n));
		}
	}

	pub(crate) fn insert(&mut self, text: Tendril) {
		if text.is_empty() {
			return;
		}

		let ins = Insertion::new(text);
		self.len_after += ins.char_len();

		match self.changes.as_mut_slice() {
			[.., Operation::Insert(prev)] | [.., Operation::Insert(prev), Operation::Delete(_)] => {
				prev.append(ins);
			}
			[.., last @ Operation::Delete(_)] => {
				// Insert goes before the pending delete.
				let del = std::mem::replace(last, Operation::Insert(ins));
				self.changes.push(del);
			}
			_ => {
				self.changes.push(Operation::Insert(ins));
			}
		}
	}

	/// Applies this changeset to a document in place.
	pub fn apply(&self, doc: &mut Rope) {
		let mut pos = 0;
		for op in &self.changes {
			match op {
				Operation::Retain(n) => {
					pos += n;
				}
				Operation::Delete(n) => {
					doc.remove(pos..pos + n);
				}
				Operation::Insert(ins) => {
					doc.insert(pos, ins.text());
					pos += ins.char_len();
				}
			}
		}
	}

	/// Maps a source position into the changed document.
	///
	/// Positions inside a deleted region collapse onto the deletion point;
	/// `bias` decides which side of an insertion a coincident position lands.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		let mut old_pos = 0;
		let mut new_pos = 0;

		for op in &self.changes {
			if old_pos > pos {
				break;
			}

			match op {
				Operation::Retain(n) => {
					if old_pos + n > pos {
						return new_pos + (pos - old_pos);
					}
					old_pos += n;
					new_pos += n;
				}
				Operation::Delete(n) => {
					if old_pos + n > pos {
						return new_pos;
					}
					old_pos += n;
				}
				Operation::Insert(ins) => {
					if !(old_pos == pos && bias == Bias::Left) {
						new_pos += ins.char_len();
					}
				}
			}
		}

		new_pos + (pos - old_pos)
	}

	/// Maps a span, biasing each endpoint independently.
	///
	/// The result never inverts: if the endpoints cross (the span was wholly
	/// deleted) it collapses to a point at the mapped start.
	pub fn map_span(&self, span: Span, start: Bias, end: Bias) -> Span {
		let from = self.map_pos(span.from, start);
		let to = self.map_pos(span.to, end);
		Span {
			from,
			to: to.max(from),
		}
	}

	/// Iterates the source positions where text is inserted, in order.
	pub fn insertion_points(&self) -> impl Iterator<Item = CharIdx> + '_ {
		let mut pos = 0;
		self.changes.iter().filter_map(move |op| match op {
			Operation::Retain(n) | Operation::Delete(n) => {
				pos += n;
				None
			}
			Operation::Insert(_) => Some(pos),
		})
	}
}
