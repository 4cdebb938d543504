//! Change primitives: retain/delete/insert changesets and transactions.

mod changeset;
mod types;


pub use changeset::ChangeSet;
use thiserror::Error;
pub use types::{Bias, Change, Insertion, Operation, Tendril};

use crate::range::CharIdx;
use crate::{Rope, RopeSlice};

/// Why a list of [`Change`]s could not be turned into a [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
	/// A change ends before it starts.
	#[error("change {index} is inverted: {start} > {end}")]
	Inverted {
		/// Position of the change in the input list.
		index: usize,
		/// Start of the offending change.
		start: CharIdx,
		/// End of the offending change.
		end: CharIdx,
	},
	/// A change starts before the previous one ended.
	#[error("change {index} at {start} overlaps the previous change ending at {prev_end}")]
	Overlapping {
		/// Position of the change in the input list.
		index: usize,
		/// Start of the offending change.
		start: CharIdx,
		/// End of the previous change.
		prev_end: CharIdx,
	},
	/// A change reaches past the end of the document.
	#[error("change {index} ends at {end}, past the document end {len}")]
	OutOfBounds {
		/// Position of the change in the input list.
		index: usize,
		/// End of the offending change.
		end: CharIdx,
		/// Document length.
		len: usize,
	},
}

/// A changeset bound to the document length it was built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
	changes: ChangeSet,
}

impl Transaction {
	/// Builds a transaction from sorted, non-overlapping changes.
	///
	/// Changes may touch (one ending where the next starts) but never overlap.
	pub fn change(
		doc: RopeSlice,
		changes: impl IntoIterator<Item = Change>,
	) -> Result<Self, ChangeError> {
		let len = doc.len_chars();
		let mut cs = ChangeSet::default();
		let mut last = 0;

		for (index, change) in changes.into_iter().enumerate() {
			let Change {
				start,
				end,
				replacement,
			} = change;
			if start > end {
				return Err(ChangeError::Inverted { index, start, end });
			}
			if start < last {
				return Err(ChangeError::Overlapping {
					index,
					start,
					prev_end: last,
				});
			}
			if end > len {
				return Err(ChangeError::OutOfBounds { index, end, len });
			}

			cs.retain(start - last);
			cs.delete(end - start);
			if let Some(text) = replacement {
				cs.insert(text);
			}
			last = end;
		}

		cs.retain(len - last);
		Ok(Self { changes: cs })
	}

	/// Returns the underlying changeset.
	pub fn changes(&self) -> &ChangeSet {
		&self.changes
	}

	/// Applies the transaction to `doc`.
	pub fn apply(&self, doc: &mut Rope) {
		self.changes.apply(doc);
	}
}

impl From<Transaction> for ChangeSet {
	fn from(tx: Transaction) -> Self {
		tx.changes
	}
}
