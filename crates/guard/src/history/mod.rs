//! User-only undo/redo log.
//!
//! Agent batches are history-exempt: they stay in the document and never
//! become undo candidates. Since the document has no native notion of an
//! exempt edit, the log stores each user edit as its inverse steps and maps
//! every stored entry through *every* later commit (user, agent, undo or
//! redo). Interleaved agent edits therefore shift entries but never enter
//! the timeline.
//!
//! Entries restore text only. Container attributes removed by a user
//! deletion do not come back on undo.

#[cfg(test)]
mod tests;

use sigil_primitives::{Bias, ChangeSet, Span};
use tracing::trace;

use crate::batch::{BatchMeta, Fragment, MutationBatch, Step};
use crate::document::Document;

/// Default maximum number of undo entries.
pub const MAX_UNDO: usize = 100;

/// Steps that revert one committed batch, in current document coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryEntry {
	steps: Vec<Step>,
}

impl HistoryEntry {
	/// Computes the inverse of `batch` against `before`, the document it is
	/// about to be applied to.
	///
	/// The resulting steps are in post-batch coordinates. Text fragments only;
	/// inserted blocks come back as plain text on redo.
	pub fn inverse_of(batch: &MutationBatch, before: &Document) -> Self {
		let mut steps = Vec::with_capacity(batch.steps().len());
		let mut delta: isize = 0;
		for step in batch.steps() {
			let inserted = step.content.as_ref().map_or(0, Fragment::char_len);
			let from = step.span.from.saturating_add_signed(delta);
			let removed = (!step.span.is_empty()).then(|| Fragment::Text(before.slice_text(step.span)));
			if inserted > 0 || removed.is_some() {
				steps.push(Step {
					span: (from..from + inserted).into(),
					content: removed,
				});
			}
			delta += inserted as isize - step.span.len() as isize;
		}
		Self { steps }
	}

	/// Returns the inverse steps.
	pub fn steps(&self) -> &[Step] {
		&self.steps
	}

	/// Returns true if replaying the entry would change nothing.
	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	/// Builds the batch that replays this entry.
	pub fn to_batch(&self) -> MutationBatch {
		MutationBatch::new(self.steps.clone(), BatchMeta::REPLAY)
	}

	/// Shifts the entry through a later commit.
	///
	/// Text inserted at either edge of a span stays outside it, so replaying
	/// never removes characters that arrived after the entry was recorded.
	/// Text inserted strictly inside a span splits it: the pieces on either
	/// side are removed on replay, the inserted text is kept. Restored
	/// content rides on the first piece.
	fn map_through(&mut self, changes: &ChangeSet) {
		let mut mapped = Vec::with_capacity(self.steps.len());
		for step in self.steps.drain(..) {
			let span = step.span;
			if span.is_empty() {
				let at = changes.map_pos(span.from, Bias::Left);
				mapped.push(Step {
					span: Span::point(at),
					content: step.content,
				});
				continue;
			}

			let mut content = step.content;
			let mut from = span.from;
			let cuts = changes.insertion_points().filter(|&p| span.from < p && p < span.to);
			for to in cuts.chain(std::iter::once(span.to)) {
				if to <= from {
					continue;
				}
				mapped.push(Step {
					span: changes.map_span(Span { from, to }, Bias::Right, Bias::Left),
					content: content.take(),
				});
				from = to;
			}
		}
		mapped.retain(|s| !s.span.is_empty() || s.content.as_ref().is_some_and(|c| c.char_len() > 0));
		self.steps = mapped;
	}
}

/// Undo and redo stacks holding user edits only.
#[derive(Debug, Clone)]
pub struct UndoHistory {
	undo: Vec<HistoryEntry>,
	redo: Vec<HistoryEntry>,
	max_undo: usize,
}

impl Default for UndoHistory {
	fn default() -> Self {
		Self::new(MAX_UNDO)
	}
}

impl UndoHistory {
	/// Creates an empty history keeping at most `max_undo` entries.
	pub fn new(max_undo: usize) -> Self {
		Self {
			undo: Vec::new(),
			redo: Vec::new(),
			max_undo: max_undo.max(1),
		}
	}

	/// Returns whether undo is available.
	pub fn can_undo(&self) -> bool {
		!self.undo.is_empty()
	}

	/// Returns whether redo is available.
	pub fn can_redo(&self) -> bool {
		!self.redo.is_empty()
	}

	/// Returns the undo stack length.
	pub fn undo_len(&self) -> usize {
		self.undo.len()
	}

	/// Returns the redo stack length.
	pub fn redo_len(&self) -> usize {
		self.redo.len()
	}

	/// The entry the next undo would replay.
	pub fn peek_undo(&self) -> Option<&HistoryEntry> {
		self.undo.last()
	}

	/// The entry the next redo would replay.
	pub fn peek_redo(&self) -> Option<&HistoryEntry> {
		self.redo.last()
	}

	/// Drops both stacks.
	pub fn clear(&mut self) {
		self.undo.clear();
		self.redo.clear();
	}

	/// Maps both stacks through a commit that does not enter the timeline.
	pub fn map_through(&mut self, changes: &ChangeSet) {
		for entry in self.undo.iter_mut().chain(self.redo.iter_mut()) {
			entry.map_through(changes);
		}
		self.undo.retain(|e| !e.is_empty());
		self.redo.retain(|e| !e.is_empty());
	}

	/// Records a fresh user edit, already committed as `changes`.
	///
	/// Clears redo and enforces the size limit by dropping the oldest entry.
	pub fn record(&mut self, entry: HistoryEntry, changes: &ChangeSet) {
		self.map_through(changes);
		self.redo.clear();
		if entry.is_empty() {
			return;
		}
		self.undo.push(entry);
		if self.undo.len() > self.max_undo {
			self.undo.remove(0);
		}
		trace!(undo = self.undo.len(), "history recorded");
	}

	/// Drops the top undo entry without replaying it.
	pub(crate) fn discard_undo(&mut self) {
		self.undo.pop();
	}

	/// Drops the top redo entry without replaying it.
	pub(crate) fn discard_redo(&mut self) {
		self.redo.pop();
	}

	/// Completes an undo: pops the replayed entry and pushes its inverse.
	pub(crate) fn finish_undo(&mut self, inverse: HistoryEntry, changes: &ChangeSet) {
		self.undo.pop();
		self.map_through(changes);
		if !inverse.is_empty() {
			self.redo.push(inverse);
		}
		trace!(undo = self.undo.len(), redo = self.redo.len(), "history undo");
	}

	/// Completes a redo: pops the replayed entry and pushes its inverse.
	pub(crate) fn finish_redo(&mut self, inverse: HistoryEntry, changes: &ChangeSet) {
		self.redo.pop();
		self.map_through(changes);
		if !inverse.is_empty() {
			self.undo.push(inverse);
		}
		trace!(undo = self.undo.len(), redo = self.redo.len(), "history redo");
	}
}
