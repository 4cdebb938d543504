//! Document engine: owns the document, the lock registry and the user-only
//! history, and routes every batch through the mutation filter.
//!
//! # Commit pipeline
//!
//! ```text
//! batch ─► filter ─► Document::apply ─► history ─► cursor
//!            │                            │
//!         Reject                 record (user) or map (exempt)
//! ```
//!
//! The registry is seeded from the tree whenever a document is loaded, before
//! any batch can be filtered against it.


use sigil_primitives::{Bias, CharIdx, ChangeSet, Span};
use tracing::{debug, info, warn};

use crate::batch::{BatchError, BatchMeta, Fragment, MutationBatch, Step};
use crate::config::GuardConfig;
use crate::document::{Document, DocumentError};
use crate::extract::{LockedRegion, locked_regions, seed_registry};
use crate::filter::{MutationFilter, RejectHook, Verdict, Violation};
use crate::history::{HistoryEntry, UndoHistory};
use crate::injector::EditHost;
use crate::registry::LockRegistry;
use crate::source::SourceTag;

/// A committed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
	/// Document version after the commit.
	pub version: u64,
	/// The committed changes.
	pub changes: ChangeSet,
	/// Metadata of the committed batch.
	pub meta: BatchMeta,
}

/// Result of submitting a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
	/// The batch was applied.
	Applied(CommitReceipt),
	/// The filter refused it; nothing changed.
	Rejected(Violation),
	/// The batch had nothing to apply.
	Unchanged,
}

impl CommitOutcome {
	/// Returns true if the document changed.
	pub fn is_applied(&self) -> bool {
		matches!(self, CommitOutcome::Applied(_))
	}
}

/// Result of an undo or redo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
	/// The entry was replayed.
	Applied(CommitReceipt),
	/// Replaying would damage a lock; both stacks are untouched.
	Rejected(Violation),
	/// The entry no longer fits the document and was dropped.
	Discarded(BatchError),
	/// Nothing to undo or redo.
	Empty,
}

#[derive(Clone, Copy)]
enum Replay {
	Undo,
	Redo,
}

/// Owner of one live document session.
#[derive(Debug)]
pub struct DocumentEngine {
	document: Document,
	registry: LockRegistry,
	history: UndoHistory,
	filter: MutationFilter,
	cursor: CharIdx,
}

impl Default for DocumentEngine {
	fn default() -> Self {
		Self::new(&GuardConfig::default())
	}
}

impl DocumentEngine {
	/// An engine over an empty document.
	pub fn new(config: &GuardConfig) -> Self {
		Self {
			document: Document::new(),
			registry: LockRegistry::new(),
			history: UndoHistory::new(config.history.max_undo),
			filter: MutationFilter::new(),
			cursor: 0,
		}
	}

	/// An engine over `document`, with the registry seeded from it.
	pub fn with_document(document: Document, config: &GuardConfig) -> Self {
		let mut engine = Self::new(config);
		engine.load(document);
		engine
	}

	/// Replaces the document and reseeds the registry.
	///
	/// Existing registrations are kept. History is cleared and the cursor is
	/// clamped into the new text. Returns the number of locks found.
	pub fn load(&mut self, document: Document) -> usize {
		self.document = document;
		self.history.clear();
		self.cursor = self.cursor.min(self.document.size());
		let found = self.reseed();
		info!(size = self.document.size(), locks = found, "document loaded");
		found
	}

	/// Loads the JSON document form.
	pub fn load_json(&mut self, json: &str) -> Result<usize, DocumentError> {
		Ok(self.load(Document::from_json(json)?))
	}

	/// Loads a plain-text document; only legacy markers carry locks.
	pub fn load_plain_text(&mut self, text: &str) -> usize {
		self.load(Document::from_plain_text(text))
	}

	/// Seeds the registry from the current tree.
	pub fn reseed(&mut self) -> usize {
		seed_registry(&self.document, &mut self.registry)
	}

	/// Returns the document.
	pub fn document(&self) -> &Document {
		&self.document
	}

	/// Consumes the engine, returning the document.
	pub fn into_document(self) -> Document {
		self.document
	}

	/// Returns the lock registry.
	pub fn registry(&self) -> &LockRegistry {
		&self.registry
	}

	/// Mutable registry access for administrative callers.
	pub fn registry_mut(&mut self) -> &mut LockRegistry {
		&mut self.registry
	}

	/// Returns the undo history.
	pub fn history(&self) -> &UndoHistory {
		&self.history
	}

	/// Returns the mutation filter.
	pub fn filter(&self) -> &MutationFilter {
		&self.filter
	}

	/// Installs or clears the rejection hook.
	pub fn set_reject_hook(&mut self, hook: Option<RejectHook>) {
		self.filter.set_hook(hook);
	}

	/// Returns the cursor position.
	pub fn cursor(&self) -> CharIdx {
		self.cursor
	}

	/// Moves the cursor, clamped to the document.
	pub fn set_cursor(&mut self, pos: CharIdx) {
		self.cursor = pos.min(self.document.size());
	}

	/// Every registered lock's current region.
	pub fn locked_regions(&self) -> Vec<LockedRegion> {
		locked_regions(&self.document, &self.registry)
	}

	/// Filters and commits a batch.
	///
	/// Lock violations are an outcome, not an error; only malformed geometry
	/// is reported as `Err`. Either way a failed batch changes nothing.
	pub fn submit(&mut self, batch: MutationBatch) -> Result<CommitOutcome, BatchError> {
		if batch.is_empty() {
			return Ok(CommitOutcome::Unchanged);
		}
		if let Verdict::Reject(violation) = self.filter.check(&batch, &self.document, &self.registry) {
			return Ok(CommitOutcome::Rejected(violation));
		}

		let meta = batch.meta();
		let entry = (!meta.history_exempt).then(|| HistoryEntry::inverse_of(&batch, &self.document));
		let changes = self.document.apply(&batch)?;
		match entry {
			Some(entry) => self.history.record(entry, &changes),
			None => self.history.map_through(&changes),
		}
		Ok(CommitOutcome::Applied(self.finish(changes, meta)))
	}

	/// Inserts user text at `at`.
	pub fn insert_text(&mut self, at: CharIdx, text: &str) -> Result<CommitOutcome, BatchError> {
		self.submit(MutationBatch::user(vec![Step::insert(at, Fragment::Text(text.into()))]))
	}

	/// Inserts user text at the cursor.
	pub fn type_text(&mut self, text: &str) -> Result<CommitOutcome, BatchError> {
		self.insert_text(self.cursor, text)
	}

	/// Deletes a user range.
	pub fn delete(&mut self, span: impl Into<Span>) -> Result<CommitOutcome, BatchError> {
		self.submit(MutationBatch::user(vec![Step::delete(span)]))
	}

	/// Replaces a user range with text.
	pub fn replace(&mut self, span: impl Into<Span>, text: &str) -> Result<CommitOutcome, BatchError> {
		self.submit(MutationBatch::user(vec![Step::replace(span, Fragment::Text(text.into()))]))
	}

	/// Reverts the most recent user edit still in the timeline.
	pub fn undo(&mut self) -> UndoOutcome {
		self.replay(Replay::Undo)
	}

	/// Re-applies the most recently undone user edit.
	pub fn redo(&mut self) -> UndoOutcome {
		self.replay(Replay::Redo)
	}

	fn replay(&mut self, direction: Replay) -> UndoOutcome {
		let entry = match direction {
			Replay::Undo => self.history.peek_undo(),
			Replay::Redo => self.history.peek_redo(),
		};
		let Some(batch) = entry.map(HistoryEntry::to_batch) else {
			return UndoOutcome::Empty;
		};

		if let Verdict::Reject(violation) = self.filter.check(&batch, &self.document, &self.registry) {
			return UndoOutcome::Rejected(violation);
		}

		let inverse = HistoryEntry::inverse_of(&batch, &self.document);
		let changes = match self.document.apply(&batch) {
			Ok(changes) => changes,
			Err(err) => {
				warn!(error = %err, "history entry no longer applies, dropping it");
				match direction {
					Replay::Undo => self.history.discard_undo(),
					Replay::Redo => self.history.discard_redo(),
				}
				return UndoOutcome::Discarded(err);
			}
		};
		match direction {
			Replay::Undo => self.history.finish_undo(inverse, &changes),
			Replay::Redo => self.history.finish_redo(inverse, &changes),
		}
		UndoOutcome::Applied(self.finish(changes, batch.meta()))
	}

	fn finish(&mut self, changes: ChangeSet, meta: BatchMeta) -> CommitReceipt {
		self.cursor = changes.map_pos(self.cursor, Bias::Right);
		let version = self.document.version();
		debug!(version, origin = ?meta.origin, action = ?meta.action, "batch committed");
		CommitReceipt { version, changes, meta }
	}
}

impl EditHost for DocumentEngine {
	fn document(&self) -> &Document {
		&self.document
	}

	fn cursor(&self) -> CharIdx {
		self.cursor
	}

	fn submit(&mut self, batch: MutationBatch) -> Result<CommitOutcome, BatchError> {
		DocumentEngine::submit(self, batch)
	}

	fn register_lock(&mut self, lock_id: &str, source: Option<SourceTag>) {
		self.registry.add_with_source(lock_id, source);
	}
}
