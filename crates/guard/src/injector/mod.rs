//! The only sanctioned way to create locked regions.
//!
//! Every operation turns into exactly one history-exempt agent batch, which
//! goes through the same mutation filter as a user edit. Bad geometry from a
//! directive is never an error: it degrades to a logged no-op or to the
//! cursor.
//!
//! ```text
//! ContentInjector                 EditHost (DocumentEngine implements)
//! ┌──────────────────┐           ┌──────────────────────────┐
//! │ throttle         │           │ document() / cursor()    │
//! │ locator          │◄─────────►│ submit(batch)            │
//! │                  │           │ register_lock(id, src)   │
//! │ inject_block()   │           └──────────────────────────┘
//! │ rewrite_range()  │
//! │ delete_range()   │
//! └──────────────────┘
//! ```

mod throttle;

#[cfg(test)]
mod tests;

use std::time::{Duration, Instant};

use sigil_primitives::{CharIdx, Span};
pub use throttle::{DEFAULT_DELETE_INTERVAL, DeleteThrottle};
use tracing::{debug, warn};

use crate::batch::{ActionKind, BatchError, Fragment, MutationBatch, Step};
use crate::config::GuardConfig;
use crate::directive::Anchor;
use crate::document::{Attrs, Document};
use crate::engine::CommitOutcome;
use crate::extract::{LOCK_ID_KEY, SOURCE_KEY, extract_all, marker};
use crate::filter::Violation;
use crate::sentence::{SentenceConfig, SentenceLocator};
use crate::source::SourceTag;

/// What the injector needs from the component that owns the document.
pub trait EditHost {
	/// Current document.
	fn document(&self) -> &Document;

	/// Current cursor position.
	fn cursor(&self) -> CharIdx;

	/// Filters and, if accepted, commits a batch.
	fn submit(&mut self, batch: MutationBatch) -> Result<CommitOutcome, BatchError>;

	/// Registers a lock created by a committed batch.
	fn register_lock(&mut self, lock_id: &str, source: Option<SourceTag>);
}

/// Why a directive was dropped without touching the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
	/// Content was empty or whitespace only.
	EmptyContent,
	/// No usable lock id.
	EmptyLockId,
	/// The range was inverted, empty or out of bounds.
	InvalidRange {
		/// Requested start.
		from: i64,
		/// Requested end.
		to: i64,
	},
	/// The operation needs a range anchor.
	UnsupportedAnchor,
	/// The sentence locator found nothing before the cursor.
	NothingToRewrite,
	/// A delete arrived inside the throttle interval.
	Throttled {
		/// Time left before the next delete may run.
		remaining: Duration,
	},
	/// The host refused the batch geometry.
	Malformed(BatchError),
}

/// Result of one injector operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectOutcome {
	/// The batch was committed.
	Committed {
		/// Lock created by the batch; `None` for deletions.
		lock_id: Option<String>,
		/// Span of the new content, or the deletion point.
		span: Span,
	},
	/// The mutation filter refused the batch.
	Rejected(Violation),
	/// Nothing was attempted.
	Skipped(SkipReason),
}

impl InjectOutcome {
	/// Returns true if the document changed.
	pub fn is_committed(&self) -> bool {
		matches!(self, InjectOutcome::Committed { .. })
	}
}

/// Where an insertion lands: the anchor start when it is in bounds, right
/// after the referenced lock's region when that lock is in the document, the
/// cursor otherwise.
fn insert_position(anchor: Option<&Anchor>, doc: &Document, cursor: CharIdx) -> CharIdx {
	let size = doc.size();
	match anchor {
		Some(Anchor::Pos { from } | Anchor::Range { from, .. }) => match usize::try_from(*from) {
			Ok(pos) if pos <= size => pos,
			_ => {
				debug!(from, size, cursor, "anchor out of bounds, using cursor");
				cursor.min(size)
			}
		},
		Some(Anchor::LockRef { ref_lock_id }) => {
			let region = extract_all(doc)
				.into_iter()
				.find(|(_, lock)| lock.lock_id == *ref_lock_id)
				.map(|(span, _)| span);
			match region {
				Some(span) => span.to,
				None => {
					debug!(lock = %ref_lock_id, cursor, "referenced lock not found, using cursor");
					cursor.min(size)
				}
			}
		}
		None => cursor.min(size),
	}
}

/// Validates a range anchor: `0 <= from < to <= size`.
fn checked_range(from: i64, to: i64, size: CharIdx) -> Result<Span, SkipReason> {
	match (usize::try_from(from), usize::try_from(to)) {
		(Ok(f), Ok(t)) if f < t && t <= size => Ok(Span { from: f, to: t }),
		_ => Err(SkipReason::InvalidRange { from, to }),
	}
}

fn locked_block(content: &str, lock_id: &str, source: Option<SourceTag>) -> Fragment {
	let mut attrs = Attrs::new();
	attrs.insert(LOCK_ID_KEY.into(), lock_id.into());
	if let Some(source) = source {
		attrs.insert(SOURCE_KEY.into(), source.as_str().into());
	}
	Fragment::Block {
		text: marker::seal(content, lock_id, source),
		attrs,
	}
}

fn check_payload(content: &str, lock_id: &str) -> Result<(), SkipReason> {
	if content.trim().is_empty() {
		return Err(SkipReason::EmptyContent);
	}
	if lock_id.trim().is_empty() {
		return Err(SkipReason::EmptyLockId);
	}
	Ok(())
}

fn skipped(op: &'static str, reason: SkipReason) -> InjectOutcome {
	warn!(op, ?reason, "directive skipped");
	InjectOutcome::Skipped(reason)
}

/// Builds agent batches for inject, rewrite and delete directives.
#[derive(Debug, Clone, Default)]
pub struct ContentInjector {
	throttle: DeleteThrottle,
	locator: SentenceLocator,
}

impl ContentInjector {
	/// Creates an injector with explicit tuning.
	pub fn new(delete_interval: Duration, sentence: SentenceConfig) -> Self {
		Self {
			throttle: DeleteThrottle::new(delete_interval),
			locator: SentenceLocator::new(sentence),
		}
	}

	/// Creates an injector from the guard configuration.
	pub fn from_config(config: &GuardConfig) -> Self {
		Self::new(config.delete_interval(), config.sentence)
	}

	/// Returns the delete throttle.
	pub fn throttle(&self) -> &DeleteThrottle {
		&self.throttle
	}

	/// Inserts `content` as a new locked block.
	///
	/// Position and range anchors give the insertion point and a lock
	/// reference places the block right after that lock's region. Unknown
	/// references, missing anchors and out-of-bounds positions fall back to
	/// the cursor.
	pub fn inject_block<H: EditHost>(
		&mut self,
		host: &mut H,
		content: &str,
		lock_id: &str,
		anchor: Option<&Anchor>,
		source: Option<SourceTag>,
	) -> InjectOutcome {
		if let Err(reason) = check_payload(content, lock_id) {
			return skipped("inject", reason);
		}
		let at = insert_position(anchor, host.document(), host.cursor());
		let block = locked_block(content, lock_id, source);
		let len = block.char_len();
		let batch = MutationBatch::agent(ActionKind::Inject, vec![Step::insert(at, block)]);
		self.commit_locked(host, batch, lock_id, source, Span::new(at, at + len))
	}

	/// Replaces a range with `content` as a new locked block.
	///
	/// Only range anchors are accepted. Without an anchor the last complete
	/// sentence before the cursor is replaced.
	pub fn rewrite_range<H: EditHost>(
		&mut self,
		host: &mut H,
		content: &str,
		lock_id: &str,
		anchor: Option<&Anchor>,
		source: Option<SourceTag>,
	) -> InjectOutcome {
		if let Err(reason) = check_payload(content, lock_id) {
			return skipped("rewrite", reason);
		}
		let size = host.document().size();
		let span = match anchor {
			Some(Anchor::Range { from, to }) => match checked_range(*from, *to, size) {
				Ok(span) => span,
				Err(reason) => return skipped("rewrite", reason),
			},
			Some(Anchor::Pos { .. } | Anchor::LockRef { .. }) => {
				return skipped("rewrite", SkipReason::UnsupportedAnchor);
			}
			None => {
				let span = self.locator.locate(host.document().text().slice(..), host.cursor());
				if span.is_empty() {
					return skipped("rewrite", SkipReason::NothingToRewrite);
				}
				debug!(%span, cursor = host.cursor(), "rewrite target located");
				span
			}
		};

		let block = locked_block(content, lock_id, source);
		let len = block.char_len();
		let batch = MutationBatch::agent(ActionKind::Rewrite, vec![Step::replace(span, block)]);
		self.commit_locked(host, batch, lock_id, source, Span::new(span.from, span.from + len))
	}

	/// Deletes a range, subject to the throttle. Never creates a lock.
	pub fn delete_range<H: EditHost>(&mut self, host: &mut H, anchor: Option<&Anchor>) -> InjectOutcome {
		self.delete_range_at(host, anchor, Instant::now())
	}

	/// [`ContentInjector::delete_range`] with an explicit clock.
	pub fn delete_range_at<H: EditHost>(
		&mut self,
		host: &mut H,
		anchor: Option<&Anchor>,
		now: Instant,
	) -> InjectOutcome {
		let span = match anchor {
			Some(Anchor::Range { from, to }) => match checked_range(*from, *to, host.document().size()) {
				Ok(span) => span,
				Err(reason) => return skipped("delete", reason),
			},
			_ => return skipped("delete", SkipReason::UnsupportedAnchor),
		};
		if !self.throttle.is_due(now) {
			let remaining = self.throttle.remaining(now);
			debug!(?remaining, %span, "delete throttled");
			return InjectOutcome::Skipped(SkipReason::Throttled { remaining });
		}

		let batch = MutationBatch::agent(ActionKind::Delete, vec![Step::delete(span)]);
		match host.submit(batch) {
			Ok(CommitOutcome::Applied(_)) => {
				self.throttle.record(now);
				debug!(%span, "agent delete committed");
				InjectOutcome::Committed {
					lock_id: None,
					span: Span::point(span.from),
				}
			}
			Ok(CommitOutcome::Rejected(violation)) => InjectOutcome::Rejected(violation),
			Ok(CommitOutcome::Unchanged) => skipped("delete", SkipReason::NothingToRewrite),
			Err(err) => skipped("delete", SkipReason::Malformed(err)),
		}
	}

	fn commit_locked<H: EditHost>(
		&mut self,
		host: &mut H,
		batch: MutationBatch,
		lock_id: &str,
		source: Option<SourceTag>,
		span: Span,
	) -> InjectOutcome {
		let action = batch.meta().action;
		match host.submit(batch) {
			Ok(CommitOutcome::Applied(_)) => {
				host.register_lock(lock_id, source);
				debug!(lock = lock_id, ?action, %span, "locked content committed");
				InjectOutcome::Committed {
					lock_id: Some(lock_id.to_owned()),
					span,
				}
			}
			Ok(CommitOutcome::Rejected(violation)) => InjectOutcome::Rejected(violation),
			Ok(CommitOutcome::Unchanged) => skipped("inject", SkipReason::EmptyContent),
			Err(err) => skipped("inject", SkipReason::Malformed(err)),
		}
	}
}
