//! The single choke point for edits: a destructive batch that touches a
//! registered lock is rejected as a whole.
//!
//! The filter judges the pre-batch document only. It does not look at
//! insertions, does not care who produced the batch and never writes to the
//! registry; a lock that exists in the tree but is not registered does not
//! protect anything.


use std::fmt;

use sigil_primitives::Span;
use tracing::debug;

use crate::batch::MutationBatch;
use crate::document::Document;
use crate::extract::{ExtractedLock, extract_mark, extract_node};
use crate::registry::LockRegistry;

/// Why a batch was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
	/// Lock that would have been damaged.
	pub lock_id: String,
	/// Index of the first offending step.
	pub step_index: usize,
	/// Span of the locked node or marked run, pre-batch.
	pub span: Span,
}

impl fmt::Display for Violation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "step {} touches lock {} at {}", self.step_index, self.lock_id, self.span)
	}
}

/// Outcome of filtering one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
	/// The batch may be committed.
	Accept,
	/// The batch must be dropped in its entirety.
	Reject(Violation),
}

impl Verdict {
	/// Returns true for [`Verdict::Accept`].
	pub fn is_accept(&self) -> bool {
		matches!(self, Verdict::Accept)
	}
}

fn registered(lock: Option<ExtractedLock>, registry: &LockRegistry) -> Option<String> {
	lock.map(|l| l.lock_id).filter(|id| registry.has(id))
}

/// Decides whether `batch` may be applied to `doc`.
///
/// A batch without destructive steps is always accepted. Otherwise every node
/// and mark whose span shares a character with a deleted span is checked; the
/// first registered lock found rejects the batch.
pub fn evaluate(batch: &MutationBatch, doc: &Document, registry: &LockRegistry) -> Verdict {
	if !batch.is_destructive() || registry.is_empty() {
		return Verdict::Accept;
	}

	for (step_index, step) in batch.steps().iter().enumerate() {
		if !step.is_destructive() {
			continue;
		}
		for node in doc.intersecting(step.span) {
			let hit = registered(extract_node(doc, node, Some(registry)), registry).or_else(|| {
				node.marks()
					.iter()
					.find_map(|mark| registered(extract_mark(doc, node, mark, Some(registry)), registry))
			});
			if let Some(lock_id) = hit {
				return Verdict::Reject(Violation {
					lock_id,
					step_index,
					span: node.span(),
				});
			}
		}
	}
	Verdict::Accept
}

/// Signal fired once per rejected batch. The details travel in the
/// [`Verdict`].
pub type RejectHook = Box<dyn FnMut() + Send>;

/// Stateful front end to [`evaluate`] with an optional rejection hook.
#[derive(Default)]
pub struct MutationFilter {
	on_reject: Option<RejectHook>,
	rejected: u64,
}

impl fmt::Debug for MutationFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MutationFilter")
			.field("on_reject", &self.on_reject.is_some())
			.field("rejected", &self.rejected)
			.finish()
	}
}

impl MutationFilter {
	/// A filter without a rejection hook.
	pub fn new() -> Self {
		Self::default()
	}

	/// A filter that calls `hook` whenever a batch is rejected.
	pub fn with_hook(hook: impl FnMut() + Send + 'static) -> Self {
		Self {
			on_reject: Some(Box::new(hook)),
			rejected: 0,
		}
	}

	/// Replaces the rejection hook.
	pub fn set_hook(&mut self, hook: Option<RejectHook>) {
		self.on_reject = hook;
	}

	/// Number of batches rejected so far.
	pub fn rejected(&self) -> u64 {
		self.rejected
	}

	/// Evaluates `batch` and fires the hook on rejection.
	pub fn check(&mut self, batch: &MutationBatch, doc: &Document, registry: &LockRegistry) -> Verdict {
		let verdict = evaluate(batch, doc, registry);
		if let Verdict::Reject(violation) = &verdict {
			self.rejected += 1;
			debug!(
				lock = %violation.lock_id,
				step = violation.step_index,
				span = %violation.span,
				origin = ?batch.meta().origin,
				"batch rejected: locked content"
			);
			if let Some(hook) = self.on_reject.as_mut() {
				hook();
			}
		}
		verdict
	}
}
