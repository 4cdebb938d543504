//! The set of active lock identifiers for one document session.
//!
//! The registry only records that a lock *exists*. Where the locked content
//! lives is always recomputed from the document tree, so the registry never
//! goes stale when text shifts around it.
//!
//! Writers are deliberately few: the extractor seeds it at load time, the
//! content injector adds to it right after committing a new locked region,
//! and administrative callers may remove or clear entries. The mutation
//! filter only ever reads it.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::source::SourceTag;

/// Active lock ids with their optional source classification.
#[derive(Debug, Default, Clone)]
pub struct LockRegistry {
	locks: FxHashMap<String, Option<SourceTag>>,
}

impl LockRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `id` without a source. Re-adding an existing id is a no-op.
	pub fn add(&mut self, id: impl Into<String>) {
		self.add_with_source(id, None);
	}

	/// Registers `id`, recording `source` if none is known yet.
	///
	/// An existing source is never overwritten.
	pub fn add_with_source(&mut self, id: impl Into<String>, source: Option<SourceTag>) {
		let id = id.into();
		match self.locks.get_mut(&id) {
			Some(known) => {
				if known.is_none() && source.is_some() {
					trace!(lock = %id, ?source, "lock source enriched");
					*known = source;
				}
			}
			None => {
				trace!(lock = %id, ?source, total = self.locks.len() + 1, "lock registered");
				self.locks.insert(id, source);
			}
		}
	}

	/// Removes `id`. Only reachable from administrative or test code.
	pub fn remove(&mut self, id: &str) -> bool {
		let removed = self.locks.remove(id).is_some();
		if removed {
			trace!(lock = %id, "lock removed");
		}
		removed
	}

	/// Returns true if `id` is registered.
	pub fn has(&self, id: &str) -> bool {
		self.locks.contains_key(id)
	}

	/// Returns the recorded source of `id`, if any.
	pub fn source_of(&self, id: &str) -> Option<SourceTag> {
		self.locks.get(id).copied().flatten()
	}

	/// Returns every registered id, sorted.
	pub fn all(&self) -> BTreeSet<&str> {
		self.locks.keys().map(String::as_str).collect()
	}

	/// Number of registered locks.
	pub fn len(&self) -> usize {
		self.locks.len()
	}

	/// Returns true if no lock is registered.
	pub fn is_empty(&self) -> bool {
		self.locks.is_empty()
	}

	/// Drops every lock.
	pub fn clear(&mut self) {
		trace!(cleared = self.locks.len(), "lock registry cleared");
		self.locks.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn add_is_idempotent() {
		let mut reg = LockRegistry::new();
		reg.add("L1");
		let once: BTreeSet<String> = reg.all().into_iter().map(str::to_owned).collect();
		reg.add("L1");
		let twice: BTreeSet<String> = reg.all().into_iter().map(str::to_owned).collect();
		assert_eq!(once, twice);
		assert_eq!(reg.len(), 1);
	}

	#[test]
	fn source_is_filled_but_never_overwritten() {
		let mut reg = LockRegistry::new();
		reg.add("L1");
		assert_eq!(reg.source_of("L1"), None);
		reg.add_with_source("L1", Some(SourceTag::AgentA));
		assert_eq!(reg.source_of("L1"), Some(SourceTag::AgentA));
		reg.add_with_source("L1", Some(SourceTag::AgentB));
		assert_eq!(reg.source_of("L1"), Some(SourceTag::AgentA));
	}

	#[test]
	fn remove_and_clear() {
		let mut reg = LockRegistry::new();
		reg.add("a");
		reg.add("b");
		assert!(reg.remove("a"));
		assert!(!reg.remove("a"));
		assert!(!reg.has("a"));
		assert!(reg.has("b"));
		reg.clear();
		assert!(reg.is_empty());
	}

	#[test]
	fn all_is_sorted() {
		let mut reg = LockRegistry::new();
		for id in ["c", "a", "b"] {
			reg.add(id);
		}
		assert_eq!(reg.all().into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
	}
}
