//! Lock recovery from nodes, marks and serialized documents.
//!
//! A lock is found in one of two places, checked in order:
//!
//! 1. **Attributes** on a container node or a mark (`data-lock-id`, then
//!    `lockId`; source in `data-source` or `source`).
//! 2. **Legacy markers** in the flattened text, `<!-- lock:<id> source:<tag> -->`,
//!    kept for documents whose attributes were lost on a round trip.
//!
//! Extraction is total: absent, empty or non-string ids mean "no lock".

pub mod marker;


use sigil_primitives::Span;
use tracing::trace;

use crate::document::{Attrs, Document, LockBearer, Mark, Node};
use crate::registry::LockRegistry;
use crate::source::SourceTag;

/// Primary attribute key holding a lock id.
pub const LOCK_ID_KEY: &str = "lockId";
/// Secondary, HTML-style attribute key; wins when both keys are set.
pub const DATA_LOCK_ID_KEY: &str = "data-lock-id";
/// Attribute key holding the source tag.
pub const SOURCE_KEY: &str = "data-source";
/// Older spelling of [`SOURCE_KEY`].
pub const LEGACY_SOURCE_KEY: &str = "source";

/// Where an extracted lock was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOrigin {
	/// Node or mark attributes.
	Attribute,
	/// An inline legacy marker.
	LegacyMarker,
}

/// A lock recovered from a node or mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLock {
	/// The lock id, never empty.
	pub lock_id: String,
	/// Validated source, if one was found or looked up.
	pub source: Option<SourceTag>,
	/// For legacy markers: characters of the node text before the marker.
	pub owned_text_len: Option<usize>,
	/// Which representation produced the lock.
	pub origin: LockOrigin,
}

fn non_empty_str<'a>(attrs: &'a Attrs, key: &str) -> Option<&'a str> {
	attrs
		.get(key)
		.and_then(serde_json::Value::as_str)
		.filter(|s| !s.trim().is_empty())
}

fn attr_source(attrs: &Attrs) -> Option<SourceTag> {
	[SOURCE_KEY, LEGACY_SOURCE_KEY]
		.into_iter()
		.find_map(|key| attrs.get(key).and_then(serde_json::Value::as_str))
		.and_then(SourceTag::parse)
}

/// Recovers a lock from an attribute map and the text it governs.
///
/// `registry` is only consulted to fill in a missing source; it never decides
/// whether a lock exists.
pub fn extract(
	attrs: Option<&Attrs>,
	text: &str,
	registry: Option<&LockRegistry>,
) -> Option<ExtractedLock> {
	let from_attrs = attrs.and_then(|attrs| {
		let id = non_empty_str(attrs, DATA_LOCK_ID_KEY).or_else(|| non_empty_str(attrs, LOCK_ID_KEY))?;
		Some(ExtractedLock {
			lock_id: id.to_owned(),
			source: attr_source(attrs),
			owned_text_len: None,
			origin: LockOrigin::Attribute,
		})
	});

	let mut lock = from_attrs.or_else(|| {
		let found = marker::find_first(text)?;
		if found.lock_id.trim().is_empty() {
			return None;
		}
		Some(ExtractedLock {
			source: found.raw_source.as_deref().and_then(SourceTag::parse),
			lock_id: found.lock_id,
			owned_text_len: Some(found.char_offset),
			origin: LockOrigin::LegacyMarker,
		})
	})?;

	if lock.source.is_none()
		&& let Some(registry) = registry
	{
		lock.source = registry.source_of(&lock.lock_id);
	}
	Some(lock)
}

/// Extracts the lock carried by `node`, reading its flattened text from `doc`.
pub fn extract_node(
	doc: &Document,
	node: &Node,
	registry: Option<&LockRegistry>,
) -> Option<ExtractedLock> {
	extract(node.lock_attrs(), &doc.node_text(node), registry)
}

/// Extracts the lock carried by `mark` on the text run `node`.
pub fn extract_mark(
	doc: &Document,
	node: &Node,
	mark: &Mark,
	registry: Option<&LockRegistry>,
) -> Option<ExtractedLock> {
	extract(mark.lock_attrs(), &doc.node_text(node), registry)
}

/// Every lock found anywhere in the document, in document order.
///
/// Marks come right after the run they sit on. The same id may appear more
/// than once if the document carries it in several places.
pub fn extract_all(doc: &Document) -> Vec<(Span, ExtractedLock)> {
	let mut out = Vec::new();
	for node in doc.walk() {
		let span = node.span();
		if let Some(lock) = extract_node(doc, node, None) {
			out.push((span, lock));
		}
		for mark in node.marks() {
			if let Some(lock) = extract_mark(doc, node, mark, None) {
				out.push((span, lock));
			}
		}
	}
	out
}

/// Seeds `registry` with every lock in `doc`. Returns how many were found.
///
/// Must run before the first batch is filtered; the filter never registers
/// anything by itself.
pub fn seed_registry(doc: &Document, registry: &mut LockRegistry) -> usize {
	let found = extract_all(doc);
	for (span, lock) in &found {
		trace!(lock = %lock.lock_id, %span, origin = ?lock.origin, "lock recovered");
		registry.add_with_source(lock.lock_id.clone(), lock.source);
	}
	found.len()
}

/// A live locked region, recomputed from the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedRegion {
	/// Registered lock id.
	pub lock_id: String,
	/// Current span of the governing node or marked run.
	pub span: Span,
	/// Source, from the document or the registry.
	pub source: Option<SourceTag>,
	/// Representation the lock was read from.
	pub origin: LockOrigin,
}

/// Lists the regions whose lock id is registered.
pub fn locked_regions(doc: &Document, registry: &LockRegistry) -> Vec<LockedRegion> {
	extract_all(doc)
		.into_iter()
		.filter(|(_, lock)| registry.has(&lock.lock_id))
		.map(|(span, lock)| LockedRegion {
			source: lock.source.or_else(|| registry.source_of(&lock.lock_id)),
			lock_id: lock.lock_id,
			span,
			origin: lock.origin,
		})
		.collect()
}
