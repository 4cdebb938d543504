//! Legacy inline lock markers: `<!-- lock:<id>[ source:<tag>] -->`.

use std::sync::LazyLock;

use regex::Regex;

use crate::source::SourceTag;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"<!--\s*lock:\s*([^\s>]+?)(?:\s+source:\s*([^\s>]+?))?\s*-->")
		.expect("marker pattern is valid")
});

/// The first marker found in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
	/// Lock id named by the marker.
	pub lock_id: String,
	/// Raw source tag text, not yet validated.
	pub raw_source: Option<String>,
	/// Character offset where the marker starts.
	pub char_offset: usize,
}

/// Finds the first marker in `text`. Later markers are ignored.
pub fn find_first(text: &str) -> Option<Marker> {
	let caps = MARKER.captures(text)?;
	let whole = caps.get(0)?;
	Some(Marker {
		lock_id: caps.get(1)?.as_str().to_owned(),
		raw_source: caps.get(2).map(|m| m.as_str().to_owned()),
		char_offset: text[..whole.start()].chars().count(),
	})
}

/// Removes every marker from `text`, along with whitespace left dangling at
/// the end.
pub fn strip(text: &str) -> String {
	MARKER.replace_all(text, "").trim_end().to_owned()
}

/// Renders the canonical marker for a lock.
pub fn render(lock_id: &str, source: Option<SourceTag>) -> String {
	match source {
		Some(source) => format!("<!-- lock:{lock_id} source:{source} -->"),
		None => format!("<!-- lock:{lock_id} -->"),
	}
}

/// Strips stale markers from `content` and appends the canonical one.
pub fn seal(content: &str, lock_id: &str, source: Option<SourceTag>) -> String {
	let body = strip(content);
	let marker = render(lock_id, source);
	if body.is_empty() {
		marker
	} else {
		format!("{body} {marker}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn offset_counts_chars() {
		let found = find_first("第一句 <!-- lock:L1 -->").unwrap();
		assert_eq!(found.char_offset, 4);
		assert_eq!(found.raw_source, None);
	}

	#[test]
	fn seal_replaces_every_marker() {
		let sealed = seal("a <!-- lock:x --> b <!-- lock:y source:agentB -->  ", "L", Some(SourceTag::AgentA));
		assert_eq!(sealed, "a  b <!-- lock:L source:agentA -->");
		assert_eq!(seal("<!-- lock:old -->", "L", None), "<!-- lock:L -->");
	}

	#[test]
	fn loose_spacing_is_accepted() {
		let found = find_first("<!--lock: id-1   source: loki-->").unwrap();
		assert_eq!(found.lock_id, "id-1");
		assert_eq!(found.raw_source.as_deref(), Some("loki"));
	}
}
