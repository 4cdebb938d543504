//! Rope utilities.

use ropey::RopeSlice;

use crate::range::Span;

/// Returns the text covered by `span`, clamped to the document.
pub fn span_text(text: RopeSlice, span: Span) -> String {
	let span = span.clamp(text.len_chars());
	text.slice(span.from..span.to).to_string()
}

#[cfg(test)]
mod tests {
	use ropey::Rope;

	use super::*;

	#[test]
	fn span_text_counts_chars_not_bytes() {
		let text = Rope::from("第一句。第二句。");
		assert_eq!(span_text(text.slice(..), Span::new(4, 8)), "第二句。");
	}

	#[test]
	fn span_text_clamps() {
		let text = Rope::from("hello");
		assert_eq!(span_text(text.slice(..), Span::new(3, 99)), "lo");
		assert_eq!(span_text(text.slice(..), Span::new(7, 9)), "");
	}
}
