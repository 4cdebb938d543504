//! Locates the last complete sentence before the cursor.

use serde::{Deserialize, Serialize};
use sigil_primitives::{CharIdx, RopeSlice, Span};

/// Characters that end a sentence, Latin and CJK.
pub const TERMINATORS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

fn is_terminator(c: char) -> bool {
	TERMINATORS.contains(&c)
}

/// Tuning for [`SentenceLocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SentenceConfig {
	/// Width of the fallback window when no terminator is found.
	pub min_window: usize,
	/// How far back from the cursor the scan may look.
	pub max_scan: usize,
}

impl Default for SentenceConfig {
	fn default() -> Self {
		Self {
			min_window: 12,
			max_scan: 400,
		}
	}
}

/// Backward sentence scanner used when a rewrite arrives without an anchor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceLocator {
	config: SentenceConfig,
}

impl SentenceLocator {
	/// Creates a locator with the given tuning.
	pub fn new(config: SentenceConfig) -> Self {
		Self { config }
	}

	/// Returns the span of the last complete sentence ending at or before
	/// `cursor`.
	///
	/// Whitespace between the sentence and the cursor is skipped, as is
	/// whitespace opening the sentence. A newline also starts a sentence.
	/// Without a terminator inside the scan window the result is the last
	/// `min_window` characters before the cursor.
	pub fn locate(&self, text: RopeSlice, cursor: CharIdx) -> Span {
		let cursor = cursor.min(text.len_chars());
		let lower = cursor.saturating_sub(self.config.max_scan);
		let chars: Vec<char> = text.slice(lower..cursor).chars().collect();

		let mut end = chars.len();
		while end > 0 && chars[end - 1].is_whitespace() {
			end -= 1;
		}

		let Some(last) = chars[..end].iter().rposition(|&c| is_terminator(c)) else {
			return Span::new(cursor - self.config.min_window.min(cursor), cursor);
		};

		let mut run = last;
		while run > 0 && is_terminator(chars[run - 1]) {
			run -= 1;
		}

		let mut start = chars[..run]
			.iter()
			.rposition(|&c| is_terminator(c) || c == '\n')
			.map_or(0, |p| p + 1);
		while start < run && chars[start].is_whitespace() {
			start += 1;
		}

		Span::new(lower + start, lower + last + 1)
	}
}

#[cfg(test)]
mod tests {
	use sigil_primitives::Rope;

	use super::*;

	fn locate(text: &str, cursor: usize) -> (Span, String) {
		let rope = Rope::from(text);
		let span = SentenceLocator::default().locate(rope.slice(..), cursor);
		(span, rope.slice(span.from..span.to).to_string())
	}

	#[test]
	fn cjk_last_sentence() {
		let text = "第一句。第二句。第三句。";
		let (span, found) = locate(text, text.chars().count());
		assert_eq!(span, Span::new(8, 12));
		assert_eq!(found, "第三句。");
	}

	#[test]
	fn latin_with_trailing_whitespace() {
		let (_, found) = locate("One. Two!  Three?  ", 19);
		assert_eq!(found, "Three?");
	}

	#[test]
	fn trailing_fragment_is_not_a_complete_sentence() {
		let (_, found) = locate("Done. Still typing", 18);
		assert_eq!(found, "Done.");
	}

	#[test]
	fn newline_starts_a_sentence() {
		let (_, found) = locate("heading\n  body line.", 20);
		assert_eq!(found, "body line.");
	}

	#[test]
	fn repeated_terminators_stay_together() {
		let (_, found) = locate("Really?!? Yes...", 16);
		assert_eq!(found, "Yes...");
	}

	#[test]
	fn no_terminator_falls_back_to_window() {
		let text = "a".repeat(30);
		assert_eq!(locate(&text, 30).0, Span::new(18, 30));
		assert_eq!(locate(&text, 5).0, Span::new(0, 5));
	}

	#[test]
	fn scan_is_bounded() {
		let locator = SentenceLocator::new(SentenceConfig {
			min_window: 4,
			max_scan: 10,
		});
		let rope = Rope::from(format!("End.{}", "x".repeat(20)));
		assert_eq!(locator.locate(rope.slice(..), 24), Span::new(20, 24));
	}

	#[test]
	fn cursor_past_end_is_clamped() {
		let (span, _) = locate("Hi.", 99);
		assert_eq!(span, Span::new(0, 3));
	}
}
