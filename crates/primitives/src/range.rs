//! Character-indexed spans over document text.

use serde::{Deserialize, Serialize};

/// A position in the text, measured in characters (not bytes).
///
/// This is the canonical coordinate space for every document position.
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
///
/// Kept distinct from [`CharIdx`] so an index is not accidentally passed
/// where a length is expected.
pub type CharLen = usize;

/// A half-open character range `[from, to)`.
///
/// Unlike a cursor selection a span has no direction; `from <= to` is an
/// invariant for every span built with [`Span::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
	/// Start of the span (inclusive).
	pub from: CharIdx,
	/// End of the span (exclusive).
	pub to: CharIdx,
}

impl Span {
	/// Creates a span, normalizing the endpoints so `from <= to`.
	pub fn new(a: CharIdx, b: CharIdx) -> Self {
		Self {
			from: a.min(b),
			to: a.max(b),
		}
	}

	/// Creates a zero-width span at `pos`.
	pub fn point(pos: CharIdx) -> Self {
		Self { from: pos, to: pos }
	}

	/// Returns the length of the span in characters.
	#[inline]
	pub fn len(&self) -> CharLen {
		self.to.saturating_sub(self.from)
	}

	/// Returns true for a zero-width span.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.to <= self.from
	}

	/// Returns true if `pos` lies inside `[from, to)`.
	#[inline]
	pub fn contains(&self, pos: CharIdx) -> bool {
		self.from <= pos && pos < self.to
	}

	/// Returns true if `other` lies entirely within this span.
	#[inline]
	pub fn covers(&self, other: Span) -> bool {
		self.from <= other.from && other.to <= self.to
	}

	/// Returns true if the two spans share at least one character.
	///
	/// Zero-width spans never intersect anything.
	#[inline]
	pub fn intersects(&self, other: Span) -> bool {
		self.from < other.to && other.from < self.to
	}

	/// Returns the overlapping part of two spans, if any.
	pub fn intersection(&self, other: Span) -> Option<Span> {
		self.intersects(other).then(|| Span {
			from: self.from.max(other.from),
			to: self.to.min(other.to),
		})
	}

	/// Clamps both endpoints into `[0, max]`.
	pub fn clamp(self, max: CharIdx) -> Self {
		Self {
			from: self.from.min(max),
			to: self.to.min(max),
		}
	}
}

impl From<std::ops::Range<CharIdx>> for Span {
	fn from(range: std::ops::Range<CharIdx>) -> Self {
		Self::new(range.start, range.end)
	}
}

impl std::fmt::Display for Span {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}, {})", self.from, self.to)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_normalizes_inverted_endpoints() {
		let span = Span::new(20, 10);
		assert_eq!(span, Span { from: 10, to: 20 });
		assert_eq!(span.len(), 10);
	}

	#[test]
	fn intersects_is_half_open() {
		let locked = Span::new(10, 25);
		assert!(locked.intersects(Span::new(5, 30)));
		assert!(locked.intersects(Span::new(24, 26)));
		assert!(!locked.intersects(Span::new(25, 30)));
		assert!(!locked.intersects(Span::new(0, 10)));
	}

	#[test]
	fn point_never_intersects() {
		let locked = Span::new(10, 25);
		assert!(!locked.intersects(Span::point(15)));
		assert!(locked.contains(15));
	}

	#[test]
	fn intersection_and_cover() {
		let a = Span::new(0, 10);
		assert_eq!(a.intersection(Span::new(5, 20)), Some(Span::new(5, 10)));
		assert_eq!(a.intersection(Span::new(10, 20)), None);
		assert!(a.covers(Span::new(2, 10)));
		assert!(!a.covers(Span::new(2, 11)));
	}
}
