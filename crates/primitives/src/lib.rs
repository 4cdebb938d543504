//! Core types for text editing: spans, rope helpers, and changesets.

/// Character-indexed span types.
pub mod range;
/// Rope utilities and extensions.
pub mod rope;
/// Retain/delete/insert changesets and transactions.
pub mod transaction;

pub use range::{CharIdx, CharLen, Span};
pub use rope::span_text;
pub use ropey::{Rope, RopeSlice};
pub use transaction::{Bias, Change, ChangeError, ChangeSet, Transaction};
