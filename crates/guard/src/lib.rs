#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Locked-region enforcement for a live rich-text document.
//!
//! Content written by an agent is tagged with a lock id and becomes
//! immutable: any batch that would delete or overwrite a registered locked
//! region is rejected as a whole, whoever produced it.
//!
//! # Main Types
//!
//! - [`LockRegistry`] - set of active lock ids
//! - [`extract`] - lock recovery from attributes and legacy markers
//! - [`MutationFilter`] - accept/reject gate for every batch
//! - [`ContentInjector`] - inject, rewrite and delete directives
//! - [`DocumentEngine`] - owns the document, registry and user-only history
//!
//! # Architecture
//!
//! ```text
//! InterventionDirective ─► ContentInjector ─┐
//!                                           ├─► DocumentEngine::submit ─► MutationFilter ─► Document
//! user edit / undo / redo ──────────────────┘          │
//!                                               LockRegistry ◄── extract (load, after inject)
//! ```

pub mod batch;
pub mod config;
pub mod directive;
pub mod document;
pub mod engine;
pub mod extract;
pub mod filter;
pub mod history;
pub mod injector;
pub mod registry;
pub mod sentence;
pub mod session;
pub mod source;

pub use batch::{ActionKind, BatchError, BatchMeta, Fragment, MutationBatch, Origin, Step};
pub use config::{ConfigError, GuardConfig, HistoryConfig};
pub use directive::{Anchor, DirectiveAction, DirectiveError, InterventionDirective, generate_lock_id};
pub use document::{Attrs, Document, DocumentError, LockBearer, Mark, Node};
pub use engine::{CommitOutcome, CommitReceipt, DocumentEngine, UndoOutcome};
pub use extract::{ExtractedLock, LockOrigin, LockedRegion, locked_regions, seed_registry};
pub use filter::{MutationFilter, RejectHook, Verdict, Violation};
pub use history::{HistoryEntry, UndoHistory};
pub use injector::{ContentInjector, DeleteThrottle, EditHost, InjectOutcome, SkipReason};
pub use registry::LockRegistry;
pub use sentence::{SentenceConfig, SentenceLocator};
pub use session::EditSession;
pub use sigil_primitives::{CharIdx, Span};
pub use source::SourceTag;
