//! One document session: the engine plus the injector that feeds it.

use std::time::Instant;

use crate::config::GuardConfig;
use crate::directive::InterventionDirective;
use crate::document::Document;
use crate::engine::DocumentEngine;
use crate::injector::{ContentInjector, InjectOutcome};

/// Engine and injector for a single document.
#[derive(Debug, Default)]
pub struct EditSession {
	engine: DocumentEngine,
	injector: ContentInjector,
}

impl EditSession {
	/// A session over `document`, tuned by `config`.
	pub fn new(document: Document, config: &GuardConfig) -> Self {
		Self {
			engine: DocumentEngine::with_document(document, config),
			injector: ContentInjector::from_config(config),
		}
	}

	/// Returns the engine.
	pub fn engine(&self) -> &DocumentEngine {
		&self.engine
	}

	/// Mutable engine access, for user edits and undo.
	pub fn engine_mut(&mut self) -> &mut DocumentEngine {
		&mut self.engine
	}

	/// Returns the injector.
	pub fn injector(&self) -> &ContentInjector {
		&self.injector
	}

	/// Applies a directive now.
	pub fn apply_directive(&mut self, directive: &InterventionDirective) -> InjectOutcome {
		self.apply_directive_at(directive, Instant::now())
	}

	/// Applies a directive with an explicit clock for the delete throttle.
	pub fn apply_directive_at(&mut self, directive: &InterventionDirective, now: Instant) -> InjectOutcome {
		directive.apply(&mut self.injector, &mut self.engine, now)
	}

	/// Consumes the session, returning the document.
	pub fn into_document(self) -> Document {
		self.engine.into_document()
	}
}
