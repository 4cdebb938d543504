//! Intervention directives as they arrive from the agent service.
//!
//! ```json
//! { "action": "inject", "content": "...", "lockId": "L1",
//!   "anchor": { "type": "pos", "from": 10 }, "sourceTag": "agentA" }
//! ```
//!
//! Older payloads are accepted too: `"provoke"` for `inject`, snake_case keys
//! (`lock_id`, `ref_lock_id`, `source`) and `"lock_id"` as an anchor type.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::injector::{ContentInjector, EditHost, InjectOutcome};
use crate::source::SourceTag;

/// Errors raised while decoding a directive.
#[derive(Debug, Error)]
pub enum DirectiveError {
	/// The payload is not a directive.
	#[error("invalid directive JSON: {0}")]
	Json(#[from] serde_json::Error),

	/// Inject and rewrite need content.
	#[error("{action} directive has no content")]
	MissingContent {
		/// Offending action.
		action: DirectiveAction,
	},

	/// Delete needs a range anchor; rewrite needs one unless it has none.
	#[error("{action} directive needs a range anchor")]
	MissingRange {
		/// Offending action.
		action: DirectiveAction,
	},
}

/// Requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveAction {
	/// Insert a new locked block.
	#[serde(alias = "provoke")]
	Inject,
	/// Replace a range with a new locked block.
	Rewrite,
	/// Remove a range.
	Delete,
}

impl std::fmt::Display for DirectiveAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			DirectiveAction::Inject => "inject",
			DirectiveAction::Rewrite => "rewrite",
			DirectiveAction::Delete => "delete",
		})
	}
}

/// Where a directive applies.
///
/// Positions are signed so that out-of-range input from a stale client is
/// representable and can be rejected by the injector instead of the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Anchor {
	/// A single position.
	#[serde(rename = "pos")]
	Pos {
		/// Position in characters.
		from: i64,
	},
	/// A half-open range.
	#[serde(rename = "range")]
	Range {
		/// Start, inclusive.
		from: i64,
		/// End, exclusive.
		to: i64,
	},
	/// A reference to an existing lock.
	#[serde(rename = "lockRef", alias = "lock_id")]
	LockRef {
		/// Referenced lock id.
		#[serde(rename = "refLockId", alias = "ref_lock_id")]
		ref_lock_id: String,
	},
}

/// One instruction from the agent service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionDirective {
	/// Requested operation.
	pub action: DirectiveAction,
	/// Content for inject and rewrite.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
	/// Lock id for the new region; generated when absent.
	#[serde(default, alias = "lock_id", skip_serializing_if = "Option::is_none")]
	pub lock_id: Option<String>,
	/// Target of the operation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub anchor: Option<Anchor>,
	/// Raw source tag; unknown values are ignored.
	#[serde(default, alias = "source", skip_serializing_if = "Option::is_none")]
	pub source_tag: Option<String>,
}

/// Generates a fresh lock id of the form `lock_<uuid>`.
pub fn generate_lock_id() -> String {
	format!("lock_{}", Uuid::new_v4())
}

impl InterventionDirective {
	/// Decodes and validates a directive.
	pub fn parse(json: &str) -> Result<Self, DirectiveError> {
		let directive: Self = serde_json::from_str(json)?;
		directive.validate()?;
		Ok(directive)
	}

	/// Checks that the payload fits the action.
	///
	/// Geometry is not checked here; out-of-bounds anchors are the injector's
	/// business.
	pub fn validate(&self) -> Result<(), DirectiveError> {
		let action = self.action;
		let has_content = self.content.as_deref().is_some_and(|c| !c.trim().is_empty());
		match action {
			DirectiveAction::Inject | DirectiveAction::Rewrite if !has_content => {
				Err(DirectiveError::MissingContent { action })
			}
			DirectiveAction::Rewrite
				if self.anchor.as_ref().is_some_and(|a| !matches!(a, Anchor::Range { .. })) =>
			{
				Err(DirectiveError::MissingRange { action })
			}
			DirectiveAction::Delete if !matches!(self.anchor, Some(Anchor::Range { .. })) => {
				Err(DirectiveError::MissingRange { action })
			}
			_ => Ok(()),
		}
	}

	/// Validated source tag.
	pub fn source(&self) -> Option<SourceTag> {
		self.source_tag.as_deref().and_then(SourceTag::parse)
	}

	/// The lock id to use, generating one when none was sent.
	pub fn resolve_lock_id(&self) -> String {
		self.lock_id
			.as_deref()
			.map(str::trim)
			.filter(|id| !id.is_empty())
			.map_or_else(generate_lock_id, str::to_owned)
	}

	/// Runs the directive through `injector` against `host`.
	pub fn apply<H: EditHost>(&self, injector: &mut ContentInjector, host: &mut H, now: Instant) -> InjectOutcome {
		let content = self.content.as_deref().unwrap_or_default();
		let anchor = self.anchor.as_ref();
		match self.action {
			DirectiveAction::Inject => {
				injector.inject_block(host, content, &self.resolve_lock_id(), anchor, self.source())
			}
			DirectiveAction::Rewrite => {
				injector.rewrite_range(host, content, &self.resolve_lock_id(), anchor, self.source())
			}
			DirectiveAction::Delete => injector.delete_range_at(host, anchor, now),
		}
	}
}
