//! Source classification for locks.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which agent policy created a lock.
///
/// Parsing is case-insensitive and accepts the agents' working-mode names
/// (`muse`, `loki`) as aliases. Anything else is not a source tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTag {
	/// The pressure agent that writes when the author is stuck (`muse`).
	AgentA,
	/// The disruptive agent that acts at random (`loki`).
	AgentB,
}

impl SourceTag {
	/// Normalizes and validates a raw tag, returning `None` for unknown values.
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"agenta" | "muse" => Some(Self::AgentA),
			"agentb" | "loki" => Some(Self::AgentB),
			_ => None,
		}
	}

	/// Canonical wire spelling.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::AgentA => "agentA",
			Self::AgentB => "agentB",
		}
	}
}

impl fmt::Display for SourceTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for SourceTag {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for SourceTag {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		Self::parse(&raw)
			.ok_or_else(|| serde::de::Error::custom(format!("unknown source tag `{raw}`")))
	}
}
