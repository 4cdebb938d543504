//! Guard tuning, loaded from TOML.
//!
//! ```toml
//! delete_throttle_ms = 1500
//!
//! [sentence]
//! min_window = 12
//! max_scan = 400
//!
//! [history]
//! max_undo = 100
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::MAX_UNDO;
use crate::injector::DEFAULT_DELETE_INTERVAL;
use crate::sentence::SentenceConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or an unknown key.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
}

/// Undo history settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
	/// Maximum number of undo entries kept.
	pub max_undo: usize,
}

impl Default for HistoryConfig {
	fn default() -> Self {
		Self { max_undo: MAX_UNDO }
	}
}

/// Top-level guard configuration. Every field has a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
	/// Minimum gap between agent deletions, in milliseconds.
	pub delete_throttle_ms: u64,
	/// Sentence locator tuning.
	pub sentence: SentenceConfig,
	/// Undo history tuning.
	pub history: HistoryConfig,
}

impl Default for GuardConfig {
	fn default() -> Self {
		Self {
			delete_throttle_ms: DEFAULT_DELETE_INTERVAL.as_millis() as u64,
			sentence: SentenceConfig::default(),
			history: HistoryConfig::default(),
		}
	}
}

impl GuardConfig {
	/// Parse a TOML string into a [`GuardConfig`].
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(input)?)
	}

	/// Load configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// The delete throttle interval.
	pub fn delete_interval(&self) -> Duration {
		Duration::from_millis(self.delete_throttle_ms)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_input_is_default() {
		assert_eq!(GuardConfig::parse("").unwrap(), GuardConfig::default());
		assert_eq!(GuardConfig::default().delete_interval(), Duration::from_millis(1500));
	}

	#[test]
	fn partial_tables_keep_other_defaults() {
		let config = GuardConfig::parse("delete_throttle_ms = 200\n[sentence]\nmax_scan = 50\n").unwrap();
		assert_eq!(config.delete_throttle_ms, 200);
		assert_eq!(config.sentence.max_scan, 50);
		assert_eq!(config.sentence.min_window, 12);
		assert_eq!(config.history.max_undo, 100);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		assert!(matches!(GuardConfig::parse("throttle = 1"), Err(ConfigError::Toml(_))));
	}

	#[test]
	fn missing_file_reports_path() {
		let err = GuardConfig::load("/nonexistent/sigil.toml").unwrap_err();
		assert!(err.to_string().contains("/nonexistent/sigil.toml"));
	}
}
