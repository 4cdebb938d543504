use std::time::{Duration, Instant};

/// Default minimum gap between agent deletions.
pub const DEFAULT_DELETE_INTERVAL: Duration = Duration::from_millis(1500);

/// Rate limit for agent deletions.
///
/// Only successful deletions advance the clock, so a rejected or skipped
/// delete never pushes the next window back.
#[derive(Debug, Clone, Copy)]
pub struct DeleteThrottle {
	min_interval: Duration,
	last: Option<Instant>,
}

impl Default for DeleteThrottle {
	fn default() -> Self {
		Self::new(DEFAULT_DELETE_INTERVAL)
	}
}

impl DeleteThrottle {
	/// Creates a throttle with the given minimum interval.
	pub fn new(min_interval: Duration) -> Self {
		Self {
			min_interval,
			last: None,
		}
	}

	/// Returns the configured interval.
	pub fn min_interval(&self) -> Duration {
		self.min_interval
	}

	/// Returns true if a delete may run at `now`.
	pub fn is_due(&self, now: Instant) -> bool {
		self.last
			.is_none_or(|last| now.saturating_duration_since(last) >= self.min_interval)
	}

	/// Time left before the next delete may run.
	pub fn remaining(&self, now: Instant) -> Duration {
		self.last.map_or(Duration::ZERO, |last| {
			self.min_interval.saturating_sub(now.saturating_duration_since(last))
		})
	}

	/// Records a committed delete.
	pub fn record(&mut self, now: Instant) {
		self.last = Some(now);
	}
}
