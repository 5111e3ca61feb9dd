use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::TextConstError;
use crate::TextConstResult;

/// Cooperative cancellation signal shared between the host and a running
/// pipeline.
///
/// Clones observe the same flag. Stages call [`CancellationToken::check`] once
/// per asset or group they process.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
	cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
	pub fn new() -> Self {
		Self::default()
	}

	/// Request cancellation of every run observing this token.
	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::Relaxed)
	}

	/// Returns [`TextConstError::Cancelled`] once cancellation was requested.
	pub fn check(&self) -> TextConstResult<()> {
		if self.is_cancelled() {
			return Err(TextConstError::Cancelled);
		}

		Ok(())
	}
}
