use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Shared flag used to stop sampling or evaluation from another thread.
///
/// Clones share the same flag. Long loops call `check` periodically.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
	cancelled: Arc<AtomicBool>,
}

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests cancellation. Every clone observes it.
	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::Relaxed);
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::Relaxed)
	}

	/// Returns `Error::Cancelled` once cancellation was requested.
	pub fn check(&self) -> Result<()> {
		if self.is_cancelled() {
			return Err(Error::Cancelled);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clones_share_the_flag() {
		let token = CancelToken::new();
		let other = token.clone();
		assert!(token.check().is_ok());
		other.cancel();
		assert!(token.is_cancelled());
		assert!(matches!(token.check(), Err(Error::Cancelled)));
	}
}
