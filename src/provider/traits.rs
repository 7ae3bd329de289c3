//! Capability contract every cloud backend implements
//!
//! The engine holds an `Arc<dyn CloudProvider>` and never a concrete type.
//! Providers own their remote-hash bookkeeping: `poll` answers "did the
//! remote content change since I last looked", and the engine trusts it.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CloudResult;

/// Remote file backend consumed by the sync engine
#[async_trait]
pub trait CloudProvider: Send + Sync {
	// === Metadata ===

	/// Registry name of the backend, used in logs
	fn kind(&self) -> &str;

	/// Whether the engine should drive periodic polls. Pure, no I/O.
	fn supports_polling(&self) -> bool;

	/// Poll interval this backend prefers, if any
	fn preferred_poll_interval(&self) -> Option<Duration> {
		None
	}

	/// Logical name of the remote file
	async fn file_name(&self) -> CloudResult<Option<String>>;

	// === Change detection ===

	/// True iff the remote content changed since this provider's previous poll.
	/// The first poll only records a baseline and returns false.
	async fn poll(&self) -> CloudResult<bool>;

	/// Hash of `data` in the provider's native algorithm, `None` if unavailable
	async fn checksum(&self, data: &[u8]) -> Option<String>;

	/// Best-known hash of the remote content. `Ok(None)` means the provider
	/// does not track one and the engine's own snapshot should be used.
	async fn remote_checksum(&self) -> CloudResult<Option<String>> {
		Ok(None)
	}

	// === Transfer ===

	/// Fetch the full remote content
	async fn download(&self) -> CloudResult<Vec<u8>>;

	/// Replace the remote content
	async fn upload(&self, data: &[u8]) -> CloudResult<()>;

	// === Lifecycle ===

	/// Release held resources. Callers treat failures as best-effort.
	async fn dispose(&self) -> CloudResult<()> {
		Ok(())
	}
}

/// Shared remote-hash bookkeeping for polling providers.
///
/// The first observation seeds the baseline and reports no change.
pub(crate) fn observe_remote_hash(last: &mut Option<String>, current: Option<String>) -> bool {
	if last.is_none() {
		*last = current;
		return false;
	}
	let changed = *last != current;
	*last = current;
	changed
}


// vim: ts=4
