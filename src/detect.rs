//! Change detection for one sync cycle
//!
//! Two detectors run every cycle. The remote one defers entirely to the
//! provider's `poll`. The local one hashes the mirror and compares it to
//! the engine's last known local hash. [`resolve_cycle`] combines both.
//!
//! Tie-break: when both fire in the same cycle, the pull wins. The poll
//! reflects a confirmed external mutation, while a local delta observed
//! at the same moment may be a stale read racing the pull. The pull
//! overwrites the mirror and re-seeds the local hash.

use tracing::debug;

use crate::error::CloudResult;
use crate::provider::CloudProvider;
use crate::storage::LocalStorage;

/// Outcome of the local-change detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalChange {
	/// Nothing readable, or the hash could not be computed
	Unavailable,
	/// First observation: seeds the baseline without reporting a change
	Seeded { hash: String },
	/// Same hash as last time
	Unchanged,
	/// Known hash moved to a different known hash
	Changed { previous: String, current: String },
}

/// What the engine does with a cycle's detector results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleAction {
	/// Download the remote content into the mirror
	Pull,
	/// Record the new local hash and push the mirror upstream
	Push { hash: String },
	/// Record the first local hash silently
	Seed { hash: String },
	Idle,
}

/// Remote-change detector
pub async fn detect_remote_change(provider: &dyn CloudProvider) -> CloudResult<bool> {
	let changed = provider.poll().await?;
	debug!("{} poll -> changed={}", provider.kind(), changed);
	Ok(changed)
}

/// Pure comparison of a fresh local hash against the baseline
pub fn compare_local(previous: Option<&str>, current: Option<String>) -> LocalChange {
	match (previous, current) {
		(_, None) => LocalChange::Unavailable,
		(None, Some(hash)) => LocalChange::Seeded { hash },
		(Some(prev), Some(hash)) if prev == hash => LocalChange::Unchanged,
		(Some(prev), Some(hash)) => LocalChange::Changed { previous: prev.to_string(), current: hash },
	}
}

/// Local-change detector: hash the mirror at `path` and compare with `previous`
pub async fn detect_local_change(
	storage: &dyn LocalStorage,
	provider: &dyn CloudProvider,
	path: &str,
	previous: Option<&str>,
) -> LocalChange {
	let current = match storage.read(path).await {
		Some(data) => provider.checksum(&data).await,
		None => None,
	};
	let change = compare_local(previous, current);
	debug!("local {}: {:?}", path, change);
	change
}

/// Combine both detectors. Remote change takes priority.
pub fn resolve_cycle(remote_changed: bool, local: &LocalChange) -> CycleAction {
	if remote_changed {
		return CycleAction::Pull;
	}
	match local {
		LocalChange::Changed { current, .. } => CycleAction::Push { hash: current.clone() },
		LocalChange::Seeded { hash } => CycleAction::Seed { hash: hash.clone() },
		LocalChange::Unchanged | LocalChange::Unavailable => CycleAction::Idle,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::provider::MemoryProvider;
	use crate::storage::MemoryStorage;

	#[test]
	fn test_compare_local_table() {
		assert_eq!(compare_local(None, None), LocalChange::Unavailable);
		assert_eq!(compare_local(Some("a"), None), LocalChange::Unavailable);
		assert_eq!(compare_local(None, Some("a".into())), LocalChange::Seeded { hash: "a".into() });
		assert_eq!(compare_local(Some("a"), Some("a".into())), LocalChange::Unchanged);
		assert_eq!(
			compare_local(Some("a"), Some("b".into())),
			LocalChange::Changed { previous: "a".into(), current: "b".into() }
		);
	}

	#[test]
	fn test_pull_wins_tie() {
		let local = LocalChange::Changed { previous: "a".into(), current: "b".into() };
		assert_eq!(resolve_cycle(true, &local), CycleAction::Pull);
		assert_eq!(resolve_cycle(false, &local), CycleAction::Push { hash: "b".into() });
	}

	#[test]
	fn test_seed_and_idle() {
		assert_eq!(
			resolve_cycle(false, &LocalChange::Seeded { hash: "h".into() }),
			CycleAction::Seed { hash: "h".into() }
		);
		assert_eq!(resolve_cycle(false, &LocalChange::Unchanged), CycleAction::Idle);
		assert_eq!(resolve_cycle(false, &LocalChange::Unavailable), CycleAction::Idle);
		assert_eq!(resolve_cycle(true, &LocalChange::Unavailable), CycleAction::Pull);
	}

	#[tokio::test]
	async fn test_detect_local_change_reads_storage() {
		let storage = MemoryStorage::new();
		let provider = MemoryProvider::new("f.txt", b"");

		let missing = detect_local_change(&storage, &provider, "bucket/f.txt", None).await;
		assert_eq!(missing, LocalChange::Unavailable);

		storage.put("bucket/f.txt", b"abc");
		let seeded = detect_local_change(&storage, &provider, "bucket/f.txt", None).await;
		assert_eq!(
			seeded,
			LocalChange::Seeded { hash: "900150983cd24fb0d6963f7d28e17f72".into() }
		);
	}

	#[tokio::test]
	async fn test_detect_remote_change_delegates() {
		let provider = MemoryProvider::new("f.txt", b"one");
		assert!(!detect_remote_change(&provider).await.unwrap());
		provider.set_content(b"two");
		assert!(detect_remote_change(&provider).await.unwrap());
	}
}

// vim: ts=4
