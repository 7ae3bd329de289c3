//! Local storage backends for the mirror file
//!
//! Paths are logical, slash-separated addresses (e.g. `bucket/notes.txt`).
//! Intermediate segments are created on write.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{CloudFileError, CloudResult};

/// Durable byte storage for the local mirror
#[async_trait]
pub trait LocalStorage: Send + Sync {
	/// Read the whole resource. Any not-found or I/O condition yields `None`.
	async fn read(&self, path: &str) -> Option<Vec<u8>>;

	/// Replace the resource with `data`, creating parent segments as needed.
	///
	/// Implementations must never leave a partially written resource behind.
	async fn write(&self, path: &str, data: &[u8]) -> CloudResult<()>;
}

/// Split a logical path into its non-empty segments, rejecting traversal
fn segments(path: &str) -> CloudResult<Vec<&str>> {
	let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
	if parts.is_empty() {
		return Err(CloudFileError::storage(path, "empty path"));
	}
	if parts.iter().any(|s| *s == "." || *s == "..") {
		return Err(CloudFileError::storage(path, "relative segments are not allowed"));
	}
	Ok(parts)
}

/// Filesystem-backed storage rooted at a directory
#[derive(Debug, Clone)]
pub struct FsStorage {
	root: PathBuf,
}

impl FsStorage {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		FsStorage { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Map a logical path onto the filesystem
	pub fn resolve(&self, path: &str) -> CloudResult<PathBuf> {
		let mut full = self.root.clone();
		for part in segments(path)? {
			full.push(part);
		}
		Ok(full)
	}
}

#[async_trait]
impl LocalStorage for FsStorage {
	async fn read(&self, path: &str) -> Option<Vec<u8>> {
		let full = self.resolve(path).ok()?;
		match tokio::fs::read(&full).await {
			Ok(data) => Some(data),
			Err(e) => {
				debug!("read {} -> none ({})", full.display(), e);
				None
			}
		}
	}

	async fn write(&self, path: &str, data: &[u8]) -> CloudResult<()> {
		let full = self.resolve(path)?;
		if let Some(parent) = full.parent() {
			tokio::fs::create_dir_all(parent)
				.await
				.map_err(|e| CloudFileError::storage(path, e.to_string()))?;
		}

		// Write next to the target and rename so readers never see a torn file
		let mut tmp_name = full.file_name().map(|n| n.to_os_string()).unwrap_or_default();
		tmp_name.push(".partial");
		let tmp = full.with_file_name(tmp_name);

		if let Err(e) = tokio::fs::write(&tmp, data).await {
			let _ = tokio::fs::remove_file(&tmp).await;
			return Err(CloudFileError::storage(path, e.to_string()));
		}
		if let Err(e) = tokio::fs::rename(&tmp, &full).await {
			let _ = tokio::fs::remove_file(&tmp).await;
			return Err(CloudFileError::storage(path, e.to_string()));
		}

		debug!("wrote {} bytes to {}", data.len(), full.display());
		Ok(())
	}
}

/// In-memory storage, handy for tests and ephemeral mirrors
#[derive(Debug, Default)]
pub struct MemoryStorage {
	files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	fn key(path: &str) -> CloudResult<String> {
		Ok(segments(path)?.join("/"))
	}

	/// Synchronous peek, bypassing the trait
	pub fn get(&self, path: &str) -> Option<Vec<u8>> {
		let key = Self::key(path).ok()?;
		self.files.lock().unwrap_or_else(|e| e.into_inner()).get(&key).cloned()
	}

	/// Synchronous store, simulating an edit made outside the engine
	pub fn put(&self, path: &str, data: &[u8]) {
		if let Ok(key) = Self::key(path) {
			self.files.lock().unwrap_or_else(|e| e.into_inner()).insert(key, data.to_vec());
		}
	}
}

#[async_trait]
impl LocalStorage for MemoryStorage {
	async fn read(&self, path: &str) -> Option<Vec<u8>> {
		self.get(path)
	}

	async fn write(&self, path: &str, data: &[u8]) -> CloudResult<()> {
		let key = Self::key(path)?;
		self.files.lock().unwrap_or_else(|e| e.into_inner()).insert(key, data.to_vec());
		Ok(())
	}
}


// vim: ts=4
