//! Filesystem-backed "remote"
//!
//! Treats a file on a mounted path (network share, synced folder, another
//! disk) as the remote object. Change detection hashes the file with BLAKE3
//! unless `checksum` selects another algorithm.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use super::traits::{observe_remote_hash, CloudProvider};
use crate::checksum::ChecksumAlgorithm;
use crate::error::{CloudFileError, CloudResult};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FsProviderConfig {
	pub path: PathBuf,
	#[serde(default)]
	pub poll_interval_ms: Option<u64>,
	#[serde(default = "default_checksum")]
	pub checksum: ChecksumAlgorithm,
}

fn default_checksum() -> ChecksumAlgorithm {
	ChecksumAlgorithm::Blake3
}

pub struct FsProvider {
	path: PathBuf,
	poll_interval: Option<Duration>,
	algorithm: ChecksumAlgorithm,
	last_hash: Mutex<Option<String>>,
}

impl FsProvider {
	pub fn new(config: FsProviderConfig) -> Self {
		FsProvider {
			path: config.path,
			poll_interval: config.poll_interval_ms.map(Duration::from_millis),
			algorithm: config.checksum,
			last_hash: Mutex::new(None),
		}
	}

	/// Registry constructor for `local-fs`
	pub fn from_value(value: &serde_json::Value) -> CloudResult<Arc<dyn CloudProvider>> {
		let config: FsProviderConfig = serde_json::from_value(value.clone())
			.map_err(|e| CloudFileError::resolution(format!("local-fs: path required ({})", e)))?;
		Ok(Arc::new(Self::new(config)))
	}

	async fn read_remote(&self, operation: &str) -> CloudResult<Vec<u8>> {
		tokio::fs::read(&self.path)
			.await
			.map_err(|e| CloudFileError::transfer(operation, None, format!("{}: {}", self.path.display(), e)))
	}
}

#[async_trait]
impl CloudProvider for FsProvider {
	fn kind(&self) -> &str {
		"local-fs"
	}

	fn supports_polling(&self) -> bool {
		true
	}

	fn preferred_poll_interval(&self) -> Option<Duration> {
		self.poll_interval
	}

	async fn file_name(&self) -> CloudResult<Option<String>> {
		Ok(self.path.file_name().map(|n| n.to_string_lossy().into_owned()))
	}

	async fn poll(&self) -> CloudResult<bool> {
		let data = self.read_remote("poll").await?;
		let hash = self.algorithm.digest(&data);
		let mut last = self.last_hash.lock().unwrap_or_else(|e| e.into_inner());
		let changed = observe_remote_hash(&mut last, Some(hash));
		debug!("local-fs poll {}: changed={}", self.path.display(), changed);
		Ok(changed)
	}

	async fn checksum(&self, data: &[u8]) -> Option<String> {
		Some(self.algorithm.digest(data))
	}

	async fn remote_checksum(&self) -> CloudResult<Option<String>> {
		Ok(self.last_hash.lock().unwrap_or_else(|e| e.into_inner()).clone())
	}

	async fn download(&self) -> CloudResult<Vec<u8>> {
		self.read_remote("download").await
	}

	async fn upload(&self, data: &[u8]) -> CloudResult<()> {
		let mut tmp = self.path.clone().into_os_string();
		tmp.push(".partial");
		let tmp = PathBuf::from(tmp);

		let result = async {
			tokio::fs::write(&tmp, data).await?;
			tokio::fs::rename(&tmp, &self.path).await
		}
		.await;
		if let Err(e) = result {
			let _ = tokio::fs::remove_file(&tmp).await;
			return Err(CloudFileError::transfer("upload", None, e.to_string()));
		}

		*self.last_hash.lock().unwrap_or_else(|e| e.into_inner()) = Some(self.algorithm.digest(data));
		Ok(())
	}
}


// vim: ts=4
