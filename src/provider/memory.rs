//! In-process provider with a scriptable remote
//!
//! Holds the remote content in memory, counts calls and can be told to
//! fail. Used by the test suites and by embedders that want a loopback
//! remote.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::traits::{observe_remote_hash, CloudProvider};
use crate::checksum::md5_hex;
use crate::error::{CloudFileError, CloudResult};

/// Call counters exposed for assertions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCalls {
	pub file_name: usize,
	pub poll: usize,
	pub download: usize,
	pub upload: usize,
	pub dispose: usize,
}

#[derive(Debug, Default)]
struct MemoryRemote {
	content: Vec<u8>,
	last_polled: Option<String>,
	uploads: Vec<Vec<u8>>,
	calls: MemoryCalls,
	poll_failures: VecDeque<CloudFileError>,
	download_failures: VecDeque<CloudFileError>,
	upload_failures: VecDeque<CloudFileError>,
	name_failure: Option<CloudFileError>,
	dispose_failure: Option<CloudFileError>,
}

pub struct MemoryProvider {
	file_name: Option<String>,
	polling: bool,
	poll_interval: Option<Duration>,
	name_delay: Option<Duration>,
	download_delay: Option<Duration>,
	remote: Mutex<MemoryRemote>,
}

impl MemoryProvider {
	pub fn new(file_name: &str, content: &[u8]) -> Self {
		MemoryProvider {
			file_name: Some(file_name.to_string()),
			polling: true,
			poll_interval: None,
			name_delay: None,
			download_delay: None,
			remote: Mutex::new(MemoryRemote { content: content.to_vec(), ..Default::default() }),
		}
	}

	/// Provider that reports no file name
	pub fn unnamed(content: &[u8]) -> Self {
		MemoryProvider { file_name: None, ..Self::new("", content) }
	}

	pub fn without_polling(mut self) -> Self {
		self.polling = false;
		self
	}

	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = Some(interval);
		self
	}

	/// Simulate a slow metadata round trip
	pub fn with_name_delay(mut self, delay: Duration) -> Self {
		self.name_delay = Some(delay);
		self
	}

	/// Simulate a slow transfer
	pub fn with_download_delay(mut self, delay: Duration) -> Self {
		self.download_delay = Some(delay);
		self
	}

	fn remote(&self) -> std::sync::MutexGuard<'_, MemoryRemote> {
		self.remote.lock().unwrap_or_else(|e| e.into_inner())
	}

	/// Replace the remote content, as another client would
	pub fn set_content(&self, content: &[u8]) {
		self.remote().content = content.to_vec();
	}

	/// Replace the remote content and mark it as already observed, so the
	/// next poll reports no change
	pub fn set_content_seen(&self, content: &[u8]) {
		let mut remote = self.remote();
		remote.content = content.to_vec();
		remote.last_polled = Some(md5_hex(content));
	}

	pub fn content(&self) -> Vec<u8> {
		self.remote().content.clone()
	}

	pub fn uploads(&self) -> Vec<Vec<u8>> {
		self.remote().uploads.clone()
	}

	pub fn calls(&self) -> MemoryCalls {
		self.remote().calls.clone()
	}

	pub fn fail_next_poll(&self, error: CloudFileError) {
		self.remote().poll_failures.push_back(error);
	}

	pub fn fail_next_download(&self, error: CloudFileError) {
		self.remote().download_failures.push_back(error);
	}

	pub fn fail_next_upload(&self, error: CloudFileError) {
		self.remote().upload_failures.push_back(error);
	}

	pub fn fail_file_name(&self, error: CloudFileError) {
		self.remote().name_failure = Some(error);
	}

	pub fn fail_dispose(&self, error: CloudFileError) {
		self.remote().dispose_failure = Some(error);
	}
}

#[async_trait]
impl CloudProvider for MemoryProvider {
	fn kind(&self) -> &str {
		"memory"
	}

	fn supports_polling(&self) -> bool {
		self.polling
	}

	fn preferred_poll_interval(&self) -> Option<Duration> {
		self.poll_interval
	}

	async fn file_name(&self) -> CloudResult<Option<String>> {
		if let Some(delay) = self.name_delay {
			tokio::time::sleep(delay).await;
		}
		let mut remote = self.remote();
		remote.calls.file_name += 1;
		match &remote.name_failure {
			Some(err) => Err(err.clone()),
			None => Ok(self.file_name.clone()),
		}
	}

	async fn poll(&self) -> CloudResult<bool> {
		let mut remote = self.remote();
		remote.calls.poll += 1;
		if let Some(err) = remote.poll_failures.pop_front() {
			return Err(err);
		}
		let current = Some(md5_hex(&remote.content));
		Ok(observe_remote_hash(&mut remote.last_polled, current))
	}

	async fn checksum(&self, data: &[u8]) -> Option<String> {
		Some(md5_hex(data))
	}

	async fn remote_checksum(&self) -> CloudResult<Option<String>> {
		Ok(self.remote().last_polled.clone())
	}

	async fn download(&self) -> CloudResult<Vec<u8>> {
		if let Some(delay) = self.download_delay {
			tokio::time::sleep(delay).await;
		}
		let mut remote = self.remote();
		remote.calls.download += 1;
		if let Some(err) = remote.download_failures.pop_front() {
			return Err(err);
		}
		Ok(remote.content.clone())
	}

	async fn upload(&self, data: &[u8]) -> CloudResult<()> {
		let mut remote = self.remote();
		remote.calls.upload += 1;
		if let Some(err) = remote.upload_failures.pop_front() {
			return Err(err);
		}
		remote.content = data.to_vec();
		remote.uploads.push(data.to_vec());
		remote.last_polled = Some(md5_hex(data));
		Ok(())
	}

	async fn dispose(&self) -> CloudResult<()> {
		let mut remote = self.remote();
		remote.calls.dispose += 1;
		match &remote.dispose_failure {
			Some(err) => Err(err.clone()),
			None => Ok(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_poll_follows_content() {
		let p = MemoryProvider::new("f.txt", b"h1");
		assert!(!p.poll().await.unwrap());
		p.set_content(b"h2");
		assert!(p.poll().await.unwrap());
		assert!(!p.poll().await.unwrap());
		assert_eq!(p.calls().poll, 3);
	}

	#[tokio::test]
	async fn test_scripted_failures_are_one_shot() {
		let p = MemoryProvider::new("f.txt", b"x");
		p.fail_next_download(CloudFileError::transfer("download", Some(500), "boom"));

		assert!(p.download().await.is_err());
		assert_eq!(p.download().await.unwrap(), b"x");
	}

	#[tokio::test]
	async fn test_download_delay() {
		let p = MemoryProvider::new("f.txt", b"slow").with_download_delay(Duration::from_millis(30));
		let started = std::time::Instant::now();
		assert_eq!(p.download().await.unwrap(), b"slow");
		assert!(started.elapsed() >= Duration::from_millis(30));
	}

	#[tokio::test]
	async fn test_upload_updates_remote_checksum() {
		let p = MemoryProvider::new("f.txt", b"x");
		p.upload(b"y").await.unwrap();
		assert_eq!(p.content(), b"y");
		assert_eq!(p.remote_checksum().await.unwrap(), Some(md5_hex(b"y")));
		assert_eq!(p.uploads(), vec![b"y".to_vec()]);
	}
}

// vim: ts=4
