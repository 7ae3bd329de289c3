//! Google Drive backends (API v2 and v3)
//!
//! Both versions share the same shape: a metadata endpoint reporting the
//! file's `md5Checksum`, and a media endpoint for content. They differ in
//! URL layout, the name field (`title` vs `name`) and the upload verb.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use super::http::{HttpClient, HttpMethod, HttpRequest, ReqwestClient};
use super::traits::{observe_remote_hash, CloudProvider};
use crate::checksum::md5_hex;
use crate::error::{CloudFileError, CloudResult};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 8000;

/// Mime prefix of Docs/Sheets/... objects, which have no binary content
const GOOGLE_APPS_MIME_PREFIX: &str = "application/vnd.google-apps";

/// Drive REST API generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveApi {
	V2,
	V3,
}

impl DriveApi {
	pub fn kind(self) -> &'static str {
		match self {
			DriveApi::V2 => "google-drive-v2",
			DriveApi::V3 => "google-drive-v3",
		}
	}

	fn metadata_url(self, base: &str, id: &str) -> String {
		match self {
			DriveApi::V2 => format!("{}/drive/v2/files/{}", base, id),
			DriveApi::V3 => format!(
				"{}/drive/v3/files/{}?fields=id,name,md5Checksum,modifiedTime,mimeType",
				base, id
			),
		}
	}

	fn media_url(self, base: &str, id: &str) -> String {
		match self {
			DriveApi::V2 => format!("{}/drive/v2/files/{}?alt=media", base, id),
			DriveApi::V3 => format!("{}/drive/v3/files/{}?alt=media", base, id),
		}
	}

	fn upload_url(self, base: &str, id: &str) -> String {
		match self {
			DriveApi::V2 => format!("{}/upload/drive/v2/files/{}?uploadType=media", base, id),
			DriveApi::V3 => format!(
				"{}/upload/drive/v3/files/{}?uploadType=media&fields=id,name,md5Checksum,mimeType",
				base, id
			),
		}
	}

	fn upload_method(self) -> HttpMethod {
		match self {
			DriveApi::V2 => HttpMethod::Put,
			DriveApi::V3 => HttpMethod::Patch,
		}
	}
}

/// Backend configuration as found under `provider.config`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveConfig {
	pub file_id: String,
	pub access_token: String,
	#[serde(default)]
	pub poll_interval_ms: Option<u64>,
	#[serde(default)]
	pub api_base: Option<String>,
}

impl DriveConfig {
	pub fn from_value(value: &serde_json::Value, api: DriveApi) -> CloudResult<Self> {
		let config: DriveConfig = serde_json::from_value(value.clone()).map_err(|e| {
			CloudFileError::resolution(format!("{}: fileId and accessToken required ({})", api.kind(), e))
		})?;
		if config.file_id.is_empty() || config.access_token.is_empty() {
			return Err(CloudFileError::resolution(format!(
				"{}: fileId and accessToken must not be empty",
				api.kind()
			)));
		}
		Ok(config)
	}
}

/// Subset of Drive file metadata the backend relies on
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveMetadata {
	#[serde(default)]
	pub id: Option<String>,
	/// v2 name field
	#[serde(default)]
	pub title: Option<String>,
	/// v3 name field
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub md5_checksum: Option<String>,
	#[serde(default)]
	pub mime_type: Option<String>,
}

#[derive(Debug, Default)]
struct DriveState {
	meta: Option<DriveMetadata>,
	last_remote_md5: Option<String>,
}

/// Google Drive file provider
pub struct DriveProvider {
	api: DriveApi,
	file_id: String,
	access_token: String,
	api_base: String,
	poll_interval: Duration,
	http: Arc<dyn HttpClient>,
	state: Mutex<DriveState>,
}

impl DriveProvider {
	pub fn new(api: DriveApi, config: DriveConfig) -> Self {
		Self::with_client(api, config, Arc::new(ReqwestClient::new()))
	}

	pub fn with_client(api: DriveApi, config: DriveConfig, http: Arc<dyn HttpClient>) -> Self {
		DriveProvider {
			api,
			file_id: config.file_id,
			access_token: config.access_token,
			api_base: config
				.api_base
				.map(|b| b.trim_end_matches('/').to_string())
				.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
			poll_interval: Duration::from_millis(
				config.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
			),
			http,
			state: Mutex::new(DriveState::default()),
		}
	}

	/// Registry constructor for `google-drive-v2`
	pub fn v2_from_value(value: &serde_json::Value) -> CloudResult<Arc<dyn CloudProvider>> {
		Ok(Arc::new(Self::new(DriveApi::V2, DriveConfig::from_value(value, DriveApi::V2)?)))
	}

	/// Registry constructor for `google-drive-v3`
	pub fn v3_from_value(value: &serde_json::Value) -> CloudResult<Arc<dyn CloudProvider>> {
		Ok(Arc::new(Self::new(DriveApi::V3, DriveConfig::from_value(value, DriveApi::V3)?)))
	}

	pub fn api(&self) -> DriveApi {
		self.api
	}

	fn encoded_id(&self) -> String {
		urlencoding::encode(&self.file_id).into_owned()
	}

	fn lock_state(&self) -> std::sync::MutexGuard<'_, DriveState> {
		self.state.lock().unwrap_or_else(|e| e.into_inner())
	}

	/// Fetch and cache the file's metadata
	pub async fn fetch_metadata(&self) -> CloudResult<DriveMetadata> {
		let url = self.api.metadata_url(&self.api_base, &self.encoded_id());
		let request = HttpRequest::new(HttpMethod::Get, url).bearer(&self.access_token);

		let response =
			self.http.send(request).await.map_err(|e| CloudFileError::metadata(None, e))?;
		if !response.is_success() {
			return Err(CloudFileError::metadata(
				Some(response.status),
				format!("metadata fetch failed: {}", response.status),
			));
		}

		let meta: DriveMetadata = serde_json::from_slice(&response.body)
			.map_err(|e| CloudFileError::metadata(Some(response.status), e.to_string()))?;
		self.lock_state().meta = Some(meta.clone());
		Ok(meta)
	}

	fn cached_metadata(&self) -> Option<DriveMetadata> {
		self.lock_state().meta.clone()
	}
}

#[async_trait]
impl CloudProvider for DriveProvider {
	fn kind(&self) -> &str {
		self.api.kind()
	}

	fn supports_polling(&self) -> bool {
		true
	}

	fn preferred_poll_interval(&self) -> Option<Duration> {
		Some(self.poll_interval)
	}

	async fn file_name(&self) -> CloudResult<Option<String>> {
		let meta = self.fetch_metadata().await?;
		Ok(match self.api {
			DriveApi::V2 => meta.title,
			DriveApi::V3 => meta.name,
		})
	}

	async fn poll(&self) -> CloudResult<bool> {
		let meta = self.fetch_metadata().await?;
		let mut state = self.lock_state();
		let changed = observe_remote_hash(&mut state.last_remote_md5, meta.md5_checksum);
		debug!("{} poll: md5={:?} changed={}", self.api.kind(), state.last_remote_md5, changed);
		Ok(changed)
	}

	async fn checksum(&self, data: &[u8]) -> Option<String> {
		Some(md5_hex(data))
	}

	async fn remote_checksum(&self) -> CloudResult<Option<String>> {
		Ok(self.lock_state().last_remote_md5.clone())
	}

	async fn download(&self) -> CloudResult<Vec<u8>> {
		let meta = match self.cached_metadata() {
			Some(meta) => meta,
			None => self.fetch_metadata().await?,
		};
		if let Some(mime) = meta.mime_type.as_deref() {
			if mime.starts_with(GOOGLE_APPS_MIME_PREFIX) {
				return Err(CloudFileError::NotDownloadable { mime_type: mime.to_string() });
			}
		}

		let url = self.api.media_url(&self.api_base, &self.encoded_id());
		let request = HttpRequest::new(HttpMethod::Get, url).bearer(&self.access_token);
		let response =
			self.http.send(request).await.map_err(|e| CloudFileError::transfer("download", None, e))?;
		if !response.is_success() {
			return Err(CloudFileError::transfer(
				"download",
				Some(response.status),
				format!("download failed: {}", response.status),
			));
		}
		Ok(response.body)
	}

	async fn upload(&self, data: &[u8]) -> CloudResult<()> {
		let content_type = self
			.cached_metadata()
			.and_then(|m| m.mime_type)
			.unwrap_or_else(|| "application/octet-stream".to_string());

		let url = self.api.upload_url(&self.api_base, &self.encoded_id());
		let request = HttpRequest::new(self.api.upload_method(), url)
			.bearer(&self.access_token)
			.header("Content-Type", &content_type)
			.body(data.to_vec());

		let response =
			self.http.send(request).await.map_err(|e| CloudFileError::transfer("upload", None, e))?;
		if !response.is_success() {
			return Err(CloudFileError::transfer(
				"upload",
				Some(response.status),
				format!("upload failed: {}", response.status),
			));
		}

		let meta: DriveMetadata = serde_json::from_slice(&response.body)
			.map_err(|e| CloudFileError::transfer("upload", Some(response.status), e.to_string()))?;
		let mut state = self.lock_state();
		state.last_remote_md5 = meta.md5_checksum.clone();
		state.meta = Some(meta);
		Ok(())
	}
}


// vim: ts=4
