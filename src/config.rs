//! Engine construction options
//!
//! Options can be built in code or loaded from a TOML or JSON file:
//!
//! ```toml
//! localPath = "bucket"
//! pollingIntervalMs = 5000
//!
//! [provider]
//! type = "google-drive-v3"
//!
//! [provider.config]
//! fileId = "1AbC..."
//! accessToken = "ya29...."
//! ```
//!
//! Priority for the polling interval:
//! 1. `pollingIntervalMs` from these options
//! 2. The provider's preferred interval
//! 3. [`DEFAULT_POLLING_INTERVAL_MS`]

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CloudFileError, CloudResult};
use crate::provider::CloudProvider;
use crate::storage::LocalStorage;

pub const DEFAULT_LOCAL_PATH: &str = "bucket";
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 8000;

fn default_local_path() -> String {
	DEFAULT_LOCAL_PATH.to_string()
}

/// How to obtain the provider: a pre-built instance, or a registry type
/// name plus its backend-specific config
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOptions {
	#[serde(skip)]
	pub instance: Option<Arc<dyn CloudProvider>>,

	#[serde(default, rename = "type")]
	pub kind: Option<String>,

	#[serde(default)]
	pub config: serde_json::Value,
}

impl ProviderOptions {
	pub fn instance(provider: Arc<dyn CloudProvider>) -> Self {
		ProviderOptions { instance: Some(provider), ..Default::default() }
	}

	pub fn typed(kind: &str, config: serde_json::Value) -> Self {
		ProviderOptions { instance: None, kind: Some(kind.to_string()), config }
	}
}

impl fmt::Debug for ProviderOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		// config usually carries an access token
		f.debug_struct("ProviderOptions")
			.field("instance", &self.instance.as_ref().map(|p| p.kind().to_string()))
			.field("type", &self.kind)
			.finish_non_exhaustive()
	}
}

/// Options for [`crate::engine::CloudFile::new`]
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFileOptions {
	#[serde(default)]
	pub provider: ProviderOptions,

	/// Top-level backend type, accepted when `provider.type` is absent
	#[serde(default, rename = "type")]
	pub kind: Option<String>,

	/// Directory (logical path) holding the mirror; the remote file name is appended
	#[serde(default = "default_local_path")]
	pub local_path: String,

	#[serde(default)]
	pub polling_interval_ms: Option<u64>,

	/// Filesystem root for the default storage backend
	#[serde(default)]
	pub storage_root: Option<PathBuf>,

	/// Storage backend override, takes precedence over `storage_root`
	#[serde(skip)]
	pub storage: Option<Arc<dyn LocalStorage>>,
}

impl Default for CloudFileOptions {
	fn default() -> Self {
		CloudFileOptions {
			provider: ProviderOptions::default(),
			kind: None,
			local_path: default_local_path(),
			polling_interval_ms: None,
			storage_root: None,
			storage: None,
		}
	}
}

impl CloudFileOptions {
	pub fn new(provider: ProviderOptions) -> Self {
		CloudFileOptions { provider, ..Default::default() }
	}

	pub fn with_instance(provider: Arc<dyn CloudProvider>) -> Self {
		Self::new(ProviderOptions::instance(provider))
	}

	pub fn with_type(kind: &str, config: serde_json::Value) -> Self {
		Self::new(ProviderOptions::typed(kind, config))
	}

	pub fn local_path(mut self, path: impl Into<String>) -> Self {
		self.local_path = path.into();
		self
	}

	pub fn polling_interval_ms(mut self, interval: u64) -> Self {
		self.polling_interval_ms = Some(interval);
		self
	}

	pub fn storage(mut self, storage: Arc<dyn LocalStorage>) -> Self {
		self.storage = Some(storage);
		self
	}

	pub fn storage_root(mut self, root: impl Into<PathBuf>) -> Self {
		self.storage_root = Some(root.into());
		self
	}

	/// Provider options with the top-level `type` folded in
	pub fn resolved_provider_options(&self) -> ProviderOptions {
		let mut provider = self.provider.clone();
		if provider.kind.is_none() {
			provider.kind = self.kind.clone();
		}
		provider
	}

	pub fn validate(&self) -> CloudResult<()> {
		if self.polling_interval_ms == Some(0) {
			return Err(CloudFileError::config("pollingIntervalMs must be positive"));
		}
		if self.local_path.split('/').any(|s| s == "..") {
			return Err(CloudFileError::config("localPath must not contain '..'"));
		}
		Ok(())
	}

	pub fn from_toml_str(text: &str) -> CloudResult<Self> {
		toml::from_str(text).map_err(|e| CloudFileError::config(e.to_string()))
	}

	pub fn from_json_str(text: &str) -> CloudResult<Self> {
		serde_json::from_str(text).map_err(|e| CloudFileError::config(e.to_string()))
	}

	/// Load from a `.toml` or `.json` file
	pub fn load(path: &Path) -> CloudResult<Self> {
		let text = std::fs::read_to_string(path)
			.map_err(|e| CloudFileError::config(format!("{}: {}", path.display(), e)))?;
		match path.extension().and_then(|e| e.to_str()) {
			Some("toml") => Self::from_toml_str(&text),
			Some("json") => Self::from_json_str(&text),
			_ => Err(CloudFileError::config(format!(
				"{}: unsupported config format (expected .toml or .json)",
				path.display()
			))),
		}
	}
}

impl fmt::Debug for CloudFileOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CloudFileOptions")
			.field("provider", &self.provider)
			.field("type", &self.kind)
			.field("local_path", &self.local_path)
			.field("polling_interval_ms", &self.polling_interval_ms)
			.field("storage_root", &self.storage_root)
			.field("storage", &self.storage.is_some())
			.finish()
	}
}


// vim: ts=4
