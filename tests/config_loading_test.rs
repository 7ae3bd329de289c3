/// Integration tests for loading engine options from disk
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use cloudmirror::provider::{registered_types, resolve_provider, MemoryProvider};
use cloudmirror::{CloudFileError, CloudFileOptions, ProviderOptions};

#[test]
fn test_load_toml_file() {
	let temp_dir = TempDir::new().expect("Failed to create temp dir");
	let path = temp_dir.path().join("mirror.toml");
	fs::write(
		&path,
		r#"
		localPath = "docs"
		pollingIntervalMs = 2500

		[provider]
		type = "google-drive-v2"

		[provider.config]
		fileId = "0B123"
		accessToken = "token"
		"#,
	)
	.unwrap();

	let options = CloudFileOptions::load(&path).unwrap();
	assert_eq!(options.local_path, "docs");
	assert_eq!(options.polling_interval_ms, Some(2500));

	// Resolution builds the provider without touching the network
	let provider = resolve_provider(&options.resolved_provider_options()).unwrap();
	assert_eq!(provider.kind(), "google-drive-v2");
	assert!(provider.supports_polling());
}

#[test]
fn test_load_json_file_with_top_level_type() {
	let temp_dir = TempDir::new().unwrap();
	let path = temp_dir.path().join("mirror.json");
	fs::write(
		&path,
		r#"{ "type": "google-drive-v3", "provider": { "config": { "fileId": "1", "accessToken": "t" } } }"#,
	)
	.unwrap();

	let options = CloudFileOptions::load(&path).unwrap();
	assert_eq!(options.local_path, "bucket");
	let provider = resolve_provider(&options.resolved_provider_options()).unwrap();
	assert_eq!(provider.kind(), "google-drive-v3");
}

#[test]
fn test_load_rejects_unknown_extension_and_missing_file() {
	let temp_dir = TempDir::new().unwrap();
	let yaml = temp_dir.path().join("mirror.yaml");
	fs::write(&yaml, "localPath: x").unwrap();

	assert!(matches!(CloudFileOptions::load(&yaml), Err(CloudFileError::Config { .. })));
	assert!(matches!(
		CloudFileOptions::load(&temp_dir.path().join("absent.toml")),
		Err(CloudFileError::Config { .. })
	));
}

#[test]
fn test_drive_config_requires_credentials() {
	let options = ProviderOptions::typed("google-drive-v3", serde_json::json!({ "fileId": "1" }));
	let err = resolve_provider(&options).err().unwrap();
	assert!(matches!(err, CloudFileError::ProviderResolution { .. }));
}

#[test]
fn test_instance_takes_precedence_over_type() {
	let mut options = ProviderOptions::instance(Arc::new(MemoryProvider::new("f", b"")));
	options.kind = Some("unknown-backend".to_string());

	let provider = resolve_provider(&options).unwrap();
	assert_eq!(provider.kind(), "memory");
}

#[test]
fn test_registry_names() {
	let names = registered_types();
	assert!(names.contains(&"google-drive-v2"));
	assert!(names.contains(&"google-drive-v3"));
	assert!(names.contains(&"local-fs"));
}

// vim: ts=4
