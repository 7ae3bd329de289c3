//! End-to-end mirroring between two real directories
//!
//! The `local-fs` provider plays the remote, FsStorage holds the mirror.

use std::fs;
use std::sync::{Arc, Mutex};

use cloudmirror::checksum::blake3_hex;
use cloudmirror::events::listener;
use cloudmirror::logging::init_tracing;
use cloudmirror::{CloudFile, CloudFileOptions, EngineState, EventKind};
use serde_json::json;
use tempfile::TempDir;

struct Setup {
	_remote_dir: TempDir,
	mirror_dir: TempDir,
	remote: std::path::PathBuf,
}

fn setup(content: &[u8]) -> Setup {
	let remote_dir = TempDir::new().unwrap();
	let mirror_dir = TempDir::new().unwrap();
	let remote = remote_dir.path().join("shared.txt");
	fs::write(&remote, content).unwrap();
	Setup { _remote_dir: remote_dir, mirror_dir, remote }
}

fn options(s: &Setup) -> CloudFileOptions {
	CloudFileOptions::with_type("local-fs", json!({ "path": s.remote }))
		.storage_root(s.mirror_dir.path())
		.local_path("bucket")
		.polling_interval_ms(3_600_000)
}

#[tokio::test]
async fn test_mirror_follows_remote_file() {
	init_tracing();
	let s = setup(b"first version");

	let engine = CloudFile::new(options(&s)).unwrap();
	let changes = Arc::new(Mutex::new(Vec::new()));
	let sink = changes.clone();
	engine.add_event_listener(
		EventKind::CloudFileChanged,
		listener(move |ev| sink.lock().unwrap().push(ev.hash().map(str::to_string))),
	);
	engine.wait_initialized().await;

	assert_eq!(engine.state(), EngineState::Running);
	let mirror = s.mirror_dir.path().join("bucket").join("shared.txt");
	assert_eq!(fs::read(&mirror).unwrap(), b"first version");
	assert_eq!(engine.local_hash(), Some(blake3_hex(b"first version")));

	fs::write(&s.remote, b"second version").unwrap();
	engine.sync().await.unwrap();

	assert_eq!(fs::read(&mirror).unwrap(), b"second version");
	assert_eq!(*changes.lock().unwrap(), vec![Some(blake3_hex(b"second version"))]);

	// No stray temporary files next to the mirror
	let entries: Vec<_> = fs::read_dir(mirror.parent().unwrap()).unwrap().collect();
	assert_eq!(entries.len(), 1);

	engine.stop().await;
}

#[tokio::test]
async fn test_local_edit_is_pushed_to_remote() {
	init_tracing();
	let s = setup(b"shared");

	let engine = CloudFile::new(options(&s)).unwrap();
	engine.wait_initialized().await;

	let mirror = s.mirror_dir.path().join("bucket/shared.txt");
	fs::write(&mirror, b"edited in the mirror").unwrap();
	engine.sync().await.unwrap();

	assert_eq!(fs::read(&s.remote).unwrap(), b"edited in the mirror");
	assert_eq!(engine.remote_hash().await, Some(blake3_hex(b"edited in the mirror")));

	// The push is not echoed back as a remote change
	let pulls = Arc::new(Mutex::new(0));
	let p = pulls.clone();
	engine.add_event_listener(EventKind::CloudFileChanged, listener(move |_| *p.lock().unwrap() += 1));
	engine.sync().await.unwrap();
	assert_eq!(*pulls.lock().unwrap(), 0);

	engine.stop().await;
}

#[tokio::test]
async fn test_missing_remote_reports_error() {
	init_tracing();
	let s = setup(b"x");
	fs::remove_file(&s.remote).unwrap();

	let engine = CloudFile::new(options(&s)).unwrap();
	let errors = Arc::new(Mutex::new(0));
	let e = errors.clone();
	engine.add_event_listener(EventKind::OpfsCloudError, listener(move |_| *e.lock().unwrap() += 1));
	engine.wait_initialized().await;

	assert_eq!(engine.state(), EngineState::Initializing);
	assert_eq!(*errors.lock().unwrap(), 1);
	assert!(!s.mirror_dir.path().join("bucket/shared.txt").exists());
}

// vim: ts=4
