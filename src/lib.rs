//! # cloudmirror - Single-File Cloud Mirror
//!
//! Keeps one local file mirror consistent with one remote file hosted by a
//! pluggable cloud backend. Divergence is detected by content hash in both
//! directions: a remote change pulls, a local change pushes, and a remote
//! change wins when both happen in the same cycle.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cloudmirror::{events, CloudFile, CloudFileOptions, EventKind};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = CloudFileOptions::with_type(
//!         "google-drive-v3",
//!         json!({ "fileId": "1AbC", "accessToken": "ya29..." }),
//!     )
//!     .local_path("bucket");
//!
//!     let mirror = CloudFile::new(options)?;
//!     mirror.add_event_listener(
//!         EventKind::CloudFileChanged,
//!         events::listener(|ev| println!("remote changed: {:?}", ev.hash())),
//!     );
//!     mirror.wait_initialized().await;
//!     // ... later
//!     mirror.stop().await;
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod provider;
pub mod storage;

// Re-export commonly used types
pub use config::{CloudFileOptions, ProviderOptions};
pub use engine::{CloudFile, EngineState};
pub use error::{CloudFileError, CloudResult};
pub use events::{ChangeReason, Event, EventDetail, EventKind, Listener};
pub use provider::{resolve_provider, CloudProvider};
pub use storage::{FsStorage, LocalStorage, MemoryStorage};

// vim: ts=4
