//! Logging prelude module for convenient access to tracing macros.
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("pulled remote file");
//! warn!("sync cycle failed");
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// By default, logs at INFO level and above are displayed. Control the log level
/// with the `RUST_LOG` environment variable:
///
/// ```bash
/// RUST_LOG=cloudmirror=debug
/// RUST_LOG=cloudmirror::engine=trace,cloudmirror::provider=debug
/// ```
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing() -> bool {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_writer(std::io::stderr)
		.try_init()
		.is_ok()
}

// vim: ts=4
