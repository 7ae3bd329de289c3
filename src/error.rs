//! Error types for cloud mirror operations

use thiserror::Error;

/// Result type used throughout the crate
pub type CloudResult<T> = Result<T, CloudFileError>;

/// Errors raised by the engine, its providers and the local storage backend.
///
/// The type is `Clone` so a single failure can be delivered to event
/// listeners and returned to the awaiting caller at the same time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CloudFileError {
	/// Construction input did not name a usable provider
	#[error("provider resolution failed: {message}")]
	ProviderResolution { message: String },

	/// Remote metadata could not be fetched
	#[error("metadata fetch failed{}: {message}", status_suffix(.status))]
	MetadataFetch { status: Option<u16>, message: String },

	/// Remote object is a virtual, non-binary document
	#[error("not a downloadable file (mime type {mime_type})")]
	NotDownloadable { mime_type: String },

	/// Network or transport failure while moving file content
	#[error("{operation} failed{}: {message}", status_suffix(.status))]
	TransferFailed { operation: String, status: Option<u16>, message: String },

	/// Local storage could not be written
	#[error("local storage error at {path}: {message}")]
	Storage { path: String, message: String },

	/// Invalid configuration
	#[error("invalid configuration: {message}")]
	Config { message: String },

	/// Operation needs a resolved remote file name
	#[error("{operation}: engine has not resolved the remote file name yet")]
	NotReady { operation: String },
}

fn status_suffix(status: &Option<u16>) -> String {
	match status {
		Some(code) => format!(" ({})", code),
		None => String::new(),
	}
}

impl CloudFileError {
	pub fn resolution(message: impl Into<String>) -> Self {
		CloudFileError::ProviderResolution { message: message.into() }
	}

	pub fn metadata(status: Option<u16>, message: impl Into<String>) -> Self {
		CloudFileError::MetadataFetch { status, message: message.into() }
	}

	pub fn transfer(operation: &str, status: Option<u16>, message: impl Into<String>) -> Self {
		CloudFileError::TransferFailed {
			operation: operation.to_string(),
			status,
			message: message.into(),
		}
	}

	pub fn storage(path: &str, message: impl Into<String>) -> Self {
		CloudFileError::Storage { path: path.to_string(), message: message.into() }
	}

	pub fn config(message: impl Into<String>) -> Self {
		CloudFileError::Config { message: message.into() }
	}

	/// True if the failure came from the network rather than local state
	pub fn is_transport(&self) -> bool {
		matches!(
			self,
			CloudFileError::MetadataFetch { .. } | CloudFileError::TransferFailed { .. }
		)
	}

	/// HTTP status carried by transport failures, if any
	pub fn status(&self) -> Option<u16> {
		match self {
			CloudFileError::MetadataFetch { status, .. }
			| CloudFileError::TransferFailed { status, .. } => *status,
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_includes_status() {
		let err = CloudFileError::metadata(Some(404), "not found");
		assert_eq!(err.to_string(), "metadata fetch failed (404): not found");

		let err = CloudFileError::transfer("upload", None, "connection reset");
		assert_eq!(err.to_string(), "upload failed: connection reset");
	}

	#[test]
	fn test_transport_classification() {
		assert!(CloudFileError::transfer("download", Some(500), "boom").is_transport());
		assert!(CloudFileError::metadata(Some(401), "denied").is_transport());
		assert!(!CloudFileError::resolution("missing").is_transport());
		assert!(!CloudFileError::NotDownloadable { mime_type: "x".into() }.is_transport());
		assert_eq!(CloudFileError::transfer("download", Some(503), "").status(), Some(503));
	}
}

// vim: ts=4
