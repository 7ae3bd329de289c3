//! Per-engine publish/subscribe registry
//!
//! Handlers are kept in insertion order per event kind. A dispatch pass
//! works on a snapshot of the handler list, so handlers added or removed
//! while an event is being delivered only take effect for the next event.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tracing::error;

use crate::error::CloudFileError;

/// Kinds of events emitted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
	/// Remote content changed and the mirror was refreshed
	CloudFileChanged,
	/// Local mirror content diverged from its last known hash
	LocalFileChanged,
	/// A fault occurred in a sync, pull, push or startup step
	OpfsCloudError,
}

impl EventKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			EventKind::CloudFileChanged => "CLOUD_FILE_CHANGED",
			EventKind::LocalFileChanged => "LOCAL_FILE_CHANGED",
			EventKind::OpfsCloudError => "OPFS_CLOUD_ERROR",
		}
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Why a change event fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
	RemoteChanged,
	LocalChanged,
}

impl ChangeReason {
	pub fn as_str(&self) -> &'static str {
		match self {
			ChangeReason::RemoteChanged => "remoteChanged",
			ChangeReason::LocalChanged => "localChanged",
		}
	}
}

/// Event payload
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
	Changed { reason: ChangeReason, hash: Option<String> },
	Error { error: CloudFileError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
	pub kind: EventKind,
	pub detail: EventDetail,
}

impl Event {
	pub fn cloud_changed(hash: Option<String>) -> Self {
		Event {
			kind: EventKind::CloudFileChanged,
			detail: EventDetail::Changed { reason: ChangeReason::RemoteChanged, hash },
		}
	}

	pub fn local_changed(hash: Option<String>) -> Self {
		Event {
			kind: EventKind::LocalFileChanged,
			detail: EventDetail::Changed { reason: ChangeReason::LocalChanged, hash },
		}
	}

	pub fn error(error: CloudFileError) -> Self {
		Event { kind: EventKind::OpfsCloudError, detail: EventDetail::Error { error } }
	}

	/// The change hash, for change events
	pub fn hash(&self) -> Option<&str> {
		match &self.detail {
			EventDetail::Changed { hash, .. } => hash.as_deref(),
			EventDetail::Error { .. } => None,
		}
	}
}

/// Event handler. Identity (for removal) is the `Arc` pointer.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Wrap a closure as a [`Listener`]
pub fn listener<F>(f: F) -> Listener
where
	F: Fn(&Event) + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Mapping from event kind to ordered handlers
#[derive(Default)]
pub struct EventBus {
	listeners: Mutex<HashMap<EventKind, Vec<Listener>>>,
}

impl EventBus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a handler. Registering the same handler twice makes it fire twice.
	pub fn add(&self, kind: EventKind, listener: Listener) {
		let mut map = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
		map.entry(kind).or_default().push(listener);
	}

	/// Remove every registration of `listener` for `kind`
	pub fn remove(&self, kind: EventKind, listener: &Listener) {
		let mut map = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
		if let Some(list) = map.get_mut(&kind) {
			list.retain(|l| !Arc::ptr_eq(l, listener));
		}
	}

	pub fn listener_count(&self, kind: EventKind) -> usize {
		let map = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
		map.get(&kind).map_or(0, Vec::len)
	}

	/// Deliver `event` to a snapshot of the handlers registered for its kind.
	///
	/// A panicking handler is logged and does not prevent the remaining
	/// handlers from running.
	pub fn emit(&self, event: &Event) {
		let snapshot: Vec<Listener> = {
			let map = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
			map.get(&event.kind).cloned().unwrap_or_default()
		};

		for handler in snapshot {
			if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
				error!("{} listener panicked", event.kind);
			}
		}
	}
}

impl fmt::Debug for EventBus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let map = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
		let counts: HashMap<&str, usize> = map.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
		f.debug_struct("EventBus").field("listeners", &counts).finish()
	}
}


// vim: ts=4
