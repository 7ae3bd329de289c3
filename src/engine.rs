//! Sync engine: one local mirror kept consistent with one remote file
//!
//! Lifecycle: `Constructing -> Initializing -> (Running | IdleAfterPull) -> Stopped`.
//!
//! Construction resolves the provider synchronously and spawns the
//! initialization task, which fetches the remote file name and calls
//! [`CloudFile::start`]. Start pulls the remote content once and, when the
//! provider supports polling, arms a recurring timer that drives
//! [`CloudFile::sync`].
//!
//! Timer ticks spawn each cycle without awaiting it, so cycles may overlap.
//! Each cycle reads the hash snapshots at its start and writes them back
//! with single assignments; the last writer wins.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{CloudFileOptions, DEFAULT_POLLING_INTERVAL_MS};
use crate::detect::{detect_local_change, detect_remote_change, resolve_cycle, CycleAction, LocalChange};
use crate::error::{CloudFileError, CloudResult};
use crate::events::{Event, EventBus, EventKind, Listener};
use crate::provider::{resolve_provider, CloudProvider};
use crate::storage::{FsStorage, LocalStorage};

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
	Constructing,
	/// Resolving the remote name and performing the first pull
	Initializing,
	/// Timer armed, periodic sync active
	Running,
	/// First pull done, provider does not poll
	IdleAfterPull,
	Stopped,
}

struct Inner {
	provider: Arc<dyn CloudProvider>,
	storage: Arc<dyn LocalStorage>,
	local_dir: String,
	polling_interval: Duration,
	file_name: Mutex<Option<String>>,
	last_local_hash: Mutex<Option<String>>,
	last_remote_hash: Mutex<Option<String>>,
	timer: Mutex<Option<JoinHandle<()>>>,
	state: watch::Sender<EngineState>,
	initialized: watch::Sender<bool>,
	events: EventBus,
}

impl Drop for Inner {
	fn drop(&mut self) {
		let timer = self.timer.get_mut().unwrap_or_else(|e| e.into_inner());
		if let Some(handle) = timer.take() {
			handle.abort();
		}
	}
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
	m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle to a sync engine. Clones share the same engine.
#[derive(Clone)]
pub struct CloudFile {
	inner: Arc<Inner>,
}

impl CloudFile {
	/// Resolve the provider and begin initialization in the background.
	///
	/// Fails synchronously, before any I/O, when the options do not name a
	/// usable provider. Must be called from within a tokio runtime.
	pub fn new(options: CloudFileOptions) -> CloudResult<Self> {
		options.validate()?;
		let provider = resolve_provider(&options.resolved_provider_options())?;
		let runtime = tokio::runtime::Handle::try_current()
			.map_err(|_| CloudFileError::config("CloudFile::new requires a tokio runtime"))?;

		let engine = Self::build(provider, &options);
		engine.set_state(EngineState::Initializing);

		let init = engine.clone();
		runtime.spawn(async move { init.initialize().await });
		Ok(engine)
	}

	fn build(provider: Arc<dyn CloudProvider>, options: &CloudFileOptions) -> Self {
		let storage = options.storage.clone().unwrap_or_else(|| {
			let root = options.storage_root.clone().unwrap_or_else(|| PathBuf::from("."));
			Arc::new(FsStorage::new(root))
		});

		let polling_interval = options
			.polling_interval_ms
			.map(Duration::from_millis)
			.or_else(|| provider.preferred_poll_interval())
			.filter(|d| !d.is_zero())
			.unwrap_or(Duration::from_millis(DEFAULT_POLLING_INTERVAL_MS));

		let (state, _) = watch::channel(EngineState::Constructing);
		let (initialized, _) = watch::channel(false);

		CloudFile {
			inner: Arc::new(Inner {
				provider,
				storage,
				local_dir: options.local_path.trim_end_matches('/').to_string(),
				polling_interval,
				file_name: Mutex::new(None),
				last_local_hash: Mutex::new(None),
				last_remote_hash: Mutex::new(None),
				timer: Mutex::new(None),
				state,
				initialized,
				events: EventBus::new(),
			}),
		}
	}

	async fn initialize(&self) {
		match self.inner.provider.file_name().await {
			Ok(Some(name)) => {
				info!("Remote file resolved: {}", name);
				*lock(&self.inner.file_name) = Some(name);
				if let Err(e) = self.start_inner(false).await {
					warn!("Startup did not complete: {}", e);
				}
			}
			Ok(None) => {
				// An unnamed mirror has no stable local address
				let err = CloudFileError::metadata(None, "remote file reports no name");
				error!("Initialization failed: {}", err);
				self.emit(Event::error(err));
			}
			Err(err) => {
				error!("Initialization failed: {}", err);
				self.emit(Event::error(err));
			}
		}
		self.inner.initialized.send_replace(true);
	}

	/// Wait until the initialization task has finished, successfully or not
	pub async fn wait_initialized(&self) {
		let mut rx = self.inner.initialized.subscribe();
		let _ = rx.wait_for(|done| *done).await;
	}

	// === Accessors ===

	pub fn state(&self) -> EngineState {
		*self.inner.state.borrow()
	}

	/// Receiver notified on every state transition
	pub fn subscribe_state(&self) -> watch::Receiver<EngineState> {
		self.inner.state.subscribe()
	}

	pub fn is_running(&self) -> bool {
		self.state() == EngineState::Running
	}

	pub fn provider(&self) -> Arc<dyn CloudProvider> {
		self.inner.provider.clone()
	}

	pub fn polling_interval(&self) -> Duration {
		self.inner.polling_interval
	}

	pub fn file_name(&self) -> Option<String> {
		lock(&self.inner.file_name).clone()
	}

	/// Logical path of the mirror, once the remote name is known
	pub fn local_path(&self) -> Option<String> {
		self.file_name().map(|name| {
			if self.inner.local_dir.is_empty() {
				name
			} else {
				format!("{}/{}", self.inner.local_dir, name)
			}
		})
	}

	/// Last successfully observed local hash
	pub fn local_hash(&self) -> Option<String> {
		lock(&self.inner.last_local_hash).clone()
	}

	/// Provider's remote checksum when it tracks one, else the engine's snapshot
	pub async fn remote_hash(&self) -> Option<String> {
		let reported = self.inner.provider.remote_checksum().await.ok().flatten();
		reported.or_else(|| self.snapshot_remote_hash())
	}

	fn snapshot_remote_hash(&self) -> Option<String> {
		lock(&self.inner.last_remote_hash).clone()
	}

	fn set_local_hash(&self, hash: Option<String>) {
		*lock(&self.inner.last_local_hash) = hash;
	}

	fn set_remote_hash(&self, hash: Option<String>) {
		*lock(&self.inner.last_remote_hash) = hash;
	}

	fn set_state(&self, state: EngineState) {
		let previous = self.inner.state.send_replace(state);
		if previous != state {
			debug!("State {:?} -> {:?}", previous, state);
		}
	}

	fn mirror_path(&self, operation: &str) -> CloudResult<String> {
		self.local_path().ok_or_else(|| CloudFileError::NotReady { operation: operation.to_string() })
	}

	// === Events ===

	pub fn add_event_listener(&self, kind: EventKind, listener: Listener) {
		self.inner.events.add(kind, listener);
	}

	pub fn remove_event_listener(&self, kind: EventKind, listener: &Listener) {
		self.inner.events.remove(kind, listener);
	}

	/// Cycles still in flight at stop time finish quietly
	fn emit(&self, event: Event) {
		if self.state() == EngineState::Stopped {
			debug!("Suppressing {} after stop", event.kind);
			return;
		}
		self.inner.events.emit(&event);
	}

	fn emit_error(&self, err: &CloudFileError) {
		self.emit(Event::error(err.clone()));
	}

	// === Lifecycle ===

	/// Pull once, then arm the polling timer if the provider polls.
	///
	/// A failed initial pull is emitted as an error event and returned; the
	/// timer is not armed and the engine stays in `Initializing`, so a
	/// later `start` can retry. Calling `start` on a stopped engine
	/// restarts it.
	pub async fn start(&self) -> CloudResult<()> {
		self.start_inner(true).await
	}

	async fn start_inner(&self, restart: bool) -> CloudResult<()> {
		if self.file_name().is_none() {
			return Err(CloudFileError::NotReady { operation: "start".to_string() });
		}
		{
			let timer = lock(&self.inner.timer);
			if timer.is_some() {
				debug!("Start ignored: already running");
				return Ok(());
			}
			if self.state() == EngineState::Stopped {
				if !restart {
					debug!("Stopped during initialization, not starting");
					return Ok(());
				}
				self.set_state(EngineState::Initializing);
			}
		}

		if let Err(err) = self.download_and_replace().await {
			error!("Initial pull failed: {}", err);
			self.emit_error(&err);
			return Err(err);
		}

		let polling = self.inner.provider.supports_polling();
		{
			// stop() sets Stopped while holding this lock
			let mut timer = lock(&self.inner.timer);
			if self.state() == EngineState::Stopped {
				debug!("Stopped during initial pull, not arming the timer");
				return Ok(());
			}
			if timer.is_some() {
				return Ok(());
			}
			if polling {
				*timer = Some(self.spawn_timer());
				self.set_state(EngineState::Running);
			} else {
				self.set_state(EngineState::IdleAfterPull);
			}
		}

		if !polling {
			info!("{} does not poll; mirror pulled once", self.inner.provider.kind());
			return Ok(());
		}
		info!(
			"Polling {} every {:?}",
			self.inner.provider.kind(),
			self.inner.polling_interval
		);

		// First poll right away instead of after a full interval
		if let Err(e) = self.sync().await {
			warn!("Initial sync failed: {}", e);
		}
		Ok(())
	}

	fn spawn_timer(&self) -> JoinHandle<()> {
		let weak = Arc::downgrade(&self.inner);
		let period = self.inner.polling_interval;

		tokio::spawn(async move {
			let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				ticker.tick().await;
				let Some(inner) = weak.upgrade() else { break };
				let engine = CloudFile { inner };
				// Not awaited: a slow cycle must not delay the next tick
				tokio::spawn(async move {
					if let Err(e) = engine.sync().await {
						warn!("Scheduled sync failed: {}", e);
					}
				});
			}
		})
	}

	/// Cancel the timer and release the provider. Idempotent.
	///
	/// In-flight cycles are not cancelled; they complete without emitting.
	pub async fn stop(&self) {
		let (timer, previous) = {
			let mut timer = lock(&self.inner.timer);
			(timer.take(), self.inner.state.send_replace(EngineState::Stopped))
		};
		if let Some(handle) = timer {
			handle.abort();
			debug!("Polling timer cancelled");
		}

		if previous == EngineState::Stopped {
			return;
		}
		info!("Stopped mirror {:?}", self.local_path());

		if let Err(e) = self.inner.provider.dispose().await {
			debug!("Provider dispose failed (ignored): {}", e);
		}
	}

	// === Sync ===

	/// Run one detection cycle.
	///
	/// Faults are emitted as `OPFS_CLOUD_ERROR` and also returned.
	pub async fn sync(&self) -> CloudResult<()> {
		match self.run_cycle().await {
			Ok(()) => Ok(()),
			Err(err) => {
				self.emit_error(&err);
				Err(err)
			}
		}
	}

	async fn run_cycle(&self) -> CloudResult<()> {
		let path = self.mirror_path("sync")?;
		let provider = self.inner.provider.as_ref();

		let remote_changed = detect_remote_change(provider).await?;
		let baseline = self.local_hash();
		let local =
			detect_local_change(self.inner.storage.as_ref(), provider, &path, baseline.as_deref()).await;

		match resolve_cycle(remote_changed, &local) {
			CycleAction::Pull => {
				if matches!(local, LocalChange::Changed { .. }) {
					warn!("Local edit to {} superseded by remote change", path);
				}
				let hash = self.download_and_replace().await?;
				self.emit(Event::cloud_changed(hash));
			}
			CycleAction::Push { hash } => {
				info!("Local change detected in {}", path);
				self.emit(Event::local_changed(Some(hash)));
				self.push_local().await?;
			}
			CycleAction::Seed { hash } => {
				debug!("Seeding local hash for {}", path);
				self.set_local_hash(Some(hash));
			}
			CycleAction::Idle => {}
		}
		Ok(())
	}

	/// Pull: fetch the remote content and replace the mirror with it.
	///
	/// Returns the new local hash. The mirror is written only once the whole
	/// payload is in memory.
	pub async fn download_and_replace(&self) -> CloudResult<Option<String>> {
		let path = self.mirror_path("download")?;
		let data = self.inner.provider.download().await?;
		self.inner.storage.write(&path, &data).await?;

		let hash = self.inner.provider.checksum(&data).await;
		self.set_local_hash(hash.clone());
		self.set_remote_hash(hash.clone());
		info!("Pulled {} bytes into {}", data.len(), path);
		Ok(hash)
	}

	/// Entry point for external file watchers: the mirror was written.
	///
	/// Uploads the mirror unless it already matches the remote checksum.
	/// Returns whether an upload happened. Faults are emitted and returned.
	pub async fn notify_local_change(&self) -> CloudResult<bool> {
		match self.push_local().await {
			Ok(uploaded) => Ok(uploaded),
			Err(err) => {
				self.emit_error(&err);
				Err(err)
			}
		}
	}

	async fn push_local(&self) -> CloudResult<bool> {
		let path = self.mirror_path("upload")?;
		let provider = self.inner.provider.as_ref();

		let Some(data) = self.inner.storage.read(&path).await else {
			debug!("Nothing to push: {} is unreadable", path);
			return Ok(false);
		};
		let local_hash = provider.checksum(&data).await;

		let reported = provider.remote_checksum().await?;
		let remote_hash = reported.or_else(|| self.snapshot_remote_hash());

		if local_hash.is_some() && local_hash == remote_hash {
			debug!("{} already matches remote, skipping upload", path);
			self.set_local_hash(local_hash);
			return Ok(false);
		}

		provider.upload(&data).await?;
		let reported = provider.remote_checksum().await?.or_else(|| local_hash.clone());
		self.set_remote_hash(reported);
		self.set_local_hash(local_hash);
		info!("Pushed {} bytes from {}", data.len(), path);
		Ok(true)
	}
}

impl fmt::Debug for CloudFile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CloudFile")
			.field("provider", &self.inner.provider.kind())
			.field("local_path", &self.local_path())
			.field("state", &self.state())
			.field("polling_interval", &self.inner.polling_interval)
			.finish()
	}
}


// vim: ts=4
