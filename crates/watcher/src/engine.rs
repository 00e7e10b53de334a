//! Watcher facade
//!
//! Owns every directory session and the two engine threads. Construct one
//! per process and share it as `Arc<Watcher>` with the components that
//! register callbacks.

use crate::backend::{Backend, NotifyBackend, SessionTag};
use crate::config::WatcherConfig;
use crate::error::WatchError;
use crate::event::{Callback, Event, RawChange, WatchId};
use crate::session::DirectorySession;
use crate::table::{IdAllocator, RegistrationTable, Scope};
use crate::{dispatch, processing, Result};
use ahash::AHashMap;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// State shared between the facade and the engine threads
///
/// Lock order: `pending` before `roots` before any session table.
pub(crate) struct Shared<B: Backend> {
    pub backend: Arc<B>,
    pub config: WatcherConfig,
    pub roots: Mutex<AHashMap<PathBuf, Arc<DirectorySession<B>>>>,
    pub pending: Mutex<VecDeque<RawChange>>,
    pub ids: Arc<IdAllocator>,
    next_tag: AtomicU64,
    shutdown: AtomicBool,
    /// Auto-reset "events available" signal
    events_tx: Sender<()>,
    events_rx: Receiver<()>,
}

impl<B: Backend> Shared<B> {
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn signal_events(&self) {
        let _ = self.events_tx.try_send(());
    }

    pub fn wait_events(&self) {
        let _ = self.events_rx.recv();
    }

    fn next_tag(&self) -> SessionTag {
        SessionTag(self.next_tag.fetch_add(1, Ordering::SeqCst))
    }
}

/// Directory and file change-notification engine
pub struct Watcher<B: Backend = NotifyBackend> {
    shared: Arc<Shared<B>>,
    running: AtomicBool,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Watcher<NotifyBackend> {
    /// Create an engine on the platform backend
    pub fn new(config: WatcherConfig) -> Result<Self> {
        Self::with_backend(NotifyBackend::new(), config)
    }
}

impl<B: Backend> Watcher<B> {
    /// Create an engine on an explicit backend
    ///
    /// Registrations are accepted immediately; nothing is delivered until
    /// [`Watcher::init`] runs.
    pub fn with_backend(backend: B, config: WatcherConfig) -> Result<Self> {
        config.validate()?;
        let (events_tx, events_rx) = bounded(1);
        Ok(Self {
            shared: Arc::new(Shared {
                backend: Arc::new(backend),
                config,
                roots: Mutex::new(AHashMap::new()),
                pending: Mutex::new(VecDeque::new()),
                ids: Arc::new(IdAllocator::new()),
                next_tag: AtomicU64::new(1),
                shutdown: AtomicBool::new(false),
                events_tx,
                events_rx,
            }),
            running: AtomicBool::new(false),
            threads: Mutex::new(Vec::new()),
        })
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.shared.config
    }

    /// Start the dispatch and event threads
    ///
    /// Call once the host can run background threads; repeated calls are
    /// logged and ignored.
    pub fn init(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Watcher already running, ignoring it");
            return Ok(());
        }

        let dispatch = thread::Builder::new().name("watcher-dispatch".into()).spawn({
            let shared = self.shared.clone();
            move || dispatch::run(shared)
        })?;
        self.threads.lock().push(dispatch);

        let events = thread::Builder::new().name("watcher-events".into()).spawn({
            let shared = self.shared.clone();
            move || processing::run(shared)
        })?;
        self.threads.lock().push(events);

        info!("Watcher started");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Watch a single file
    ///
    /// The file's parent directory becomes (or reuses) a watched root. The
    /// callback runs on the event thread for every change to exactly this
    /// path.
    pub fn add_file<F>(&self, path: impl AsRef<Path>, callback: F) -> Result<WatchId>
    where
        F: Fn(Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let path = absolute(path.as_ref())?;
        let root = path
            .parent()
            .ok_or_else(|| {
                WatchError::InvalidArgument(format!("Path {} has no parent directory", path.display()))
            })?
            .to_path_buf();

        info!("Adding file to watcher: {}", path.display());
        let callback: Callback = Arc::new(callback);
        self.register(&root, |table| table.add_file(&path, callback))
    }

    /// Watch a directory recursively
    ///
    /// The callback runs for every change anywhere under `path`.
    pub fn add_dir<F>(&self, path: impl AsRef<Path>, callback: F) -> Result<WatchId>
    where
        F: Fn(Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let root = absolute(path.as_ref())?;

        info!("Adding directory to watcher: {}", root.display());
        let callback: Callback = Arc::new(callback);
        self.register(&root, |table| Ok(table.add_dir(callback)))
    }

    /// Never report changes at or below `path`
    ///
    /// Meant for directories the host itself writes to inside a watched
    /// tree, such as its log directory. Applies to every root, current and
    /// future.
    pub fn ignore(&self, path: impl AsRef<Path>) -> Result<()> {
        let prefix = absolute(path.as_ref())?;
        debug!("Ignoring changes under {}", prefix.display());
        self.shared.backend.ignore(&prefix);
        Ok(())
    }

    /// Stop delivering to a registration
    ///
    /// Unknown ids are logged and ignored. Events already resolved to this
    /// registration may still be delivered.
    pub fn remove_file(&self, id: WatchId) {
        let mut roots = self.shared.roots.lock();
        let owner = roots
            .iter()
            .find(|(_, session)| session.table().contains(id))
            .map(|(root, session)| (root.clone(), session.clone()));

        let Some((root, session)) = owner else {
            warn!("No registration with id {}, ignoring it", id);
            return;
        };

        session.table().remove_watch(id);
        info!("Removed watch {} from {}", id, root.display());

        if self.shared.config.release_idle_roots && session.table().is_empty() {
            roots.remove(&root);
            debug!("Released idle root {}", root.display());
        }
    }

    /// Scope of a live registration
    pub fn scope(&self, id: WatchId) -> Option<Scope> {
        self.shared
            .roots
            .lock()
            .values()
            .find_map(|session| session.table().scope_of(id))
    }

    /// Number of directories with an active OS watch
    pub fn root_count(&self) -> usize {
        self.shared.roots.lock().len()
    }

    pub fn registration_count(&self) -> usize {
        self.shared
            .roots
            .lock()
            .values()
            .map(|session| session.table().len())
            .sum()
    }

    /// Locate or open the session for `root`, then register under the lock
    fn register(
        &self,
        root: &Path,
        add: impl FnOnce(&RegistrationTable) -> Result<WatchId>,
    ) -> Result<WatchId> {
        let mut roots = self.shared.roots.lock();
        let session = match roots.get(root) {
            Some(session) => session.clone(),
            None => {
                let session = Arc::new(DirectorySession::open(
                    self.shared.backend.clone(),
                    root,
                    self.shared.next_tag(),
                    self.shared.config.buffer_size,
                    self.shared.ids.clone(),
                )?);
                roots.insert(root.to_path_buf(), session.clone());
                session
            }
        };

        let result = add(session.table());
        if result.is_err() && session.table().is_empty() && self.shared.config.release_idle_roots {
            roots.remove(root);
        }
        result
    }
}

impl<B: Backend> Drop for Watcher<B> {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        self.shared.backend.wake();
        self.shared.signal_events();

        let current = thread::current().id();
        for handle in self.threads.get_mut().drain(..) {
            // Dropped from inside a callback: that thread exits on its own
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                error!("Watcher thread panicked during shutdown");
            }
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(WatchError::InvalidArgument("Path cannot be empty".into()));
    }
    std::path::absolute(path).map_err(|e| {
        WatchError::InvalidArgument(format!("Cannot resolve {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ManualBackend;
    use tempfile::TempDir;

    fn watcher() -> Watcher<ManualBackend> {
        Watcher::with_backend(ManualBackend::new(), WatcherConfig::default()).unwrap()
    }

    fn noop(_: Event) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn test_roots_are_reused() {
        let dir = TempDir::new().unwrap();
        let watcher = watcher();
        watcher.add_file(dir.path().join("a.css"), noop).unwrap();
        watcher.add_file(dir.path().join("b.css"), noop).unwrap();
        watcher.add_dir(dir.path(), noop).unwrap();
        assert_eq!(watcher.root_count(), 1);
        assert_eq!(watcher.registration_count(), 3);
    }

    #[test]
    fn test_empty_path_allocates_no_id() {
        let dir = TempDir::new().unwrap();
        let watcher = watcher();
        let err = watcher.add_file("", noop).unwrap_err();
        assert!(matches!(err, WatchError::InvalidArgument(_)));
        let err = watcher.add_dir("", noop).unwrap_err();
        assert!(matches!(err, WatchError::InvalidArgument(_)));

        let id = watcher.add_file(dir.path().join("a.css"), noop).unwrap();
        assert_eq!(id.get(), 1);
    }

    #[test]
    fn test_open_failure_leaves_no_root() {
        let dir = TempDir::new().unwrap();
        let watcher = watcher();
        let missing = dir.path().join("missing").join("a.css");
        let err = watcher.add_file(&missing, noop).unwrap_err();
        assert!(matches!(err, WatchError::OpenFailed { .. }));
        assert_eq!(watcher.root_count(), 0);

        // Engine stays usable for other roots
        watcher.add_file(dir.path().join("a.css"), noop).unwrap();
        assert_eq!(watcher.root_count(), 1);
    }

    #[test]
    fn test_last_removal_releases_root() {
        let dir = TempDir::new().unwrap();
        let watcher = watcher();
        let a = watcher.add_file(dir.path().join("a.css"), noop).unwrap();
        let b = watcher.add_dir(dir.path(), noop).unwrap();
        assert_eq!(watcher.scope(b), Some(Scope::Recursive));

        watcher.remove_file(a);
        assert!(watcher.backend().is_open(dir.path()));
        watcher.remove_file(b);
        assert_eq!(watcher.root_count(), 0);
        assert!(!watcher.backend().is_open(dir.path()));

        // Unknown and repeated ids are tolerated
        watcher.remove_file(b);
    }

    #[test]
    fn test_idle_roots_kept_when_configured() {
        let dir = TempDir::new().unwrap();
        let config = WatcherConfig {
            release_idle_roots: false,
            ..WatcherConfig::default()
        };
        let watcher = Watcher::with_backend(ManualBackend::new(), config).unwrap();
        let id = watcher.add_file(dir.path().join("a.css"), noop).unwrap();
        watcher.remove_file(id);
        assert_eq!(watcher.root_count(), 1);
        assert_eq!(watcher.registration_count(), 0);
    }

    #[test]
    fn test_ignore_rejects_empty_path() {
        let watcher = watcher();
        assert!(matches!(watcher.ignore(""), Err(WatchError::InvalidArgument(_))));
    }

    #[test]
    fn test_init_is_idempotent() {
        let watcher = watcher();
        watcher.init().unwrap();
        watcher.init().unwrap();
        assert!(watcher.is_running());
        assert_eq!(watcher.threads.lock().len(), 2);
    }
}
