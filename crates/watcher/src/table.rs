//! Per-root registration table

use crate::error::WatchError;
use crate::event::{Callback, WatchId};
use crate::Result;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Monotonic registration id source, starting at 1
#[derive(Debug)]
pub(crate) struct IdAllocator(AtomicU64);

impl IdAllocator {
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub fn next(&self) -> WatchId {
        WatchId(self.0.fetch_add(1, Ordering::SeqCst))
    }
}

/// What a registration listens to within its root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Exactly this path
    Exact(PathBuf),
    /// Anything under the root, recursively
    Recursive,
}

impl Scope {
    fn matches(&self, path: &Path) -> bool {
        match self {
            Scope::Exact(target) => target == path,
            Scope::Recursive => true,
        }
    }
}

struct Registration {
    scope: Scope,
    callback: Callback,
}

/// Registrations for one watched root
///
/// Exact and recursive registrations share one id-ordered table; a lookup
/// returns the union of both kinds.
pub(crate) struct RegistrationTable {
    root: PathBuf,
    ids: std::sync::Arc<IdAllocator>,
    entries: RwLock<BTreeMap<WatchId, Registration>>,
}

impl RegistrationTable {
    pub fn new(root: PathBuf, ids: std::sync::Arc<IdAllocator>) -> Self {
        Self {
            root,
            ids,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a callback for one path (the root or a direct child of it)
    pub fn add_file(&self, path: &Path, callback: Callback) -> Result<WatchId> {
        if path.as_os_str().is_empty() {
            return Err(WatchError::InvalidArgument("Path cannot be empty".into()));
        }
        if path != self.root && path.parent() != Some(self.root.as_path()) {
            return Err(WatchError::NotDirectChild {
                root: self.root.clone(),
                path: path.to_path_buf(),
            });
        }

        Ok(self.insert(Scope::Exact(path.to_path_buf()), callback))
    }

    /// Register a callback for every change under the root
    pub fn add_dir(&self, callback: Callback) -> WatchId {
        self.insert(Scope::Recursive, callback)
    }

    fn insert(&self, scope: Scope, callback: Callback) -> WatchId {
        let mut entries = self.entries.write();
        let id = self.ids.next();
        if entries.insert(id, Registration { scope, callback }).is_some() {
            crate::invariant_violation(&format!("watch id {} registered twice", id));
        }
        id
    }

    /// Remove a registration; unknown ids are logged and ignored
    pub fn remove_watch(&self, id: WatchId) -> bool {
        match self.entries.write().remove(&id) {
            Some(_) => true,
            None => {
                warn!("No callback registered for id {}, ignoring it", id);
                false
            }
        }
    }

    pub fn contains(&self, id: WatchId) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Registrations interested in `path`, in registration order
    pub fn matching(&self, path: &Path) -> SmallVec<[(WatchId, Callback); 4]> {
        self.entries
            .read()
            .iter()
            .filter(|(_, reg)| reg.scope.matches(path))
            .map(|(id, reg)| (*id, reg.callback.clone()))
            .collect()
    }

    pub fn scope_of(&self, id: WatchId) -> Option<Scope> {
        self.entries.read().get(&id).map(|reg| reg.scope.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
