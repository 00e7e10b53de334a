//! Backend driven by explicit change posts
//!
//! Useful for hosts that already observe changes by other means, and for
//! exercising the engine deterministically.

use super::{Backend, Completion, CompletionPort, SessionTag, WatchSlot};
use crate::error::WatchError;
use crate::event::Reason;
use crate::record::{NotifyBuffer, RawRecord};
use crate::Result;
use ahash::AHashMap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

type SlotMap = Mutex<AHashMap<PathBuf, Arc<WatchSlot>>>;

/// Backend whose changes are posted by the caller
pub struct ManualBackend {
    port: CompletionPort,
    slots: Arc<SlotMap>,
}

/// Open root of a [`ManualBackend`]
pub struct ManualHandle {
    slot: Arc<WatchSlot>,
    slots: Weak<SlotMap>,
}

impl Drop for ManualHandle {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            let mut slots = slots.lock();
            if slots
                .get(self.slot.root())
                .is_some_and(|current| Arc::ptr_eq(current, &self.slot))
            {
                slots.remove(self.slot.root());
            }
        }
    }
}

impl ManualBackend {
    pub fn new() -> Self {
        Self {
            port: CompletionPort::new(),
            slots: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Report one change under `root`
    ///
    /// `relative` is the path relative to the root. Returns false if no
    /// session has `root` open.
    pub fn post(&self, root: &Path, relative: impl Into<String>, reason: Reason) -> bool {
        self.post_batch(root, [(relative.into(), reason)])
    }

    /// Report several changes as one notification
    pub fn post_batch(
        &self,
        root: &Path,
        changes: impl IntoIterator<Item = (String, Reason)>,
    ) -> bool {
        let slot = match self.slots.lock().get(root) {
            Some(slot) => slot.clone(),
            None => return false,
        };
        let records = changes
            .into_iter()
            .map(|(name, reason)| RawRecord::new(name, reason))
            .collect();
        slot.deliver(records);
        true
    }

    /// Whether some session currently has `root` open
    pub fn is_open(&self, root: &Path) -> bool {
        self.slots.lock().contains_key(root)
    }
}

impl Default for ManualBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for ManualBackend {
    type Handle = ManualHandle;

    fn open(&self, root: &Path, tag: SessionTag, buffer: Arc<NotifyBuffer>) -> Result<Self::Handle> {
        if !root.is_dir() {
            return Err(WatchError::OpenFailed {
                path: root.to_path_buf(),
                reason: "not a directory".into(),
            });
        }

        let slot = Arc::new(WatchSlot::new(root, tag, buffer, &self.port));
        self.slots.lock().insert(root.to_path_buf(), slot.clone());
        Ok(ManualHandle {
            slot,
            slots: Arc::downgrade(&self.slots),
        })
    }

    fn arm(&self, handle: &Self::Handle) -> Result<()> {
        handle.slot.arm();
        Ok(())
    }

    fn wait(&self) -> Completion {
        self.port.wait()
    }

    fn wake(&self) {
        self.port.wake();
    }

    fn ignore(&self, prefix: &Path) {
        self.port.filter().add(prefix);
    }
}
