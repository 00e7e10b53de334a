//! Directory sessions: one armed watch per root

use crate::backend::{Backend, SessionTag};
use crate::record::NotifyBuffer;
use crate::table::{IdAllocator, RegistrationTable};
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// One watched root directory
///
/// Owns the OS handle, the notification buffer and the root's
/// registrations. The handle is released when the session is dropped.
pub(crate) struct DirectorySession<B: Backend> {
    root: PathBuf,
    tag: SessionTag,
    buffer: Arc<NotifyBuffer>,
    backend: Arc<B>,
    handle: B::Handle,
    table: RegistrationTable,
}

impl<B: Backend> DirectorySession<B> {
    /// Open `root` and issue the first watch request
    pub fn open(
        backend: Arc<B>,
        root: &Path,
        tag: SessionTag,
        buffer_size: usize,
        ids: Arc<IdAllocator>,
    ) -> Result<Self> {
        let buffer = Arc::new(NotifyBuffer::new(buffer_size));
        let handle = backend.open(root, tag, buffer.clone())?;
        let session = Self {
            root: root.to_path_buf(),
            tag,
            buffer,
            backend,
            handle,
            table: RegistrationTable::new(root.to_path_buf(), ids),
        };
        session.watch()?;
        debug!("Watching {} (session {})", session.root.display(), tag);
        Ok(session)
    }

    /// Re-arm the watch request
    ///
    /// Must follow every completion, or the session stops reporting.
    pub fn watch(&self) -> Result<()> {
        self.buffer.clear();
        self.backend.arm(&self.handle)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tag(&self) -> SessionTag {
        self.tag
    }

    pub fn buffer(&self) -> &NotifyBuffer {
        &self.buffer
    }

    pub fn table(&self) -> &RegistrationTable {
        &self.table
    }
}
