//! Asynchronous change-notification backends
//!
//! A backend opens directories for change notification, arms a watch
//! request against a session's buffer, and blocks a thread until some armed
//! request completes. The dispatch loop is written against [`Backend`]
//! only; each platform mechanism lives behind it.

mod manual;
mod native;
mod port;

pub use manual::ManualBackend;
pub use native::NotifyBackend;
pub(crate) use port::{CompletionPort, WatchSlot};

use crate::record::NotifyBuffer;
use crate::Result;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Identifies the session a completion belongs to
///
/// Tags are never reused, so a completion from a released session is
/// recognisably stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTag(pub(crate) u64);

impl fmt::Display for SessionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of waiting on the completion port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A watch request finished and wrote `bytes` into its buffer
    ///
    /// Zero bytes means the buffer overflowed and records were dropped.
    Ready { tag: SessionTag, bytes: usize },
    /// Woken without a completion (shutdown)
    Woken,
}

/// Capability interface over an OS change-notification mechanism
pub trait Backend: Send + Sync + 'static {
    /// Open directory, associated with the completion port
    type Handle: Send + Sync + 'static;

    /// Open `root` and associate it with the port, tagging its completions
    fn open(&self, root: &Path, tag: SessionTag, buffer: Arc<NotifyBuffer>) -> Result<Self::Handle>;

    /// Issue a new watch request; the buffer is cleared first
    fn arm(&self, handle: &Self::Handle) -> Result<()>;

    /// Block until an armed request completes or [`Backend::wake`] is called
    fn wait(&self) -> Completion;

    /// Release one blocked [`Backend::wait`] call
    fn wake(&self);

    /// Drop changes at or below `prefix` before they reach any session
    fn ignore(&self, prefix: &Path);
}
