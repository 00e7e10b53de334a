//! Change and event values delivered to callbacks

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Registration identifier
///
/// Positive, allocated from 1 upward and never reused by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub(crate) u64);

impl WatchId {
    /// Raw numeric value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of filesystem change observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// File or directory created
    Added,
    /// File or directory deleted
    Removed,
    /// Contents or write time changed
    Modified,
    /// Old name of a renamed entry
    RenamedOldName,
    /// New name of a renamed entry
    RenamedNewName,
}

impl Reason {
    /// All reasons, in action-code order
    pub const ALL: [Reason; 5] = [
        Reason::Added,
        Reason::Removed,
        Reason::Modified,
        Reason::RenamedOldName,
        Reason::RenamedNewName,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Reason::Added => "ADDED",
            Reason::Removed => "REMOVED",
            Reason::Modified => "MODIFIED",
            Reason::RenamedOldName => "RENAMED_OLD_NAME",
            Reason::RenamedNewName => "RENAMED_NEW_NAME",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded change, before it is resolved against registrations
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawChange {
    /// Absolute path affected
    pub path: PathBuf,
    pub reason: Reason,
    /// Root of the session that reported the change
    pub root: PathBuf,
}

/// A change delivered to one registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    path: PathBuf,
    reason: Reason,
    watch_id: WatchId,
}

impl Event {
    pub fn new(path: PathBuf, reason: Reason, watch_id: WatchId) -> Self {
        Self {
            path,
            reason,
            watch_id,
        }
    }

    /// Absolute path affected
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// Registration this event was matched to
    pub fn watch_id(&self) -> WatchId {
        self.watch_id
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event: {{path: {}, reason: {}, watchId: {}}}",
            self.path.display(),
            self.reason,
            self.watch_id
        )
    }
}

/// Callback invoked on the event processing thread
///
/// Returning `Err` (or panicking) is logged and isolated from other callbacks.
pub type Callback = Arc<dyn Fn(Event) -> anyhow::Result<()> + Send + Sync>;
