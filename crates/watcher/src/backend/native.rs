//! Platform backend on top of the `notify` crate
//!
//! notify selects the OS mechanism (inotify, ReadDirectoryChangesW,
//! FSEvents); this module turns its events into raw records and feeds them
//! through the same armed-slot discipline as every other backend.

use super::{Backend, Completion, CompletionPort, SessionTag, WatchSlot};
use crate::error::WatchError;
use crate::event::Reason;
use crate::record::{NotifyBuffer, RawRecord};
use crate::Result;
use notify::event::{MetadataKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{trace, warn};

/// Production backend
pub struct NotifyBackend {
    port: CompletionPort,
}

/// Directory opened by a [`NotifyBackend`]
///
/// Dropping it stops the underlying OS watch.
pub struct NotifyHandle {
    slot: Arc<WatchSlot>,
    _watcher: Mutex<RecommendedWatcher>,
}

impl NotifyBackend {
    pub fn new() -> Self {
        Self {
            port: CompletionPort::new(),
        }
    }
}

impl Default for NotifyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for NotifyBackend {
    type Handle = NotifyHandle;

    fn open(&self, root: &Path, tag: SessionTag, buffer: Arc<NotifyBuffer>) -> Result<Self::Handle> {
        if !root.is_dir() {
            return Err(WatchError::OpenFailed {
                path: root.to_path_buf(),
                reason: "not a directory".into(),
            });
        }

        let slot = Arc::new(WatchSlot::new(root, tag, buffer, &self.port));
        let translator = Translator::new(root);
        let handler_slot = slot.clone();
        let filter = self.port.filter().clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            // Nothing is logged for these; the log file may live under an ignored prefix
            Ok(event) if filter.ignores_all(&event.paths) => {}
            Ok(event) => handler_slot.deliver(translator.records(&event)),
            Err(e) => warn!("File watch error under {}: {}", translator.root.display(), e),
        })
        .map_err(|e| WatchError::OpenFailed {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| WatchError::OpenFailed {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(NotifyHandle {
            slot,
            _watcher: Mutex::new(watcher),
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

/// Converts notify events for one root into raw records
struct Translator {
    root: PathBuf,
    /// Some platforms report canonical paths (e.g. /private/var on macOS)
    canonical: PathBuf,
}

impl Translator {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            canonical: root.canonicalize().unwrap_or_else(|_| root.to_path_buf()),
        }
    }

    fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.root)
            .or_else(|_| path.strip_prefix(&self.canonical))
            .ok()
    }

    fn records(&self, event: &Event) -> Vec<RawRecord> {
        let mut records = Vec::with_capacity(event.paths.len());
        let mut push = |path: &Path, reason: Reason| {
            let Some(rel) = self.relative(path) else {
                trace!("Ignoring event outside {}: {}", self.root.display(), path.display());
                return;
            };
            // Records carry UTF-8 names; a lossy name would never match a registration
            match rel.to_str() {
                Some(name) => records.push(RawRecord::new(name, reason)),
                None => warn!("Dropping {} for non UTF-8 path {}", reason, path.display()),
            }
        };

        match event.kind {
            EventKind::Create(_) => event.paths.iter().for_each(|p| push(p, Reason::Added)),
            EventKind::Remove(_) => event.paths.iter().for_each(|p| push(p, Reason::Removed)),
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::From => event
                    .paths
                    .iter()
                    .for_each(|p| push(p, Reason::RenamedOldName)),
                RenameMode::To => event
                    .paths
                    .iter()
                    .for_each(|p| push(p, Reason::RenamedNewName)),
                RenameMode::Both => {
                    if let [from, to] = event.paths.as_slice() {
                        push(from, Reason::RenamedOldName);
                        push(to, Reason::RenamedNewName);
                    }
                }
                RenameMode::Any | RenameMode::Other => {
                    for path in &event.paths {
                        let reason = if path.exists() {
                            Reason::RenamedNewName
                        } else {
                            Reason::RenamedOldName
                        };
                        push(path, reason);
                    }
                }
            },
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime | MetadataKind::Any))
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other) => {
                event.paths.iter().for_each(|p| push(p, Reason::Modified))
            }
            _ => trace!("Ignoring {:?} for {:?}", event.kind, event.paths),
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};

    fn translator() -> Translator {
        Translator {
            root: PathBuf::from("/cfg"),
            canonical: PathBuf::from("/private/cfg"),
        }
    }

    fn reasons(event: Event) -> Vec<(String, Reason)> {
        translator()
            .records(&event)
            .into_iter()
            .map(|r| {
                let reason = r.reason().unwrap();
                (r.name, reason)
            })
            .collect()
    }

    #[test]
    fn test_create_modify_remove() {
        let created = Event::new(EventKind::Create(CreateKind::File)).add_path("/cfg/a.css".into());
        assert_eq!(reasons(created), vec![("a.css".to_string(), Reason::Added)]);

        let modified = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path("/private/cfg/themes/b.css".into());
        let expected = Path::new("themes").join("b.css").to_string_lossy().into_owned();
        assert_eq!(reasons(modified), vec![(expected, Reason::Modified)]);

        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path("/cfg/a.css".into());
        assert_eq!(reasons(removed), vec![("a.css".to_string(), Reason::Removed)]);
    }

    #[test]
    fn test_rename_both_yields_pair() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path("/cfg/old.css".into())
            .add_path("/cfg/new.css".into());
        assert_eq!(
            reasons(event),
            vec![
                ("old.css".to_string(), Reason::RenamedOldName),
                ("new.css".to_string(), Reason::RenamedNewName),
            ]
        );
    }

    #[test]
    fn test_access_and_foreign_paths_are_ignored() {
        let access = Event::new(EventKind::Access(AccessKind::Any)).add_path("/cfg/a.css".into());
        assert!(reasons(access).is_empty());

        let foreign = Event::new(EventKind::Create(CreateKind::File)).add_path("/elsewhere/a.css".into());
        assert!(reasons(foreign).is_empty());

        let perms = Event::new(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)))
            .add_path("/cfg/a.css".into());
        assert!(reasons(perms).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_dropped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let bad = Path::new("/cfg").join(OsStr::from_bytes(b"theme-\xff.css"));
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(bad)
            .add_path("/cfg/ok.css".into());
        assert_eq!(reasons(event), vec![("ok.css".to_string(), Reason::Added)]);
    }
}
