//! Completion port and per-directory watch slots shared by backends

use super::{Completion, SessionTag};
use crate::record::{NotifyBuffer, RawRecord};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Repeats of the last record within this window are folded into it
///
/// A single write is often reported twice (truncate, then data).
pub(crate) const COALESCE_WINDOW: Duration = Duration::from_millis(50);

/// Path prefixes whose changes never reach a session
#[derive(Clone, Default)]
pub(crate) struct PathFilter(Arc<RwLock<Vec<PathBuf>>>);

impl PathFilter {
    /// Ignore `prefix` and, if it resolves elsewhere, its canonical form
    pub fn add(&self, prefix: &Path) {
        let mut prefixes = self.0.write();
        let canonical = prefix.canonicalize().ok();
        for path in std::iter::once(prefix.to_path_buf()).chain(canonical) {
            if !prefixes.contains(&path) {
                prefixes.push(path);
            }
        }
    }

    pub fn ignores(&self, path: &Path) -> bool {
        self.0.read().iter().any(|prefix| path.starts_with(prefix))
    }

    pub fn ignores_all(&self, paths: &[PathBuf]) -> bool {
        !paths.is_empty() && paths.iter().all(|path| self.ignores(path))
    }
}

/// Queue of completed watch requests
pub(crate) struct CompletionPort {
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    filter: PathFilter,
}

impl CompletionPort {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            filter: PathFilter::default(),
        }
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    pub fn wait(&self) -> Completion {
        // The port keeps a sender alive, so recv only fails if it is torn down
        self.rx.recv().unwrap_or(Completion::Woken)
    }

    pub fn wake(&self) {
        let _ = self.tx.send(Completion::Woken);
    }
}

#[derive(Default)]
struct SlotState {
    armed: bool,
    /// Records observed while no request was outstanding
    backlog: Vec<RawRecord>,
    backlog_bytes: usize,
    overflowed: bool,
    /// Most recent record accepted, and when
    last: Option<(RawRecord, Instant)>,
}

/// One directory's outstanding watch request
///
/// Records observed while armed complete the request immediately; records
/// observed while disarmed are held until the next [`WatchSlot::arm`].
/// Records under an ignored prefix, and repeats of the previous record
/// within [`COALESCE_WINDOW`], are dropped on arrival.
pub(crate) struct WatchSlot {
    root: PathBuf,
    tag: SessionTag,
    buffer: Arc<NotifyBuffer>,
    port: Sender<Completion>,
    filter: PathFilter,
    state: Mutex<SlotState>,
}

impl WatchSlot {
    pub fn new(root: &Path, tag: SessionTag, buffer: Arc<NotifyBuffer>, port: &CompletionPort) -> Self {
        Self {
            root: root.to_path_buf(),
            tag,
            buffer,
            port: port.tx.clone(),
            filter: port.filter.clone(),
            state: Mutex::new(SlotState::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn arm(&self) {
        let mut state = self.state.lock();
        self.buffer.clear();

        if state.overflowed {
            *state = SlotState::default();
            self.post(0);
            return;
        }

        if !state.backlog.is_empty() {
            let records = std::mem::take(&mut state.backlog);
            state.backlog_bytes = 0;
            state.armed = false;
            self.complete(&records);
            return;
        }

        state.armed = true;
    }

    pub fn deliver(&self, mut records: Vec<RawRecord>) {
        let mut state = self.state.lock();
        let now = Instant::now();
        records.retain(|record| {
            if self.filter.ignores(&self.root.join(&record.name)) {
                return false;
            }
            let repeat = state
                .last
                .as_ref()
                .is_some_and(|(last, at)| last == record && now.duration_since(*at) < COALESCE_WINDOW);
            if !repeat {
                state.last = Some((record.clone(), now));
            }
            !repeat
        });
        if records.is_empty() {
            return;
        }

        if state.armed {
            state.armed = false;
            self.complete(&records);
            return;
        }

        if state.overflowed {
            return;
        }
        state.backlog_bytes += records.iter().map(RawRecord::encoded_len).sum::<usize>();
        state.backlog.extend(records);
        if state.backlog_bytes > self.buffer.capacity() {
            state.backlog.clear();
            state.backlog_bytes = 0;
            state.overflowed = true;
        }
    }

    fn complete(&self, records: &[RawRecord]) {
        let bytes = match self.buffer.fill(records) {
            Some(bytes) => bytes,
            None => {
                warn!(
                    "Notification buffer for {} overflowed, dropping {} records",
                    self.root.display(),
                    records.len()
                );
                0
            }
        };
        self.post(bytes);
    }

    fn post(&self, bytes: usize) {
        trace!("Completing watch {} for {} ({} bytes)", self.tag, self.root.display(), bytes);
        let _ = self.port.send(Completion::Ready { tag: self.tag, bytes });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Reason;

    fn slot(capacity: usize) -> (WatchSlot, CompletionPort, Arc<NotifyBuffer>) {
        let port = CompletionPort::new();
        let buffer = Arc::new(NotifyBuffer::new(capacity));
        let slot = WatchSlot::new(Path::new("/cfg"), SessionTag(7), buffer.clone(), &port);
        (slot, port, buffer)
    }

    fn names(port: &CompletionPort, buffer: &NotifyBuffer) -> Vec<String> {
        let Completion::Ready { bytes, .. } = port.wait() else {
            panic!("expected a completion");
        };
        buffer.decode(bytes).unwrap().into_iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_disarmed_records_wait_for_arm() {
        let (slot, port, buffer) = slot(256);
        slot.deliver(vec![RawRecord::new("a.css", Reason::Added)]);
        assert!(port.rx.try_recv().is_err());

        slot.arm();
        let completion = port.wait();
        let Completion::Ready { tag, bytes } = completion else {
            panic!("expected a completion");
        };
        assert_eq!(tag, SessionTag(7));
        assert_eq!(buffer.decode(bytes).unwrap()[0].name, "a.css");
    }

    #[test]
    fn test_armed_slot_completes_once() {
        let (slot, port, _buffer) = slot(256);
        slot.arm();
        slot.deliver(vec![RawRecord::new("a.css", Reason::Modified)]);
        slot.deliver(vec![RawRecord::new("b.css", Reason::Modified)]);

        assert!(matches!(port.wait(), Completion::Ready { .. }));
        // Second batch is held until re-armed
        assert!(port.rx.try_recv().is_err());
    }

    #[test]
    fn test_backlog_overflow_reports_zero_bytes() {
        let (slot, port, _buffer) = slot(32);
        for i in 0..4 {
            slot.deliver(vec![RawRecord::new(format!("file-{i}.css"), Reason::Added)]);
        }
        slot.arm();
        assert_eq!(
            port.wait(),
            Completion::Ready { tag: SessionTag(7), bytes: 0 }
        );
    }

    #[test]
    fn test_repeated_write_is_coalesced() {
        let (slot, port, buffer) = slot(256);
        slot.arm();
        // Truncate and data change of one write
        slot.deliver(vec![RawRecord::new("config.json", Reason::Modified)]);
        slot.deliver(vec![RawRecord::new("config.json", Reason::Modified)]);
        assert_eq!(names(&port, &buffer), vec!["config.json"]);

        slot.arm();
        assert!(port.rx.try_recv().is_err());

        // Different actions on the same name are all kept
        slot.deliver(vec![
            RawRecord::new("config.json", Reason::Removed),
            RawRecord::new("config.json", Reason::Added),
            RawRecord::new("config.json", Reason::Added),
        ]);
        assert_eq!(names(&port, &buffer), vec!["config.json", "config.json"]);
    }

    #[test]
    fn test_repeat_after_window_is_kept() {
        let (slot, port, buffer) = slot(256);
        slot.arm();
        slot.deliver(vec![RawRecord::new("a.css", Reason::Modified)]);
        assert_eq!(names(&port, &buffer), vec!["a.css"]);

        std::thread::sleep(COALESCE_WINDOW * 2);
        slot.arm();
        slot.deliver(vec![RawRecord::new("a.css", Reason::Modified)]);
        assert_eq!(names(&port, &buffer), vec!["a.css"]);
    }

    #[test]
    fn test_ignored_prefix_is_dropped() {
        let (slot, port, buffer) = slot(256);
        port.filter().add(Path::new("/cfg/logs"));
        slot.arm();

        slot.deliver(vec![RawRecord::new("logs/native.log", Reason::Modified)]);
        assert!(port.rx.try_recv().is_err());

        slot.deliver(vec![
            RawRecord::new("logs/native.log", Reason::Modified),
            RawRecord::new("logs.css", Reason::Modified),
        ]);
        assert_eq!(names(&port, &buffer), vec!["logs.css"]);
    }

    #[test]
    fn test_filter_matches_whole_components() {
        let filter = PathFilter::default();
        filter.add(Path::new("/cfg/logs"));
        assert!(filter.ignores(Path::new("/cfg/logs")));
        assert!(filter.ignores(Path::new("/cfg/logs/native.log.2026-10-17")));
        assert!(!filter.ignores(Path::new("/cfg/logs.css")));
        assert!(!filter.ignores_all(&[]));
        assert!(!filter.ignores_all(&[PathBuf::from("/cfg/logs/a"), PathBuf::from("/cfg/a")]));
    }
}
