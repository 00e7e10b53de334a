//! Event processing loop
//!
//! Drains the pending queue, resolves each change against the registration
//! tables, then invokes the callbacks one at a time with no lock held.

use crate::backend::Backend;
use crate::engine::Shared;
use crate::event::{Callback, Event};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

type WorkItem = (Event, Callback);

/// Outcome of one drain
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Drained {
    pub delivered: usize,
    /// Callbacks that returned an error or panicked
    pub failed: usize,
}

impl Drained {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

pub(crate) fn run<B: Backend>(shared: Arc<Shared<B>>) {
    info!("Watcher event loop started");
    let mut work: VecDeque<WorkItem> = VecDeque::new();
    loop {
        if !work.is_empty() {
            crate::invariant_violation("Pending events not empty, This should never happen");
        }

        resolve(&shared, &mut work);
        let drained = deliver(&mut work);
        if drained.total() > 0 {
            debug!(
                "Processed {} events ({} delivered, {} failed)",
                drained.total(),
                drained.delivered,
                drained.failed
            );
        }

        shared.wait_events();
        if shared.is_shutdown() {
            info!("Watcher shutdown requested, exiting event processing");
            return;
        }
    }
}

/// Move every pending change into `work`, one item per interested registration
pub(crate) fn resolve<B: Backend>(shared: &Shared<B>, work: &mut VecDeque<WorkItem>) {
    let mut pending = shared.pending.lock();
    let roots = shared.roots.lock();

    for change in pending.drain(..) {
        match roots.get(&change.root) {
            Some(session) => {
                for (id, callback) in session.table().matching(&change.path) {
                    work.push_back((Event::new(change.path.clone(), change.reason, id), callback));
                }
            }
            None => warn!(
                "Received event for path {} but no directory registered for it, ignoring it",
                change.path.display()
            ),
        }
    }
}

/// Invoke each work item; failures are logged and do not stop the drain
pub(crate) fn deliver(work: &mut VecDeque<WorkItem>) -> Drained {
    let mut drained = Drained::default();
    while let Some((event, callback)) = work.pop_front() {
        trace!("dispatching fs watcher event: {}", event);
        let context = event.clone();
        match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
            Ok(Ok(())) => drained.delivered += 1,
            Ok(Err(e)) => {
                drained.failed += 1;
                error!("Error occurred while processing {}, {:#}", context, e);
            }
            Err(payload) => {
                drained.failed += 1;
                error!(
                    "Callback panicked while processing {}: {}",
                    context,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
    drained
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
