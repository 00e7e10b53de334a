//! Completion dispatch loop
//!
//! Blocks on the backend's completion port, decodes each completed buffer
//! into raw changes, queues them and re-arms the session before letting go
//! of the locks.

use crate::backend::{Backend, Completion, SessionTag};
use crate::engine::Shared;
use crate::error::RecordError;
use crate::event::RawChange;
use crate::session::DirectorySession;
use std::sync::Arc;
use tracing::{error, info, trace, warn};

pub(crate) fn run<B: Backend>(shared: Arc<Shared<B>>) {
    info!("Watcher dispatch loop started");
    loop {
        let completion = shared.backend.wait();
        if shared.is_shutdown() {
            info!("Watcher shutdown requested, exiting loop");
            return;
        }

        match completion {
            Completion::Woken => continue,
            Completion::Ready { tag, bytes } => {
                if dispatch_completion(&shared, tag, bytes) {
                    shared.signal_events();
                }
            }
        }
    }
}

/// Queue the changes of one completion; returns whether any were queued
fn dispatch_completion<B: Backend>(shared: &Shared<B>, tag: SessionTag, bytes: usize) -> bool {
    let mut pending = shared.pending.lock();
    let roots = shared.roots.lock();

    let Some(session) = roots.values().find(|s| s.tag() == tag) else {
        warn!("No directory registered for session {}, ignoring it", tag);
        return false;
    };

    if bytes == 0 {
        warn!(
            "Bytes transferred is 0 for {}, notification buffer overflowed",
            session.root().display()
        );
        rearm(session);
        return false;
    }

    let records = match session.buffer().decode(bytes) {
        Ok(records) => records,
        Err(RecordError::UnknownAction(code)) => {
            crate::invariant_violation(&format!("Unknown action type {}", code))
        }
        Err(e) => {
            error!(
                "Dropping malformed notification for {}: {}",
                session.root().display(),
                e
            );
            rearm(session);
            return false;
        }
    };

    let before = pending.len();
    for record in records {
        let reason = match record.reason() {
            Ok(reason) => reason,
            Err(e) => crate::invariant_violation(&format!("Unknown action type: {}", e)),
        };
        let path = if record.name.is_empty() {
            session.root().to_path_buf()
        } else {
            session.root().join(&record.name)
        };
        trace!("Queued {} {}", reason, path.display());
        pending.push_back(RawChange {
            path,
            reason,
            root: session.root().to_path_buf(),
        });
    }

    rearm(session);
    pending.len() > before
}

fn rearm<B: Backend>(session: &DirectorySession<B>) {
    if let Err(e) = session.watch() {
        error!("Failed to re-arm watch for {}: {}", session.root().display(), e);
    }
}
