//! File system watching for Extendify
//!
//! This crate provides the change-notification engine behind the config,
//! quick CSS and theme features:
//! - One OS watch per directory, shared by every registration under it
//! - Exact-file and recursive-directory registrations with stable ids
//! - A dispatch thread that decodes completed notification buffers
//! - An event thread that runs callbacks with no engine lock held
//!
//! ```no_run
//! use watcher::{Watcher, WatcherConfig};
//!
//! let watcher = Watcher::new(WatcherConfig::default())?;
//! let id = watcher.add_file("/home/me/.config/extendify/quickCss.css", |event| {
//!     println!("{event}");
//!     Ok(())
//! })?;
//! watcher.init()?;
//! # watcher.remove_file(id);
//! # Ok::<(), watcher::WatchError>(())
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod record;

mod dispatch;
mod engine;
mod processing;
mod session;
mod table;

pub use backend::{Backend, Completion, ManualBackend, NotifyBackend, SessionTag};
pub use config::WatcherConfig;
pub use engine::Watcher;
pub use error::{RecordError, WatchError};
pub use event::{Callback, Event, Reason, WatchId};
pub use table::Scope;

/// Result alias for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Log a broken engine invariant and abort the process
///
/// Reserved for states the engine cannot recover from without risking
/// delivering events to the wrong registration.
#[cold]
pub(crate) fn invariant_violation(msg: &str) -> ! {
    tracing::error!("Watcher invariant violated: {}", msg);
    std::process::abort()
}
