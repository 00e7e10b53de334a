//! CLI command implementations

pub mod config;
pub mod quick_css;
pub mod settings;
pub mod themes;
pub mod watch;

use anyhow::Result;
use extendify_core::Paths;
use std::sync::Arc;
use watcher::{Event, Reason, Watcher, WatcherConfig};
use owo_colors::OwoColorize;

/// Engine for commands that need one
///
/// The log directory sits inside the watched config tree; its writes are
/// never reported, or every logged event would trigger another.
pub(crate) fn engine(paths: &Paths, config: &WatcherConfig) -> Result<Arc<Watcher>> {
    let watcher = Watcher::new(config.clone())?;
    watcher.ignore(paths.log_dir(false)?)?;
    Ok(Arc::new(watcher))
}

/// Block until Ctrl-C
pub(crate) async fn wait_for_ctrl_c() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    println!();
    Ok(())
}

pub(crate) fn print_event(event: &Event) {
    let reason = match event.reason() {
        Reason::Added => event.reason().green().to_string(),
        Reason::Removed => event.reason().red().to_string(),
        Reason::Modified => event.reason().yellow().to_string(),
        Reason::RenamedOldName | Reason::RenamedNewName => event.reason().cyan().to_string(),
    };
    println!(
        "{} {} {}",
        format!("#{}", event.watch_id()).dimmed(),
        reason,
        event.path().display()
    );
}
