//! Watch arbitrary files and directories

use super::{engine, print_event};
use anyhow::{Context, Result};
use extendify_core::Paths;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tokio::sync::mpsc;
use watcher::{Event, WatcherConfig};

/// Print every change under the given paths until Ctrl-C
///
/// With no paths, watches the whole config directory.
pub async fn run(
    paths: &Paths,
    config: &WatcherConfig,
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
) -> Result<()> {
    let watcher = engine(paths, config)?;
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let dirs = if files.is_empty() && dirs.is_empty() {
        vec![paths.base_dir(true)?.to_path_buf()]
    } else {
        dirs
    };

    for file in &files {
        let tx = tx.clone();
        let id = watcher
            .add_file(file, move |event| {
                tx.send(event)
                    .map_err(|_| anyhow::anyhow!("event receiver closed"))
            })
            .with_context(|| format!("Failed to watch {}", file.display()))?;
        println!("{} {} {}", "Watching".bold(), file.display(), format!("(#{id})").dimmed());
    }
    for dir in &dirs {
        let tx = tx.clone();
        let id = watcher
            .add_dir(dir, move |event| {
                tx.send(event)
                    .map_err(|_| anyhow::anyhow!("event receiver closed"))
            })
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        println!("{} {}/ {}", "Watching".bold(), dir.display(), format!("(#{id})").dimmed());
    }
    drop(tx);

    watcher.init()?;
    println!("{}", "Press Ctrl-C to stop".dimmed());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => print_event(&event),
                None => break,
            },
            res = &mut ctrl_c => {
                res?;
                println!();
                break;
            }
        }
    }
    Ok(())
}
