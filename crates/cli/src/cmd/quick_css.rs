//! Quick CSS commands

use super::{engine, wait_for_ctrl_c};
use anyhow::{Context, Result};
use extendify_api::QuickCss;
use extendify_core::Paths;
use owo_colors::OwoColorize;
use watcher::WatcherConfig;

pub async fn run_get(paths: &Paths, config: &WatcherConfig) -> Result<()> {
    let quick_css = QuickCss::new(paths.clone(), engine(paths, config)?);
    print!("{}", quick_css.get().context("Error reading quick CSS file")?);
    Ok(())
}

/// Replace the stylesheet; `-` reads it from stdin
pub async fn run_set(paths: &Paths, config: &WatcherConfig, css: &str) -> Result<()> {
    let css = if css == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
    } else {
        css.to_string()
    };
    let quick_css = QuickCss::new(paths.clone(), engine(paths, config)?);
    quick_css.set(&css).context("Error writing quick CSS file")?;
    println!("{} Updated {}", "✓".green(), quick_css.path()?.display());
    Ok(())
}

pub async fn run_path(paths: &Paths) -> Result<()> {
    println!("{}", paths.quick_css_file(false)?.display());
    Ok(())
}

/// Print the stylesheet every time it changes
pub async fn run_watch(paths: &Paths, config: &WatcherConfig) -> Result<()> {
    let watcher = engine(paths, config)?;
    let quick_css = QuickCss::new(paths.clone(), watcher.clone());
    quick_css.add_change_listener(|css| {
        println!("{}", "── quick css changed ──".yellow());
        println!("{css}");
    });
    quick_css.attach()?;
    watcher.init()?;

    println!("{} {}", "Watching".bold(), quick_css.path()?.display());
    wait_for_ctrl_c().await?;
    quick_css.detach();
    Ok(())
}
