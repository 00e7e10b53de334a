//! Settings commands

use anyhow::{Context, Result};
use extendify_core::{settings, Paths};
use owo_colors::OwoColorize;

pub async fn run_get(paths: &Paths) -> Result<()> {
    let value = settings::load(paths)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub async fn run_set(paths: &Paths, json: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(json).context("Invalid settings JSON")?;
    settings::save(paths, &value)?;
    println!("{} Saved settings", "✓".green());
    Ok(())
}

pub async fn run_path(paths: &Paths) -> Result<()> {
    println!("{}", settings::settings_dir(paths)?.display());
    Ok(())
}
