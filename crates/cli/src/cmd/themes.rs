//! Theme commands

use super::{engine, wait_for_ctrl_c};
use anyhow::Result;
use extendify_api::{Themes, UserTheme};
use extendify_core::Paths;
use owo_colors::OwoColorize;
use watcher::WatcherConfig;

pub async fn run_list(paths: &Paths, config: &WatcherConfig, json: bool) -> Result<()> {
    let themes = Themes::new(paths.clone(), engine(paths, config)?);
    let list = themes.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    if list.is_empty() {
        println!("No themes in {}", themes.dir()?.display().dimmed());
        return Ok(());
    }
    print_themes(&list);
    Ok(())
}

/// Print the theme list every time the themes directory changes
pub async fn run_watch(paths: &Paths, config: &WatcherConfig) -> Result<()> {
    let watcher = engine(paths, config)?;
    let themes = Themes::new(paths.clone(), watcher.clone());
    themes.add_change_listener(|list| {
        println!("{}", "── themes changed ──".yellow());
        print_themes(list);
    });
    themes.attach()?;
    watcher.init()?;

    println!("{} {}", "Watching".bold(), themes.dir()?.display());
    wait_for_ctrl_c().await?;
    themes.detach();
    Ok(())
}

fn print_themes(list: &[UserTheme]) {
    for theme in list {
        let version = if theme.version.is_empty() {
            String::new()
        } else {
            format!(" v{}", theme.version)
        };
        println!("{}{} {}", theme.name.bold(), version, format!("({})", theme.file_name).dimmed());
        if !theme.author.is_empty() {
            println!("  {}: {}", "author".cyan(), theme.author);
        }
        if !theme.description.is_empty() {
            println!("  {}: {}", "description".cyan(), theme.description);
        }
    }
}
