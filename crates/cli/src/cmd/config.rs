//! Configuration management command
//!
//! Provides CLI interface to view and edit the native configuration.

use crate::system_config::{self, NativeConfig};
use anyhow::{Context, Result};
use extendify_core::Paths;
use owo_colors::OwoColorize;

/// List all configuration values
pub async fn run_list(paths: &Paths) -> Result<()> {
    let config = system_config::load(paths)?;
    let config_path = system_config::config_file_path(paths);

    println!("{}", "Native Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[logging]".yellow());
    println!("  {} = {}", "level".cyan(), config.logging.level);
    println!(
        "  {} = {} {}",
        "file".cyan(),
        config.logging.file,
        format!("({})", paths.log_dir(false)?.display()).dimmed()
    );

    println!("\n{}", "[watcher]".yellow());
    println!(
        "  {} = {} {}",
        "buffer_size".cyan(),
        config.watcher.buffer_size,
        format!("({} KiB)", config.watcher.buffer_size / 1024).dimmed()
    );
    println!(
        "  {} = {}",
        "release_idle_roots".cyan(),
        config.watcher.release_idle_roots
    );

    println!("\n{}", "Valid Ranges:".bold());
    println!("  logging.level: error, warn, info, debug, trace");
    println!("  watcher.buffer_size: 256-65,536");

    Ok(())
}

fn get_value(config: &NativeConfig, key: &str) -> Result<String> {
    let value = match key {
        "logging.level" => config.logging.level.clone(),
        "logging.file" => config.logging.file.to_string(),
        "watcher.buffer_size" => config.watcher.buffer_size.to_string(),
        "watcher.release_idle_roots" => config.watcher.release_idle_roots.to_string(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'extendify config list' to see available keys.",
            key
        ),
    };
    Ok(value)
}

fn set_value(config: &mut NativeConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "logging.level" => {
            config.logging.level = value.to_ascii_lowercase();
        }
        "logging.file" => {
            config.logging.file = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        "watcher.buffer_size" => {
            config.watcher.buffer_size = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
        }
        "watcher.release_idle_roots" => {
            config.watcher.release_idle_roots = value
                .parse()
                .context("Invalid value: must be 'true' or 'false'")?;
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'extendify config list' to see available keys.",
            key
        ),
    }
    Ok(())
}

/// Get a single configuration value
pub async fn run_get(paths: &Paths, key: &str) -> Result<()> {
    let config = system_config::load(paths)?;
    println!("{}", get_value(&config, key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(paths: &Paths, key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load(paths)?;
    set_value(&mut config, key, value)?;

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save(paths, &config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(paths: &Paths, create: bool) -> Result<()> {
    let config_path = system_config::config_file_path(paths);

    if create && !config_path.exists() {
        system_config::init_if_missing(paths)?;
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else {
        println!("{}", config_path.display());
        if !config_path.exists() {
            println!("{}", "File does not exist. Use --create to create it.".yellow());
        }
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    print!("{}", system_config::example_config());
    Ok(())
}
