//! Extendify CLI - extendify command

use anyhow::Result;
use clap::{Parser, Subcommand};
use extendify_core::Paths;
use std::path::PathBuf;
use tracing::debug;

mod cmd;
mod logging;
mod system_config;

/// Extendify - native companion for themes, quick CSS and settings
#[derive(Parser)]
#[command(name = "extendify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config directory (default: $EXTENDIFY_HOME or <config dir>/extendify)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print file system changes until Ctrl-C
    Watch {
        /// Files to watch exactly
        files: Vec<PathBuf>,
        /// Directories to watch recursively
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,
    },
    /// Manage the quick CSS stylesheet
    #[command(subcommand)]
    QuickCss(QuickCssCommands),
    /// Inspect user themes
    #[command(subcommand)]
    Themes(ThemesCommands),
    /// Read or replace settings (config.json)
    #[command(subcommand)]
    Settings(SettingsCommands),
    /// View and edit native configuration (native.toml)
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum QuickCssCommands {
    /// Print the stylesheet
    Get,
    /// Replace the stylesheet
    Set {
        /// New contents, or - to read stdin
        css: String,
    },
    /// Print the stylesheet's path
    Path,
    /// Print the stylesheet whenever it changes
    Watch,
}

#[derive(Subcommand)]
enum ThemesCommands {
    /// List installed themes
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the theme list whenever it changes
    Watch,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print settings as JSON
    Get,
    /// Replace settings with a JSON object
    Set {
        json: String,
    },
    /// Print the settings directory
    Path,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Get a configuration value (e.g. watcher.buffer_size)
    Get {
        key: String,
    },
    /// Set a configuration value
    Set {
        key: String,
        value: String,
    },
    /// Show the config file path
    Path {
        /// Create the file with defaults if missing
        #[arg(long)]
        create: bool,
    },
    /// Print an example configuration
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match cli.home {
        Some(home) => Paths::new(home),
        None => Paths::from_env()?,
    };
    let config = system_config::load(&paths)?;
    let _guard = logging::init(&paths, &config.logging)?;
    debug!("Using config directory {}", paths.base_dir(false)?.display());

    let watcher_config = &config.watcher;
    match cli.command {
        Commands::Watch { files, dirs } => cmd::watch::run(&paths, watcher_config, files, dirs).await,
        Commands::QuickCss(command) => match command {
            QuickCssCommands::Get => cmd::quick_css::run_get(&paths, watcher_config).await,
            QuickCssCommands::Set { css } => {
                cmd::quick_css::run_set(&paths, watcher_config, &css).await
            }
            QuickCssCommands::Path => cmd::quick_css::run_path(&paths).await,
            QuickCssCommands::Watch => cmd::quick_css::run_watch(&paths, watcher_config).await,
        },
        Commands::Themes(command) => match command {
            ThemesCommands::List { json } => {
                cmd::themes::run_list(&paths, watcher_config, json).await
            }
            ThemesCommands::Watch => cmd::themes::run_watch(&paths, watcher_config).await,
        },
        Commands::Settings(command) => match command {
            SettingsCommands::Get => cmd::settings::run_get(&paths).await,
            SettingsCommands::Set { json } => cmd::settings::run_set(&paths, &json).await,
            SettingsCommands::Path => cmd::settings::run_path(&paths).await,
        },
        Commands::Config(command) => match command {
            ConfigCommands::List => cmd::config::run_list(&paths).await,
            ConfigCommands::Get { key } => cmd::config::run_get(&paths, &key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&paths, &key, &value).await,
            ConfigCommands::Path { create } => cmd::config::run_path(&paths, create).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
