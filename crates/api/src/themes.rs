//! User themes
//!
//! A theme is a `.css` file in the themes directory. Its metadata comes
//! from a leading doc block in the BetterDiscord style:
//!
//! ```css
//! /**
//!  * @name Midnight
//!  * @author someone
//!  * @description A dark theme
//!  *   spanning two lines
//!  */
//! ```

use crate::Result;
use extendify_core::{fs, Paths};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use watcher::{Backend, Event, NotifyBackend, WatchId, Watcher};

/// Metadata of one theme file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTheme {
    pub file_name: String,
    pub name: String,
    pub author: String,
    pub description: String,
    pub version: String,
    pub license: String,
    pub source: String,
    pub website: String,
    pub invite: String,
}

impl UserTheme {
    fn set(&mut self, field: &str, value: String) {
        if field.is_empty() {
            return;
        }
        if value.is_empty() {
            warn!("Attempting to set an empty value for field: {}", field);
        }

        let slot = match field {
            "name" => &mut self.name,
            "author" => &mut self.author,
            "description" => &mut self.description,
            "version" => &mut self.version,
            "license" => &mut self.license,
            "source" => &mut self.source,
            "website" => &mut self.website,
            "invite" => &mut self.invite,
            "fileName" => {
                warn!("Attempting to set the fileName of a UserTheme, this is not allowed");
                return;
            }
            other => {
                warn!("Unknown field in UserTheme: {}", other);
                return;
            }
        };
        *slot = value;
    }
}

/// Parse the meta block of `css`
///
/// Missing or malformed blocks are not errors; the theme is then named
/// after its file.
pub fn parse_meta(css: &str, file_name: &str) -> UserTheme {
    let mut theme = UserTheme::default();
    if css.is_empty() {
        warn!("making theme info for empty css with filename: {}", file_name);
    } else if let Some(block) = meta_block(css) {
        let mut field = String::new();
        let mut accum = String::new();

        for line in meta_lines(block) {
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix('@').filter(|r| !r.starts_with(' ')) {
                theme.set(&field, std::mem::take(&mut accum).trim().to_string());
                match rest.split_once(char::is_whitespace) {
                    Some((name, value)) => {
                        field = name.to_string();
                        accum = value.to_string();
                    }
                    None => field = rest.to_string(),
                }
            } else {
                let line = line.trim_start();
                let text = line.strip_prefix("\\@").map_or_else(
                    || line.to_string(),
                    |rest| format!("@{rest}"),
                );
                accum.push(' ');
                accum.push_str(&text.replace("\\n", "\n"));
            }
        }
        theme.set(&field, accum.trim().to_string());
    }

    theme.file_name = file_name.to_string();
    if theme.name.is_empty() {
        theme.name = file_name
            .strip_suffix(".css")
            .unwrap_or(file_name)
            .to_string();
    }
    theme
}

/// Text between the first `/**` and the following `*/`
fn meta_block(css: &str) -> Option<&str> {
    let (_, rest) = css.split_once("/**")?;
    rest.split_once("*/").map(|(block, _)| block)
}

/// Block lines with the leading ` * ` decoration removed
fn meta_lines(block: &str) -> impl Iterator<Item = &str> {
    block.split('\n').map(|line| {
        let line = line.trim_end_matches('\r').trim_start();
        let line = line.strip_prefix('*').unwrap_or(line);
        line.strip_prefix([' ', '\t']).unwrap_or(line).trim_end()
    })
}

/// Receives the full theme list after every change
pub type ThemesListener = Arc<dyn Fn(&[UserTheme]) + Send + Sync>;

pub struct Themes<B: Backend = NotifyBackend> {
    paths: Paths,
    watcher: Arc<Watcher<B>>,
    listeners: Arc<RwLock<Vec<ThemesListener>>>,
    watch: Mutex<Option<WatchId>>,
}

impl<B: Backend> Themes<B> {
    pub fn new(paths: Paths, watcher: Arc<Watcher<B>>) -> Self {
        Self {
            paths,
            watcher,
            listeners: Arc::new(RwLock::new(Vec::new())),
            watch: Mutex::new(None),
        }
    }

    pub fn dir(&self) -> Result<PathBuf> {
        Ok(self.paths.themes_dir(true)?)
    }

    /// Every `.css` theme, sorted by file name
    pub fn list(&self) -> Result<Vec<UserTheme>> {
        list_dir(&self.dir()?)
    }

    pub fn add_change_listener<F>(&self, listener: F)
    where
        F: Fn(&[UserTheme]) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write();
        listeners.push(Arc::new(listener));
        debug!("Added themes change listener, total listeners: {}", listeners.len());
    }

    /// Start watching the themes directory; repeated calls reuse the watch
    pub fn attach(&self) -> Result<WatchId> {
        let mut watch = self.watch.lock();
        if let Some(id) = *watch {
            return Ok(id);
        }

        let dir = self.dir()?;
        let listeners = self.listeners.clone();
        let scan_dir = dir.clone();
        let id = self.watcher.add_dir(&dir, move |event: Event| -> anyhow::Result<()> {
            // Old and new names of a rename both count
            if !is_theme_file(event.path()) {
                return Ok(());
            }
            debug!("Theme changed: {}", event);
            let themes = list_dir(&scan_dir)?;
            let current: Vec<ThemesListener> = listeners.read().clone();
            for listener in current {
                listener(&themes);
            }
            Ok(())
        })?;

        info!("Watching themes directory {}", dir.display());
        *watch = Some(id);
        Ok(id)
    }

    pub fn detach(&self) {
        if let Some(id) = self.watch.lock().take() {
            self.watcher.remove_file(id);
        }
    }
}

fn is_theme_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "css")
}

fn list_dir(dir: &Path) -> Result<Vec<UserTheme>> {
    let mut themes = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_theme_file(entry.path()) {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let css = fs::read_file(entry.path())?;
        themes.push(parse_meta(&css, &file_name));
    }
    Ok(themes)
}
