//! Quick CSS: one user stylesheet applied on top of every theme

use crate::Result;
use extendify_core::{fs, Paths};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use watcher::{Backend, Event, NotifyBackend, WatchId, Watcher};

/// Receives the full stylesheet after every change
pub type CssListener = Arc<dyn Fn(&str) + Send + Sync>;

pub struct QuickCss<B: Backend = NotifyBackend> {
    paths: Paths,
    watcher: Arc<Watcher<B>>,
    listeners: Arc<RwLock<Vec<CssListener>>>,
    watch: Mutex<Option<WatchId>>,
}

impl<B: Backend> QuickCss<B> {
    pub fn new(paths: Paths, watcher: Arc<Watcher<B>>) -> Self {
        Self {
            paths,
            watcher,
            listeners: Arc::new(RwLock::new(Vec::new())),
            watch: Mutex::new(None),
        }
    }

    pub fn path(&self) -> Result<PathBuf> {
        Ok(self.paths.quick_css_file(false)?)
    }

    /// Current stylesheet, creating an empty one if needed
    pub fn get(&self) -> Result<String> {
        let path = self.paths.quick_css_file(true)?;
        Ok(fs::read_file(&path)?)
    }

    /// Replace the stylesheet
    ///
    /// Listeners hear about it through the file watch, not from here.
    pub fn set(&self, css: &str) -> Result<()> {
        let path = self.paths.quick_css_file(true)?;
        fs::write_file(&path, css)?;
        Ok(())
    }

    pub fn add_change_listener<F>(&self, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write();
        listeners.push(Arc::new(listener));
        debug!("Added quick css change listener, total listeners: {}", listeners.len());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Start watching the stylesheet; repeated calls reuse the watch
    pub fn attach(&self) -> Result<WatchId> {
        let mut watch = self.watch.lock();
        if let Some(id) = *watch {
            return Ok(id);
        }

        let path = self.paths.quick_css_file(true)?;
        let listeners = self.listeners.clone();
        let file = path.clone();
        let id = self.watcher.add_file(&path, move |event: Event| -> anyhow::Result<()> {
            debug!("Quick css changed: {}", event);
            let css = fs::read_file(&file)?;
            let current: Vec<CssListener> = listeners.read().clone();
            for listener in current {
                listener(&css);
            }
            Ok(())
        })?;

        info!("Watching quick css file {}", path.display());
        *watch = Some(id);
        Ok(id)
    }

    /// Stop watching; listeners are kept for a later [`QuickCss::attach`]
    pub fn detach(&self) {
        if let Some(id) = self.watch.lock().take() {
            self.watcher.remove_file(id);
        }
    }
}
