//! Host-facing quick CSS and theme APIs
//!
//! Both features keep their files under the Extendify config directory and
//! use the shared [`watcher::Watcher`] to push changes to listeners.

pub mod error;
pub mod quick_css;
pub mod themes;

pub use error::ApiError;
pub use quick_css::QuickCss;
pub use themes::{parse_meta, Themes, UserTheme};

/// Result alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
