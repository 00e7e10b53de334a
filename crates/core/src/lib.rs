//! Extendify config-directory layout and file helpers
//!
//! Everything the host keeps on disk lives under one base directory:
//! ```text
//! extendify/
//!   config.json     settings
//!   quickCss.css    user CSS applied on top of every theme
//!   native.toml     engine configuration
//!   themes/         user themes (*.css)
//!   logs/           native.log.*
//! ```

pub mod error;
pub mod fs;
pub mod paths;
pub mod settings;

pub use error::CoreError;
pub use paths::{ensure_dir, ensure_file, Paths};

/// Result alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
