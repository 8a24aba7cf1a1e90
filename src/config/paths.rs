//! Path management for dumback
//!
//! Resolves the application directory holding the settings file and the log.
//!
//! ## Path Resolution Order
//!
//! 1. `DUMBACK_DATA_DIR` environment variable (if set)
//! 2. `~/.dumback` in the user's home directory

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::DumbackError;

/// Name of the application directory inside the home directory
const APP_DIRNAME: &str = ".dumback";

/// Manages all paths used by dumback
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Base directory for all dumback state
    base_dir: PathBuf,
}

impl AppPaths {
    /// Create a new AppPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, DumbackError> {
        let base_dir = if let Ok(custom) = std::env::var("DUMBACK_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create AppPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.dumback/ or the override)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("dumback.json")
    }

    /// Get the path to the diagnostic log
    pub fn log_file(&self) -> PathBuf {
        self.base_dir.join("dumback.log")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), DumbackError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| DumbackError::at_path(&self.base_dir, e))
    }
}

fn resolve_default_path() -> Result<PathBuf, DumbackError> {
    let dirs = BaseDirs::new()
        .ok_or_else(|| DumbackError::Config("Could not determine home directory".into()))?;
    Ok(dirs.home_dir().join(APP_DIRNAME))
}
