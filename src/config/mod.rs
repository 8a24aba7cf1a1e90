//! Configuration module for dumback
//!
//! This module provides configuration management including:
//! - Application directory resolution
//! - The validated backup configuration snapshot
//! - Settings persistence behind the `ConfigStore` trait

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{BackupConfig, ConfigStore, JsonConfigStore};
