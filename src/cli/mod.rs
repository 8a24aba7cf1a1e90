//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the orchestrator.

pub mod backup;
pub mod config;
pub mod daemon;

pub use backup::{handle_backup_command, handle_status_command, handle_verify_command};
pub use config::{handle_config_command, ConfigCommands};
pub use daemon::handle_daemon_command;
