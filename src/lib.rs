//! dumback - simple personal backups
//!
//! This library provides the core of the dumback backup agent: it writes
//! timestamped full-snapshot zip archives of a set of directories, seals each
//! one with an MD5 sidecar, verifies them later, prunes archives that fell
//! out of the retention window and repeats all of this on a daily schedule.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and the validated configuration snapshot
//! - `error`: Custom error types
//! - `backup`: Archive writer, checksum verifier, retention sweeper and the
//!   snapshot engine composing them
//! - `scheduler`: Single-flight orchestrator and the recurring timer
//! - `logging`: Diagnostic log setup
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use dumback::config::{AppPaths, JsonConfigStore};
//! use dumback::scheduler::{Orchestrator, Schedule};
//!
//! let paths = AppPaths::new()?;
//! let orchestrator = Orchestrator::new(JsonConfigStore::new(paths), Schedule::Enabled)?;
//!
//! let outcome = orchestrator.run_backup_now().await;
//! orchestrator.shutdown().await;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod scheduler;

pub use error::{DumbackError, DumbackResult};
