//! Backup scheduling
//!
//! The `Orchestrator` is the single owner of the configuration and of the
//! single-flight guarantee: manual requests and timer fires both go through
//! it, and at most one backup cycle runs at any instant.
//!
//! ```text
//!   run_backup_now() ──┐
//!                      ├──> [Idle] ──claim──> [BackupRunning] ──done──> [Idle]
//!   timer fire ────────┘        ^                   │
//!                               └── AlreadyRunning ─┘
//! ```

pub mod orchestrator;
pub mod timer;

pub use orchestrator::{BackupOutcome, BackupReport, ConfigUpdate, Orchestrator, Schedule, Trigger};
