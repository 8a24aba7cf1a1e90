//! Backup orchestrator
//!
//! Owns the current configuration and the "backup in progress" flag, runs
//! manual backups on demand and keeps the recurring timer in line with the
//! configured frequency. Both live behind one mutex; a backup cycle holds the
//! flag through a guard that travels into the blocking worker, so the flag
//! is cleared exactly when the work ends.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use chrono::Local;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use super::timer::{self, TimerHandle};
use crate::backup::retention::{self, PruneReport};
use crate::backup::snapshot::{self, SnapshotReport};
use crate::backup::ArchiveStatus;
use crate::config::{BackupConfig, ConfigStore};
use crate::error::{DumbackError, DumbackResult};

/// Whether the orchestrator may arm the recurring timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Arm the timer whenever `freq_days > 0`
    Enabled,
    /// Never run automatic backups (one-shot commands)
    Disabled,
}

/// What started a backup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Automatic,
}

/// Result of a successful backup cycle
#[derive(Debug)]
pub struct BackupReport {
    pub snapshot: SnapshotReport,
    /// Present when retention ran (`keep_days > 0`)
    pub prune: Option<PruneReport>,
    /// Set when the updated `last_backup` could not be persisted
    pub save_error: Option<DumbackError>,
}

/// Outcome of a backup request
#[derive(Debug)]
pub enum BackupOutcome {
    Completed(BackupReport),
    AlreadyRunning,
    Failed(DumbackError),
}

impl BackupOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Outcome of an accepted configuration update
#[derive(Debug)]
pub enum ConfigUpdate {
    Saved,
    /// Applied in memory, but the store refused it
    NotSaved(DumbackError),
}

struct State {
    config: BackupConfig,
    running: bool,
    closed: bool,
    timer: Option<TimerHandle>,
}

struct Inner {
    store: Box<dyn ConfigStore>,
    state: Mutex<State>,
    /// Signalled whenever a backup cycle ends
    idle: Notify,
    runtime: Handle,
    schedule: Schedule,
}

/// Clears the in-progress flag when dropped
struct RunGuard {
    inner: Arc<Inner>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.inner.state.lock().running = false;
        self.inner.idle.notify_waiters();
    }
}

/// Single-flight backup coordinator
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Create an orchestrator from the stored configuration
    ///
    /// Must be called from within a tokio runtime. With `Schedule::Enabled`
    /// the timer is armed immediately according to the loaded configuration.
    pub fn new(store: impl ConfigStore + 'static, schedule: Schedule) -> DumbackResult<Self> {
        let config = store.load()?;
        let runtime = Handle::try_current().map_err(|e| DumbackError::Worker(e.to_string()))?;

        debug!(?config, ?schedule, "Starting orchestrator");

        let inner = Arc::new(Inner {
            store: Box::new(store),
            state: Mutex::new(State {
                config,
                running: false,
                closed: false,
                timer: None,
            }),
            idle: Notify::new(),
            runtime,
            schedule,
        });

        {
            let mut state = inner.state.lock();
            inner.rearm(&mut state);
        }

        Ok(Self { inner })
    }

    /// Snapshot of the current configuration
    pub fn current_config(&self) -> BackupConfig {
        self.inner.state.lock().config.clone()
    }

    /// Whether a backup is running right now
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// Whether an automatic backup timer is armed
    pub fn is_timer_armed(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }

    /// Replace the configuration
    ///
    /// Rejected while a backup runs or after shutdown. On success the timer
    /// is re-armed (or disarmed when `freq_days == 0`) and the new snapshot
    /// is persisted; a persistence failure does not undo the update.
    pub fn update_config(&self, config: BackupConfig) -> DumbackResult<ConfigUpdate> {
        let mut state = self.inner.state.lock();

        if state.closed {
            return Err(DumbackError::ShuttingDown);
        }
        if state.running {
            return Err(DumbackError::BackupInProgress);
        }

        debug!(from = ?state.config, to = ?config, "Updating config");
        state.config = config;
        self.inner.rearm(&mut state);

        Ok(match self.inner.persist(&state.config) {
            Ok(()) => ConfigUpdate::Saved,
            Err(e) => ConfigUpdate::NotSaved(e),
        })
    }

    /// Run a backup now unless one is already in progress
    pub async fn run_backup_now(&self) -> BackupOutcome {
        self.run_backup(Trigger::Manual).await
    }

    /// Verify every archive in the configured destination
    ///
    /// `None` when no destination is configured or it does not exist.
    pub async fn verify_archives(&self) -> Option<BTreeMap<PathBuf, ArchiveStatus>> {
        let dest = self.current_config().dest_path()?.to_path_buf();

        match self
            .inner
            .runtime
            .spawn_blocking(move || snapshot::verify_all(&dest))
            .await
        {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "Verification worker failed");
                None
            }
        }
    }

    /// Stop accepting work, cancel the timer and wait for any in-flight run
    pub async fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock();
            state.closed = true;
            if state.timer.take().is_some() {
                debug!("Automatic backup timer cancelled");
            }
        }

        loop {
            let notified = self.inner.idle.notified();
            let running = self.inner.state.lock().running;
            if !running {
                break;
            }
            info!("Waiting for the running backup to finish");
            notified.await;
        }

        info!("Backup agent stopped");
    }

    async fn run_backup(&self, trigger: Trigger) -> BackupOutcome {
        let (guard, config) = match self.inner.begin_run() {
            Ok(started) => started,
            Err(DumbackError::BackupInProgress) => {
                match trigger {
                    Trigger::Manual => info!("Backup already in progress"),
                    Trigger::Automatic => debug!("Automatic backup skipped, one is already running"),
                }
                return BackupOutcome::AlreadyRunning;
            }
            Err(e) => return BackupOutcome::Failed(e),
        };

        let inner = Arc::clone(&self.inner);
        match self
            .inner
            .runtime
            .spawn_blocking(move || inner.backup_cycle(guard, config, trigger))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Backup worker failed");
                BackupOutcome::Failed(DumbackError::Worker(e.to_string()))
            }
        }
    }
}

impl Inner {
    /// Atomically claim the single-flight slot
    fn begin_run(self: &Arc<Self>) -> DumbackResult<(RunGuard, BackupConfig)> {
        let mut state = self.state.lock();

        if state.closed {
            return Err(DumbackError::ShuttingDown);
        }
        if state.running {
            return Err(DumbackError::BackupInProgress);
        }

        state.running = true;
        let guard = RunGuard {
            inner: Arc::clone(self),
        };
        Ok((guard, state.config.clone()))
    }

    /// Archive, seal, record and prune; runs on a blocking worker
    fn backup_cycle(&self, _guard: RunGuard, config: BackupConfig, trigger: Trigger) -> BackupOutcome {
        let Some(dest) = config.dest_path().map(|p| p.to_path_buf()) else {
            warn!("Backup requested without a destination directory");
            return BackupOutcome::Failed(DumbackError::NotConfigured("destination directory"));
        };

        info!(?trigger, dest = %dest.display(), "Backup started");

        let snapshot = match snapshot::run_backup(&dest, config.dirs_to_backup()) {
            Ok(report) => report,
            Err(e) => {
                error!(?trigger, error = %e, "Backup failed");
                return BackupOutcome::Failed(e);
            }
        };

        let today = Local::now().date_naive();
        let (save_error, keep_days) = {
            let mut state = self.state.lock();
            state.config = state.config.with_last_backup(today);
            (self.persist(&state.config).err(), state.config.keep_days())
        };

        let prune = (keep_days > 0).then(|| retention::prune(&dest, keep_days));

        info!(?trigger, archive = %snapshot.archive.display(), "Backup finished");

        BackupOutcome::Completed(BackupReport {
            snapshot,
            prune,
            save_error,
        })
    }

    fn persist(&self, config: &BackupConfig) -> DumbackResult<()> {
        self.store.save(config).map_err(|e| {
            error!(error = %e, "Failed to save configuration");
            e
        })
    }

    /// Cancel any pending timer and arm a new one if the configuration asks for it
    fn rearm(self: &Arc<Self>, state: &mut State) {
        state.timer = None;

        let freq_days = state.config.freq_days();
        if self.schedule == Schedule::Disabled || state.closed || freq_days == 0 {
            return;
        }

        let today = Local::now().date_naive();
        let first = timer::first_fire_delay(freq_days, state.config.last_backup(), today);
        let period = timer::period(freq_days);

        info!(
            freq_days,
            first_in_secs = first.as_secs(),
            "Automatic backups enabled"
        );

        let weak: Weak<Inner> = Arc::downgrade(self);
        state.timer = Some(timer::spawn_recurring(
            &self.runtime,
            first,
            period,
            move || {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(inner) => {
                            Orchestrator { inner }.run_backup(Trigger::Automatic).await;
                            ControlFlow::Continue(())
                        }
                        None => ControlFlow::Break(()),
                    }
                }
            },
        ));
    }
}
