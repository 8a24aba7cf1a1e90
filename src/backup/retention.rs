//! Retention sweeper
//!
//! Deletes archive pairs whose embedded date is more than `keep_days`
//! calendar days before today. Classification of the whole directory
//! completes before anything is deleted, and every failure is isolated to
//! the file it concerns.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

use super::naming::{list_archives, parse_archive_date, sidecar_path};

/// What a prune pass did
#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    /// Files removed, containers and sidecars alike
    pub deleted: Vec<PathBuf>,
    /// Number of containers inside the retention window
    pub kept: usize,
    /// Containers whose name carried no usable date
    pub skipped: Vec<(PathBuf, String)>,
    /// Files that could not be listed or deleted
    pub failures: Vec<(PathBuf, String)>,
}

impl PruneReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failures.is_empty()
    }
}

/// Prune archives in `dest` older than `keep_days`, relative to today
///
/// `keep_days == 0` keeps everything.
pub fn prune(dest: &Path, keep_days: u32) -> PruneReport {
    prune_as_of(dest, keep_days, Local::now().date_naive())
}

/// Prune archives in `dest` older than `keep_days`, relative to `today`
pub fn prune_as_of(dest: &Path, keep_days: u32, today: NaiveDate) -> PruneReport {
    let mut report = PruneReport::default();

    if keep_days == 0 || !dest.is_dir() {
        return report;
    }

    debug!(dest = %dest.display(), keep_days, "Checking for old backups");

    let archives = match list_archives(dest) {
        Ok(archives) => archives,
        Err(e) => {
            error!(dest = %dest.display(), error = %e, "Failed to access destination");
            report.failures.push((dest.to_path_buf(), e.to_string()));
            return report;
        }
    };

    let mut to_delete = Vec::new();

    for archive in archives {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let date = match parse_archive_date(&name) {
            Ok(date) => date,
            Err(reason) => {
                warn!(archive = %name, reason = %reason, "Invalid backup timestamp");
                report.skipped.push((archive, reason));
                continue;
            }
        };

        let age = today.signed_duration_since(date).num_days();
        if age > i64::from(keep_days) {
            debug!(archive = %name, age_days = age, "Marked for deletion");
            let sidecar = sidecar_path(&archive);
            to_delete.push(archive);
            if sidecar.exists() {
                to_delete.push(sidecar);
            }
        } else {
            report.kept += 1;
        }
    }

    for file in to_delete {
        match fs::remove_file(&file) {
            Ok(()) => {
                debug!(file = %file.display(), "Deleted old file");
                report.deleted.push(file);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                error!(file = %file.display(), error = %e, "Failed to delete");
                report.failures.push((file, e.to_string()));
            }
        }
    }

    if !report.deleted.is_empty() {
        info!(
            dest = %dest.display(),
            deleted = report.deleted.len(),
            kept = report.kept,
            "Pruned old backups"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    /// Create an archive pair dated `days_ago` before `today()`
    fn make_pair(dest: &Path, days_ago: i64) -> PathBuf {
        let date = today() - Duration::days(days_ago);
        let archive = dest.join(format!("dumback_{}_120000.zip", date.format("%Y%m%d")));
        fs::write(&archive, b"zip").unwrap();
        fs::write(sidecar_path(&archive), b"sum  name\n").unwrap();
        archive
    }

    #[test]
    fn test_prunes_only_outside_window() {
        let temp = TempDir::new().unwrap();
        let old = make_pair(temp.path(), 40);
        let recent = make_pair(temp.path(), 20);
        let newest = make_pair(temp.path(), 5);

        let report = prune_as_of(temp.path(), 30, today());

        assert!(!old.exists());
        assert!(!sidecar_path(&old).exists());
        assert!(recent.exists() && sidecar_path(&recent).exists());
        assert!(newest.exists() && sidecar_path(&newest).exists());
        assert_eq!(report.deleted.len(), 2);
        assert_eq!(report.kept, 2);
        assert!(report.is_clean());
    }

    #[test]
    fn test_retention_boundary() {
        let temp = TempDir::new().unwrap();
        let at_limit = make_pair(temp.path(), 7);
        let past_limit = make_pair(temp.path(), 8);

        prune_as_of(temp.path(), 7, today());

        assert!(at_limit.exists());
        assert!(!past_limit.exists());
    }

    #[test]
    fn test_second_prune_deletes_nothing() {
        let temp = TempDir::new().unwrap();
        make_pair(temp.path(), 100);
        make_pair(temp.path(), 1);

        let first = prune_as_of(temp.path(), 10, today());
        let second = prune_as_of(temp.path(), 10, today());

        assert_eq!(first.deleted.len(), 2);
        assert!(second.deleted.is_empty());
        assert_eq!(second.kept, 1);
    }

    #[test]
    fn test_keep_zero_is_noop() {
        let temp = TempDir::new().unwrap();
        let ancient = make_pair(temp.path(), 5000);

        let report = prune_as_of(temp.path(), 0, today());

        assert!(ancient.exists());
        assert!(report.deleted.is_empty());
    }

    #[test]
    fn test_future_dates_are_kept() {
        let temp = TempDir::new().unwrap();
        let future = make_pair(temp.path(), -3);

        prune_as_of(temp.path(), 1, today());
        assert!(future.exists());
    }

    #[test]
    fn test_bad_names_are_skipped() {
        let temp = TempDir::new().unwrap();
        let no_date = temp.path().join("dumback_latest.zip");
        let bad_date = temp.path().join("dumback_20251399_000000.zip");
        fs::write(&no_date, b"x").unwrap();
        fs::write(&bad_date, b"x").unwrap();
        let old = make_pair(temp.path(), 90);

        let report = prune_as_of(temp.path(), 30, today());

        assert!(no_date.exists());
        assert!(bad_date.exists());
        assert!(!old.exists());
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn test_missing_sidecar_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let old = make_pair(temp.path(), 90);
        fs::remove_file(sidecar_path(&old)).unwrap();

        let report = prune_as_of(temp.path(), 30, today());

        assert!(!old.exists());
        assert_eq!(report.deleted, vec![old]);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_failed_deletion_does_not_stop_others() {
        let temp = TempDir::new().unwrap();
        let stuck = make_pair(temp.path(), 60);
        let stuck_sidecar = sidecar_path(&stuck);
        fs::remove_file(&stuck_sidecar).unwrap();
        fs::create_dir_all(stuck_sidecar.join("inner")).unwrap();
        let other = make_pair(temp.path(), 50);

        let report = prune_as_of(temp.path(), 30, today());

        assert!(!stuck.exists());
        assert!(stuck_sidecar.exists());
        assert!(!other.exists());
        assert!(!sidecar_path(&other).exists());
        assert_eq!(report.deleted.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, stuck_sidecar);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_missing_destination_is_empty_report() {
        let temp = TempDir::new().unwrap();
        let report = prune_as_of(&temp.path().join("nope"), 30, today());
        assert!(report.deleted.is_empty());
        assert!(report.is_clean());
    }
}
