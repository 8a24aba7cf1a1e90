//! Snapshot engine
//!
//! Composes the archive writer and the checksum verifier into the
//! `run_backup` / `verify_all` pair over one destination directory.
//! Retention is left to the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{error, info};

use super::archive::{self, ArchiveSummary};
use super::checksum::{self, ArchiveStatus};
use super::naming::{list_archives, sidecar_path};
use crate::error::DumbackResult;

/// A sealed archive produced by `run_backup`
#[derive(Debug, Clone)]
pub struct SnapshotReport {
    pub archive: PathBuf,
    pub sidecar: PathBuf,
    pub digest: String,
    pub entries: Vec<String>,
    /// Links left out of the archive
    pub skipped: Vec<(PathBuf, String)>,
}

/// Write and seal one full snapshot of `sources` into `dest`
pub fn run_backup(dest: &Path, sources: &[PathBuf]) -> DumbackResult<SnapshotReport> {
    let summary = archive::create(dest, sources)?;
    seal_summary(summary)
}

/// Like `run_backup`, with an explicit archive timestamp
pub fn run_backup_at(
    dest: &Path,
    sources: &[PathBuf],
    timestamp: NaiveDateTime,
) -> DumbackResult<SnapshotReport> {
    let summary = archive::create_at(dest, sources, timestamp)?;
    seal_summary(summary)
}

fn seal_summary(summary: ArchiveSummary) -> DumbackResult<SnapshotReport> {
    let digest = checksum::seal(&summary.path)?;
    let sidecar = sidecar_path(&summary.path);

    info!(
        archive = %summary.path.display(),
        entries = summary.entries.len(),
        "The archive and checksum have been created"
    );

    Ok(SnapshotReport {
        archive: summary.path,
        sidecar,
        digest,
        entries: summary.entries,
        skipped: summary.skipped,
    })
}

/// Verify every archive in `dest` against its sidecar
///
/// Returns `None` when `dest` does not exist or cannot be listed, which is
/// not the same as an empty map of zero archives.
pub fn verify_all(dest: &Path) -> Option<BTreeMap<PathBuf, ArchiveStatus>> {
    if !dest.exists() {
        return None;
    }

    let archives = match list_archives(dest) {
        Ok(archives) => archives,
        Err(e) => {
            error!(dest = %dest.display(), error = %e, "Failed to access destination");
            return None;
        }
    };

    let results = archives
        .into_iter()
        .map(|archive| {
            let status = checksum::verify(&archive, &sidecar_path(&archive));
            (archive, status)
        })
        .collect();

    Some(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ts(day: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn sources(root: &Path) -> Vec<PathBuf> {
        let a = root.join("A");
        let b = root.join("B");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(b.join("sub")).unwrap();
        fs::write(a.join("a.txt"), b"alpha").unwrap();
        fs::write(b.join("sub").join("b.txt"), b"beta").unwrap();
        vec![a, b]
    }

    #[test]
    fn test_run_backup_end_to_end() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");

        let report = run_backup(&dest, &sources(temp.path())).unwrap();

        let mut listing: Vec<_> = fs::read_dir(&dest)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        listing.sort();
        assert_eq!(listing, vec![report.sidecar.clone(), report.archive.clone()]);
        assert_eq!(report.entries, vec!["A/a.txt", "B/sub/b.txt"]);
        assert!(checksum::check(&report.archive, &report.sidecar).unwrap());
    }

    #[test]
    fn test_verify_all_missing_destination() {
        let temp = TempDir::new().unwrap();
        assert!(verify_all(&temp.path().join("absent")).is_none());
    }

    #[test]
    fn test_verify_all_empty_destination() {
        let temp = TempDir::new().unwrap();
        let results = verify_all(temp.path()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_sidecar_does_not_affect_others() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        let srcs = sources(temp.path());

        let good = run_backup_at(&dest, &srcs, ts(1)).unwrap();
        let orphan = run_backup_at(&dest, &srcs, ts(2)).unwrap();
        fs::remove_file(&orphan.sidecar).unwrap();

        let results = verify_all(&dest).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[&good.archive].is_valid());
        assert!(matches!(
            results[&orphan.archive],
            ArchiveStatus::Unreadable { .. }
        ));
    }

    #[test]
    fn test_corrupted_archive_reported_as_mismatch() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("dest");
        let report = run_backup_at(&dest, &sources(temp.path()), ts(3)).unwrap();

        let mut bytes = fs::read(&report.archive).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&report.archive, bytes).unwrap();

        let results = verify_all(&dest).unwrap();
        assert!(matches!(
            results[&report.archive],
            ArchiveStatus::Mismatch { .. }
        ));
    }
}
