//! Archive naming for the destination directory
//!
//! Archives are named `dumback_YYYYMMDD_HHMMSS.zip` and their checksum
//! sidecars share the base name with an `.md5` extension.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

pub const ARCHIVE_PREFIX: &str = "dumback_";
pub const ARCHIVE_EXTENSION: &str = "zip";
pub const SIDECAR_EXTENSION: &str = "md5";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File name of the archive created at `timestamp`
pub fn archive_file_name(timestamp: NaiveDateTime) -> String {
    format!(
        "{}{}.{}",
        ARCHIVE_PREFIX,
        timestamp.format(TIMESTAMP_FORMAT),
        ARCHIVE_EXTENSION
    )
}

/// Whether `name` looks like an archive container
pub fn is_archive_name(name: &str) -> bool {
    name.starts_with(ARCHIVE_PREFIX) && name.ends_with(&format!(".{}", ARCHIVE_EXTENSION))
}

/// Path of the checksum sidecar paired with `archive`
pub fn sidecar_path(archive: &Path) -> PathBuf {
    archive.with_extension(SIDECAR_EXTENSION)
}

/// Parse the calendar date embedded in an archive file name
///
/// The date is the 8-digit segment between the prefix and the next `_`.
/// Time of day is ignored.
pub fn parse_archive_date(name: &str) -> Result<NaiveDate, String> {
    let rest = name
        .strip_prefix(ARCHIVE_PREFIX)
        .ok_or_else(|| format!("missing '{}' prefix", ARCHIVE_PREFIX))?;

    let date_part = match rest.find('_') {
        Some(end) => &rest[..end],
        None => return Err("no date segment".to_string()),
    };

    if date_part.len() != 8 || !date_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not a YYYYMMDD date", date_part));
    }

    let year: i32 = date_part[0..4].parse().map_err(|_| date_part.to_string())?;
    let month: u32 = date_part[4..6].parse().map_err(|_| date_part.to_string())?;
    let day: u32 = date_part[6..8].parse().map_err(|_| date_part.to_string())?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("'{}' is not a valid calendar date", date_part))
}

/// List archive containers directly inside `dest`, sorted by name
///
/// Names embed a sortable timestamp, so this is oldest first. Entries that
/// cannot be inspected are logged and left out; only failing to read `dest`
/// itself is an error.
pub fn list_archives(dest: &Path) -> io::Result<Vec<PathBuf>> {
    let mut archives = Vec::new();

    for entry in fs::read_dir(dest)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dest = %dest.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        let name = entry.file_name();
        if !name.to_str().is_some_and(is_archive_name) {
            continue;
        }

        match entry.file_type() {
            Ok(file_type) if file_type.is_file() => archives.push(entry.path()),
            Ok(_) => {}
            Err(e) => {
                warn!(entry = %entry.path().display(), error = %e, "Skipping unreadable entry");
            }
        }
    }

    archives.sort();
    Ok(archives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_archive_file_name() {
        let ts = NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap();
        assert_eq!(archive_file_name(ts), "dumback_20250307_090501.zip");
    }

    #[test]
    fn test_is_archive_name() {
        assert!(is_archive_name("dumback_20250307_090501.zip"));
        assert!(!is_archive_name("dumback_20250307_090501.md5"));
        assert!(!is_archive_name("notes_20250307_090501.zip"));
    }

    #[test]
    fn test_sidecar_path() {
        let archive = Path::new("/dest/dumback_20250307_090501.zip");
        assert_eq!(
            sidecar_path(archive),
            PathBuf::from("/dest/dumback_20250307_090501.md5")
        );
    }

    #[test]
    fn test_parse_archive_date() {
        let date = parse_archive_date("dumback_20251127_143022.zip").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 11, 27).unwrap());
    }

    #[test]
    fn test_parse_archive_date_errors() {
        assert!(parse_archive_date("dumback_20251127.zip").is_err());
        assert!(parse_archive_date("dumback_2025112_143022.zip").is_err());
        assert!(parse_archive_date("dumback_20251340_143022.zip").is_err());
        assert!(parse_archive_date("dumback_2025ab27_143022.zip").is_err());
    }

    #[test]
    fn test_list_archives_filters_and_sorts() {
        let temp = TempDir::new().unwrap();
        for name in [
            "dumback_20250102_000000.zip",
            "dumback_20250101_000000.zip",
            "dumback_20250101_000000.md5",
            "unrelated.txt",
        ] {
            fs::write(temp.path().join(name), b"x").unwrap();
        }
        fs::create_dir(temp.path().join("dumback_20250103_000000.zip")).unwrap();

        let archives = list_archives(temp.path()).unwrap();
        let names: Vec<_> = archives
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["dumback_20250101_000000.zip", "dumback_20250102_000000.zip"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_list_archives_passes_over_links() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("dumback_20250101_000000.zip"), b"x").unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("missing.zip"),
            temp.path().join("dumback_20250102_000000.zip"),
        )
        .unwrap();

        let archives = list_archives(temp.path()).unwrap();

        assert_eq!(
            archives,
            vec![temp.path().join("dumback_20250101_000000.zip")]
        );
    }
}
