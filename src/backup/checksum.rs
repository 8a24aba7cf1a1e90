//! MD5 checksums for archive containers
//!
//! Each archive is sealed with a sidecar file in `md5sum` format:
//! `"<lowercase-hex>  <archive-file-name>\n"`. The digest guards against
//! accidental corruption only.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use md5::{Digest, Md5};
use serde::Serialize;
use tracing::{debug, warn};

use super::naming::sidecar_path;
use crate::error::{DumbackError, DumbackResult};

/// Integrity status of one archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArchiveStatus {
    /// Recomputed digest matches the sidecar
    Valid,
    /// The archive content no longer matches its recorded digest
    Mismatch { expected: String, actual: String },
    /// The archive or its sidecar could not be read
    Unreadable { reason: String },
}

impl ArchiveStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Computes the lowercase hex MD5 digest of a file, streaming its content
pub fn file_digest(path: &Path) -> DumbackResult<String> {
    let file = File::open(path).map_err(|e| DumbackError::at_path(path, e))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| DumbackError::at_path(path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Seal `archive` by writing its checksum sidecar
///
/// Returns the hex digest that was recorded.
pub fn seal(archive: &Path) -> DumbackResult<String> {
    let digest = file_digest(archive)?;
    let file_name = archive
        .file_name()
        .ok_or_else(|| DumbackError::at_path(archive, "archive path has no file name"))?
        .to_string_lossy();

    let sidecar = sidecar_path(archive);
    fs::write(&sidecar, format!("{}  {}\n", digest, file_name))
        .map_err(|e| DumbackError::at_path(&sidecar, e))?;

    debug!(archive = %archive.display(), digest = %digest, "Sealed archive");
    Ok(digest)
}

/// Read the expected digest recorded in `sidecar`
fn expected_digest(sidecar: &Path) -> DumbackResult<String> {
    let contents = fs::read_to_string(sidecar).map_err(|e| DumbackError::at_path(sidecar, e))?;

    contents
        .split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| DumbackError::at_path(sidecar, "checksum file is empty"))
}

/// Recompute the digest of `archive` and compare it with `sidecar`
pub fn check(archive: &Path, sidecar: &Path) -> DumbackResult<bool> {
    let expected = expected_digest(sidecar)?;
    let actual = file_digest(archive)?;
    Ok(expected == actual)
}

/// Verify `archive` against `sidecar`, folding every failure into the status
pub fn verify(archive: &Path, sidecar: &Path) -> ArchiveStatus {
    let expected = match expected_digest(sidecar) {
        Ok(expected) => expected,
        Err(e) => {
            warn!(archive = %archive.display(), error = %e, "Not a valid checksum");
            return ArchiveStatus::Unreadable {
                reason: e.to_string(),
            };
        }
    };

    let actual = match file_digest(archive) {
        Ok(actual) => actual,
        Err(e) => {
            warn!(archive = %archive.display(), error = %e, "Archive unreadable");
            return ArchiveStatus::Unreadable {
                reason: e.to_string(),
            };
        }
    };

    debug!(archive = %archive.display(), actual = %actual, expected = %expected, "md5sum");

    if expected == actual {
        ArchiveStatus::Valid
    } else {
        warn!(archive = %archive.display(), "Checksum mismatch");
        ArchiveStatus::Mismatch { expected, actual }
    }
}
