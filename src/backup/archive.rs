//! Archive writer
//!
//! Streams every regular file under a list of source directories into one
//! zip container. Entry names are relative to each source's parent, so the
//! source directory's own name prefixes its entries (`docs/notes/a.txt`).

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Datelike, Local, NaiveDateTime, Timelike};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::naming::archive_file_name;
use crate::error::{DumbackError, DumbackResult};

/// Result of writing one archive
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// Full path of the finished container
    pub path: PathBuf,
    /// Entry names in the order they were written
    pub entries: Vec<String>,
    /// Links that were not archived, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

/// Create an archive of `sources` in `dest`, named after the current local time
pub fn create(dest: &Path, sources: &[PathBuf]) -> DumbackResult<ArchiveSummary> {
    create_at(dest, sources, Local::now().naive_local())
}

/// Create an archive of `sources` in `dest`, named after `timestamp`
///
/// An existing archive with the same name is never overwritten. On failure the
/// partially written container stays on disk. A directory listed more than
/// once is archived once; two different directories with the same name are
/// rejected before the container is created.
pub fn create_at(
    dest: &Path,
    sources: &[PathBuf],
    timestamp: NaiveDateTime,
) -> DumbackResult<ArchiveSummary> {
    let sources = distinct_sources(sources)?;
    ensure_destination(dest)?;

    let path = dest.join(archive_file_name(timestamp));
    info!(archive = %path.display(), sources = sources.len(), "Creating archive");

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| DumbackError::at_path(&path, e))?;

    let mut zip = ZipWriter::new(file);
    let mut summary = ArchiveSummary {
        path,
        entries: Vec::new(),
        skipped: Vec::new(),
    };

    for dir in sources {
        add_directory(&mut zip, dir, &mut summary).map_err(|e| DumbackError::archive(dir, e))?;
    }

    let file = zip
        .finish()
        .map_err(|e| DumbackError::at_path(&summary.path, e))?;
    file.sync_all()
        .map_err(|e| DumbackError::at_path(&summary.path, e))?;

    debug!(
        archive = %summary.path.display(),
        entries = summary.entries.len(),
        skipped = summary.skipped.len(),
        "Archive written"
    );

    Ok(summary)
}

/// First pair of distinct sources whose entries would share a prefix
///
/// Entries are named relative to each source's parent, so `/x/docs` and
/// `/y/docs` would both write `docs/...`.
pub fn find_name_clash(sources: &[PathBuf]) -> Option<(&Path, &Path)> {
    sources.iter().enumerate().find_map(|(i, dir)| {
        sources[..i]
            .iter()
            .find(|earlier| *earlier != dir && earlier.file_name() == dir.file_name())
            .map(|earlier| (earlier.as_path(), dir.as_path()))
    })
}

/// Sources in order, with repeats of the same directory dropped
fn distinct_sources(sources: &[PathBuf]) -> DumbackResult<Vec<&Path>> {
    if let Some((first, second)) = find_name_clash(sources) {
        return Err(DumbackError::archive(
            second,
            format!("has the same name as {}", first.display()),
        ));
    }

    let mut distinct: Vec<&Path> = Vec::with_capacity(sources.len());
    for dir in sources {
        if distinct.contains(&dir.as_path()) {
            warn!(dir = %dir.display(), "Directory listed more than once, archiving it once");
            continue;
        }
        distinct.push(dir);
    }

    Ok(distinct)
}

/// Create `dest` if missing and make sure it is a directory
fn ensure_destination(dest: &Path) -> DumbackResult<()> {
    if !dest.exists() {
        debug!(dest = %dest.display(), "Creating destination directory");
        fs::create_dir_all(dest).map_err(|e| DumbackError::at_path(dest, e))?;
    }

    if !dest.is_dir() {
        return Err(DumbackError::at_path(dest, "destination is not a directory"));
    }

    Ok(())
}

fn add_directory(
    zip: &mut ZipWriter<File>,
    dir: &Path,
    summary: &mut ArchiveSummary,
) -> Result<(), String> {
    debug!(dir = %dir.display(), "Zipping directory");
    let base = dir.parent().unwrap_or(dir);

    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| e.to_string())?;
        let path = entry.path();

        let metadata = if entry.file_type().is_symlink() {
            // Links to files are stored with the target's contents
            match fs::metadata(path) {
                Ok(target) if target.is_file() => target,
                Ok(_) => {
                    if entry.depth() > 0 {
                        warn!(link = %path.display(), "Not following link to a directory");
                        summary
                            .skipped
                            .push((path.to_path_buf(), "link to a directory".to_string()));
                    }
                    continue;
                }
                Err(e) => {
                    warn!(link = %path.display(), error = %e, "Skipping broken link");
                    summary
                        .skipped
                        .push((path.to_path_buf(), format!("broken link: {}", e)));
                    continue;
                }
            }
        } else if entry.file_type().is_file() {
            entry
                .metadata()
                .map_err(|e| format!("{}: {}", path.display(), e))?
        } else {
            continue;
        };

        if path == summary.path {
            debug!(archive = %path.display(), "Skipping the archive being written");
            continue;
        }

        let name = entry_name(base, path)?;
        debug!(entry = %name, "Adding file");

        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(metadata.len() >= u64::from(u32::MAX));
        if let Some(mtime) = metadata.modified().ok().and_then(zip_time) {
            options = options.last_modified_time(mtime);
        }

        zip.start_file(name.clone(), options)
            .map_err(|e| format!("{}: {}", name, e))?;

        let mut source = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        io::copy(&mut source, zip).map_err(|e| format!("{}: {}", path.display(), e))?;

        summary.entries.push(name);
    }

    Ok(())
}

/// `/`-separated name of `path` relative to `base`
fn entry_name(base: &Path, path: &Path) -> Result<String, String> {
    let relative = path
        .strip_prefix(base)
        .map_err(|_| format!("{} is outside {}", path.display(), base.display()))?;

    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return Err(format!("{} has no name inside the archive", path.display()));
    }

    Ok(parts.join("/"))
}

fn zip_time(modified: std::time::SystemTime) -> Option<zip::DateTime> {
    let local: DateTime<Local> = modified.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}
