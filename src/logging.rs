//! Diagnostic logging setup
//!
//! Library code logs through `tracing`. The binary installs a subscriber that
//! appends plain-text lines to `dumback.log` and echoes warnings and errors
//! to stderr. The log file is trimmed at startup once it grows past 2 MiB.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::paths::AppPaths;
use crate::error::{DumbackError, DumbackResult};

/// First line of every log file
pub const LOG_HEADER: &str = "# dumback log\n";

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV_VAR: &str = "DUMBACK_LOG";

const TRUNCATION_SIZE: u64 = 2 * 1024 * 1024;

/// Install the global subscriber
///
/// `verbose` lowers the default level to debug and echoes it to stderr too.
pub fn init(paths: &AppPaths, verbose: bool) -> DumbackResult<()> {
    paths.ensure_directories()?;

    let log_path = paths.log_file();
    prepare_log_file(&log_path)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| DumbackError::at_path(&log_path, e))?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_level);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| DumbackError::Config(format!("Failed to initialize logging: {}", e)))
}

/// Create the log file with its header, or trim it when it got too large
pub fn prepare_log_file(path: &Path) -> DumbackResult<()> {
    if !path.exists() {
        return fs::write(path, LOG_HEADER).map_err(|e| DumbackError::at_path(path, e));
    }

    let size = fs::metadata(path)
        .map_err(|e| DumbackError::at_path(path, e))?
        .len();

    if size > TRUNCATION_SIZE {
        truncate_log(path, TRUNCATION_SIZE / 2)?;
    }

    Ok(())
}

/// Keep roughly the last `keep` bytes of the log, starting at a line boundary
fn truncate_log(path: &Path, keep: u64) -> DumbackResult<()> {
    let content = fs::read(path).map_err(|e| DumbackError::at_path(path, e))?;

    let keep = (keep as usize).min(content.len());
    let cut = content.len() - keep;
    let start = content
        .get(..=cut)
        .and_then(|head| head.iter().rposition(|&b| b == b'\n'))
        .map_or(0, |newline| newline + 1);

    let mut trimmed = LOG_HEADER.as_bytes().to_vec();
    trimmed.extend_from_slice(&content[start..]);

    fs::write(path, trimmed).map_err(|e| DumbackError::at_path(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_log_gets_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dumback.log");

        prepare_log_file(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), LOG_HEADER);
    }

    #[test]
    fn test_small_log_is_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dumback.log");
        fs::write(&path, "# dumback log\nline one\n").unwrap();

        prepare_log_file(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# dumback log\nline one\n"
        );
    }

    #[test]
    fn test_truncate_keeps_whole_trailing_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dumback.log");
        fs::write(&path, "aaaa\nbbbb\ncccc\n").unwrap();

        truncate_log(&path, 7).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            format!("{}bbbb\ncccc\n", LOG_HEADER)
        );
    }

    #[test]
    fn test_large_log_is_trimmed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dumback.log");
        let line = "x".repeat(99) + "\n";
        let content = line.repeat(30_000);
        fs::write(&path, &content).unwrap();

        prepare_log_file(&path).unwrap();

        let trimmed = fs::read_to_string(&path).unwrap();
        assert!(trimmed.starts_with(LOG_HEADER));
        assert!(trimmed.len() as u64 <= TRUNCATION_SIZE / 2 + 200);
        assert!(trimmed[LOG_HEADER.len()..].starts_with(&line));
    }
}
