//! Status display formatting
//!
//! Renders the configuration summary and integrity results for terminal
//! output.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::backup::ArchiveStatus;
use crate::config::BackupConfig;

/// Format the configuration as a status report, relative to `today`
pub fn format_status(config: &BackupConfig, today: NaiveDate) -> String {
    let mut output = String::new();

    let last_backup = match config.last_backup() {
        Some(date) => {
            let days = today.signed_duration_since(date).num_days();
            format!("{} ({})", date.format("%Y-%m-%d"), format_days_ago(days))
        }
        None => "Never".to_string(),
    };
    output.push_str(&format!("Last backup:       {}\n", last_backup));

    output.push_str(&format!(
        "Destination:       {}\n",
        config
            .dest_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Not set".to_string())
    ));

    output.push_str(&format!(
        "Automatic backups: {}\n",
        match config.freq_days() {
            0 => "Disabled".to_string(),
            n => format!("Every {} day(s)", n),
        }
    ));

    output.push_str(&format!(
        "Keep backups:      {}\n",
        match config.keep_days() {
            0 => "Forever".to_string(),
            n => format!("{} day(s)", n),
        }
    ));

    output.push_str("\nDirectories to back up:\n");
    if config.dirs_to_backup().is_empty() {
        output.push_str("  (None configured)\n");
    } else {
        for dir in config.dirs_to_backup() {
            output.push_str(&format!("  - {}\n", dir.display()));
        }
    }

    output
}

/// Format integrity results, one archive per line
pub fn format_integrity(results: &BTreeMap<PathBuf, ArchiveStatus>) -> String {
    if results.is_empty() {
        return "No backups found.\n".to_string();
    }

    let name_width = results
        .keys()
        .map(|p| file_name(p).len())
        .max()
        .unwrap_or(7)
        .max(7);

    let mut output = String::new();
    for (archive, status) in results {
        let line = match status {
            ArchiveStatus::Valid => "ok".to_string(),
            ArchiveStatus::Mismatch { expected, actual } => {
                format!("INVALID! checksum {} != recorded {}", actual, expected)
            }
            ArchiveStatus::Unreadable { reason } => format!("INVALID! {}", reason),
        };
        output.push_str(&format!(
            "  {:<name_width$}  {}\n",
            file_name(archive),
            line,
            name_width = name_width,
        ));
    }

    let invalid = results.values().filter(|s| !s.is_valid()).count();
    output.push_str(&format!(
        "\n{} archive(s), {} invalid\n",
        results.len(),
        invalid
    ));

    output
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_days_ago(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "1 day ago".to_string(),
        n => format!("{} days ago", n),
    }
}
