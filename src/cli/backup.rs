//! Backup CLI commands
//!
//! Implements the `backup`, `verify` and `status` commands on top of the
//! orchestrator.

use chrono::Local;

use crate::display::status::{format_integrity, format_status};
use crate::error::{DumbackError, DumbackResult};
use crate::scheduler::{BackupOutcome, Orchestrator};

/// Run one backup now and print what happened
pub async fn handle_backup_command(orchestrator: &Orchestrator) -> DumbackResult<()> {
    println!("Starting backup...");

    let report = match orchestrator.run_backup_now().await {
        BackupOutcome::Completed(report) => report,
        BackupOutcome::AlreadyRunning => return Err(DumbackError::BackupInProgress),
        BackupOutcome::Failed(e) => return Err(e),
    };

    let snapshot = &report.snapshot;
    println!("Backup created: {}", snapshot.archive.display());
    println!("Files:          {}", snapshot.entries.len());
    println!("Size:           {}", format_size(file_size(&snapshot.archive)));
    println!("Checksum:       {}", snapshot.digest);
    for (path, reason) in &snapshot.skipped {
        eprintln!("Warning: not archived: {} ({})", path.display(), reason);
    }

    if let Some(prune) = &report.prune {
        if prune.deleted.is_empty() {
            println!("No old backups to prune.");
        } else {
            println!("Pruned {} old file(s):", prune.deleted.len());
            for path in &prune.deleted {
                println!("  - {}", path.display());
            }
        }
        for (path, reason) in prune.skipped.iter().chain(&prune.failures) {
            eprintln!("Warning: {}: {}", path.display(), reason);
        }
    }

    if let Some(e) = &report.save_error {
        eprintln!("Warning: backup recorded in memory only: {}", e);
    }

    Ok(())
}

/// Verify every archive in the destination
pub async fn handle_verify_command(orchestrator: &Orchestrator, json: bool) -> DumbackResult<()> {
    let Some(results) = orchestrator.verify_archives().await else {
        println!("Nothing to verify: destination is not configured or does not exist.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("Verifying existing backups...");
        print!("{}", format_integrity(&results));
    }

    Ok(())
}

/// Print configuration status and the integrity of existing backups
pub async fn handle_status_command(orchestrator: &Orchestrator) -> DumbackResult<()> {
    let config = orchestrator.current_config();
    let today = Local::now().date_naive();

    println!("Backup Status");
    println!("=============");
    print!("{}", format_status(&config, today));

    if let Some(results) = orchestrator.verify_archives().await {
        println!();
        println!("Integrity check:");
        print!("{}", format_integrity(&results));
    }

    Ok(())
}

fn file_size(path: &std::path::Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
