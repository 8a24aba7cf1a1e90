//! Configuration CLI commands
//!
//! Shows and edits the backup settings. Edits go through the orchestrator so
//! validation and the in-progress check apply exactly as for any other
//! front end.

use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;

use crate::backup::archive::find_name_clash;
use crate::config::{AppPaths, BackupConfig};
use crate::display::status::format_status;
use crate::error::DumbackResult;
use crate::scheduler::{ConfigUpdate, Orchestrator};

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration and paths
    Show,

    /// Change backup settings
    Set {
        /// Destination directory for archives
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Days between automatic backups (0 disables them)
        #[arg(short, long, allow_negative_numbers = true)]
        freq: Option<i64>,

        /// Days to keep archives (0 keeps them forever)
        #[arg(short, long, allow_negative_numbers = true)]
        keep: Option<i64>,

        /// Directory to back up (repeatable)
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,

        /// Remove the configured directories before adding --dir ones
        #[arg(long)]
        clear_dirs: bool,
    },
}

/// Handle a config command
pub fn handle_config_command(
    orchestrator: &Orchestrator,
    paths: &AppPaths,
    cmd: ConfigCommands,
) -> DumbackResult<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("dumback Configuration");
            println!("=====================");
            println!("Config file: {}", paths.config_file().display());
            println!("Log file:    {}", paths.log_file().display());
            println!();
            print!(
                "{}",
                format_status(&orchestrator.current_config(), Local::now().date_naive())
            );
        }

        ConfigCommands::Set {
            dest,
            freq,
            keep,
            dirs,
            clear_dirs,
        } => {
            let current = orchestrator.current_config();
            let updated = apply_changes(&current, dest, freq, keep, dirs, clear_dirs)?;

            match orchestrator.update_config(updated.clone())? {
                ConfigUpdate::Saved => println!("Configuration saved."),
                ConfigUpdate::NotSaved(e) => {
                    eprintln!("Warning: configuration applied but not saved: {}", e)
                }
            }

            if let Some((first, second)) = find_name_clash(updated.dirs_to_backup()) {
                eprintln!(
                    "Warning: {} and {} have the same name; backups will fail until one is removed.",
                    first.display(),
                    second.display()
                );
            }

            if updated.auto_backup_enabled() {
                println!(
                    "Automatic backups enabled - 'dumback daemon' will run them every {} day(s).",
                    updated.freq_days()
                );
            }
        }
    }

    Ok(())
}

/// Build the new configuration from the current one and the requested edits
fn apply_changes(
    current: &BackupConfig,
    dest: Option<PathBuf>,
    freq: Option<i64>,
    keep: Option<i64>,
    dirs: Vec<PathBuf>,
    clear_dirs: bool,
) -> DumbackResult<BackupConfig> {
    let mut all_dirs = if clear_dirs {
        Vec::new()
    } else {
        current.dirs_to_backup().to_vec()
    };
    all_dirs.extend(dirs);

    BackupConfig::new(
        current.last_backup(),
        dest.or_else(|| current.dest_path().map(|p| p.to_path_buf())),
        freq.unwrap_or(i64::from(current.freq_days())),
        keep.unwrap_or(i64::from(current.keep_days())),
        all_dirs,
    )
}
