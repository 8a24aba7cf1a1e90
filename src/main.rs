use anyhow::Result;
use clap::{Parser, Subcommand};

use dumback::cli::{
    handle_backup_command, handle_config_command, handle_daemon_command, handle_status_command,
    handle_verify_command, ConfigCommands,
};
use dumback::config::{AppPaths, JsonConfigStore};
use dumback::logging;
use dumback::scheduler::{Orchestrator, Schedule};

#[derive(Parser)]
#[command(
    name = "dumback",
    version,
    about = "Simple personal backups",
    long_about = "dumback writes timestamped zip snapshots of your directories, \
                  seals each one with an MD5 checksum, verifies them on demand \
                  and deletes the ones older than your retention window."
)]
struct Cli {
    /// Log debug details to stderr and the log file
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Perform a backup now
    Backup,

    /// Verify the checksums of existing backups
    Verify {
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration and backup status
    Status,

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Run automatic backups until interrupted
    Daemon,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("dumback - simple backups");
        println!();
        println!("Run 'dumback --help' for usage information.");
        println!("Run 'dumback config set --dest <DIR> --dir <DIR>' to get started.");
        return Ok(());
    };

    let paths = AppPaths::new()?;
    logging::init(&paths, cli.verbose)?;

    // Only the daemon runs automatic backups
    let schedule = match command {
        Commands::Daemon => Schedule::Enabled,
        _ => Schedule::Disabled,
    };
    let orchestrator = Orchestrator::new(JsonConfigStore::new(paths.clone()), schedule)?;

    let result = match command {
        Commands::Backup => handle_backup_command(&orchestrator).await,
        Commands::Verify { json } => handle_verify_command(&orchestrator, json).await,
        Commands::Status => handle_status_command(&orchestrator).await,
        Commands::Config(cmd) => handle_config_command(&orchestrator, &paths, cmd),
        Commands::Daemon => handle_daemon_command(&orchestrator).await,
    };

    orchestrator.shutdown().await;
    result?;

    Ok(())
}
