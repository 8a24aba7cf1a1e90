//! Background mode
//!
//! Keeps the process alive with the automatic backup timer armed until the
//! user interrupts it.

use tracing::info;

use crate::error::DumbackResult;
use crate::scheduler::Orchestrator;

/// Run until Ctrl-C, then shut the orchestrator down cleanly
pub async fn handle_daemon_command(orchestrator: &Orchestrator) -> DumbackResult<()> {
    let config = orchestrator.current_config();

    if config.auto_backup_enabled() {
        println!(
            "Automatic backups every {} day(s). Press Ctrl-C to stop.",
            config.freq_days()
        );
    } else {
        println!("Automatic backups are disabled (freq_days = 0). Press Ctrl-C to stop.");
    }

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received");

    println!("Stopping...");
    orchestrator.shutdown().await;
    Ok(())
}
