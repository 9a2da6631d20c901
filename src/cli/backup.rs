//! Backup CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::emit;
use crate::api::ContaApi;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Write today's backup (replaces an earlier one from today)
    Create,

    /// List verified backups, newest first
    List,

    /// Replace all data with a backup
    Restore {
        /// Backup file name, e.g. backup-2025-03-01.json.gz
        file_name: String,
    },
}

pub fn handle_backup_command(api: &ContaApi, cmd: BackupCommands) -> Result<bool> {
    match cmd {
        BackupCommands::Create => emit(&api.generate_backup()),
        BackupCommands::List => emit(&api.fetch_backups()),
        BackupCommands::Restore { file_name } => emit(&api.restore_backup(&file_name)),
    }
}
