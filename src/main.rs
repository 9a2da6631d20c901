use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use conta_certa::api::{ApiResponse, ContaApi};
use conta_certa::cli::{
    emit, handle_backup_command, handle_billing_command, handle_client_command,
    handle_import_command, handle_service_command, handle_settings_command, BackupCommands,
    BillingCommands, ClientCommands, ServiceCommands, SettingsCommands,
};
use conta_certa::config::paths::{ContaPaths, DATA_DIR_ENV};
use conta_certa::logging;

#[derive(Parser)]
#[command(
    name = "conta-certa",
    version,
    about = "Client billing, recurring fees and verified local backups",
    long_about = "Conta Certa keeps clients, their monthly fees and extra services, \
                  generates one billing per client each month, and writes verified \
                  daily backups. Every command prints a JSON envelope."
)]
struct Cli {
    /// Data directory (defaults to the per-user config directory)
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Client management commands
    #[command(subcommand)]
    Client(ClientCommands),

    /// Catalog service commands
    #[command(subcommand)]
    Service(ServiceCommands),

    /// Billing commands
    #[command(subcommand)]
    Billing(BillingCommands),

    /// Import clients from a CSV file (one JSON event per line)
    Import {
        /// Path to the CSV file
        file: PathBuf,
    },

    /// Backup commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Generate this month's billings
    AutoBilling,

    /// Run the start-up routine (auto-billing and auto-backup)
    Startup,

    /// Show recent audit log entries
    Audit {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Show data paths
    Config,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PathsReport {
    base_dir: PathBuf,
    data_dir: PathBuf,
    backup_dir: PathBuf,
    settings_file: PathBuf,
    audit_log: PathBuf,
}

fn run(cli: Cli) -> Result<bool> {
    let paths = match cli.data_dir {
        Some(dir) => ContaPaths::with_base_dir(dir),
        None => ContaPaths::new()?,
    };
    let api = ContaApi::open(paths)?;

    match cli.command {
        Commands::Client(cmd) => handle_client_command(&api, cmd),
        Commands::Service(cmd) => handle_service_command(&api, cmd),
        Commands::Billing(cmd) => handle_billing_command(&api, cmd),
        Commands::Import { file } => handle_import_command(&api, &file),
        Commands::Backup(cmd) => handle_backup_command(&api, cmd),
        Commands::Settings(cmd) => handle_settings_command(&api, cmd),
        Commands::AutoBilling => emit(&api.run_auto_billing()),
        Commands::Startup => emit(&api.on_startup()),
        Commands::Audit { limit } => emit(&api.fetch_audit_log(limit)),
        Commands::Config => {
            let paths = api.paths();
            emit(&ApiResponse::ok(PathsReport {
                base_dir: paths.base_dir().to_path_buf(),
                data_dir: paths.data_dir(),
                backup_dir: paths.backup_dir(),
                settings_file: paths.settings_file(),
                audit_log: paths.audit_log(),
            }))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
