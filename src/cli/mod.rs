//! CLI command handlers
//!
//! Bridges clap argument parsing with [`ContaApi`](crate::api::ContaApi).
//! Every command prints the JSON envelope of its operation on stdout; the
//! returned flag is the envelope's `success`.

pub mod backup;
pub mod billing;
pub mod client;
pub mod service;
pub mod settings;

pub use backup::{handle_backup_command, BackupCommands};
pub use billing::{handle_billing_command, BillingCommands};
pub use client::{handle_client_command, ClientCommands};
pub use service::{handle_service_command, ServiceCommands};
pub use settings::{handle_settings_command, SettingsCommands};

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::api::{ApiError, ApiResponse, ContaApi};

/// Default page size for list commands
pub const DEFAULT_LIMIT: usize = 30;

/// Print a pretty JSON envelope and report whether it succeeded
pub fn emit<T: Serialize>(response: &ApiResponse<T>) -> Result<bool> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, response)?;
    writeln!(out)?;
    Ok(response.success)
}

/// Print the envelope of a failure that happened while assembling a request
pub fn emit_failure(error: ApiError) -> Result<bool> {
    emit(&ApiResponse::<()>::failure(error))
}

/// Stream import events as JSON lines
///
/// When the import cannot start no event is produced, so the failure
/// envelope is printed instead.
pub fn handle_import_command(api: &ContaApi, file: &Path) -> Result<bool> {
    let stdout = std::io::stdout();
    let mut write_error = None;

    let response = api.import_clients_csv(file, |event| {
        let mut out = stdout.lock();
        let line = serde_json::to_writer(&mut out, &event).map_err(anyhow::Error::from);
        if let Err(e) = line.and_then(|_| writeln!(out).map_err(anyhow::Error::from)) {
            write_error.get_or_insert(e);
        }
    });

    if let Some(e) = write_error {
        return Err(e);
    }
    if response.success {
        Ok(true)
    } else {
        emit(&response)
    }
}

/// Parse a lowercase wire name (`dark`, `pt-BR`, ...) into a serde enum
pub(crate) fn parse_wire_enum<T: serde::de::DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| format!("unknown value '{}'", value))
}
