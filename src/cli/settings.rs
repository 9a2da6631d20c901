//! Settings CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::{emit, emit_failure, parse_wire_enum};
use crate::api::ContaApi;
use crate::config::{Language, Settings, Theme};

/// Settings subcommands
#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show current settings
    Show,

    /// Change one or more settings
    Set {
        /// light, dark or system
        #[arg(long, value_parser = parse_wire_enum::<Theme>)]
        theme: Option<Theme>,
        /// pt-BR or en-US
        #[arg(long, value_parser = parse_wire_enum::<Language>)]
        language: Option<Language>,
        #[arg(long)]
        auto_update: Option<bool>,
        /// Generate the month's billings at start-up
        #[arg(long)]
        auto_billing: Option<bool>,
        /// Write today's backup at start-up
        #[arg(long)]
        auto_backup: Option<bool>,
    },
}

pub fn handle_settings_command(api: &ContaApi, cmd: SettingsCommands) -> Result<bool> {
    match cmd {
        SettingsCommands::Show => emit(&api.get_settings()),
        SettingsCommands::Set {
            theme,
            language,
            auto_update,
            auto_billing,
            auto_backup,
        } => {
            let current = match api.get_settings().into_result() {
                Ok(settings) => settings,
                Err(error) => return emit_failure(error),
            };
            let settings = Settings {
                theme: theme.unwrap_or(current.theme),
                language: language.unwrap_or(current.language),
                auto_update: auto_update.unwrap_or(current.auto_update),
                auto_billing: auto_billing.unwrap_or(current.auto_billing),
                auto_backup: auto_backup.unwrap_or(current.auto_backup),
                ..current
            };
            emit(&api.set_settings(settings))
        }
    }
}
