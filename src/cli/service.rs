//! Catalog service CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::{emit, emit_failure, DEFAULT_LIMIT};
use crate::api::ContaApi;
use crate::forms::ServiceForm;
use crate::models::{Money, ServiceId};

/// Service subcommands
#[derive(Subcommand)]
pub enum ServiceCommands {
    /// List catalog services, id ascending
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Name prefix
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// Show one service
    Show { id: ServiceId },
    /// Create or update a service
    Save {
        /// Service ID to update (omit to create)
        #[arg(long)]
        id: Option<ServiceId>,
        #[arg(short, long)]
        name: Option<String>,
        /// Unit price
        #[arg(short, long, value_parser = Money::parse)]
        value: Option<Money>,
    },
    /// Delete a service; billed lines keep their copy
    Delete { id: ServiceId },
}

pub fn handle_service_command(api: &ContaApi, cmd: ServiceCommands) -> Result<bool> {
    match cmd {
        ServiceCommands::List {
            offset,
            limit,
            filter,
        } => emit(&api.fetch_services(offset, limit, &filter)),
        ServiceCommands::Show { id } => emit(&api.fetch_service(id)),
        ServiceCommands::Save { id, name, value } => {
            let mut form = match id {
                Some(id) => match api.fetch_service(id).into_result() {
                    Ok(service) => ServiceForm::from(service),
                    Err(error) => return emit_failure(error),
                },
                None => ServiceForm::default(),
            };
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(value) = value {
                form.value = value;
            }
            emit(&api.save_service(form))
        }
        ServiceCommands::Delete { id } => emit(&api.delete_service(id)),
    }
}
