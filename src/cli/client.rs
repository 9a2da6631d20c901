//! Client CLI commands

use anyhow::Result;
use clap::{Args, Subcommand};

use super::{emit, emit_failure, DEFAULT_LIMIT};
use crate::api::ContaApi;
use crate::forms::ClientForm;
use crate::models::{ClientId, Money};

/// Fields of `client save`; on update, omitted fields keep their value
#[derive(Args, Debug, Default)]
pub struct ClientArgs {
    /// Client ID to update (omit to create)
    #[arg(long)]
    pub id: Option<ClientId>,
    #[arg(short, long)]
    pub name: Option<String>,
    /// 11 digits
    #[arg(long)]
    pub cpf: Option<String>,
    /// 14 digits
    #[arg(long)]
    pub cnpj: Option<String>,
    #[arg(short, long)]
    pub email: Option<String>,
    /// 11 digits (area code + number)
    #[arg(short, long)]
    pub phone: Option<String>,
    /// Monthly fee (e.g. "150,00" or "150.00")
    #[arg(short, long, value_parser = Money::parse)]
    pub fee: Option<Money>,
    /// Day of the month the fee is due
    #[arg(short = 'd', long)]
    pub due_day: Option<u8>,
}

impl ClientArgs {
    fn apply(self, mut form: ClientForm) -> ClientForm {
        form.id = self.id.or(form.id);
        if let Some(name) = self.name {
            form.name = name;
        }
        form.cpf = self.cpf.or(form.cpf);
        form.cnpj = self.cnpj.or(form.cnpj);
        form.email = self.email.or(form.email);
        if let Some(phone) = self.phone {
            form.phone = phone;
        }
        if let Some(fee) = self.fee {
            form.fee = fee;
        }
        if let Some(day) = self.due_day {
            form.fee_due_day = day;
        }
        form
    }
}

/// Client subcommands
#[derive(Subcommand)]
pub enum ClientCommands {
    /// List clients, id ascending
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Prefix of name, cpf or cnpj
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// Count clients
    Count,
    /// Show one client
    Show { id: ClientId },
    /// Create or update a client
    Save(ClientArgs),
    /// Delete a client without billings
    Delete { id: ClientId },
    /// List client ids and names
    Names,
}

pub fn handle_client_command(api: &ContaApi, cmd: ClientCommands) -> Result<bool> {
    match cmd {
        ClientCommands::List {
            offset,
            limit,
            filter,
        } => emit(&api.fetch_clients(offset, limit, &filter)),
        ClientCommands::Count => emit(&api.count_clients()),
        ClientCommands::Show { id } => emit(&api.fetch_client(id)),
        ClientCommands::Save(args) => {
            let base = match args.id {
                Some(id) => match api.fetch_client(id).into_result() {
                    Ok(client) => ClientForm::from(client),
                    Err(error) => return emit_failure(error),
                },
                None => ClientForm {
                    fee_due_day: 1,
                    ..ClientForm::default()
                },
            };
            emit(&api.save_client(args.apply(base)))
        }
        ClientCommands::Delete { id } => emit(&api.delete_client(id)),
        ClientCommands::Names => emit(&api.fetch_clients_resume()),
    }
}
