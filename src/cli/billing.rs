//! Billing CLI commands

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::{emit, emit_failure, DEFAULT_LIMIT};
use crate::api::{ApiError, ContaApi};
use crate::forms::{BillingForm, ServiceBillingForm};
use crate::models::{BillingId, BillingRecord, BillingStatus, ClientId, Money, ServiceId};

/// `SERVICE_ID:QTY`, e.g. `3:2`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemArg {
    pub service: ServiceId,
    pub quantity: u32,
}

fn parse_item(value: &str) -> Result<ItemArg, String> {
    let (service, quantity) = value.split_once(':').unwrap_or((value, "1"));
    let service = service
        .parse::<ServiceId>()
        .map_err(|_| format!("invalid service id in '{}'", value))?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", value))?;
    Ok(ItemArg { service, quantity })
}

fn parse_status(value: &str) -> Result<BillingStatus, String> {
    BillingStatus::parse(value).ok_or_else(|| format!("unknown status '{}'", value))
}

/// Billing subcommands
#[derive(Subcommand)]
pub enum BillingCommands {
    /// List billings with their totals, id ascending
    List {
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        /// Client-name prefix, or a status (pending/pendente, paid/pago)
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// Show one billing with lines, client and total
    Show { id: BillingId },
    /// Amounts and dates of every billing
    Resume,
    /// Create or update a billing
    Save(BillingArgs),
    /// Delete a billing and its lines
    Delete { id: BillingId },
}

/// Fields of `billing save`; on update, omitted fields keep their value
#[derive(Args, Debug, Default)]
pub struct BillingArgs {
    /// Billing ID to update (omit to create)
    #[arg(long)]
    pub id: Option<BillingId>,
    #[arg(short, long)]
    pub client: Option<ClientId>,
    /// Defaults to the client's fee on create
    #[arg(short, long, value_parser = Money::parse)]
    pub fee: Option<Money>,
    /// YYYY-MM-DD
    #[arg(short, long)]
    pub due_date: Option<NaiveDate>,
    /// pending or paid
    #[arg(short, long, value_parser = parse_status)]
    pub status: Option<BillingStatus>,
    /// YYYY-MM-DD, required when paid
    #[arg(long)]
    pub paid_at: Option<NaiveDate>,
    /// Line item as SERVICE_ID:QTY; repeat for more. Replaces all lines.
    #[arg(short, long = "item", value_parser = parse_item)]
    pub items: Vec<ItemArg>,
}

/// Start from the stored billing (or the client's defaults) and overlay
/// whatever was given on the command line
fn build_form(api: &ContaApi, args: BillingArgs) -> Result<BillingForm, ApiError> {
    let mut form = match args.id {
        Some(id) => {
            let stored = api.fetch_billing(id).into_result()?;
            BillingForm::from(BillingRecord {
                billing: stored.billing,
                service_billings: stored.service_billings,
            })
        }
        None => BillingForm {
            status: Some(BillingStatus::Pending),
            ..BillingForm::default()
        },
    };

    if let Some(client) = args.client {
        form.client_id = Some(client);
    }
    match (args.fee, args.id, form.client_id) {
        (Some(fee), _, _) => form.fee = fee,
        (None, None, Some(client)) => form.fee = api.fetch_client(client).into_result()?.fee,
        _ => {}
    }
    if args.due_date.is_some() {
        form.due_date = args.due_date;
    }
    if let Some(status) = args.status {
        form.set_status(status);
    }
    if args.paid_at.is_some() {
        form.paid_at = args.paid_at;
    }
    if !args.items.is_empty() {
        form.service_billings = args
            .items
            .iter()
            .map(|item| {
                let service = api.fetch_service(item.service).into_result()?;
                Ok(ServiceBillingForm::from_service(&service, item.quantity))
            })
            .collect::<Result<_, ApiError>>()?;
    }
    Ok(form)
}

pub fn handle_billing_command(api: &ContaApi, cmd: BillingCommands) -> Result<bool> {
    match cmd {
        BillingCommands::List {
            offset,
            limit,
            filter,
        } => emit(&api.fetch_billings(offset, limit, &filter)),
        BillingCommands::Show { id } => emit(&api.fetch_billing(id)),
        BillingCommands::Resume => emit(&api.fetch_billings_resume()),
        BillingCommands::Save(args) => match build_form(api, args) {
            Ok(form) => emit(&api.save_billing(form)),
            Err(error) => emit_failure(error),
        },
        BillingCommands::Delete { id } => emit(&api.delete_billing(id)),
    }
}
