//! CSV client import
//!
//! Reads a spreadsheet export of clients, maps its columns by header name
//! (Portuguese or English), and saves each row through the regular client
//! validation. Progress is reported row by row through a sink callback.

use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ContaError, ContaResult};
use crate::forms::ClientForm;
use crate::models::{ClientId, Money};
use crate::services::ClientService;
use crate::storage::Storage;

/// Result of importing a single data row (1-based, header excluded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RowOutcome {
    #[serde(rename_all = "camelCase")]
    Imported { row: usize, client_id: ClientId },
    #[serde(rename_all = "camelCase")]
    Rejected {
        row: usize,
        code: String,
        field: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: usize,
    pub imported: usize,
    pub rejected: usize,
}

/// Progress events; `Finished` is always the last one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ImportEvent {
    Row(RowOutcome),
    Finished(ImportSummary),
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, Default, PartialEq)]
struct ColumnMap {
    name: usize,
    phone: usize,
    cpf: Option<usize>,
    cnpj: Option<usize>,
    email: Option<usize>,
    fee: Option<usize>,
    fee_due_day: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> ContaResult<Self> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();
        let find = |aliases: &[&str]| aliases.iter().find_map(|a| index.get(*a).copied());

        let missing = || ContaError::validation("CSV.MISSING_COLUMNS", "header");

        Ok(Self {
            name: find(&["nome", "name"]).ok_or_else(missing)?,
            phone: find(&["telefone", "phone", "celular"]).ok_or_else(missing)?,
            cpf: find(&["cpf"]),
            cnpj: find(&["cnpj"]),
            email: find(&["email", "e-mail"]),
            fee: find(&["mensalidade", "fee", "valor", "honorario", "honorário"]),
            fee_due_day: find(&["vencimento", "dia", "feedueday", "fee_due_day"]),
        })
    }
}

/// Pick `;` when the header has more semicolons than commas
fn detect_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn cell<'r>(record: &'r StringRecord, column: Option<usize>) -> Option<&'r str> {
    column
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Build a client form from one CSV record, or the reason it cannot be read
fn row_to_form(record: &StringRecord, columns: &ColumnMap) -> Result<ClientForm, (String, String)> {
    let fee = match cell(record, columns.fee) {
        Some(raw) => Money::parse(raw).map_err(|_| ("CSV.INVALID_FEE".into(), "fee".into()))?,
        None => Money::zero(),
    };

    let fee_due_day = match cell(record, columns.fee_due_day) {
        Some(raw) => raw
            .parse::<u8>()
            .map_err(|_| ("CSV.INVALID_FEE_DUE_DAY".into(), "feeDueDay".into()))?,
        None => 1,
    };

    Ok(ClientForm {
        id: None,
        name: cell(record, Some(columns.name)).unwrap_or_default().to_string(),
        cpf: cell(record, columns.cpf).map(digits_only),
        cnpj: cell(record, columns.cnpj).map(digits_only),
        email: cell(record, columns.email).map(str::to_string),
        phone: cell(record, Some(columns.phone))
            .map(digits_only)
            .unwrap_or_default(),
        fee,
        fee_due_day,
    })
}

pub struct ImportService<'a> {
    storage: &'a Storage,
}

impl<'a> ImportService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Import every row of `path`, reporting each outcome to `sink`
    ///
    /// An unreadable file or a header without name and phone columns fails
    /// before any event is emitted. Row-level problems never abort the import.
    pub fn import_clients<P, F>(&self, path: P, mut sink: F) -> ContaResult<ImportSummary>
    where
        P: AsRef<Path>,
        F: FnMut(ImportEvent),
    {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let content = content.trim_start_matches('\u{feff}');

        let mut reader = ReaderBuilder::new()
            .delimiter(detect_delimiter(content))
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ContaError::Unexpected(format!("CSV header: {}", e)))?
            .clone();
        let columns = ColumnMap::from_headers(&headers)?;
        debug!(file = %path.display(), ?columns, "importing clients");

        let clients = ClientService::new(self.storage);
        let mut summary = ImportSummary::default();

        for (index, record) in reader.records().enumerate() {
            let row = index + 1;
            summary.total += 1;

            let outcome = match record {
                Err(_) => RowOutcome::Rejected {
                    row,
                    code: "CSV.INVALID_ROW".into(),
                    field: None,
                },
                Ok(record) if record.iter().all(|v| v.trim().is_empty()) => {
                    summary.total -= 1;
                    continue;
                }
                Ok(record) => match row_to_form(&record, &columns) {
                    Err((code, field)) => RowOutcome::Rejected {
                        row,
                        code,
                        field: Some(field),
                    },
                    Ok(form) => match clients.save(form) {
                        Ok(client) => RowOutcome::Imported {
                            row,
                            client_id: client.id,
                        },
                        Err(e) => RowOutcome::Rejected {
                            row,
                            code: e.code().to_string(),
                            field: e.params().remove("field"),
                        },
                    },
                },
            };

            match outcome {
                RowOutcome::Imported { .. } => summary.imported += 1,
                RowOutcome::Rejected { .. } => summary.rejected += 1,
            }
            sink(ImportEvent::Row(outcome));
        }

        info!(
            total = summary.total,
            imported = summary.imported,
            rejected = summary.rejected,
            "client import finished"
        );
        sink(ImportEvent::Finished(summary));

        Ok(summary)
    }
}
