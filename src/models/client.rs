//! Client model
//!
//! A client carries its legal identifiers (CPF for individuals, CNPJ for
//! companies), contact data and the parameters of its monthly fee.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ClientId;
use super::money::Money;

/// Digits in a CPF (individual taxpayer number)
pub const CPF_LEN: usize = 11;
/// Digits in a CNPJ (company registration number)
pub const CNPJ_LEN: usize = 14;
/// Digits in a phone number, area code included
pub const PHONE_LEN: usize = 11;

/// A billed client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique identifier
    pub id: ClientId,

    /// Display name
    pub name: String,

    /// CPF, 11 digits
    pub cpf: Option<String>,

    /// CNPJ, 14 digits
    pub cnpj: Option<String>,

    pub email: Option<String>,

    /// Phone with area code, 11 digits
    pub phone: String,

    /// Monthly fee charged by the recurring generator
    pub fee: Money,

    /// Day of month the fee is due (clamped to the month's length when billed)
    pub fee_due_day: u8,

    /// When the client was created
    pub created_at: DateTime<Utc>,

    /// When the client was last modified
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// The document that identifies this client, CPF first
    pub fn document(&self) -> Option<&str> {
        self.cpf.as_deref().or(self.cnpj.as_deref())
    }

    /// Case-insensitive prefix match on name, CPF or CNPJ
    pub fn matches_prefix(&self, filter: &str) -> bool {
        let filter = filter.trim().to_lowercase();
        if filter.is_empty() {
            return true;
        }

        self.name.to_lowercase().starts_with(&filter)
            || self.cpf.as_deref().is_some_and(|c| c.starts_with(&filter))
            || self.cnpj.as_deref().is_some_and(|c| c.starts_with(&filter))
    }

    pub fn resume(&self) -> ClientResume {
        ClientResume {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.document() {
            Some(doc) => write!(f, "{} ({})", self.name, doc),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Id + name projection used by pickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientResume {
    pub id: ClientId,
    pub name: String,
}

/// Whether `value` consists of exactly `len` ASCII digits
pub fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}
