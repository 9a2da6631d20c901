//! Billing and service-billing models
//!
//! A billing is one client's charge for one month. It owns its line items
//! (service billings), which are snapshots of catalog services taken when the
//! billing was written. The total is always derived, never stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ContaError, ContaResult};

use super::ids::{BillingId, ClientId, ServiceBillingId, ServiceId};
use super::money::Money;
use super::year_month::YearMonth;

/// Payment state of a billing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    #[default]
    Pending,
    Paid,
}

impl BillingStatus {
    /// Parse a status label in English or Portuguese
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendente" => Some(Self::Pending),
            "paid" | "pago" => Some(Self::Paid),
            _ => None,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// A monthly charge for one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Billing {
    pub id: BillingId,

    pub client_id: ClientId,

    /// Snapshot of the client's fee when the billing was written
    pub fee: Money,

    pub status: BillingStatus,

    pub due_date: NaiveDate,

    /// Set exactly when `status` is paid
    pub paid_at: Option<NaiveDate>,

    /// Month this billing covers; unique per client
    pub year_month: YearMonth,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Billing {
    pub fn total_fee(&self, lines: &[ServiceBilling]) -> ContaResult<Money> {
        total_fee(self.fee, lines)
    }
}

/// A line item: snapshot of a catalog service with a quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBilling {
    pub id: ServiceBillingId,

    pub billing_id: BillingId,

    /// Catalog service this line was copied from; may dangle after deletion
    pub service_origin_id: Option<ServiceId>,

    pub name: String,

    /// Unit price at snapshot time
    pub value: Money,

    pub quantity: u32,
}

impl ServiceBilling {
    /// `None` when `value × quantity` does not fit
    pub fn line_total(&self) -> Option<Money> {
        self.value.checked_mul(self.quantity)
    }
}

/// A billing together with the line items it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    #[serde(flatten)]
    pub billing: Billing,
    pub service_billings: Vec<ServiceBilling>,
}

impl BillingRecord {
    pub fn total_fee(&self) -> ContaResult<Money> {
        self.billing.total_fee(&self.service_billings)
    }
}

/// `fee + Σ(value × quantity)` in integer centavos
///
/// Fails with `BILLING.TOTAL_OUT_OF_RANGE` instead of overflowing.
pub fn total_fee(fee: Money, lines: &[ServiceBilling]) -> ContaResult<Money> {
    lines
        .iter()
        .try_fold(fee, |total, line| {
            line.line_total().and_then(|amount| total.checked_add(amount))
        })
        .ok_or_else(|| ContaError::validation("BILLING.TOTAL_OUT_OF_RANGE", "serviceBillings"))
}
