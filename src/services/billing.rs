//! Billing service
//!
//! Writes billings with their line items and serves the read projections
//! that carry the derived total.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audit::EntityType;
use crate::error::{ContaError, ContaResult};
use crate::forms::{BillingForm, ValidBilling};
use crate::models::{
    Billing, BillingId, BillingRecord, BillingStatus, ClientId, ClientResume, Money,
    ServiceBilling, ServiceBillingId,
};
use crate::storage::Storage;

/// A billing with its lines, its client and the computed total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingWithTotal {
    #[serde(flatten)]
    pub billing: Billing,
    pub service_billings: Vec<ServiceBilling>,
    pub client: Option<ClientResume>,
    pub total_fee: Money,
}

/// Dashboard projection: amounts and dates only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingResume {
    pub fee: Money,
    pub status: BillingStatus,
    pub due_date: NaiveDate,
    pub paid_at: Option<NaiveDate>,
    pub total_fee: Money,
}

impl TryFrom<&BillingRecord> for BillingResume {
    type Error = ContaError;

    fn try_from(record: &BillingRecord) -> ContaResult<Self> {
        Ok(Self {
            fee: record.billing.fee,
            status: record.billing.status,
            due_date: record.billing.due_date,
            paid_at: record.billing.paid_at,
            total_fee: record.total_fee()?,
        })
    }
}

pub struct BillingService<'a> {
    storage: &'a Storage,
}

impl<'a> BillingService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn client_names(&self) -> ContaResult<BTreeMap<ClientId, ClientResume>> {
        Ok(self
            .storage
            .clients
            .get_all()?
            .iter()
            .map(|c| (c.id, c.resume()))
            .collect())
    }

    fn with_total(
        record: BillingRecord,
        client: Option<ClientResume>,
    ) -> ContaResult<BillingWithTotal> {
        let total_fee = record.total_fee()?;
        Ok(BillingWithTotal {
            billing: record.billing,
            service_billings: record.service_billings,
            client,
            total_fee,
        })
    }

    /// A page of billings, id ascending
    ///
    /// A non-empty `filter` matches a client-name prefix or, when it is a
    /// status label (`pending`, `pendente`, `paid`, `pago`), that status.
    pub fn list_with_total(
        &self,
        offset: usize,
        limit: usize,
        filter: &str,
    ) -> ContaResult<Vec<BillingWithTotal>> {
        let clients = self.client_names()?;
        let filter = filter.trim().to_lowercase();
        let status = BillingStatus::parse(&filter);

        let matches = |record: &BillingRecord| {
            if filter.is_empty() {
                return true;
            }
            let by_name = clients
                .get(&record.billing.client_id)
                .is_some_and(|c| c.name.to_lowercase().starts_with(&filter));
            by_name || status == Some(record.billing.status)
        };

        self.storage
            .billings
            .get_all_records()?
            .into_iter()
            .filter(|r| matches(r))
            .skip(offset)
            .take(limit)
            .map(|r| {
                let client = clients.get(&r.billing.client_id).cloned();
                Self::with_total(r, client)
            })
            .collect()
    }

    pub fn get_with_total(&self, id: BillingId) -> ContaResult<BillingWithTotal> {
        let record = self
            .storage
            .billings
            .get(id)?
            .ok_or_else(|| ContaError::billing_not_found(id))?;
        let client = self
            .storage
            .clients
            .get(record.billing.client_id)?
            .map(|c| c.resume());
        Self::with_total(record, client)
    }

    /// Every billing reduced to amounts and dates, id ascending
    pub fn list_resumes(&self) -> ContaResult<Vec<BillingResume>> {
        self.storage
            .billings
            .get_all_records()?
            .iter()
            .map(BillingResume::try_from)
            .collect()
    }

    /// Create or update a billing, replacing its lines wholesale
    pub fn save(&self, form: BillingForm) -> ContaResult<BillingRecord> {
        let valid = form.validate()?;
        match valid.id {
            Some(id) => self.update(id, valid),
            None => self.create(valid),
        }
    }

    fn create(&self, valid: ValidBilling) -> ContaResult<BillingRecord> {
        let now = Utc::now();
        let record = self.storage.transaction(|| {
            self.ensure_client(valid.client_id)?;
            let lines = build_lines(&valid);
            let billing = Billing {
                id: BillingId::new(0),
                client_id: valid.client_id,
                fee: valid.fee,
                status: valid.status,
                due_date: valid.due_date,
                paid_at: valid.paid_at,
                year_month: valid.year_month,
                created_at: now,
                updated_at: now,
            };

            let record = self.storage.billings.insert(billing, lines)?;
            self.storage.billings.save()?;
            Ok(record)
        })?;

        self.storage.log_create(
            EntityType::Billing,
            record.billing.id,
            &record.billing.year_month.to_string(),
            &record,
        )?;
        info!(billing_id = %record.billing.id, client_id = %record.billing.client_id, "billing created");

        Ok(record)
    }

    fn update(&self, id: BillingId, valid: ValidBilling) -> ContaResult<BillingRecord> {
        let (before, after) = self.storage.transaction(|| {
            self.ensure_client(valid.client_id)?;
            let before = self
                .storage
                .billings
                .get(id)?
                .ok_or_else(|| ContaError::billing_not_found(id))?;

            let billing = Billing {
                id,
                client_id: valid.client_id,
                fee: valid.fee,
                status: valid.status,
                due_date: valid.due_date,
                paid_at: valid.paid_at,
                year_month: valid.year_month,
                created_at: before.billing.created_at,
                updated_at: Utc::now(),
            };

            self.storage.billings.update(billing, build_lines(&valid))?;
            self.storage.billings.save()?;

            let after = self
                .storage
                .billings
                .get(id)?
                .ok_or_else(|| ContaError::billing_not_found(id))?;
            Ok((before, after))
        })?;

        self.storage.log_update(
            EntityType::Billing,
            id,
            &after.billing.year_month.to_string(),
            &before,
            &after,
        )?;
        info!(billing_id = %id, "billing updated");

        Ok(after)
    }

    /// Delete a billing together with its lines
    pub fn delete(&self, id: BillingId) -> ContaResult<BillingRecord> {
        let removed = self.storage.transaction(|| {
            let removed = self
                .storage
                .billings
                .delete(id)?
                .ok_or_else(|| ContaError::billing_not_found(id))?;
            self.storage.billings.save()?;
            Ok(removed)
        })?;

        self.storage.log_delete(
            EntityType::Billing,
            id,
            &removed.billing.year_month.to_string(),
            &removed,
        )?;
        info!(billing_id = %id, "billing deleted");

        Ok(removed)
    }

    fn ensure_client(&self, id: ClientId) -> ContaResult<()> {
        if self.storage.clients.exists(id)? {
            Ok(())
        } else {
            Err(ContaError::client_not_found(id))
        }
    }
}

/// Line items ready for the repository, which assigns their ids
fn build_lines(valid: &ValidBilling) -> Vec<ServiceBilling> {
    valid
        .lines
        .iter()
        .map(|line| ServiceBilling {
            id: ServiceBillingId::new(0),
            billing_id: BillingId::new(0),
            service_origin_id: line.service_origin_id,
            name: line.name.clone(),
            value: line.value,
            quantity: line.quantity,
        })
        .collect()
}
