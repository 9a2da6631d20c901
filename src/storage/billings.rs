//! Billing repository, persisted to `data/billings.json`
//!
//! Billings and their line items share one file and one lock, so a billing is
//! always written together with its lines. The `(client_id, year_month)`
//! constraint is checked and applied under the same write guard.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::ContaResult;
use crate::models::{
    Billing, BillingId, BillingRecord, ClientId, ServiceBilling, ServiceBillingId, YearMonth,
};

use super::error::StoreError;
use super::file_io::{read_json, write_json_atomic};

const TABLE: &str = "billings";
const UNIQUE_CLIENT_MONTH: &str = "billings(client_id, year_month)";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BillingData {
    #[serde(default)]
    next_billing_id: u64,
    #[serde(default)]
    next_line_id: u64,
    billings: Vec<Billing>,
    #[serde(default)]
    service_billings: Vec<ServiceBilling>,
}

#[derive(Debug, Clone)]
struct BillingTable {
    next_billing_id: BillingId,
    next_line_id: ServiceBillingId,
    billings: BTreeMap<BillingId, Billing>,
    lines: BTreeMap<ServiceBillingId, ServiceBilling>,
}

impl Default for BillingTable {
    fn default() -> Self {
        Self {
            next_billing_id: BillingId::new(1),
            next_line_id: ServiceBillingId::new(1),
            billings: BTreeMap::new(),
            lines: BTreeMap::new(),
        }
    }
}

impl BillingTable {
    fn month_taken(&self, client_id: ClientId, year_month: YearMonth, except: BillingId) -> bool {
        self.billings
            .values()
            .any(|b| b.client_id == client_id && b.year_month == year_month && b.id != except)
    }

    fn lines_of(&self, billing_id: BillingId) -> Vec<ServiceBilling> {
        self.lines
            .values()
            .filter(|l| l.billing_id == billing_id)
            .cloned()
            .collect()
    }

    fn record(&self, billing: &Billing) -> BillingRecord {
        BillingRecord {
            billing: billing.clone(),
            service_billings: self.lines_of(billing.id),
        }
    }

    fn attach_lines(&mut self, billing_id: BillingId, lines: Vec<ServiceBilling>) -> Vec<ServiceBilling> {
        lines
            .into_iter()
            .map(|mut line| {
                line.id = self.next_line_id;
                line.billing_id = billing_id;
                self.next_line_id = line.id.next();
                self.lines.insert(line.id, line.clone());
                line
            })
            .collect()
    }

    fn detach_lines(&mut self, billing_id: BillingId) {
        self.lines.retain(|_, l| l.billing_id != billing_id);
    }
}

/// Copy of the in-memory table, put back by [`BillingRepository::rollback`]
#[derive(Debug, Clone)]
pub struct BillingCheckpoint(BillingTable);

/// Repository for billings and their service billings
pub struct BillingRepository {
    path: PathBuf,
    data: RwLock<BillingTable>,
}

impl BillingRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(BillingTable::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BillingTable>, StoreError> {
        self.data.read().map_err(|_| StoreError::poisoned(TABLE))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BillingTable>, StoreError> {
        self.data.write().map_err(|_| StoreError::poisoned(TABLE))
    }

    pub fn checkpoint(&self) -> ContaResult<BillingCheckpoint> {
        Ok(BillingCheckpoint(self.read()?.clone()))
    }

    /// Discard every in-memory change made since `checkpoint` was taken
    pub fn rollback(&self, checkpoint: BillingCheckpoint) -> ContaResult<()> {
        *self.write()? = checkpoint.0;
        Ok(())
    }

    pub fn load(&self) -> ContaResult<()> {
        let file_data: BillingData = read_json(&self.path)?;

        let billings: BTreeMap<BillingId, Billing> =
            file_data.billings.into_iter().map(|b| (b.id, b)).collect();
        let lines: BTreeMap<ServiceBillingId, ServiceBilling> = file_data
            .service_billings
            .into_iter()
            .filter(|l| billings.contains_key(&l.billing_id))
            .map(|l| (l.id, l))
            .collect();

        let after_billing = billings
            .keys()
            .next_back()
            .map(BillingId::next)
            .unwrap_or(BillingId::new(1));
        let after_line = lines
            .keys()
            .next_back()
            .map(ServiceBillingId::next)
            .unwrap_or(ServiceBillingId::new(1));

        let mut table = self.write()?;
        table.next_billing_id = BillingId::new(file_data.next_billing_id).max(after_billing);
        table.next_line_id = ServiceBillingId::new(file_data.next_line_id).max(after_line);
        table.billings = billings;
        table.lines = lines;
        Ok(())
    }

    pub fn save(&self) -> ContaResult<()> {
        let table = self.read()?;
        let file_data = BillingData {
            next_billing_id: table.next_billing_id.get(),
            next_line_id: table.next_line_id.get(),
            billings: table.billings.values().cloned().collect(),
            service_billings: table.lines.values().cloned().collect(),
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// A billing with its lines
    pub fn get(&self, id: BillingId) -> ContaResult<Option<BillingRecord>> {
        let table = self.read()?;
        Ok(table.billings.get(&id).map(|b| table.record(b)))
    }

    /// Every billing without lines, id ascending
    pub fn get_all(&self) -> ContaResult<Vec<Billing>> {
        Ok(self.read()?.billings.values().cloned().collect())
    }

    /// Every billing with its lines, id ascending
    pub fn get_all_records(&self) -> ContaResult<Vec<BillingRecord>> {
        let table = self.read()?;
        Ok(table.billings.values().map(|b| table.record(b)).collect())
    }

    pub fn count_for_client(&self, client_id: ClientId) -> ContaResult<usize> {
        Ok(self
            .read()?
            .billings
            .values()
            .filter(|b| b.client_id == client_id)
            .count())
    }

    /// Insert a billing and its lines, allocating all ids
    ///
    /// Fails with a unique violation if the client already has a billing for
    /// that month.
    pub fn insert(&self, mut billing: Billing, lines: Vec<ServiceBilling>) -> ContaResult<BillingRecord> {
        let mut table = self.write()?;

        if table.month_taken(billing.client_id, billing.year_month, BillingId::new(0)) {
            return Err(StoreError::unique(UNIQUE_CLIENT_MONTH).into());
        }

        billing.id = table.next_billing_id;
        table.next_billing_id = billing.id.next();
        table.billings.insert(billing.id, billing.clone());
        let service_billings = table.attach_lines(billing.id, lines);

        Ok(BillingRecord {
            billing,
            service_billings,
        })
    }

    /// Replace a billing and all of its lines; returns the previous record
    pub fn update(&self, billing: Billing, lines: Vec<ServiceBilling>) -> ContaResult<BillingRecord> {
        let mut table = self.write()?;

        let previous = match table.billings.get(&billing.id) {
            Some(existing) => table.record(existing),
            None => return Err(StoreError::not_found(TABLE).into()),
        };

        if table.month_taken(billing.client_id, billing.year_month, billing.id) {
            return Err(StoreError::unique(UNIQUE_CLIENT_MONTH).into());
        }

        table.detach_lines(billing.id);
        table.attach_lines(billing.id, lines);
        table.billings.insert(billing.id, billing);

        Ok(previous)
    }

    /// Remove a billing and cascade to its lines
    pub fn delete(&self, id: BillingId) -> ContaResult<Option<BillingRecord>> {
        let mut table = self.write()?;
        let Some(billing) = table.billings.get(&id).cloned() else {
            return Ok(None);
        };

        let record = table.record(&billing);
        table.detach_lines(id);
        table.billings.remove(&id);
        Ok(Some(record))
    }

    /// Swap the whole table (restore), keeping record ids as given
    ///
    /// Nothing is swapped if a client has two billings in one month or a
    /// total does not fit.
    pub fn replace_all(&self, records: Vec<BillingRecord>) -> ContaResult<()> {
        let mut fresh = BillingTable::default();

        for record in records {
            record.total_fee()?;
            let billing_id = record.billing.id;
            if fresh.month_taken(record.billing.client_id, record.billing.year_month, billing_id) {
                return Err(StoreError::unique(UNIQUE_CLIENT_MONTH).into());
            }
            for mut line in record.service_billings {
                line.billing_id = billing_id;
                fresh.lines.insert(line.id, line);
            }
            fresh.billings.insert(billing_id, record.billing);
        }

        if let Some(last) = fresh.billings.keys().next_back() {
            fresh.next_billing_id = last.next();
        }
        if let Some(last) = fresh.lines.keys().next_back() {
            fresh.next_line_id = last.next();
        }

        *self.write()? = fresh;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingStatus, Money, ServiceId};
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, BillingRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = BillingRepository::new(temp_dir.path().join("billings.json"));
        (temp_dir, repo)
    }

    fn billing(client: u64, month: u32) -> Billing {
        let now = Utc::now();
        let year_month = YearMonth::new(2025, month).unwrap();
        Billing {
            id: BillingId::new(0),
            client_id: ClientId::new(client),
            fee: Money::from_cents(15000),
            status: BillingStatus::Pending,
            due_date: year_month.clamped_day(10),
            paid_at: None,
            year_month,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(name: &str, cents: i64, quantity: u32) -> ServiceBilling {
        ServiceBilling {
            id: ServiceBillingId::new(0),
            billing_id: BillingId::new(0),
            service_origin_id: Some(ServiceId::new(1)),
            name: name.into(),
            value: Money::from_cents(cents),
            quantity,
        }
    }

    #[test]
    fn test_insert_assigns_ids_to_billing_and_lines() {
        let (_temp_dir, repo) = create_test_repo();
        let record = repo
            .insert(billing(1, 3), vec![line("A", 100, 1), line("B", 200, 2)])
            .unwrap();

        assert_eq!(record.billing.id, BillingId::new(1));
        assert_eq!(record.service_billings.len(), 2);
        assert!(record
            .service_billings
            .iter()
            .all(|l| l.billing_id == record.billing.id));
        assert_eq!(record.total_fee().unwrap().cents(), 15000 + 100 + 400);
    }

    #[test]
    fn test_one_billing_per_client_per_month() {
        let (_temp_dir, repo) = create_test_repo();
        repo.insert(billing(1, 3), vec![]).unwrap();

        let err = repo.insert(billing(1, 3), vec![]).unwrap_err();
        assert!(err.is_unique_violation());

        // Other month or other client is fine
        repo.insert(billing(1, 4), vec![]).unwrap();
        repo.insert(billing(2, 3), vec![]).unwrap();
        assert_eq!(repo.get_all().unwrap().len(), 3);
    }

    #[test]
    fn test_update_replaces_lines_wholesale() {
        let (_temp_dir, repo) = create_test_repo();
        let record = repo
            .insert(billing(1, 3), vec![line("A", 100, 1), line("B", 200, 2)])
            .unwrap();

        let previous = repo
            .update(record.billing.clone(), vec![line("C", 300, 1)])
            .unwrap();
        assert_eq!(previous.service_billings.len(), 2);

        let current = repo.get(record.billing.id).unwrap().unwrap();
        let names: Vec<&str> = current
            .service_billings
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["C"]);
    }

    #[test]
    fn test_update_may_keep_its_own_month() {
        let (_temp_dir, repo) = create_test_repo();
        let record = repo.insert(billing(1, 3), vec![]).unwrap();
        let mut paid = record.billing.clone();
        paid.status = BillingStatus::Paid;
        paid.paid_at = NaiveDate::from_ymd_opt(2025, 3, 9);
        repo.update(paid, vec![]).unwrap();
    }

    #[test]
    fn test_update_into_taken_month_is_rejected() {
        let (_temp_dir, repo) = create_test_repo();
        repo.insert(billing(1, 3), vec![]).unwrap();
        let april = repo.insert(billing(1, 4), vec![]).unwrap();

        let mut moved = april.billing;
        moved.year_month = YearMonth::new(2025, 3).unwrap();
        assert!(repo.update(moved, vec![]).unwrap_err().is_unique_violation());
    }

    #[test]
    fn test_delete_cascades_to_lines() {
        let (_temp_dir, repo) = create_test_repo();
        let record = repo.insert(billing(1, 3), vec![line("A", 100, 1)]).unwrap();

        let removed = repo.delete(record.billing.id).unwrap().unwrap();
        assert_eq!(removed.service_billings.len(), 1);
        assert!(repo.get_all_records().unwrap().is_empty());
        assert!(repo.delete(record.billing.id).unwrap().is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.insert(billing(1, 3), vec![line("A", 100, 3)]).unwrap();
        repo.save().unwrap();

        let reloaded = BillingRepository::new(temp_dir.path().join("billings.json"));
        reloaded.load().unwrap();
        let records = reloaded.get_all_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].service_billings[0].quantity, 3);
        assert_eq!(reloaded.count_for_client(ClientId::new(1)).unwrap(), 1);
    }

    #[test]
    fn test_replace_all_restores_counters() {
        let (_temp_dir, repo) = create_test_repo();
        let mut restored = billing(1, 3);
        restored.id = BillingId::new(5);
        let mut restored_line = line("A", 100, 1);
        restored_line.id = ServiceBillingId::new(9);

        repo.replace_all(vec![BillingRecord {
            billing: restored,
            service_billings: vec![restored_line],
        }])
        .unwrap();

        let next = repo.insert(billing(2, 3), vec![line("B", 1, 1)]).unwrap();
        assert_eq!(next.billing.id, BillingId::new(6));
        assert_eq!(next.service_billings[0].id, ServiceBillingId::new(10));
    }
}
