//! Recurring billing generator
//!
//! Creates one pending billing per client for the current month. Running it
//! again in the same month is a no-op: the `(client, month)` constraint makes
//! each insert either create or skip.

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, EntityType};
use crate::error::ContaResult;
use crate::models::{Billing, BillingId, BillingStatus, ClientId, YearMonth};
use crate::storage::Storage;

/// A client whose billing could not be generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoBillingFailure {
    pub client_id: ClientId,
    pub code: String,
    pub status: u16,
}

/// Outcome of one generator run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoBillingReport {
    pub year_month: YearMonth,
    pub created: usize,
    /// Clients that already had a billing for the month
    pub skipped: usize,
    pub failures: Vec<AutoBillingFailure>,
}

pub struct AutoBillingService<'a> {
    storage: &'a Storage,
}

impl<'a> AutoBillingService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Run for the local calendar day
    pub fn run_now(&self) -> ContaResult<AutoBillingReport> {
        self.run(Local::now().date_naive())
    }

    /// Generate the billings of `today`'s month
    ///
    /// Per-client failures are collected and do not stop the run. The
    /// billings file is written once at the end; if that fails the whole run
    /// fails.
    pub fn run(&self, today: NaiveDate) -> ContaResult<AutoBillingReport> {
        let year_month = YearMonth::of(today);
        let now = Utc::now();

        let (report, audit) = self.storage.transaction(|| {
            let mut report = AutoBillingReport {
                year_month,
                created: 0,
                skipped: 0,
                failures: Vec::new(),
            };
            let mut audit = Vec::new();

            for client in self.storage.clients.get_all()? {
                let billing = Billing {
                    id: BillingId::new(0),
                    client_id: client.id,
                    fee: client.fee,
                    status: BillingStatus::Pending,
                    due_date: year_month.clamped_day(u32::from(client.fee_due_day)),
                    paid_at: None,
                    year_month,
                    created_at: now,
                    updated_at: now,
                };

                match self.storage.billings.insert(billing, Vec::new()) {
                    Ok(record) => {
                        report.created += 1;
                        audit.push(
                            AuditEntry::created(EntityType::Billing, record.billing.id, &record)
                                .with_label(year_month.to_string()),
                        );
                    }
                    Err(e) if e.is_unique_violation() => {
                        debug!(client_id = %client.id, %year_month, "billing already exists");
                        report.skipped += 1;
                    }
                    Err(e) => {
                        warn!(client_id = %client.id, error = %e, "auto billing failed for client");
                        report.failures.push(AutoBillingFailure {
                            client_id: client.id,
                            code: e.code().to_string(),
                            status: e.status(),
                        });
                    }
                }
            }

            if report.created > 0 {
                self.storage.billings.save()?;
            }
            Ok((report, audit))
        })?;

        self.storage.audit().log_batch(&audit)?;
        info!(
            %year_month,
            created = report.created,
            skipped = report.skipped,
            failed = report.failures.len(),
            "auto billing finished"
        );

        Ok(report)
    }
}
