//! Billing form validation and state transitions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ContaError, ContaResult};
use crate::models::{
    BillingId, BillingRecord, BillingStatus, ClientId, Money, Service, ServiceBilling, ServiceId,
    YearMonth,
};

/// One line of a billing form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceBillingForm {
    pub service_origin_id: Option<ServiceId>,
    pub name: String,
    pub value: Money,
    pub quantity: u32,
}

impl ServiceBillingForm {
    /// Snapshot a catalog service into a line
    pub fn from_service(service: &Service, quantity: u32) -> Self {
        Self {
            service_origin_id: Some(service.id),
            name: service.name.clone(),
            value: service.value,
            quantity,
        }
    }
}

impl ServiceBillingForm {
    /// A line needs a name and a positive unit price
    fn validate(self) -> ContaResult<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() || !self.value.is_positive() {
            return Err(ContaError::validation(
                "BILLING.INVALID_SERVICE_BILLING",
                "serviceBillings",
            ));
        }
        Ok(Self { name, ..self })
    }
}

impl From<&ServiceBilling> for ServiceBillingForm {
    fn from(line: &ServiceBilling) -> Self {
        Self {
            service_origin_id: line.service_origin_id,
            name: line.name.clone(),
            value: line.value,
            quantity: line.quantity,
        }
    }
}

/// Candidate billing payload as edited by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillingForm {
    pub id: Option<BillingId>,
    pub client_id: Option<ClientId>,
    pub fee: Money,
    pub status: Option<BillingStatus>,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<NaiveDate>,
    pub service_billings: Vec<ServiceBillingForm>,
}

/// A billing form that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBilling {
    pub id: Option<BillingId>,
    pub client_id: ClientId,
    pub fee: Money,
    pub status: BillingStatus,
    pub due_date: NaiveDate,
    pub paid_at: Option<NaiveDate>,
    pub year_month: YearMonth,
    /// Lines with a non-zero quantity
    pub lines: Vec<ServiceBillingForm>,
}

impl From<BillingRecord> for BillingForm {
    /// Load a stored billing, with its lines, for editing
    fn from(record: BillingRecord) -> Self {
        Self {
            id: Some(record.billing.id),
            client_id: Some(record.billing.client_id),
            fee: record.billing.fee,
            status: Some(record.billing.status),
            due_date: Some(record.billing.due_date),
            paid_at: record.billing.paid_at,
            service_billings: record
                .service_billings
                .iter()
                .map(ServiceBillingForm::from)
                .collect(),
        }
    }
}

impl BillingForm {
    /// Change the status; going back to pending forgets the payment date
    pub fn set_status(&mut self, status: BillingStatus) {
        self.status = Some(status);
        if status == BillingStatus::Pending {
            self.paid_at = None;
        }
    }

    pub fn validate(self) -> ContaResult<ValidBilling> {
        let client_id = self
            .client_id
            .filter(ClientId::is_valid)
            .ok_or_else(|| ContaError::validation("BILLING.INVALID_CLIENT", "clientId"))?;

        if !self.fee.is_positive() {
            return Err(ContaError::validation("BILLING.INVALID_FEE", "fee"));
        }

        let due_date = self
            .due_date
            .ok_or_else(|| ContaError::validation("BILLING.INVALID_DUE_DATE", "dueDate"))?;

        let status = self
            .status
            .ok_or_else(|| ContaError::validation("BILLING.INVALID_STATUS", "status"))?;

        let paid_at = match status {
            BillingStatus::Paid => Some(
                self.paid_at
                    .ok_or_else(|| ContaError::validation("BILLING.INVALID_PAID_AT", "paidAt"))?,
            ),
            BillingStatus::Pending => None,
        };

        let lines: Vec<ServiceBillingForm> = self
            .service_billings
            .into_iter()
            .filter(|line| line.quantity > 0)
            .map(ServiceBillingForm::validate)
            .collect::<ContaResult<_>>()?;

        lines
            .iter()
            .try_fold(self.fee, |total, line| {
                line.value
                    .checked_mul(line.quantity)
                    .and_then(|amount| total.checked_add(amount))
            })
            .ok_or_else(|| ContaError::validation("BILLING.TOTAL_OUT_OF_RANGE", "serviceBillings"))?;

        Ok(ValidBilling {
            id: self.id.filter(BillingId::is_valid),
            client_id,
            fee: self.fee,
            status,
            due_date,
            paid_at,
            year_month: YearMonth::of(due_date),
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(quantity: u32) -> ServiceBillingForm {
        ServiceBillingForm {
            service_origin_id: Some(ServiceId::new(1)),
            name: "Folha".into(),
            value: Money::from_cents(5000),
            quantity,
        }
    }

    fn form() -> BillingForm {
        BillingForm {
            id: None,
            client_id: Some(ClientId::new(1)),
            fee: Money::from_cents(15000),
            status: Some(BillingStatus::Pending),
            due_date: Some(date(2025, 3, 10)),
            paid_at: None,
            service_billings: vec![line(2)],
        }
    }

    #[test]
    fn test_valid_form() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.year_month.to_string(), "2025-3");
        assert_eq!(valid.lines.len(), 1);
    }

    #[test]
    fn test_required_fields() {
        let cases: Vec<(BillingForm, &str)> = vec![
            (
                BillingForm {
                    client_id: None,
                    ..form()
                },
                "BILLING.INVALID_CLIENT",
            ),
            (
                BillingForm {
                    client_id: Some(ClientId::new(0)),
                    ..form()
                },
                "BILLING.INVALID_CLIENT",
            ),
            (
                BillingForm {
                    fee: Money::zero(),
                    ..form()
                },
                "BILLING.INVALID_FEE",
            ),
            (
                BillingForm {
                    due_date: None,
                    ..form()
                },
                "BILLING.INVALID_DUE_DATE",
            ),
            (
                BillingForm {
                    status: None,
                    ..form()
                },
                "BILLING.INVALID_STATUS",
            ),
        ];

        for (candidate, code) in cases {
            assert_eq!(candidate.validate().unwrap_err().code(), code);
        }
    }

    #[test]
    fn test_paid_requires_paid_at() {
        let mut paid = form();
        paid.set_status(BillingStatus::Paid);
        assert_eq!(paid.clone().validate().unwrap_err().code(), "BILLING.INVALID_PAID_AT");

        paid.paid_at = Some(date(2025, 3, 8));
        assert_eq!(paid.validate().unwrap().paid_at, Some(date(2025, 3, 8)));
    }

    #[test]
    fn test_pending_clears_paid_at() {
        let mut candidate = BillingForm {
            status: Some(BillingStatus::Paid),
            paid_at: Some(date(2025, 3, 8)),
            ..form()
        };
        candidate.set_status(BillingStatus::Pending);
        assert_eq!(candidate.paid_at, None);

        // A stale paid_at on a pending form is dropped by validation too
        let stale = BillingForm {
            paid_at: Some(date(2025, 3, 8)),
            ..form()
        };
        assert_eq!(stale.validate().unwrap().paid_at, None);
    }

    #[test]
    fn test_zero_quantity_lines_are_pruned() {
        let valid = BillingForm {
            service_billings: vec![line(0), line(3), line(0)],
            ..form()
        }
        .validate()
        .unwrap();
        assert_eq!(valid.lines.len(), 1);
        assert_eq!(valid.lines[0].quantity, 3);
    }

    #[test]
    fn test_lines_need_name_and_positive_value() {
        let bad_lines = [
            ServiceBillingForm {
                name: "   ".into(),
                ..line(1)
            },
            ServiceBillingForm {
                value: Money::zero(),
                ..line(1)
            },
            ServiceBillingForm {
                value: Money::from_cents(-500),
                ..line(1)
            },
        ];

        for bad in bad_lines {
            let err = BillingForm {
                service_billings: vec![line(1), bad],
                ..form()
            }
            .validate()
            .unwrap_err();
            assert_eq!(err.code(), "BILLING.INVALID_SERVICE_BILLING");
            assert_eq!(
                err.params().get("field").map(String::as_str),
                Some("serviceBillings")
            );
        }

        let trimmed = BillingForm {
            service_billings: vec![ServiceBillingForm {
                name: "  Folha ".into(),
                ..line(1)
            }],
            ..form()
        }
        .validate()
        .unwrap();
        assert_eq!(trimmed.lines[0].name, "Folha");
    }

    #[test]
    fn test_total_that_does_not_fit_is_rejected() {
        let err = BillingForm {
            service_billings: vec![ServiceBillingForm {
                value: Money::from_cents(i64::MAX / 2),
                ..line(3)
            }],
            ..form()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.code(), "BILLING.TOTAL_OUT_OF_RANGE");
    }

    #[test]
    fn test_from_service_snapshots_name_and_value() {
        let now = chrono::Utc::now();
        let service = Service {
            id: ServiceId::new(7),
            name: "Balanço".into(),
            value: Money::from_cents(5000),
            created_at: now,
            updated_at: now,
        };
        let line = ServiceBillingForm::from_service(&service, 2);
        assert_eq!(line.service_origin_id, Some(ServiceId::new(7)));
        assert_eq!(line.value.checked_mul(line.quantity), Some(Money::from_cents(10000)));
    }
}
