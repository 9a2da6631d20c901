//! Service layer for Conta Certa
//!
//! Business logic on top of the storage layer: validation, projections with
//! derived totals, the recurring billing generator and CSV import.

pub mod auto_billing;
pub mod billing;
pub mod catalog;
pub mod client;
pub mod import;

pub use auto_billing::{AutoBillingFailure, AutoBillingReport, AutoBillingService};
pub use billing::{BillingResume, BillingService, BillingWithTotal};
pub use catalog::CatalogService;
pub use client::ClientService;
pub use import::{ImportEvent, ImportService, ImportSummary, RowOutcome};
