//! Core data models for Conta Certa
//!
//! Clients, catalog services, billings and their line items, plus the value
//! types they are built from (ids, money, year-month).

pub mod billing;
pub mod client;
pub mod ids;
pub mod money;
pub mod service;
pub mod year_month;

pub use billing::{total_fee, Billing, BillingRecord, BillingStatus, ServiceBilling};
pub use client::{Client, ClientResume};
pub use ids::{BillingId, ClientId, ServiceBillingId, ServiceId};
pub use money::{Money, MoneyParseError};
pub use service::Service;
pub use year_month::YearMonth;
