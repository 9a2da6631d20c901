//! Form validators
//!
//! Each form is a candidate payload coming from the presentation layer.
//! `validate` returns the accepted, normalized payload or the first field
//! that fails as a validation error. Validators never touch storage.

pub mod billing;
pub mod client;
pub mod service;

pub use billing::{BillingForm, ServiceBillingForm, ValidBilling};
pub use client::ClientForm;
pub use service::ServiceForm;

/// Trim an optional string, mapping blank values to `None`
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
