//! Audit trail
//!
//! Every create, update and delete on clients, services, billings and
//! settings is appended to `audit.log` as one JSON object per line, with the
//! record before and after the change and the list of fields that moved.
//! Restores are recorded as a single entry.

mod diff;
mod entry;
mod logger;

pub use diff::{field_changes, FieldChange};
pub use entry::{Action, AuditEntry, EntityType};
pub use logger::AuditLogger;
