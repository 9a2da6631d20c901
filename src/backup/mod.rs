//! Backup system for Conta Certa
//!
//! - `codec`: the gzip + SHA-256 envelope format and its verification
//! - `manager`: dated backup files, listing, restore and the daily auto-backup
//!
//! A backup file holds every client, billing (with its lines) and catalog
//! service. Restoring replaces all three tables in one step and only after
//! the file verifies.

pub mod codec;
pub mod manager;

pub use codec::{Backup, BackupData, BackupMeta, BackupSource};
pub use manager::{file_name_for, BackupFile, BackupManager};
