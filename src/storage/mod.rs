//! Storage layer for Conta Certa
//!
//! JSON file repositories with atomic writes. Each repository guards its own
//! table; `Storage` adds a storage-wide gate so multi-table work and full
//! snapshots never interleave.
//!
//! Lock order is always gate, clients, catalog, billings.

pub mod billings;
pub mod catalog;
pub mod clients;
mod error;
pub mod file_io;

pub use billings::{BillingCheckpoint, BillingRepository};
pub use catalog::{CatalogCheckpoint, CatalogRepository};
pub use clients::{ClientCheckpoint, ClientRepository};
pub use error::{StoreError, StoreErrorCode};
pub use file_io::{read_json, write_bytes_atomic, write_json_atomic};

use std::collections::BTreeSet;
use std::sync::RwLock;

use serde::Serialize;
use tracing::{debug, warn};

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::ContaPaths;
use crate::error::{ContaResult, ErrorKind};
use crate::models::{BillingRecord, Client, ClientId, Service};

/// Point-in-time copy of every table, id ordered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub clients: Vec<Client>,
    pub billings: Vec<BillingRecord>,
    pub services: Vec<Service>,
}

/// In-memory state of every table at the start of a transaction
struct Checkpoint {
    clients: ClientCheckpoint,
    catalog: CatalogCheckpoint,
    billings: BillingCheckpoint,
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: ContaPaths,
    gate: RwLock<()>,
    audit: AuditLogger,
    pub clients: ClientRepository,
    pub catalog: CatalogRepository,
    pub billings: BillingRepository,
}

impl Storage {
    /// Create a storage handle; nothing is read until [`Storage::load_all`]
    pub fn new(paths: ContaPaths) -> ContaResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            clients: ClientRepository::new(paths.clients_file()),
            catalog: CatalogRepository::new(paths.services_file()),
            billings: BillingRepository::new(paths.billings_file()),
            gate: RwLock::new(()),
            paths,
        })
    }

    /// Create and load in one step
    pub fn open(paths: ContaPaths) -> ContaResult<Self> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &ContaPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn load_all(&self) -> ContaResult<()> {
        self.clients.load()?;
        self.catalog.load()?;
        self.billings.load()?;
        debug!(base = %self.paths.base_dir().display(), "storage loaded");
        Ok(())
    }

    pub fn save_all(&self) -> ContaResult<()> {
        self.clients.save()?;
        self.catalog.save()?;
        self.billings.save()?;
        Ok(())
    }

    /// Run `f` while holding the gate exclusively
    ///
    /// Every mutation goes through here so that a snapshot taken under the
    /// shared gate never observes half of a multi-table change. If `f` fails,
    /// every table is put back as it was before `f` ran; after a storage
    /// failure the files are rewritten from that state too.
    pub fn transaction<T>(&self, f: impl FnOnce() -> ContaResult<T>) -> ContaResult<T> {
        let _guard = self
            .gate
            .write()
            .map_err(|_| StoreError::poisoned("storage"))?;

        let checkpoint = self.checkpoint()?;
        let result = f();
        if let Err(error) = &result {
            debug!(%error, "transaction failed, rolling back");
            self.rollback(checkpoint, error.kind() == ErrorKind::StorageIo);
        }
        result
    }

    fn checkpoint(&self) -> ContaResult<Checkpoint> {
        Ok(Checkpoint {
            clients: self.clients.checkpoint()?,
            catalog: self.catalog.checkpoint()?,
            billings: self.billings.checkpoint()?,
        })
    }

    fn rollback(&self, checkpoint: Checkpoint, rewrite_files: bool) {
        let restored = self
            .clients
            .rollback(checkpoint.clients)
            .and_then(|()| self.catalog.rollback(checkpoint.catalog))
            .and_then(|()| self.billings.rollback(checkpoint.billings))
            .and_then(|()| if rewrite_files { self.save_all() } else { Ok(()) });

        if let Err(error) = restored {
            warn!(%error, "rollback incomplete");
        }
    }

    /// Read every table under the shared gate
    pub fn consistent_snapshot(&self) -> ContaResult<Snapshot> {
        let _guard = self
            .gate
            .read()
            .map_err(|_| StoreError::poisoned("storage"))?;

        Ok(Snapshot {
            clients: self.clients.get_all()?,
            services: self.catalog.get_all()?,
            billings: self.billings.get_all_records()?,
        })
    }

    /// Replace every table with `snapshot` and persist
    ///
    /// Billings must reference clients present in the snapshot and be unique
    /// per client and month. Id counters restart after the highest restored
    /// id. On any failure the previous tables stay in place.
    pub fn replace_all(&self, snapshot: Snapshot) -> ContaResult<()> {
        let client_ids: BTreeSet<ClientId> = snapshot.clients.iter().map(|c| c.id).collect();
        if snapshot
            .billings
            .iter()
            .any(|r| !client_ids.contains(&r.billing.client_id))
        {
            return Err(StoreError::foreign_key("billings.client_id").into());
        }

        self.transaction(|| {
            // Billings is the only table that can reject its records
            self.billings.replace_all(snapshot.billings)?;
            self.clients.replace_all(snapshot.clients)?;
            self.catalog.replace_all(snapshot.services)?;
            self.save_all()
        })
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity: EntityType,
        id: impl ToString,
        label: &str,
        record: &T,
    ) -> ContaResult<()> {
        self.audit
            .log(&AuditEntry::created(entity, id, record).with_label(label))
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity: EntityType,
        id: impl ToString,
        label: &str,
        before: &T,
        after: &T,
    ) -> ContaResult<()> {
        self.audit
            .log(&AuditEntry::updated(entity, id, before, after).with_label(label))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity: EntityType,
        id: impl ToString,
        label: &str,
        record: &T,
    ) -> ContaResult<()> {
        self.audit
            .log(&AuditEntry::deleted(entity, id, record).with_label(label))
    }
}
