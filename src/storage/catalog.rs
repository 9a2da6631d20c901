//! Catalog repository, persisted to `data/services.json`

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::ContaResult;
use crate::models::{Service, ServiceId};

use super::error::StoreError;
use super::file_io::{read_json, write_json_atomic};

const TABLE: &str = "services";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogData {
    #[serde(default)]
    next_id: u64,
    services: Vec<Service>,
}

#[derive(Debug, Clone)]
struct CatalogTable {
    next_id: ServiceId,
    rows: BTreeMap<ServiceId, Service>,
}

impl Default for CatalogTable {
    fn default() -> Self {
        Self {
            next_id: ServiceId::new(1),
            rows: BTreeMap::new(),
        }
    }
}

/// Copy of the in-memory table, put back by [`CatalogRepository::rollback`]
#[derive(Debug, Clone)]
pub struct CatalogCheckpoint(CatalogTable);

/// Repository for catalog services
pub struct CatalogRepository {
    path: PathBuf,
    data: RwLock<CatalogTable>,
}

impl CatalogRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(CatalogTable::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CatalogTable>, StoreError> {
        self.data.read().map_err(|_| StoreError::poisoned(TABLE))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CatalogTable>, StoreError> {
        self.data.write().map_err(|_| StoreError::poisoned(TABLE))
    }

    pub fn checkpoint(&self) -> ContaResult<CatalogCheckpoint> {
        Ok(CatalogCheckpoint(self.read()?.clone()))
    }

    /// Discard every in-memory change made since `checkpoint` was taken
    pub fn rollback(&self, checkpoint: CatalogCheckpoint) -> ContaResult<()> {
        *self.write()? = checkpoint.0;
        Ok(())
    }

    pub fn load(&self) -> ContaResult<()> {
        let file_data: CatalogData = read_json(&self.path)?;
        let rows: BTreeMap<ServiceId, Service> =
            file_data.services.into_iter().map(|s| (s.id, s)).collect();
        let after_max = rows
            .keys()
            .next_back()
            .map(ServiceId::next)
            .unwrap_or(ServiceId::new(1));

        let mut table = self.write()?;
        table.next_id = ServiceId::new(file_data.next_id).max(after_max);
        table.rows = rows;
        Ok(())
    }

    pub fn save(&self) -> ContaResult<()> {
        let table = self.read()?;
        let file_data = CatalogData {
            next_id: table.next_id.get(),
            services: table.rows.values().cloned().collect(),
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: ServiceId) -> ContaResult<Option<Service>> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    pub fn get_all(&self) -> ContaResult<Vec<Service>> {
        Ok(self.read()?.rows.values().cloned().collect())
    }

    /// A page of services whose name starts with `filter`
    pub fn list(&self, offset: usize, limit: usize, filter: &str) -> ContaResult<Vec<Service>> {
        let table = self.read()?;
        Ok(table
            .rows
            .values()
            .filter(|s| s.matches_prefix(filter))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    pub fn insert(&self, mut service: Service) -> ContaResult<Service> {
        let mut table = self.write()?;
        service.id = table.next_id;
        table.next_id = service.id.next();
        table.rows.insert(service.id, service.clone());
        Ok(service)
    }

    /// Replace an existing service, returning the previous version
    pub fn update(&self, service: Service) -> ContaResult<Service> {
        let mut table = self.write()?;
        let slot = table
            .rows
            .get_mut(&service.id)
            .ok_or(StoreError::not_found(TABLE))?;
        Ok(std::mem::replace(slot, service))
    }

    pub fn delete(&self, id: ServiceId) -> ContaResult<Option<Service>> {
        Ok(self.write()?.rows.remove(&id))
    }

    pub fn replace_all(&self, services: Vec<Service>) -> ContaResult<()> {
        let rows: BTreeMap<ServiceId, Service> =
            services.into_iter().map(|s| (s.id, s)).collect();
        let mut table = self.write()?;
        table.next_id = rows
            .keys()
            .next_back()
            .map(ServiceId::next)
            .unwrap_or(ServiceId::new(1));
        table.rows = rows;
        Ok(())
    }
}
