//! Catalog service
//!
//! Reusable priced services that billings copy into their line items.

use chrono::Utc;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{ContaError, ContaResult};
use crate::forms::ServiceForm;
use crate::models::{Service, ServiceId};
use crate::storage::Storage;

pub struct CatalogService<'a> {
    storage: &'a Storage,
}

impl<'a> CatalogService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn list(&self, offset: usize, limit: usize, filter: &str) -> ContaResult<Vec<Service>> {
        self.storage.catalog.list(offset, limit, filter)
    }

    pub fn get(&self, id: ServiceId) -> ContaResult<Service> {
        self.storage
            .catalog
            .get(id)?
            .ok_or_else(|| ContaError::service_not_found(id))
    }

    pub fn save(&self, form: ServiceForm) -> ContaResult<Service> {
        let form = form.validate()?;
        let now = Utc::now();

        match form.existing_id() {
            Some(id) => {
                let (before, after) = self.storage.transaction(|| {
                    let before = self.get(id)?;
                    let after = Service {
                        name: form.name,
                        value: form.value,
                        updated_at: now,
                        ..before.clone()
                    };
                    self.storage.catalog.update(after.clone())?;
                    self.storage.catalog.save()?;
                    Ok((before, after))
                })?;

                self.storage
                    .log_update(EntityType::Service, id, &after.name, &before, &after)?;
                info!(service_id = %id, "service updated");
                Ok(after)
            }
            None => {
                let service = self.storage.transaction(|| {
                    let service = self.storage.catalog.insert(Service {
                        id: ServiceId::new(0),
                        name: form.name,
                        value: form.value,
                        created_at: now,
                        updated_at: now,
                    })?;
                    self.storage.catalog.save()?;
                    Ok(service)
                })?;

                self.storage
                    .log_create(EntityType::Service, service.id, &service.name, &service)?;
                info!(service_id = %service.id, "service created");
                Ok(service)
            }
        }
    }

    /// Delete a service; billing lines copied from it are left untouched
    pub fn delete(&self, id: ServiceId) -> ContaResult<Service> {
        let service = self.storage.transaction(|| {
            let service = self.get(id)?;
            self.storage.catalog.delete(id)?;
            self.storage.catalog.save()?;
            Ok(service)
        })?;

        self.storage
            .log_delete(EntityType::Service, id, &service.name, &service)?;
        info!(service_id = %id, "service deleted");
        Ok(service)
    }
}
