//! Client service
//!
//! CRUD over clients. Saving validates through [`ClientForm`]; deleting is
//! refused while the client still owns billings.

use chrono::Utc;
use tracing::info;

use crate::audit::EntityType;
use crate::error::{ContaError, ContaResult};
use crate::forms::ClientForm;
use crate::models::{Client, ClientId, ClientResume};
use crate::storage::Storage;

/// Service for client management
pub struct ClientService<'a> {
    storage: &'a Storage,
}

impl<'a> ClientService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// A page of clients whose name, CPF or CNPJ starts with `filter`
    pub fn list(&self, offset: usize, limit: usize, filter: &str) -> ContaResult<Vec<Client>> {
        self.storage.clients.list(offset, limit, filter)
    }

    pub fn count(&self) -> ContaResult<usize> {
        self.storage.clients.count()
    }

    pub fn get(&self, id: ClientId) -> ContaResult<Client> {
        self.storage
            .clients
            .get(id)?
            .ok_or_else(|| ContaError::client_not_found(id))
    }

    /// Id and name of every client
    pub fn list_resumes(&self) -> ContaResult<Vec<ClientResume>> {
        Ok(self
            .storage
            .clients
            .get_all()?
            .iter()
            .map(Client::resume)
            .collect())
    }

    /// Create or update depending on whether the form carries an id
    pub fn save(&self, form: ClientForm) -> ContaResult<Client> {
        let form = form.validate()?;
        match form.existing_id() {
            Some(id) => self.update(id, form),
            None => self.create(form),
        }
    }

    fn create(&self, form: ClientForm) -> ContaResult<Client> {
        let now = Utc::now();
        let candidate = Client {
            id: ClientId::new(0),
            name: form.name,
            cpf: form.cpf,
            cnpj: form.cnpj,
            email: form.email,
            phone: form.phone,
            fee: form.fee,
            fee_due_day: form.fee_due_day,
            created_at: now,
            updated_at: now,
        };

        let client = self.storage.transaction(|| {
            let client = self.storage.clients.insert(candidate)?;
            self.storage.clients.save()?;
            Ok(client)
        })?;

        self.storage
            .log_create(EntityType::Client, client.id, &client.name, &client)?;
        info!(client_id = %client.id, "client created");

        Ok(client)
    }

    fn update(&self, id: ClientId, form: ClientForm) -> ContaResult<Client> {
        let (before, after) = self.storage.transaction(|| {
            let before = self.get(id)?;
            let after = Client {
                name: form.name,
                email: form.email,
                phone: form.phone,
                fee: form.fee,
                fee_due_day: form.fee_due_day,
                updated_at: Utc::now(),
                // Documents are immutable once the client exists
                ..before.clone()
            };

            self.storage.clients.update(after.clone())?;
            self.storage.clients.save()?;
            Ok((before, after))
        })?;

        self.storage
            .log_update(EntityType::Client, id, &after.name, &before, &after)?;
        info!(client_id = %id, "client updated");

        Ok(after)
    }

    /// Delete a client that has no billings
    pub fn delete(&self, id: ClientId) -> ContaResult<Client> {
        let client = self.storage.transaction(|| {
            let client = self.get(id)?;

            let billings = self.storage.billings.count_for_client(id)?;
            if billings > 0 {
                return Err(ContaError::conflict("CLIENT.HAS_BILLINGS")
                    .with_param("billings", billings.to_string()));
            }

            self.storage.clients.delete(id)?;
            self.storage.clients.save()?;
            Ok(client)
        })?;

        self.storage
            .log_delete(EntityType::Client, id, &client.name, &client)?;
        info!(client_id = %id, "client deleted");

        Ok(client)
    }
}
