//! Client repository, persisted to `data/clients.json`

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::ContaResult;
use crate::models::{Client, ClientId};

use super::error::StoreError;
use super::file_io::{read_json, write_json_atomic};

const TABLE: &str = "clients";

/// On-disk layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientData {
    #[serde(default)]
    next_id: u64,
    clients: Vec<Client>,
}

#[derive(Debug, Clone)]
struct ClientTable {
    next_id: ClientId,
    rows: BTreeMap<ClientId, Client>,
}

impl Default for ClientTable {
    fn default() -> Self {
        Self {
            next_id: ClientId::new(1),
            rows: BTreeMap::new(),
        }
    }
}

/// Copy of the in-memory table, put back by [`ClientRepository::rollback`]
#[derive(Debug, Clone)]
pub struct ClientCheckpoint(ClientTable);

pub struct ClientRepository {
    path: PathBuf,
    data: RwLock<ClientTable>,
}

impl ClientRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(ClientTable::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ClientTable>, StoreError> {
        self.data.read().map_err(|_| StoreError::poisoned(TABLE))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ClientTable>, StoreError> {
        self.data.write().map_err(|_| StoreError::poisoned(TABLE))
    }

    pub fn checkpoint(&self) -> ContaResult<ClientCheckpoint> {
        Ok(ClientCheckpoint(self.read()?.clone()))
    }

    /// Discard every in-memory change made since `checkpoint` was taken
    pub fn rollback(&self, checkpoint: ClientCheckpoint) -> ContaResult<()> {
        *self.write()? = checkpoint.0;
        Ok(())
    }

    /// Load clients from disk
    pub fn load(&self) -> ContaResult<()> {
        let file_data: ClientData = read_json(&self.path)?;
        let rows: BTreeMap<ClientId, Client> =
            file_data.clients.into_iter().map(|c| (c.id, c)).collect();
        let max_id = rows.keys().next_back().copied().unwrap_or(ClientId::new(0));

        let mut table = self.write()?;
        table.next_id = ClientId::new(file_data.next_id).max(max_id.next());
        table.rows = rows;
        Ok(())
    }

    /// Save clients to disk
    pub fn save(&self) -> ContaResult<()> {
        let table = self.read()?;
        let file_data = ClientData {
            next_id: table.next_id.get(),
            clients: table.rows.values().cloned().collect(),
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: ClientId) -> ContaResult<Option<Client>> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    pub fn exists(&self, id: ClientId) -> ContaResult<bool> {
        Ok(self.read()?.rows.contains_key(&id))
    }

    /// All clients, id ascending
    pub fn get_all(&self) -> ContaResult<Vec<Client>> {
        Ok(self.read()?.rows.values().cloned().collect())
    }

    /// A page of clients matching `filter`, id ascending
    pub fn list(&self, offset: usize, limit: usize, filter: &str) -> ContaResult<Vec<Client>> {
        let table = self.read()?;
        Ok(table
            .rows
            .values()
            .filter(|c| c.matches_prefix(filter))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    pub fn count(&self) -> ContaResult<usize> {
        Ok(self.read()?.rows.len())
    }

    /// Insert a new client, allocating its id
    pub fn insert(&self, mut client: Client) -> ContaResult<Client> {
        let mut table = self.write()?;
        client.id = table.next_id;
        table.next_id = client.id.next();
        table.rows.insert(client.id, client.clone());
        Ok(client)
    }

    /// Replace an existing client, returning the previous version
    pub fn update(&self, client: Client) -> ContaResult<Client> {
        let mut table = self.write()?;
        match table.rows.get_mut(&client.id) {
            Some(slot) => Ok(std::mem::replace(slot, client)),
            None => Err(StoreError::not_found(TABLE).into()),
        }
    }

    /// Remove a client, returning it if it existed
    pub fn delete(&self, id: ClientId) -> ContaResult<Option<Client>> {
        Ok(self.write()?.rows.remove(&id))
    }

    /// Swap the whole table (restore)
    pub fn replace_all(&self, clients: Vec<Client>) -> ContaResult<()> {
        let rows: BTreeMap<ClientId, Client> = clients.into_iter().map(|c| (c.id, c)).collect();
        let mut table = self.write()?;
        table.next_id = rows
            .keys()
            .next_back()
            .map(ClientId::next)
            .unwrap_or(ClientId::new(1));
        table.rows = rows;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, ClientRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = ClientRepository::new(temp_dir.path().join("clients.json"));
        (temp_dir, repo)
    }

    fn client(name: &str) -> Client {
        let now = Utc::now();
        Client {
            id: ClientId::new(0),
            name: name.into(),
            cpf: Some("12345678901".into()),
            cnpj: None,
            email: None,
            phone: "11999998888".into(),
            fee: Money::from_cents(10000),
            fee_due_day: 10,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_allocates_sequential_ids() {
        let (_temp_dir, repo) = create_test_repo();
        let a = repo.insert(client("Ana")).unwrap();
        let b = repo.insert(client("Bruno")).unwrap();
        assert_eq!(a.id, ClientId::new(1));
        assert_eq!(b.id, ClientId::new(2));
    }

    #[test]
    fn test_save_and_reload_keeps_counter() {
        let (temp_dir, repo) = create_test_repo();
        repo.insert(client("Ana")).unwrap();
        let second = repo.insert(client("Bruno")).unwrap();
        repo.delete(second.id).unwrap();
        repo.save().unwrap();

        let reloaded = ClientRepository::new(temp_dir.path().join("clients.json"));
        reloaded.load().unwrap();
        assert_eq!(reloaded.count().unwrap(), 1);

        // Deleted ids are never reused
        let third = reloaded.insert(client("Carla")).unwrap();
        assert_eq!(third.id, ClientId::new(3));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let (_temp_dir, repo) = create_test_repo();
        let mut ghost = client("Ghost");
        ghost.id = ClientId::new(42);
        let err = repo.update(ghost).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_pages_and_filters() {
        let (_temp_dir, repo) = create_test_repo();
        for name in ["Ana", "Bruno", "Amanda", "Carla"] {
            repo.insert(client(name)).unwrap();
        }

        let page = repo.list(0, 10, "a").unwrap();
        let names: Vec<&str> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Amanda"]);

        let page = repo.list(1, 2, "").unwrap();
        let names: Vec<&str> = page.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Bruno", "Amanda"]);
    }

    #[test]
    fn test_replace_all_resets_counter() {
        let (_temp_dir, repo) = create_test_repo();
        let mut restored = client("Ana");
        restored.id = ClientId::new(7);
        repo.replace_all(vec![restored]).unwrap();

        let next = repo.insert(client("Bruno")).unwrap();
        assert_eq!(next.id, ClientId::new(8));
    }
}
