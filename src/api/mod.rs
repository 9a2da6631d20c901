//! Request/response boundary
//!
//! `ContaApi` is what a host (the CLI, or a desktop shell) talks to. Every
//! method returns an [`ApiResponse`] and never panics or propagates an error:
//! failures become `{ code, status, params }` and panics become
//! `UNEXPECTED_ERROR`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::audit::{AuditEntry, EntityType};
use crate::backup::{BackupFile, BackupManager, BackupMeta, BackupSource};
use crate::config::{ContaPaths, Settings};
use crate::error::{ContaError, ContaResult, ErrorKind, ErrorParams};
use crate::forms::{BillingForm, ClientForm, ServiceForm};
use crate::models::{BillingId, BillingRecord, Client, ClientId, ClientResume, Service, ServiceId};
use crate::services::{
    AutoBillingReport, AutoBillingService, BillingResume, BillingService, BillingWithTotal,
    CatalogService, ClientService, ImportEvent, ImportService, ImportSummary,
};
use crate::storage::Storage;

/// Wire form of a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "ErrorParams::is_empty")]
    pub params: ErrorParams,
}

impl ApiError {
    fn unexpected() -> Self {
        Self {
            code: "UNEXPECTED_ERROR".into(),
            status: 500,
            params: ErrorParams::new(),
        }
    }
}

impl From<&ContaError> for ApiError {
    fn from(err: &ContaError) -> Self {
        Self {
            code: err.code().to_string(),
            status: err.status(),
            params: err.params(),
        }
    }
}

/// Envelope returned by every operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Split into the data or the wire error
    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err(error),
            (None, None) => Err(ApiError::unexpected()),
        }
    }
}

/// What the start-up routine did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupReport {
    pub settings: Settings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_billing: Option<AutoBillingReport>,
    /// Present when a backup was written for today
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupFile>,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Run `f`, turning errors and panics into an envelope
fn respond<T>(operation: &'static str, f: impl FnOnce() -> ContaResult<T>) -> ApiResponse<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(data)) => ApiResponse::ok(data),
        Ok(Err(err)) => {
            match err.kind() {
                ErrorKind::StorageIo | ErrorKind::CorruptedData | ErrorKind::Unexpected => {
                    error!(operation, code = err.code(), error = %err, "operation failed")
                }
                _ => debug!(operation, code = err.code(), error = %err, "operation rejected"),
            }
            ApiResponse::failure(ApiError::from(&err))
        }
        Err(payload) => {
            error!(operation, panic = panic_message(payload.as_ref()), "operation panicked");
            ApiResponse::failure(ApiError::unexpected())
        }
    }
}

pub struct ContaApi {
    storage: Storage,
}

impl ContaApi {
    /// Open the store under `paths`, loading every table
    pub fn open(paths: ContaPaths) -> ContaResult<Self> {
        Ok(Self {
            storage: Storage::open(paths)?,
        })
    }

    /// Open the store at the default location
    pub fn from_env() -> ContaResult<Self> {
        Self::open(ContaPaths::new()?)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn paths(&self) -> &ContaPaths {
        self.storage.paths()
    }

    // --- Clients ---

    pub fn fetch_clients(&self, offset: usize, limit: usize, filter: &str) -> ApiResponse<Vec<Client>> {
        respond("fetch_clients", || {
            ClientService::new(&self.storage).list(offset, limit, filter)
        })
    }

    pub fn count_clients(&self) -> ApiResponse<usize> {
        respond("count_clients", || ClientService::new(&self.storage).count())
    }

    pub fn fetch_client(&self, id: ClientId) -> ApiResponse<Client> {
        respond("fetch_client", || ClientService::new(&self.storage).get(id))
    }

    pub fn save_client(&self, form: ClientForm) -> ApiResponse<Client> {
        respond("save_client", || ClientService::new(&self.storage).save(form))
    }

    pub fn delete_client(&self, id: ClientId) -> ApiResponse<Client> {
        respond("delete_client", || ClientService::new(&self.storage).delete(id))
    }

    pub fn fetch_clients_resume(&self) -> ApiResponse<Vec<ClientResume>> {
        respond("fetch_clients_resume", || {
            ClientService::new(&self.storage).list_resumes()
        })
    }

    // --- Catalog ---

    pub fn fetch_services(&self, offset: usize, limit: usize, filter: &str) -> ApiResponse<Vec<Service>> {
        respond("fetch_services", || {
            CatalogService::new(&self.storage).list(offset, limit, filter)
        })
    }

    pub fn fetch_service(&self, id: ServiceId) -> ApiResponse<Service> {
        respond("fetch_service", || CatalogService::new(&self.storage).get(id))
    }

    pub fn save_service(&self, form: ServiceForm) -> ApiResponse<Service> {
        respond("save_service", || CatalogService::new(&self.storage).save(form))
    }

    pub fn delete_service(&self, id: ServiceId) -> ApiResponse<Service> {
        respond("delete_service", || CatalogService::new(&self.storage).delete(id))
    }

    // --- Billings ---

    pub fn fetch_billings(
        &self,
        offset: usize,
        limit: usize,
        filter: &str,
    ) -> ApiResponse<Vec<BillingWithTotal>> {
        respond("fetch_billings", || {
            BillingService::new(&self.storage).list_with_total(offset, limit, filter)
        })
    }

    pub fn fetch_billing(&self, id: BillingId) -> ApiResponse<BillingWithTotal> {
        respond("fetch_billing", || {
            BillingService::new(&self.storage).get_with_total(id)
        })
    }

    pub fn fetch_billings_resume(&self) -> ApiResponse<Vec<BillingResume>> {
        respond("fetch_billings_resume", || {
            BillingService::new(&self.storage).list_resumes()
        })
    }

    pub fn save_billing(&self, form: BillingForm) -> ApiResponse<BillingRecord> {
        respond("save_billing", || BillingService::new(&self.storage).save(form))
    }

    pub fn delete_billing(&self, id: BillingId) -> ApiResponse<BillingRecord> {
        respond("delete_billing", || BillingService::new(&self.storage).delete(id))
    }

    pub fn run_auto_billing(&self) -> ApiResponse<AutoBillingReport> {
        respond("run_auto_billing", || {
            AutoBillingService::new(&self.storage).run_now()
        })
    }

    // --- Import ---

    /// Import clients from a CSV file, streaming progress into `sink`
    pub fn import_clients_csv<F>(&self, path: &Path, sink: F) -> ApiResponse<ImportSummary>
    where
        F: FnMut(ImportEvent),
    {
        respond("import_clients_csv", || {
            ImportService::new(&self.storage).import_clients(path, sink)
        })
    }

    // --- Backups ---

    pub fn generate_backup(&self) -> ApiResponse<BackupFile> {
        respond("generate_backup", || {
            BackupManager::new(&self.storage).create(BackupSource::Local)
        })
    }

    pub fn fetch_backups(&self) -> ApiResponse<Vec<BackupFile>> {
        respond("fetch_backups", || BackupManager::new(&self.storage).list())
    }

    pub fn restore_backup(&self, file_name: &str) -> ApiResponse<BackupMeta> {
        respond("restore_backup", || {
            BackupManager::new(&self.storage).restore(file_name)
        })
    }

    /// Most recent audit entries, oldest first
    pub fn fetch_audit_log(&self, count: usize) -> ApiResponse<Vec<AuditEntry>> {
        respond("fetch_audit_log", || self.storage.audit().read_recent(count))
    }

    // --- Settings ---

    pub fn get_settings(&self) -> ApiResponse<Settings> {
        respond("get_settings", || Settings::get_or_create(self.paths()))
    }

    pub fn set_settings(&self, settings: Settings) -> ApiResponse<Settings> {
        respond("set_settings", || {
            let before = Settings::get_or_create(self.paths())?;
            settings.save(self.paths())?;
            self.storage
                .log_update(EntityType::Settings, "settings", "settings", &before, &settings)?;
            info!("settings updated");
            Ok(settings)
        })
    }

    /// Start-up routine: generate this month's billings and today's backup
    /// when the settings ask for them
    pub fn on_startup(&self) -> ApiResponse<StartupReport> {
        respond("on_startup", || {
            let settings = Settings::get_or_create(self.paths())?;

            let auto_billing = if settings.auto_billing {
                Some(AutoBillingService::new(&self.storage).run_now()?)
            } else {
                None
            };

            // Runs after billing so today's backup includes the new month
            let backup = if settings.auto_backup {
                BackupManager::new(&self.storage).ensure_today()?
            } else {
                None
            };

            Ok(StartupReport {
                settings,
                auto_billing,
                backup,
            })
        })
    }
}
