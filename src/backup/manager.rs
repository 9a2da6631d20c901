//! Backup manager for Conta Certa
//!
//! Writes one compressed envelope per calendar day into the backup directory
//! (`backup-YYYY-MM-DD.json.gz`), lists them, and restores one over the live
//! tables.

use std::fs;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::codec::{self, Backup, BackupMeta, BackupSource};
use crate::audit::AuditEntry;
use crate::error::{ContaError, ContaResult};
use crate::storage::{write_bytes_atomic, Storage};

const FILE_PREFIX: &str = "backup-";
const FILE_SUFFIX: &str = ".json.gz";

/// A backup file on disk together with its verified metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFile {
    pub file_name: String,
    #[serde(flatten)]
    pub meta: BackupMeta,
}

/// File name used for a backup taken on `date`
pub fn file_name_for(date: NaiveDate) -> String {
    format!("{}{}{}", FILE_PREFIX, date.format("%Y-%m-%d"), FILE_SUFFIX)
}

/// Reject anything that could escape the backup directory
fn check_file_name(file_name: &str) -> ContaResult<()> {
    let invalid = file_name.is_empty()
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..")
        || !file_name.ends_with(FILE_SUFFIX);

    if invalid {
        return Err(ContaError::validation("BACKUP.INVALID_FILE_NAME", "fileName"));
    }
    Ok(())
}

/// Manages backup creation, listing and restore
pub struct BackupManager<'a> {
    storage: &'a Storage,
    backup_dir: PathBuf,
}

impl<'a> BackupManager<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            backup_dir: storage.paths().backup_dir(),
            storage,
        }
    }

    pub fn backup_dir(&self) -> &PathBuf {
        &self.backup_dir
    }

    /// Back up every table as of now; a second backup on the same day
    /// replaces the first
    pub fn create(&self, source: BackupSource) -> ContaResult<BackupFile> {
        self.create_on(Local::now().date_naive(), source)
    }

    fn create_on(&self, date: NaiveDate, source: BackupSource) -> ContaResult<BackupFile> {
        let snapshot = self.storage.consistent_snapshot()?;
        let backup = Backup {
            meta: BackupMeta::new(source, Utc::now()),
            data: snapshot.into(),
        };
        let (meta, bytes) = codec::encode(backup)?;

        fs::create_dir_all(&self.backup_dir)?;
        let file_name = file_name_for(date);
        write_bytes_atomic(self.backup_dir.join(&file_name), &bytes)?;

        info!(file = %file_name, backup_id = %meta.backup_id, "backup written");
        Ok(BackupFile { file_name, meta })
    }

    /// Every backup in the directory, newest first
    ///
    /// Each file is fully verified; the first unreadable one fails the whole
    /// listing with its name in the `file` parameter.
    pub fn list(&self) -> ContaResult<Vec<BackupFile>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !path.is_file() || !file_name.ends_with(FILE_SUFFIX) {
                continue;
            }

            let file_name = file_name.to_string();
            let bytes = fs::read(&path)?;
            let backup = codec::decode(&bytes).map_err(|e| e.with_param("file", &file_name))?;
            backups.push(BackupFile {
                file_name,
                meta: backup.meta,
            });
        }

        backups.sort_by(|a, b| {
            b.meta
                .created_at()
                .cmp(&a.meta.created_at())
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(backups)
    }

    /// Replace every table with the contents of `file_name`
    ///
    /// Nothing is touched unless the file verifies.
    pub fn restore(&self, file_name: &str) -> ContaResult<BackupMeta> {
        check_file_name(file_name)?;

        let path = self.backup_dir.join(file_name);
        if !path.is_file() {
            return Err(ContaError::backup_not_found(file_name));
        }

        let backup = codec::decode(&fs::read(&path)?)
            .map_err(|e| e.with_param("file", file_name))?;
        debug!(
            file = %file_name,
            clients = backup.data.clients.len(),
            billings = backup.data.billings.len(),
            services = backup.data.services.len(),
            "restoring backup"
        );

        self.storage.replace_all(backup.data.into())?;
        self.storage
            .audit()
            .log(&AuditEntry::restored(backup.meta.backup_id, file_name))?;

        info!(file = %file_name, backup_id = %backup.meta.backup_id, "backup restored");
        Ok(backup.meta)
    }

    /// Write today's backup unless it already exists
    pub fn ensure_today(&self) -> ContaResult<Option<BackupFile>> {
        self.ensure_on(Local::now().date_naive())
    }

    fn ensure_on(&self, date: NaiveDate) -> ContaResult<Option<BackupFile>> {
        if self.backup_dir.join(file_name_for(date)).exists() {
            debug!(%date, "backup for today already present");
            return Ok(None);
        }
        self.create_on(date, BackupSource::Local).map(Some)
    }
}
