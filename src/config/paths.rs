//! Path management for Conta Certa
//!
//! ## Path Resolution Order
//!
//! 1. `CONTA_CERTA_DATA_DIR` environment variable (if set)
//! 2. The platform's per-user config directory, as reported by
//!    `directories::ProjectDirs` (e.g. `~/.config/conta-certa` on Linux)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{ContaError, ContaResult};

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "CONTA_CERTA_DATA_DIR";

/// Manages all paths used by Conta Certa
#[derive(Debug, Clone)]
pub struct ContaPaths {
    base_dir: PathBuf,
}

impl ContaPaths {
    /// Resolve the base directory from the environment or the platform
    pub fn new() -> ContaResult<Self> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => ProjectDirs::from("br", "ContaCerta", "conta-certa")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    ContaError::Unexpected("Could not determine a home directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Use an explicit base directory (tests, portable installs)
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    pub fn clients_file(&self) -> PathBuf {
        self.data_dir().join("clients.json")
    }

    /// Catalog services
    pub fn services_file(&self) -> PathBuf {
        self.data_dir().join("services.json")
    }

    /// Billings together with their line items
    pub fn billings_file(&self) -> PathBuf {
        self.data_dir().join("billings.json")
    }

    /// Create base, data and backup directories (idempotent)
    pub fn ensure_directories(&self) -> ContaResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.backup_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContaPaths::with_base_dir(temp_dir.path());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.data_dir(), temp_dir.path().join("data"));
        assert_eq!(paths.backup_dir(), temp_dir.path().join("backups"));
    }

    #[test]
    fn test_ensure_directories_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContaPaths::with_base_dir(temp_dir.path().join("nested"));

        paths.ensure_directories().unwrap();
        paths.ensure_directories().unwrap();

        assert!(paths.data_dir().exists());
        assert!(paths.backup_dir().exists());
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContaPaths::with_base_dir(temp_dir.path());

        assert_eq!(paths.settings_file(), temp_dir.path().join("settings.json"));
        assert_eq!(
            paths.billings_file(),
            temp_dir.path().join("data").join("billings.json")
        );
        assert_eq!(
            paths.clients_file(),
            temp_dir.path().join("data").join("clients.json")
        );
    }
}
