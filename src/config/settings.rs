//! Application settings
//!
//! A flat document persisted as `settings.json`. Missing keys fall back to
//! their defaults so older files keep loading.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::paths::ContaPaths;
use crate::error::{ContaError, ContaResult, ErrorParams};
use crate::storage::file_io::write_json_atomic;

/// UI theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    System,
}

/// UI language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub language: Language,

    #[serde(default = "enabled")]
    pub auto_update: bool,

    /// Run the recurring billing generator at start-up
    #[serde(default = "enabled")]
    pub auto_billing: bool,

    /// Write today's backup at start-up if missing
    #[serde(default = "enabled")]
    pub auto_backup: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            theme: Theme::default(),
            language: Language::default(),
            auto_update: true,
            auto_billing: true,
            auto_backup: true,
        }
    }
}

impl Settings {
    /// Load settings, writing the defaults first if the file is missing
    pub fn get_or_create(paths: &ContaPaths) -> ContaResult<Self> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            debug!(path = %settings_path.display(), "writing default settings");
            let settings = Settings::default();
            settings.save(paths)?;
            return Ok(settings);
        }

        let contents = std::fs::read_to_string(&settings_path)?;
        serde_json::from_str(&contents).map_err(|e| ContaError::CorruptedData {
            code: "SETTINGS.INVALID_SETTINGS_FILE",
            detail: e.to_string(),
            params: ErrorParams::new(),
        })
    }

    /// Persist settings atomically
    pub fn save(&self, paths: &ContaPaths) -> ContaResult<()> {
        write_json_atomic(paths.settings_file(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.language, Language::PtBr);
        assert!(settings.auto_billing);
        assert!(settings.auto_backup);
    }

    #[test]
    fn test_get_or_create_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContaPaths::with_base_dir(temp_dir.path());

        let settings = Settings::get_or_create(&paths).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(paths.settings_file().exists());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContaPaths::with_base_dir(temp_dir.path());

        let settings = Settings {
            theme: Theme::Light,
            language: Language::EnUs,
            auto_billing: false,
            ..Settings::default()
        };
        settings.save(&paths).unwrap();

        let loaded = Settings::get_or_create(&paths).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["language"], "pt-BR");
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["autoBackup"], true);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"theme":"system"}"#).unwrap();
        assert_eq!(settings.theme, Theme::System);
        assert!(settings.auto_update);
    }

    #[test]
    fn test_malformed_file_is_corrupted_data() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ContaPaths::with_base_dir(temp_dir.path());
        std::fs::write(paths.settings_file(), "{ not json").unwrap();

        let err = Settings::get_or_create(&paths).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptedData);
        assert_eq!(err.code(), "SETTINGS.INVALID_SETTINGS_FILE");
    }
}
