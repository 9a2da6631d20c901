//! Configuration module for Conta Certa
//!
//! Path resolution and the persisted application settings.

pub mod paths;
pub mod settings;

pub use paths::ContaPaths;
pub use settings::{Language, Settings, Theme};
