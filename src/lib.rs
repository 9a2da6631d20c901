//! Conta Certa - client billing for small accounting offices
//!
//! Keeps a register of clients with a monthly fee, a catalog of extra
//! services, and one billing per client and month whose total is the fee
//! plus its service lines. Data lives in local JSON files, and dated backups
//! are gzip-compressed and SHA-256 verified.
//!
//! # Architecture
//!
//! - `config`: paths and application settings
//! - `error`: error taxonomy with stable codes
//! - `models`: clients, services, billings, money and ids
//! - `forms`: validation of incoming payloads
//! - `storage`: JSON file repositories and the storage gate
//! - `services`: business logic (CRUD, recurring billing, CSV import)
//! - `audit`: append-only change log
//! - `backup`: backup codec and manager
//! - `api`: request/response envelope over every operation
//! - `cli`: command handlers for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use conta_certa::api::ContaApi;
//! use conta_certa::config::ContaPaths;
//!
//! let api = ContaApi::open(ContaPaths::new()?)?;
//! let clients = api.fetch_clients(0, 30, "");
//! ```

pub mod api;
pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod forms;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{ContaError, ContaResult};
