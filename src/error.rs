//! Error types for Conta Certa
//!
//! Every error carries a stable machine-readable code and an HTTP-like status
//! so the presentation layer can localize it. Nothing in here is a
//! user-facing sentence.

use std::collections::BTreeMap;
use std::io;

use thiserror::Error;

use crate::storage::{StoreError, StoreErrorCode};

/// Interpolation parameters attached to an error code
pub type ErrorParams = BTreeMap<String, String>;

/// Broad error category, mirrored on the wire as a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, addressable to a form field
    Validation,
    /// Entity does not exist
    NotFound,
    /// Unique key or reference conflict
    Conflict,
    /// Filesystem failure
    StorageIo,
    /// Integrity check failed
    CorruptedData,
    /// Anything else
    Unexpected,
}

impl ErrorKind {
    /// HTTP-like status for this kind
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::StorageIo | Self::CorruptedData | Self::Unexpected => 500,
        }
    }
}

/// The main error type for Conta Certa operations
#[derive(Error, Debug)]
pub enum ContaError {
    /// A field failed validation
    #[error("Validation error on '{field}': {code}")]
    Validation {
        code: &'static str,
        field: &'static str,
    },

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        code: &'static str,
        entity_type: &'static str,
        identifier: String,
    },

    /// Domain-level conflict (e.g. deleting a client that still has billings)
    #[error("Conflict: {code}")]
    Conflict {
        code: &'static str,
        params: ErrorParams,
    },

    /// Raw store failure, mapped onto the taxonomy by [`ContaError::kind`]
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Filesystem errors
    #[error("I/O error ({code}): {detail}")]
    StorageIo { code: &'static str, detail: String },

    /// Integrity failures (backup hash mismatch, unreadable settings)
    #[error("Corrupted data ({code}): {detail}")]
    CorruptedData {
        code: &'static str,
        detail: String,
        params: ErrorParams,
    },

    /// Catch-all
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ContaError {
    pub fn validation(code: &'static str, field: &'static str) -> Self {
        Self::Validation { code, field }
    }

    /// Create a "not found" error for clients
    pub fn client_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            code: "CLIENT.CLIENT_NOT_FOUND",
            entity_type: "Client",
            identifier: identifier.to_string(),
        }
    }

    /// Create a "not found" error for catalog services
    pub fn service_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            code: "SERVICE.SERVICE_NOT_FOUND",
            entity_type: "Service",
            identifier: identifier.to_string(),
        }
    }

    /// Create a "not found" error for billings
    pub fn billing_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            code: "BILLING.BILLING_NOT_FOUND",
            entity_type: "Billing",
            identifier: identifier.to_string(),
        }
    }

    /// Create a "not found" error for backup files
    pub fn backup_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            code: "BACKUP.BACKUP_NOT_FOUND",
            entity_type: "Backup",
            identifier: identifier.to_string(),
        }
    }

    pub fn conflict(code: &'static str) -> Self {
        Self::Conflict {
            code,
            params: ErrorParams::new(),
        }
    }

    pub fn corrupted_backup(detail: impl Into<String>) -> Self {
        Self::CorruptedData {
            code: "BACKUP.INVALID_OR_CORRUPTED_BACKUP",
            detail: detail.into(),
            params: ErrorParams::new(),
        }
    }

    /// Attach an interpolation parameter (only kept on variants that carry params)
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        match &mut self {
            Self::Conflict { params, .. } | Self::CorruptedData { params, .. } => {
                params.insert(key.to_string(), value.into());
            }
            _ => {}
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Store(err) => match err.code {
                StoreErrorCode::UniqueViolation | StoreErrorCode::ForeignKeyViolation => {
                    ErrorKind::Conflict
                }
                StoreErrorCode::RecordNotFound => ErrorKind::NotFound,
                StoreErrorCode::LockPoisoned => ErrorKind::Unexpected,
            },
            Self::StorageIo { .. } => ErrorKind::StorageIo,
            Self::CorruptedData { .. } => ErrorKind::CorruptedData,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Stable code used for localization
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { code, .. }
            | Self::NotFound { code, .. }
            | Self::Conflict { code, .. }
            | Self::StorageIo { code, .. }
            | Self::CorruptedData { code, .. } => code,
            Self::Store(err) => match err.code {
                StoreErrorCode::UniqueViolation => "DB.ALREADY_EXISTS",
                StoreErrorCode::ForeignKeyViolation => "DB.REFERENCE_VIOLATION",
                StoreErrorCode::RecordNotFound => "DB.RECORD_NOT_FOUND",
                StoreErrorCode::LockPoisoned => "DB.UNKNOWN_ERROR",
            },
            Self::Unexpected(_) => "UNEXPECTED_ERROR",
        }
    }

    pub fn status(&self) -> u16 {
        self.kind().status()
    }

    /// Interpolation parameters for the presentation layer
    pub fn params(&self) -> ErrorParams {
        let mut params = ErrorParams::new();
        match self {
            Self::Validation { field, .. } => {
                params.insert("field".into(), (*field).into());
            }
            Self::NotFound { identifier, .. } => {
                params.insert("id".into(), identifier.clone());
            }
            Self::Conflict { params: p, .. } | Self::CorruptedData { params: p, .. } => {
                params.extend(p.clone());
            }
            Self::Store(err) => {
                params.insert("target".into(), err.target.to_string());
            }
            Self::StorageIo { .. } | Self::Unexpected(_) => {}
        }
        params
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if this is a unique-key violation coming from the store
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Store(StoreError { code: StoreErrorCode::UniqueViolation, .. }))
    }
}

/// Map a low-level I/O error kind onto a user-safe code
fn io_error_code(kind: io::ErrorKind) -> &'static str {
    match kind {
        io::ErrorKind::NotFound => "FS.PATH_NOT_FOUND",
        io::ErrorKind::PermissionDenied => "FS.PERMISSION_DENIED",
        io::ErrorKind::ResourceBusy => "FS.FILE_BUSY",
        io::ErrorKind::StorageFull => "FS.DISK_FULL",
        io::ErrorKind::IsADirectory => "FS.IS_A_DIRECTORY",
        io::ErrorKind::NotADirectory => "FS.NOT_A_DIRECTORY",
        io::ErrorKind::InvalidInput => "FS.INVALID_PATH",
        _ => "FS.UNEXPECTED",
    }
}

impl From<io::Error> for ContaError {
    fn from(err: io::Error) -> Self {
        Self::StorageIo {
            code: io_error_code(err.kind()),
            detail: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ContaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unexpected(format!("JSON error: {}", err))
    }
}

/// Result type alias for Conta Certa operations
pub type ContaResult<T> = Result<T, ContaError>;
