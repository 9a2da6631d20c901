//! Closed set of failures the store itself can report

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// A unique key already exists
    UniqueViolation,
    /// A row references a missing parent
    ForeignKeyViolation,
    /// Update or delete of a row that is not there
    RecordNotFound,
    /// A writer panicked while holding a table lock
    LockPoisoned,
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UniqueViolation => "unique constraint violated",
            Self::ForeignKeyViolation => "foreign key constraint violated",
            Self::RecordNotFound => "record not found",
            Self::LockPoisoned => "lock poisoned",
        };
        f.write_str(label)
    }
}

/// Store failure with the table or constraint it concerns
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} on {target}")]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub target: &'static str,
}

impl StoreError {
    pub fn unique(target: &'static str) -> Self {
        Self {
            code: StoreErrorCode::UniqueViolation,
            target,
        }
    }

    pub fn foreign_key(target: &'static str) -> Self {
        Self {
            code: StoreErrorCode::ForeignKeyViolation,
            target,
        }
    }

    pub fn not_found(target: &'static str) -> Self {
        Self {
            code: StoreErrorCode::RecordNotFound,
            target,
        }
    }

    pub fn poisoned(target: &'static str) -> Self {
        Self {
            code: StoreErrorCode::LockPoisoned,
            target,
        }
    }
}
