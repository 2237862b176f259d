//! Store error type and fault classification

use std::io;

use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

/// Error raised by any data-access call
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// Classify the failure when it is one of the known store faults.
    pub fn fault(&self) -> Option<StoreFault> {
        match self {
            DbError::Sqlx(sqlx::Error::Database(db_err)) => db_err
                .try_downcast_ref::<MySqlDatabaseError>()
                .and_then(|e| StoreFault::from_error_number(e.number())),
            DbError::Sqlx(sqlx::Error::Io(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
                Some(StoreFault::ConnectionRefused)
            }
            _ => None,
        }
    }

    /// Driver message for the response body
    pub fn detail(&self) -> String {
        match self {
            DbError::Sqlx(sqlx::Error::Database(db_err)) => db_err.message().to_string(),
            DbError::Sqlx(e) => e.to_string(),
        }
    }
}

/// Known store faults with dedicated responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    DuplicateEntry,
    MissingReference,
    InvalidField,
    AccessDenied,
    ConnectionRefused,
    UnknownDatabase,
}

impl StoreFault {
    /// Map a MySQL server error number.
    pub fn from_error_number(number: u16) -> Option<Self> {
        match number {
            1062 => Some(StoreFault::DuplicateEntry),
            1216 | 1452 => Some(StoreFault::MissingReference),
            1054 => Some(StoreFault::InvalidField),
            1044 | 1045 => Some(StoreFault::AccessDenied),
            1049 => Some(StoreFault::UnknownDatabase),
            _ => None,
        }
    }

    /// Faults caused by the request rather than the deployment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreFault::DuplicateEntry | StoreFault::MissingReference | StoreFault::InvalidField
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            StoreFault::DuplicateEntry => "duplicate_entry",
            StoreFault::MissingReference => "missing_reference",
            StoreFault::InvalidField => "invalid_field",
            StoreFault::AccessDenied => "database_access_denied",
            StoreFault::ConnectionRefused => "database_unreachable",
            StoreFault::UnknownDatabase => "database_not_found",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            StoreFault::DuplicateEntry => "Duplicate entry",
            StoreFault::MissingReference => "Referenced record does not exist",
            StoreFault::InvalidField => "Invalid field in request",
            StoreFault::AccessDenied => "Database access denied",
            StoreFault::ConnectionRefused => "Database connection refused",
            StoreFault::UnknownDatabase => "Database does not exist",
        }
    }
}
