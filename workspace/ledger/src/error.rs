use thiserror::Error;

/// Error types for the ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Input rejected before any I/O. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested row does not exist for this user
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A unit of background work exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        LedgerError::NotFound(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }
}

/// A due-processing batch that stopped on its first error.
///
/// `created` is the number of entries materialized before the failure; those
/// entries are persisted and are not rolled back.
#[derive(Error, Debug)]
#[error("due processing stopped after {created} created entries: {source}")]
pub struct BatchError {
    pub created: usize,
    #[source]
    pub source: LedgerError,
}

impl BatchError {
    pub fn new(created: usize, source: LedgerError) -> Self {
        Self { created, source }
    }
}

/// Type alias for Result with LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;
