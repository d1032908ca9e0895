//! # Error Module
//!
//! One error type for the whole core. Classification and aggregation never
//! fail; errors only come from the store boundary, from transfer planning,
//! and from parsing user-supplied identifiers.

use thiserror::Error;

/// Errors produced by the enlist core.
#[derive(Debug, Error)]
pub enum EnlistError {
    /// Backend storage failed (redb open, transaction, table or commit).
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A batch write contained an id that already exists.
    #[error("duplicate record id: {0}")]
    DuplicateRecord(String),

    /// An update targeted an id that does not exist.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// The transfer produced no candidates; nothing was written.
    #[error("no records eligible for transfer from {source_year} to {target_year}")]
    EmptyTransfer { source_year: i32, target_year: i32 },

    /// The target year does not come after the source year.
    #[error("invalid transfer: target year {target_year} must be after {source_year}")]
    InvalidTransferYears { source_year: i32, target_year: i32 },

    /// The target cohort already holds records; a second transfer would duplicate them.
    #[error("target year {year} already has {count} records")]
    TargetCohortNotEmpty { year: i32, count: usize },

    /// A list identifier could not be parsed.
    #[error("unknown list: {0}")]
    UnknownList(String),

    /// A status name could not be parsed.
    #[error("unknown status: {0}")]
    UnknownStatus(String),

    /// A stored value carries a format version this build cannot read.
    #[error("unsupported record format version: {0}")]
    UnsupportedFormat(u8),
}

impl EnlistError {
    /// Wrap any redb error kind.
    pub fn storage<E: Into<redb::Error>>(err: E) -> Self {
        Self::Storage(err.into().to_string())
    }
}

impl From<postcard::Error> for EnlistError {
    fn from(err: postcard::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, EnlistError>;
