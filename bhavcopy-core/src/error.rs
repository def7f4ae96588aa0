//! Error taxonomy for bhavcopy retrieval.
//!
//! Validation problems are caught before any connection is opened. Storage
//! problems split into connection failures (always propagated) and query
//! failures (handled per item by the fan-out, depending on its policy).

use chrono::NaiveDate;
use thiserror::Error;

/// Input problems detected before any fetch is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid date '{input}': {reason}")]
    InvalidDate { input: String, reason: String },

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("instruments must be a non-empty list")]
    EmptyInstruments,

    #[error("series must be a non-empty list for cash-market queries")]
    EmptySeries,
}

/// Errors raised by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Top-level error for a bhavcopy call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BhavcopyError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("unknown table '{name}'")]
    UnknownTable { name: String },
}

impl From<StorageError> for BhavcopyError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Connection(msg) => BhavcopyError::Connection(msg),
            StorageError::Query(msg) => BhavcopyError::Query(msg),
        }
    }
}

impl BhavcopyError {
    /// True for errors that happen before the storage is touched.
    pub fn is_validation(&self) -> bool {
        matches!(self, BhavcopyError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_map_onto_call_errors() {
        let conn: BhavcopyError = StorageError::Connection("refused".into()).into();
        assert_eq!(conn, BhavcopyError::Connection("refused".into()));

        let query: BhavcopyError = StorageError::Query("bad predicate".into()).into();
        assert_eq!(query, BhavcopyError::Query("bad predicate".into()));
    }

    #[test]
    fn validation_is_flagged() {
        let err: BhavcopyError = ValidationError::EmptyInstruments.into();
        assert!(err.is_validation());
        assert!(!BhavcopyError::Query("x".into()).is_validation());
    }

    #[test]
    fn messages_name_the_input() {
        let err = ValidationError::InvalidDate {
            input: "31-31-2023".into(),
            reason: "unrecognised format".into(),
        };
        assert!(err.to_string().contains("31-31-2023"));
    }
}
