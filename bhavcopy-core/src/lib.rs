//! Bhavcopy Core: schema reconciliation for historical market-data records.
//!
//! This crate retrieves daily bhavcopy records from two parallel storage
//! schemas and reconciles them into one table per query:
//! - Date normalization and range validation
//! - Legacy-to-canonical column mapping
//! - Per-table record fetching through a pluggable storage backend
//! - Full outer join of the canonical and mapped legacy results
//! - Fan-out across instruments and series with per-item failure handling
//! - Polars export of the merged result

pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod storage;

pub use client::BhavcopyClient;
pub use config::DbConfig;
pub use error::{BhavcopyError, StorageError, ValidationError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: result and query types can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<data::RecordSet>();
        require_sync::<data::RecordSet>();
        require_send::<data::AggregateResult>();
        require_sync::<data::AggregateResult>();
        require_send::<data::QuerySpec>();
        require_sync::<data::QuerySpec>();
        require_send::<DbConfig>();
        require_sync::<DbConfig>();
        require_send::<BhavcopyError>();
        require_sync::<BhavcopyError>();

        require_send::<BhavcopyClient>();
        require_sync::<BhavcopyClient>();
        require_send::<storage::MemoryStorage>();
        require_sync::<storage::MemoryStorage>();
        require_send::<storage::PostgresStorage>();
        require_sync::<storage::PostgresStorage>();
    }
}
