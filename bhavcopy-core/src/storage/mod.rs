//! Storage collaborator: connection acquisition and query execution.
//!
//! The fan-out only ever talks to [`Storage`] and [`Connection`], so the
//! Postgres backend can be swapped for the in-memory one in tests and demos.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

use crate::config::DbConfig;
use crate::data::date::DateRange;
use crate::data::record::Row;
use crate::data::table::TableId;
use crate::data::value::Value;
use crate::error::StorageError;
use tracing::warn;

/// A fully shaped, parameterized query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub table: TableId,
    pub sql: String,
    pub params: Vec<Value>,
    pub range: DateRange,
    pub instrument: String,
    pub series: Option<String>,
}

/// Opens connections.
pub trait Storage: Send + Sync {
    /// Human-readable name of this backend.
    fn name(&self) -> &str;

    /// Open a connection. Fails with [`StorageError::Connection`] when the
    /// host is unreachable or the credentials are rejected.
    fn connect(&self, config: &DbConfig) -> Result<Box<dyn Connection>, StorageError>;
}

/// An open connection.
pub trait Connection {
    /// Run a query and return its rows positionally, in the query's column
    /// order. Fails with [`StorageError::Query`].
    fn execute(&mut self, query: &TableQuery) -> Result<Vec<Row>, StorageError>;

    /// Release the connection. Idempotent; never fails.
    fn close(&mut self);
}

/// Holds a connection for the length of a call and closes it on drop, so
/// every exit path releases it.
pub struct ConnectionGuard {
    conn: Box<dyn Connection>,
}

impl ConnectionGuard {
    pub fn new(conn: Box<dyn Connection>) -> Self {
        Self { conn }
    }

    pub fn connection(&mut self) -> &mut dyn Connection {
        self.conn.as_mut()
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.conn.close();
    }
}

/// Acquire a guarded connection.
pub fn open(storage: &dyn Storage, config: &DbConfig) -> Result<ConnectionGuard, StorageError> {
    match storage.connect(config) {
        Ok(conn) => Ok(ConnectionGuard::new(conn)),
        Err(e) => {
            warn!(backend = storage.name(), host = %config.hostname, error = %e, "connect failed");
            Err(e)
        }
    }
}
