//! In-process storage backend.
//!
//! Holds rows per table and answers [`TableQuery`]s with the same predicate
//! semantics as the database: inclusive date range, exact instrument match,
//! exact series match for cash-market tables. Failures can be injected per
//! instrument or at connect time, and connect/close/query activity is
//! counted so callers can check how a call used its connection.

use super::{Connection, Storage, TableQuery};
use crate::config::DbConfig;
use crate::data::record::Row;
use crate::data::table::TableId;
use crate::data::value::Value;
use crate::error::StorageError;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    tables: HashMap<TableId, Vec<Row>>,
    failing_instruments: HashSet<String>,
    connect_error: Option<String>,
    connects: AtomicUsize,
    closes: AtomicUsize,
    executed: Mutex<Vec<TableQuery>>,
}

// Builders run before the storage is shared; once a clone exists, changes go
// to a private copy with fresh counters.
impl Clone for Inner {
    fn clone(&self) -> Self {
        Self {
            tables: self.tables.clone(),
            failing_instruments: self.failing_instruments.clone(),
            connect_error: self.connect_error.clone(),
            ..Self::default()
        }
    }
}

/// In-memory tables behind the [`Storage`] contract.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner_mut(&mut self) -> &mut Inner {
        Arc::make_mut(&mut self.inner)
    }

    /// Add a row to a table. The row is padded or truncated to the table's
    /// column count.
    pub fn insert(&mut self, table: TableId, mut row: Row) -> &mut Self {
        row.resize(table.columns().len(), Value::Null);
        self.inner_mut().tables.entry(table).or_default().push(row);
        self
    }

    /// Add a row given as `(column, value)` pairs; unnamed columns are `Null`.
    pub fn insert_named<I, S>(&mut self, table: TableId, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let mut row = vec![Value::Null; table.columns().len()];
        for (name, value) in cells {
            if let Some(idx) = table.column_index(name.as_ref()) {
                row[idx] = value;
            }
        }
        self.insert(table, row)
    }

    /// Make every query for `instrument` fail with a query error.
    pub fn fail_instrument(&mut self, instrument: impl Into<String>) -> &mut Self {
        self.inner_mut()
            .failing_instruments
            .insert(instrument.into());
        self
    }

    /// Make `connect` fail.
    pub fn fail_connect(&mut self, reason: impl Into<String>) -> &mut Self {
        self.inner_mut().connect_error = Some(reason.into());
        self
    }

    /// Number of successful and failed `connect` calls.
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Number of connections closed.
    pub fn close_count(&self) -> usize {
        self.inner.closes.load(Ordering::SeqCst)
    }

    /// Every query executed so far, in order.
    pub fn executed(&self) -> Vec<TableQuery> {
        self.inner
            .executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: TableId) -> usize {
        self.inner.tables.get(&table).map_or(0, Vec::len)
    }
}

impl Storage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn connect(&self, _config: &DbConfig) -> Result<Box<dyn Connection>, StorageError> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.inner.connect_error {
            return Err(StorageError::Connection(reason.clone()));
        }
        Ok(Box::new(MemoryConnection {
            inner: Arc::clone(&self.inner),
            closed: false,
        }))
    }
}

struct MemoryConnection {
    inner: Arc<Inner>,
    closed: bool,
}

impl Connection for MemoryConnection {
    fn execute(&mut self, query: &TableQuery) -> Result<Vec<Row>, StorageError> {
        if self.closed {
            return Err(StorageError::Query("connection is closed".into()));
        }
        if let Ok(mut log) = self.inner.executed.lock() {
            log.push(query.clone());
        }

        let table = query.table;
        if query.params.len() != table.parameter_count() {
            return Err(StorageError::Query(format!(
                "{table} expects {} parameters, got {}",
                table.parameter_count(),
                query.params.len()
            )));
        }
        if self.inner.failing_instruments.contains(&query.instrument) {
            return Err(StorageError::Query(format!(
                "query on {table} failed for '{}'",
                query.instrument
            )));
        }

        let date_idx = column_position(table, table.date_column())?;
        let symbol_idx = column_position(table, table.symbol_column())?;
        let series_filter = match table.series_column() {
            Some(col) => {
                let series = query.series.as_deref().ok_or_else(|| {
                    StorageError::Query(format!("{table} requires a series parameter"))
                })?;
                Some((column_position(table, col)?, series))
            }
            None => None,
        };

        let rows = self
            .inner
            .tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        row[date_idx]
                            .as_date()
                            .is_some_and(|d| query.range.contains(d))
                    })
                    .filter(|row| row[symbol_idx].as_str() == Some(query.instrument.as_str()))
                    .filter(|row| match series_filter {
                        Some((idx, series)) => row[idx].as_str() == Some(series),
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(rows)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.inner.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn column_position(table: TableId, column: &str) -> Result<usize, StorageError> {
    table
        .column_index(column)
        .ok_or_else(|| StorageError::Query(format!("{table} has no column {column}")))
}
