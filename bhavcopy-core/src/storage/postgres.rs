//! Postgres backend on sqlx.
//!
//! sqlx is async; this backend owns a current-thread tokio runtime and
//! blocks on each call so the rest of the crate stays synchronous.

use super::{Connection, Storage, TableQuery};
use crate::config::DbConfig;
use crate::data::record::Row;
use crate::data::value::Value;
use crate::error::StorageError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Connection as _, Postgres, Row as _, TypeInfo, ValueRef};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Storage backed by a Postgres server.
pub struct PostgresStorage {
    runtime: Arc<Runtime>,
}

impl PostgresStorage {
    pub fn new() -> Result<Self, StorageError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StorageError::Connection(format!("runtime start failed: {e}")))?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }
}

fn connect_options(config: &DbConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.hostname)
        .port(config.port)
        .database(&config.database)
        .username(&config.username)
        .password(&config.password)
}

impl Storage for PostgresStorage {
    fn name(&self) -> &str {
        "postgres"
    }

    fn connect(&self, config: &DbConfig) -> Result<Box<dyn Connection>, StorageError> {
        let options = connect_options(config);
        let conn = self
            .runtime
            .block_on(PgConnection::connect_with(&options))
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        debug!(host = %config.hostname, database = %config.database, "postgres connection open");
        Ok(Box::new(PostgresConnection {
            runtime: Arc::clone(&self.runtime),
            conn: Some(conn),
        }))
    }
}

struct PostgresConnection {
    runtime: Arc<Runtime>,
    conn: Option<PgConnection>,
}

impl Connection for PostgresConnection {
    fn execute(&mut self, query: &TableQuery) -> Result<Vec<Row>, StorageError> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| StorageError::Query("connection is closed".into()))?;

        let mut stmt = sqlx::query(&query.sql);
        for param in &query.params {
            stmt = bind(stmt, param);
        }

        let rows = self
            .runtime
            .block_on(stmt.fetch_all(&mut *conn))
            .map_err(|e| StorageError::Query(format!("{}: {e}", query.table)))?;

        rows.iter().map(decode_row).collect()
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = self.runtime.block_on(conn.close()) {
                debug!(error = %e, "postgres close reported an error");
            }
        }
    }
}

fn bind<'q>(
    stmt: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => stmt.bind(None::<String>),
        Value::Bool(b) => stmt.bind(*b),
        Value::Int(i) => stmt.bind(*i),
        Value::Float(x) => stmt.bind(*x),
        Value::Decimal(d) => stmt.bind(*d),
        Value::Text(s) => stmt.bind(s.clone()),
        Value::Date(d) => stmt.bind(*d),
        Value::Timestamp(ts) => stmt.bind(*ts),
    }
}

fn decode_row(row: &PgRow) -> Result<Row, StorageError> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &PgRow, idx: usize) -> Result<Value, StorageError> {
    let (is_null, type_name) = {
        let raw = row.try_get_raw(idx).map_err(decode_err)?;
        (raw.is_null(), raw.type_info().name().to_string())
    };
    if is_null {
        return Ok(Value::Null);
    }

    let value = match type_name.as_str() {
        "BOOL" => Value::Bool(row.try_get::<bool, _>(idx).map_err(decode_err)?),
        "INT2" => Value::Int(row.try_get::<i16, _>(idx).map_err(decode_err)?.into()),
        "INT4" => Value::Int(row.try_get::<i32, _>(idx).map_err(decode_err)?.into()),
        "INT8" => Value::Int(row.try_get::<i64, _>(idx).map_err(decode_err)?),
        "FLOAT4" => Value::Float(row.try_get::<f32, _>(idx).map_err(decode_err)?.into()),
        "FLOAT8" => Value::Float(row.try_get::<f64, _>(idx).map_err(decode_err)?),
        "NUMERIC" => Value::Decimal(row.try_get::<Decimal, _>(idx).map_err(decode_err)?),
        "DATE" => Value::Date(row.try_get::<NaiveDate, _>(idx).map_err(decode_err)?),
        "TIMESTAMP" => Value::Timestamp(row.try_get::<NaiveDateTime, _>(idx).map_err(decode_err)?),
        "TIMESTAMPTZ" => Value::Timestamp(
            row.try_get::<DateTime<Utc>, _>(idx)
                .map_err(decode_err)?
                .naive_utc(),
        ),
        _ => Value::Text(row.try_get::<String, _>(idx).map_err(decode_err)?),
    };
    Ok(value)
}

fn decode_err(e: sqlx::Error) -> StorageError {
    StorageError::Query(format!("decode failed: {e}"))
}
