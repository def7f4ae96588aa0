//! Per-table record retrieval.
//!
//! Every query is shaped entirely by its [`TableId`]: the select list is the
//! table's fixed column list, and the predicates are the inclusive date range,
//! an exact instrument match and, for cash-market tables, an exact series
//! match. Rows come back positionally and are wrapped into that column list.

use super::date::DateRange;
use super::record::RecordSet;
use super::table::TableId;
use super::value::Value;
use crate::error::BhavcopyError;
use crate::storage::{Connection, TableQuery};
use tracing::debug;

/// Build the parameterized query for one (table, range, instrument, series).
///
/// Cash-market tables require a series; passing `None` for one is a query
/// error. Derivatives tables ignore `series`.
pub fn build_query(
    table: TableId,
    range: DateRange,
    instrument: &str,
    series: Option<&str>,
) -> Result<TableQuery, BhavcopyError> {
    let mut sql = format!(
        "SELECT {} FROM {} WHERE {date} >= $1 AND {date} <= $2 AND {} = $3",
        table.columns().join(", "),
        table.table_name(),
        table.symbol_column(),
        date = table.date_column(),
    );
    let mut params = vec![
        Value::Date(range.start),
        Value::Date(range.end),
        Value::from(instrument),
    ];

    let series = match table.series_column() {
        Some(col) => {
            let series = series.ok_or_else(|| {
                BhavcopyError::Query(format!("{table} requires a series for '{instrument}'"))
            })?;
            sql.push_str(&format!(" AND {col} = $4"));
            params.push(Value::from(series));
            Some(series.to_string())
        }
        None => None,
    };

    Ok(TableQuery {
        table,
        sql,
        params,
        range,
        instrument: instrument.to_string(),
        series,
    })
}

/// Fetch one table's rows for one item over an open connection.
pub fn fetch(
    conn: &mut dyn Connection,
    table: TableId,
    range: DateRange,
    instrument: &str,
    series: Option<&str>,
) -> Result<RecordSet, BhavcopyError> {
    let query = build_query(table, range, instrument, series)?;
    let rows = conn.execute(&query)?;

    let width = table.columns().len();
    if let Some(bad) = rows.iter().find(|row| row.len() != width) {
        return Err(BhavcopyError::Query(format!(
            "{table} returned a row of width {}, expected {width}",
            bad.len()
        )));
    }

    debug!(
        table = %table,
        instrument,
        series = series.unwrap_or("-"),
        rows = rows.len(),
        "fetched"
    );

    Ok(RecordSet::new(
        table.columns().iter().map(|c| c.to_string()).collect(),
        rows,
    ))
}
