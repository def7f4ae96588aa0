//! Row-oriented record sets with an explicit, ordered column list.

use super::value::Value;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

/// A positional row, as wide as its record set's column list.
pub type Row = Vec<Value>;

/// Ordered columns plus ordered rows.
///
/// The column order is part of the contract: fetched sets carry their table's
/// fixed column list, merged sets carry the merge's column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl RecordSet {
    /// Build a record set. Rows narrower than the column list are padded with
    /// `Null`; wider rows are truncated.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// An empty set with the given columns.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell lookup by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Append a row, padding or truncating it to the column width.
    pub fn push_row(&mut self, mut row: Row) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Rename columns in place through `rename`; names it returns `None`
    /// for are left untouched.
    pub fn rename_columns<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        for col in &mut self.columns {
            if let Some(new_name) = rename(col) {
                *col = new_name;
            }
        }
    }

    /// Concatenate `other` below `self`.
    ///
    /// The column list becomes the union of both (existing order first, new
    /// columns appended); cells missing on either side are `Null`. Rows are
    /// kept as-is, duplicates included.
    pub fn append(&mut self, other: RecordSet) {
        if other.columns.is_empty() && other.rows.is_empty() {
            return;
        }

        let mut positions = Vec::with_capacity(other.columns.len());
        let mut grew = false;
        for col in &other.columns {
            match self.column_index(col) {
                Some(idx) => positions.push(idx),
                None => {
                    self.columns.push(col.clone());
                    positions.push(self.columns.len() - 1);
                    grew = true;
                }
            }
        }

        let width = self.columns.len();
        if grew {
            for row in &mut self.rows {
                row.resize(width, Value::Null);
            }
        }

        for row in other.rows {
            let mut out = vec![Value::Null; width];
            for (value, &pos) in row.into_iter().zip(&positions) {
                out[pos] = value;
            }
            self.rows.push(out);
        }
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json_rows(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::with_capacity(self.columns.len());
                for (col, value) in self.columns.iter().zip(row) {
                    let json = serde_json::to_value(value).unwrap_or(JsonValue::Null);
                    obj.insert(col.clone(), json);
                }
                JsonValue::Object(obj)
            })
            .collect()
    }

    /// Rows as name → value maps, for callers that want keyed access.
    pub fn records(&self) -> Vec<HashMap<&str, &Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(String::as_str)
                    .zip(row.iter())
                    .collect()
            })
            .collect()
    }
}
