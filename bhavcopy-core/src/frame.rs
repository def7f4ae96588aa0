//! Polars export of merged record sets.
//!
//! Column dtypes are inferred from the non-null cells of each column:
//! a uniform kind keeps its dtype, mixed integers and floats widen to
//! Float64, and anything else falls back to String.
//!
//! Writes are atomic: the file is written to `{path}.tmp` and renamed into
//! place, so a failed export never leaves a truncated file behind.

use crate::data::record::RecordSet;
use crate::data::value::{Value, ValueKind};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported output format for {0} (expected .csv, .parquet or .json)")]
    UnsupportedFormat(PathBuf),
}

/// Export format, chosen from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
    Json,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, FrameError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(OutputFormat::Csv),
            Some("parquet") | Some("pq") => Ok(OutputFormat::Parquet),
            Some("json") => Ok(OutputFormat::Json),
            _ => Err(FrameError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Build a DataFrame with one typed column per record-set column.
pub fn to_dataframe(records: &RecordSet) -> Result<DataFrame, FrameError> {
    let columns = records
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Value> = records.rows().iter().map(|row| &row[idx]).collect();
            build_column(name, &cells)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DataFrame::new(columns)?)
}

fn infer_kind(cells: &[&Value]) -> ValueKind {
    let mut kind = ValueKind::Null;
    for cell in cells {
        let k = cell.kind();
        kind = match (kind, k) {
            (_, ValueKind::Null) => kind,
            (ValueKind::Null, k) => k,
            (a, b) if a == b => a,
            (ValueKind::Int, ValueKind::Float) | (ValueKind::Float, ValueKind::Int) => {
                ValueKind::Float
            }
            _ => return ValueKind::Text,
        };
    }
    kind
}

fn build_column(name: &str, cells: &[&Value]) -> Result<Column, FrameError> {
    let name: PlSmallStr = name.into();
    let column = match infer_kind(cells) {
        ValueKind::Bool => {
            let vals: Vec<Option<bool>> = cells
                .iter()
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Column::new(name, vals)
        }
        ValueKind::Int => {
            let vals: Vec<Option<i64>> = cells
                .iter()
                .map(|v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Column::new(name, vals)
        }
        ValueKind::Float => {
            let vals: Vec<Option<f64>> = cells.iter().map(|v| v.as_f64()).collect();
            Column::new(name, vals)
        }
        ValueKind::Date => {
            let epoch = unix_epoch();
            let vals: Vec<Option<i32>> = cells
                .iter()
                .map(|v| match v {
                    Value::Date(d) => Some((*d - epoch).num_days() as i32),
                    _ => None,
                })
                .collect();
            Column::new(name, vals).cast(&DataType::Date)?
        }
        ValueKind::Timestamp => {
            let vals: Vec<Option<i64>> = cells
                .iter()
                .map(|v| match v {
                    Value::Timestamp(ts) => Some(ts.and_utc().timestamp_millis()),
                    _ => None,
                })
                .collect();
            Column::new(name, vals)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        ValueKind::Text | ValueKind::Null => {
            let vals: Vec<Option<String>> = cells
                .iter()
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect();
            Column::new(name, vals)
        }
    };
    Ok(column)
}

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Write `records` as CSV with a header row.
pub fn write_csv(records: &RecordSet, path: &Path) -> Result<(), FrameError> {
    let mut df = to_dataframe(records)?;
    write_atomic(path, |file| {
        CsvWriter::new(file).include_header(true).finish(&mut df)?;
        Ok(())
    })
}

/// Write `records` as a single Parquet file.
pub fn write_parquet(records: &RecordSet, path: &Path) -> Result<(), FrameError> {
    let mut df = to_dataframe(records)?;
    write_atomic(path, |file| {
        ParquetWriter::new(file).finish(&mut df)?;
        Ok(())
    })
}

/// Write `records` as a JSON array of row objects.
pub fn write_json(records: &RecordSet, path: &Path) -> Result<(), FrameError> {
    let rows = records.to_json_rows();
    write_atomic(path, |file| {
        serde_json::to_writer_pretty(file, &rows)?;
        Ok(())
    })
}

/// Write in the format implied by `path`'s extension.
pub fn write(records: &RecordSet, path: &Path) -> Result<OutputFormat, FrameError> {
    let format = OutputFormat::from_path(path)?;
    match format {
        OutputFormat::Csv => write_csv(records, path)?,
        OutputFormat::Parquet => write_parquet(records, path)?,
        OutputFormat::Json => write_json(records, path)?,
    }
    debug!(path = %path.display(), rows = records.len(), ?format, "export written");
    Ok(format)
}

fn write_atomic<F>(path: &Path, write: F) -> Result<(), FrameError>
where
    F: FnOnce(&mut File) -> Result<(), FrameError>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let result = File::create(&tmp)
        .map_err(io_err(tmp.as_path()))
        .and_then(|mut file| write(&mut file));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        FrameError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> FrameError {
    let path = path.to_path_buf();
    move |source| FrameError::Io { path, source }
}
