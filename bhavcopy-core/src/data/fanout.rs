//! Fan-out orchestrator: runs one query across every instrument (and, for
//! cash-market queries, every series), merging both schemas per item and
//! concatenating the results.
//!
//! Per-item failures are handled according to a [`FailurePolicy`] and
//! recorded in a [`FanOutReport`], so a caller can tell a complete result
//! from a partial one.

use super::columns::map_columns;
use super::date::{normalize_range, DateInput, DateRange};
use super::fetch::fetch;
use super::merge::outer_join;
use super::record::RecordSet;
use super::table::Segment;
use crate::config::DbConfig;
use crate::error::{BhavcopyError, ValidationError};
use crate::storage::{self, Connection, Storage};
use serde::Serialize;
use tracing::{error, info, warn};

/// What to do when one item of the fan-out fails with a query error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailurePolicy {
    /// Log the failure, treat the item as empty and carry on.
    IsolatePerItem,
    /// Stop at the first failure and return what was accumulated so far.
    StopOnFirstError,
}

impl FailurePolicy {
    /// The policy each segment uses unless the caller overrides it.
    pub fn default_for(segment: Segment) -> Self {
        match segment {
            Segment::CashMarket => FailurePolicy::IsolatePerItem,
            Segment::Derivatives => FailurePolicy::StopOnFirstError,
        }
    }
}

/// An item that contributed no rows because it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub instrument: String,
    pub series: Option<String>,
    pub reason: String,
}

/// Side-channel account of a fan-out run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub items_attempted: usize,
    pub items_succeeded: usize,
    pub skipped: Vec<SkippedItem>,
    /// Set when [`FailurePolicy::StopOnFirstError`] cut the loop short.
    pub stopped_early: bool,
}

impl FanOutReport {
    /// True when every planned item ran and succeeded.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && !self.stopped_early
    }
}

/// Concatenated per-item results, in instrument then series order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    pub records: RecordSet,
    pub report: FanOutReport,
}

impl AggregateResult {
    /// An empty result means no matching data, not a failure.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// A validated, normalized query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuerySpec {
    pub segment: Segment,
    pub range: DateRange,
    pub instruments: Vec<String>,
    /// Empty for derivatives queries.
    pub series: Vec<String>,
}

impl QuerySpec {
    pub fn cash_market<I, S, J, T>(
        start: impl Into<DateInput>,
        end: impl Into<DateInput>,
        instruments: I,
        series: J,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let range = normalize_range(start, end)?;
        let instruments = collect_non_empty(instruments, ValidationError::EmptyInstruments)?;
        let series = collect_non_empty(series, ValidationError::EmptySeries)?;
        Ok(Self {
            segment: Segment::CashMarket,
            range,
            instruments,
            series,
        })
    }

    pub fn derivatives<I, S>(
        start: impl Into<DateInput>,
        end: impl Into<DateInput>,
        instruments: I,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let range = normalize_range(start, end)?;
        let instruments = collect_non_empty(instruments, ValidationError::EmptyInstruments)?;
        Ok(Self {
            segment: Segment::Derivatives,
            range,
            instruments,
            series: Vec::new(),
        })
    }

    /// Every (instrument, series) pair in fan-out order.
    pub fn items(&self) -> Vec<(&str, Option<&str>)> {
        if self.segment.uses_series() {
            self.instruments
                .iter()
                .flat_map(|i| self.series.iter().map(move |s| (i.as_str(), Some(s.as_str()))))
                .collect()
        } else {
            self.instruments.iter().map(|i| (i.as_str(), None)).collect()
        }
    }
}

fn collect_non_empty<I, S>(items: I, err: ValidationError) -> Result<Vec<String>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let items: Vec<String> = items.into_iter().map(Into::into).collect();
    if items.is_empty() {
        return Err(err);
    }
    Ok(items)
}

/// Run a validated query against `storage`.
///
/// Opens exactly one connection and closes it on every exit path. Connection
/// errors propagate; query errors are handled per `policy`.
pub fn run(
    storage: &dyn Storage,
    config: &DbConfig,
    query: &QuerySpec,
    policy: FailurePolicy,
) -> Result<AggregateResult, BhavcopyError> {
    let items = query.items();
    info!(
        segment = %query.segment,
        range = %query.range,
        items = items.len(),
        ?policy,
        "bhavcopy fan-out starting"
    );

    let mut guard = storage::open(storage, config)?;
    let conn = guard.connection();

    let mut records = RecordSet::default();
    let mut report = FanOutReport::default();

    for (instrument, series) in items {
        report.items_attempted += 1;
        info!(instrument, series = series.unwrap_or("-"), "fetching");

        match fetch_item(conn, query.segment, query.range, instrument, series) {
            Ok(merged) => {
                report.items_succeeded += 1;
                records.append(merged);
            }
            Err(e @ BhavcopyError::Connection(_)) => return Err(e),
            Err(e) => {
                error!(instrument, series = series.unwrap_or("-"), error = %e, "item failed");
                report.skipped.push(SkippedItem {
                    instrument: instrument.to_string(),
                    series: series.map(str::to_string),
                    reason: e.to_string(),
                });
                if policy == FailurePolicy::StopOnFirstError {
                    warn!(instrument, "stopping fan-out after first failure");
                    report.stopped_early = true;
                    break;
                }
            }
        }
    }

    info!(
        rows = records.len(),
        succeeded = report.items_succeeded,
        skipped = report.skipped.len(),
        "bhavcopy fan-out finished"
    );

    Ok(AggregateResult { records, report })
}

/// Fetch both schemas for one item, map the legacy side and merge with the
/// canonical side on the left.
fn fetch_item(
    conn: &mut dyn Connection,
    segment: Segment,
    range: DateRange,
    instrument: &str,
    series: Option<&str>,
) -> Result<RecordSet, BhavcopyError> {
    let (canonical, legacy) = segment.tables();
    let udiff = fetch(conn, canonical, range, instrument, series)?;
    let old = fetch(conn, legacy, range, instrument, series)?;
    let mapped = match legacy.mapping() {
        Some(mapping) => map_columns(old, mapping),
        None => old,
    };
    Ok(outer_join(&udiff, &mapped))
}
