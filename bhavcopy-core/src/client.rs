//! Public call surface.

use crate::config::DbConfig;
use crate::data::date::{history_start, DateInput};
use crate::data::fanout::{self, AggregateResult, FailurePolicy, QuerySpec};
use crate::data::table::Segment;
use crate::error::BhavcopyError;
use crate::storage::Storage;
use chrono::Local;

/// Retrieves merged bhavcopies through a storage backend.
///
/// Each call validates its inputs, opens one connection, runs the fan-out
/// and closes the connection before returning.
pub struct BhavcopyClient {
    storage: Box<dyn Storage>,
    config: DbConfig,
    derivatives_policy: FailurePolicy,
}

impl BhavcopyClient {
    pub fn new(storage: Box<dyn Storage>, config: DbConfig) -> Self {
        Self {
            storage,
            config,
            derivatives_policy: FailurePolicy::default_for(Segment::Derivatives),
        }
    }

    /// Override how derivatives queries react to a failing instrument.
    /// The default stops at the first failure.
    pub fn with_derivatives_policy(mut self, policy: FailurePolicy) -> Self {
        self.derivatives_policy = policy;
        self
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn storage_name(&self) -> &str {
        self.storage.name()
    }

    /// Cash-market bhavcopy for every (instrument, series) pair.
    ///
    /// A failing pair is logged, listed in the report and contributes no
    /// rows; the remaining pairs still run.
    pub fn get_cash_market_bhavcopy<I, S, J, T>(
        &self,
        start: impl Into<DateInput>,
        end: impl Into<DateInput>,
        instruments: I,
        series: J,
    ) -> Result<AggregateResult, BhavcopyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let query = QuerySpec::cash_market(start, end, instruments, series)?;
        fanout::run(
            self.storage.as_ref(),
            &self.config,
            &query,
            FailurePolicy::default_for(Segment::CashMarket),
        )
    }

    /// Derivatives bhavcopy for every instrument.
    pub fn get_derivatives_bhavcopy<I, S>(
        &self,
        start: impl Into<DateInput>,
        end: impl Into<DateInput>,
        instruments: I,
    ) -> Result<AggregateResult, BhavcopyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let query = QuerySpec::derivatives(start, end, instruments)?;
        fanout::run(
            self.storage.as_ref(),
            &self.config,
            &query,
            self.derivatives_policy,
        )
    }

    /// Derivatives bhavcopy from the start of stored history to today.
    pub fn get_derivatives_bhavcopy_default_range<I, S>(
        &self,
        instruments: I,
    ) -> Result<AggregateResult, BhavcopyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let today = Local::now().date_naive();
        self.get_derivatives_bhavcopy(history_start(), today, instruments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::TableId;
    use crate::data::value::Value;
    use crate::error::ValidationError;
    use crate::storage::MemoryStorage;
    use chrono::NaiveDate;

    #[test]
    fn default_range_starts_at_history_start() {
        let mut storage = MemoryStorage::new();
        storage.insert_named(
            TableId::DerivativesUdiff,
            [
                ("TradDt", Value::Date(NaiveDate::from_ymd_opt(2016, 1, 1).unwrap())),
                ("TckrSymb", Value::from("NIFTY")),
            ],
        );
        let client = BhavcopyClient::new(Box::new(storage.clone()), DbConfig::default());

        let out = client.get_derivatives_bhavcopy_default_range(["NIFTY"]).unwrap();
        assert_eq!(out.len(), 1);
        let q = &storage.executed()[0];
        assert_eq!(q.range.start, history_start());
        assert_eq!(q.range.end, Local::now().date_naive());
    }

    #[test]
    fn invalid_date_fails_before_connecting() {
        let storage = MemoryStorage::new();
        let client = BhavcopyClient::new(Box::new(storage.clone()), DbConfig::default());
        let err = client
            .get_cash_market_bhavcopy("not a date", "2023-01-31", ["TCS"], ["EQ"])
            .unwrap_err();
        assert!(matches!(
            err,
            BhavcopyError::Validation(ValidationError::InvalidDate { .. })
        ));
        assert_eq!(storage.connect_count(), 0);
    }

    #[test]
    fn derivatives_policy_can_be_overridden() {
        let mut storage = MemoryStorage::new();
        storage.fail_instrument("BAD");
        let client = BhavcopyClient::new(Box::new(storage), DbConfig::default())
            .with_derivatives_policy(FailurePolicy::IsolatePerItem);
        let out = client
            .get_derivatives_bhavcopy("2023-01-01", "2023-01-31", ["BAD", "NIFTY"])
            .unwrap();
        assert_eq!(out.report.items_attempted, 2);
        assert!(!out.report.stopped_early);
    }
}
