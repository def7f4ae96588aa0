//! Cash-market retrieval end to end against the in-memory backend.

use bhavcopy_core::data::{TableId, Value};
use bhavcopy_core::storage::MemoryStorage;
use bhavcopy_core::{BhavcopyClient, BhavcopyError, DbConfig, ValidationError};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One trading day for `symbol`, written identically to both schemas.
fn insert_day(storage: &mut MemoryStorage, symbol: &str, series: &str, date: NaiveDate, close: i64) {
    let close = Decimal::new(close * 100, 2);
    storage
        .insert_named(
            TableId::CashMarketUdiff,
            [
                ("TradDt", Value::Date(date)),
                ("BizDt", Value::Date(date)),
                ("Sgmt", Value::from("CM")),
                ("Src", Value::from("NSE")),
                ("FinInstrmTp", Value::from("STK")),
                ("ISIN", Value::from(format!("INE{symbol}01"))),
                ("TckrSymb", Value::from(symbol)),
                ("SctySrs", Value::from(series)),
                ("OpnPric", Value::Decimal(close)),
                ("HghPric", Value::Decimal(close)),
                ("LwPric", Value::Decimal(close)),
                ("ClsPric", Value::Decimal(close)),
                ("LastPric", Value::Decimal(close)),
                ("PrvsClsgPric", Value::Decimal(close)),
                ("TtlTradgVol", Value::Int(1000)),
                ("TtlTrfVal", Value::Decimal(close * Decimal::from(1000))),
                ("TtlNbOfTxsExctd", Value::Int(42)),
            ],
        )
        .insert_named(
            TableId::CashMarketLegacy,
            [
                ("SYMBOL", Value::from(symbol)),
                ("SERIES", Value::from(series)),
                ("OPEN", Value::Float(close.to_f64().unwrap())),
                ("HIGH", Value::Decimal(close)),
                ("LOW", Value::Decimal(close)),
                ("CLOSE", Value::Decimal(close)),
                ("LAST", Value::Decimal(close)),
                ("PREVCLOSE", Value::Decimal(close)),
                ("TOTTRDQTY", Value::Int(1000)),
                ("TOTTRDVAL", Value::Decimal(close * Decimal::from(1000))),
                ("TIMESTAMP", Value::Date(date)),
                ("TOTALTRADES", Value::Int(42)),
                ("ISIN", Value::from(format!("INE{symbol}01"))),
            ],
        );
}

fn client(storage: &MemoryStorage) -> BhavcopyClient {
    BhavcopyClient::new(Box::new(storage.clone()), DbConfig::default())
}

#[test]
fn matching_rows_in_both_schemas_merge_into_one() {
    let mut storage = MemoryStorage::new();
    insert_day(&mut storage, "TCS", "EQ", ymd(2023, 1, 2), 3400);

    let out = client(&storage)
        .get_cash_market_bhavcopy("2023-01-01", "2023-01-31", ["TCS"], ["EQ"])
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out.records.width(), 34);
    assert_eq!(out.records.get(0, "Sgmt"), Some(&Value::from("CM")));
    assert_eq!(out.records.get(0, "TtlNbOfTxsExctd"), Some(&Value::Int(42)));
    assert!(out.report.is_complete());
}

#[test]
fn bad_instrument_does_not_erase_others() {
    let mut storage = MemoryStorage::new();
    insert_day(&mut storage, "TCS", "EQ", ymd(2023, 1, 2), 3400);
    insert_day(&mut storage, "TCS", "EQ", ymd(2023, 1, 3), 3410);
    insert_day(&mut storage, "HDFCBANK", "EQ", ymd(2023, 1, 2), 1600);
    storage.fail_instrument("BAD_SYMBOL");

    let out = client(&storage)
        .get_cash_market_bhavcopy(
            "2023-01-01",
            "2023-01-31",
            ["TCS", "BAD_SYMBOL", "HDFCBANK"],
            ["EQ"],
        )
        .unwrap();

    let symbols: Vec<_> = out
        .records
        .column_values("TckrSymb")
        .unwrap()
        .into_iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert_eq!(symbols, ["TCS", "TCS", "HDFCBANK"]);

    assert_eq!(out.report.items_attempted, 3);
    assert_eq!(out.report.items_succeeded, 2);
    assert_eq!(out.report.skipped.len(), 1);
    assert_eq!(out.report.skipped[0].instrument, "BAD_SYMBOL");
    assert_eq!(out.report.skipped[0].series.as_deref(), Some("EQ"));
    assert!(!out.report.stopped_early);
    assert_eq!(storage.close_count(), 1);
}

#[test]
fn legacy_only_rows_are_kept_with_canonical_names() {
    let mut storage = MemoryStorage::new();
    storage.insert_named(
        TableId::CashMarketLegacy,
        [
            ("SYMBOL", Value::from("INFY")),
            ("SERIES", Value::from("EQ")),
            ("CLOSE", Value::Float(1500.0)),
            ("TIMESTAMP", Value::Date(ymd(2023, 1, 5))),
        ],
    );

    let out = client(&storage)
        .get_cash_market_bhavcopy("2023-01-01", "2023-01-31", ["INFY"], ["EQ"])
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out.records.get(0, "ClsPric"), Some(&Value::Float(1500.0)));
    assert_eq!(out.records.get(0, "TradDt"), Some(&Value::Date(ymd(2023, 1, 5))));
    assert!(!out.records.has_column("CLOSE"));
}

#[test]
fn results_follow_instrument_then_series_order() {
    let mut storage = MemoryStorage::new();
    insert_day(&mut storage, "B", "BE", ymd(2023, 1, 2), 20);
    insert_day(&mut storage, "B", "EQ", ymd(2023, 1, 2), 21);
    insert_day(&mut storage, "A", "BE", ymd(2023, 1, 2), 10);
    insert_day(&mut storage, "A", "EQ", ymd(2023, 1, 2), 11);

    let out = client(&storage)
        .get_cash_market_bhavcopy("2023-01-01", "2023-01-31", ["A", "B"], ["EQ", "BE"])
        .unwrap();

    let pairs: Vec<(String, String)> = out
        .records
        .records()
        .iter()
        .map(|r| (r["TckrSymb"].to_string(), r["SctySrs"].to_string()))
        .collect();
    assert_eq!(
        pairs,
        [("A", "EQ"), ("A", "BE"), ("B", "EQ"), ("B", "BE")]
            .map(|(a, b)| (a.to_string(), b.to_string()))
    );
}

#[test]
fn repeated_instruments_are_not_deduplicated() {
    let mut storage = MemoryStorage::new();
    insert_day(&mut storage, "TCS", "EQ", ymd(2023, 1, 2), 3400);

    let out = client(&storage)
        .get_cash_market_bhavcopy("2023-01-01", "2023-01-31", ["TCS", "TCS"], ["EQ"])
        .unwrap();
    assert_eq!(out.len(), 2);
}

#[test]
fn empty_instruments_are_rejected_before_connecting() {
    let storage = MemoryStorage::new();
    let err = client(&storage)
        .get_cash_market_bhavcopy("2023-01-01", "2023-01-31", Vec::<String>::new(), ["EQ"])
        .unwrap_err();

    assert_eq!(err, BhavcopyError::Validation(ValidationError::EmptyInstruments));
    assert_eq!(storage.connect_count(), 0);
}

#[test]
fn reversed_range_is_rejected_before_connecting() {
    let storage = MemoryStorage::new();
    let err = client(&storage)
        .get_cash_market_bhavcopy("2023-02-01", "2023-01-01", ["TCS"], ["EQ"])
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(storage.connect_count(), 0);
}

#[test]
fn no_matching_rows_is_an_empty_success() {
    let mut storage = MemoryStorage::new();
    insert_day(&mut storage, "TCS", "EQ", ymd(2022, 6, 1), 3000);

    let out = client(&storage)
        .get_cash_market_bhavcopy("2023-01-01", "2023-01-31", ["TCS"], ["EQ"])
        .unwrap();
    assert!(out.is_empty());
    assert!(out.report.is_complete());
    assert_eq!(storage.connect_count(), 1);
    assert_eq!(storage.close_count(), 1);
}

#[test]
fn connection_failure_propagates() {
    let mut storage = MemoryStorage::new();
    storage.fail_connect("password authentication failed");

    let err = client(&storage)
        .get_cash_market_bhavcopy("2023-01-01", "2023-01-31", ["TCS"], ["EQ"])
        .unwrap_err();
    assert!(matches!(err, BhavcopyError::Connection(_)));
}

#[test]
fn each_pair_queries_both_schemas_over_one_connection() {
    let storage = MemoryStorage::new();
    client(&storage)
        .get_cash_market_bhavcopy("2023-01-01", "2023-01-31", ["TCS", "INFY"], ["EQ"])
        .unwrap();

    let tables: Vec<TableId> = storage.executed().iter().map(|q| q.table).collect();
    assert_eq!(
        tables,
        [
            TableId::CashMarketUdiff,
            TableId::CashMarketLegacy,
            TableId::CashMarketUdiff,
            TableId::CashMarketLegacy,
        ]
    );
    assert_eq!(storage.connect_count(), 1);
}
