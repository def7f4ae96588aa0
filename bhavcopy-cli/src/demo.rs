//! Sample in-memory storage for `--demo` runs.
//!
//! A handful of trading days in both schemas, enough to see matched rows,
//! legacy-only rows, canonical-only rows and a failing instrument.

use bhavcopy_core::data::{TableId, Value};
use bhavcopy_core::storage::MemoryStorage;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Instrument whose queries always fail in the demo storage.
pub const FAILING_SYMBOL: &str = "BAD_SYMBOL";

struct CashDay {
    symbol: &'static str,
    series: &'static str,
    isin: &'static str,
    day: u32,
    open: i64,
    close: i64,
    volume: i64,
    trades: i64,
}

const CASH_DAYS: &[CashDay] = &[
    CashDay { symbol: "TCS", series: "EQ", isin: "INE467B01029", day: 2, open: 325_000, close: 326_315, volume: 1_204_332, trades: 58_211 },
    CashDay { symbol: "TCS", series: "EQ", isin: "INE467B01029", day: 3, open: 326_500, close: 328_090, volume: 1_402_117, trades: 61_045 },
    CashDay { symbol: "HDFCBANK", series: "EQ", isin: "INE040A01034", day: 2, open: 163_000, close: 164_255, volume: 3_861_520, trades: 97_334 },
    CashDay { symbol: "TECHM", series: "EQ", isin: "INE669C01036", day: 2, open: 101_020, close: 102_340, volume: 905_112, trades: 40_871 },
    CashDay { symbol: "20MICRONS", series: "BE", isin: "INE144J01027", day: 2, open: 8_500, close: 8_610, volume: 15_202, trades: 611 },
];

fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn price(paise: i64) -> Value {
    Value::Decimal(Decimal::new(paise, 2))
}

/// Build the demo storage.
pub fn sample_storage() -> MemoryStorage {
    let mut storage = MemoryStorage::new();

    for (i, d) in CASH_DAYS.iter().enumerate() {
        let date = Value::from(ymd(2023, 1, d.day));
        let value = Decimal::new(d.close * d.volume, 2);

        // TECHM only exists in the legacy table
        if d.symbol != "TECHM" {
            storage.insert_named(
                TableId::CashMarketUdiff,
                [
                    ("TradDt", date.clone()),
                    ("BizDt", date.clone()),
                    ("Sgmt", Value::from("CM")),
                    ("Src", Value::from("NSE")),
                    ("FinInstrmTp", Value::from("STK")),
                    ("FinInstrmId", Value::Int(1000 + i as i64)),
                    ("ISIN", Value::from(d.isin)),
                    ("TckrSymb", Value::from(d.symbol)),
                    ("SctySrs", Value::from(d.series)),
                    ("FinInstrmNm", Value::from(format!("{} LIMITED", d.symbol))),
                    ("OpnPric", price(d.open)),
                    ("HghPric", price(d.close.max(d.open))),
                    ("LwPric", price(d.close.min(d.open))),
                    ("ClsPric", price(d.close)),
                    ("LastPric", price(d.close)),
                    ("PrvsClsgPric", price(d.open)),
                    ("TtlTradgVol", Value::Int(d.volume)),
                    ("TtlTrfVal", Value::Decimal(value)),
                    ("TtlNbOfTxsExctd", Value::Int(d.trades)),
                    ("SsnId", Value::from("F1")),
                    ("NewBrdLotQty", Value::Int(1)),
                ],
            );
        }

        // HDFCBANK only exists in the canonical table
        if d.symbol != "HDFCBANK" {
            storage.insert_named(
                TableId::CashMarketLegacy,
                [
                    ("SYMBOL", Value::from(d.symbol)),
                    ("SERIES", Value::from(d.series)),
                    ("OPEN", price(d.open)),
                    ("HIGH", price(d.close.max(d.open))),
                    ("LOW", price(d.close.min(d.open))),
                    ("CLOSE", price(d.close)),
                    ("LAST", price(d.close)),
                    ("PREVCLOSE", price(d.open)),
                    ("TOTTRDQTY", Value::Int(d.volume)),
                    ("TOTTRDVAL", Value::Decimal(value)),
                    ("TIMESTAMP", date),
                    ("TOTALTRADES", Value::Int(d.trades)),
                    ("ISIN", Value::from(d.isin)),
                ],
            );
        }
    }

    let expiry = Value::from(ymd(2023, 12, 28));
    for (symbol, settle, oi) in [("BANKNIFTY", 4_702_540_i64, 2_451_175_i64), ("NIFTYINFRA", 680_015, 1_200)] {
        for day in [1, 4] {
            let date = Value::from(ymd(2023, 12, day));
            storage
                .insert_named(
                    TableId::DerivativesUdiff,
                    [
                        ("TradDt", date.clone()),
                        ("BizDt", date.clone()),
                        ("Sgmt", Value::from("FO")),
                        ("Src", Value::from("NSE")),
                        ("FinInstrmTp", Value::from("IDF")),
                        ("TckrSymb", Value::from(symbol)),
                        ("XpryDt", expiry.clone()),
                        ("OpnPric", price(settle)),
                        ("HghPric", price(settle)),
                        ("LwPric", price(settle)),
                        ("ClsPric", price(settle)),
                        ("SttlmPric", price(settle)),
                        ("OpnIntrst", Value::Int(oi)),
                        ("ChngInOpnIntrst", Value::Int(0)),
                        ("TtlTradgVol", Value::Int(oi / 10)),
                        ("TtlTrfVal", price(settle * (oi / 10))),
                    ],
                )
                .insert_named(
                    TableId::DerivativesLegacy,
                    [
                        ("INSTRUMENT", Value::from("IDF")),
                        ("SYMBOL", Value::from(symbol)),
                        ("EXPIRY_DT", expiry.clone()),
                        ("OPEN", price(settle)),
                        ("HIGH", price(settle)),
                        ("LOW", price(settle)),
                        ("CLOSE", price(settle)),
                        ("SETTLE_PR", price(settle)),
                        ("CONTRACTS", Value::Int(oi / 10)),
                        ("VAL_INLAKH", price(settle * (oi / 10))),
                        ("OPEN_INT", Value::Int(oi)),
                        ("CHG_IN_OI", Value::Int(0)),
                        ("TIMESTAMP", date),
                    ],
                );
        }
    }

    storage.fail_instrument(FAILING_SYMBOL);
    storage
}
