//! The closed set of physical bhavcopy tables.
//!
//! Each [`TableId`] statically owns its physical name, predicate columns,
//! fixed output column list and (for legacy tables) its column mapping.
//! Nothing here is inferred from fetched data.

use super::columns::{ColumnMapping, CASH_MARKET_MAPPING, DERIVATIVES_MAPPING};
use crate::error::BhavcopyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column list shared by both UDIFF tables.
pub const UDIFF_COLUMNS: &[&str] = &[
    "TradDt",
    "BizDt",
    "Sgmt",
    "Src",
    "FinInstrmTp",
    "FinInstrmId",
    "ISIN",
    "TckrSymb",
    "SctySrs",
    "XpryDt",
    "FininstrmActlXpryDt",
    "StrkPric",
    "OptnTp",
    "FinInstrmNm",
    "OpnPric",
    "HghPric",
    "LwPric",
    "ClsPric",
    "LastPric",
    "PrvsClsgPric",
    "UndrlygPric",
    "SttlmPric",
    "OpnIntrst",
    "ChngInOpnIntrst",
    "TtlTradgVol",
    "TtlTrfVal",
    "TtlNbOfTxsExctd",
    "SsnId",
    "NewBrdLotQty",
    "Rmks",
    "Rsvd1",
    "Rsvd2",
    "Rsvd3",
    "Rsvd4",
];

pub const CASH_MARKET_LEGACY_COLUMNS: &[&str] = &[
    "SYMBOL",
    "SERIES",
    "OPEN",
    "HIGH",
    "LOW",
    "CLOSE",
    "LAST",
    "PREVCLOSE",
    "TOTTRDQTY",
    "TOTTRDVAL",
    "TIMESTAMP",
    "TOTALTRADES",
    "ISIN",
];

pub const DERIVATIVES_LEGACY_COLUMNS: &[&str] = &[
    "INSTRUMENT",
    "SYMBOL",
    "EXPIRY_DT",
    "STRIKE_PR",
    "OPTION_TYP",
    "OPEN",
    "HIGH",
    "LOW",
    "CLOSE",
    "SETTLE_PR",
    "CONTRACTS",
    "VAL_INLAKH",
    "OPEN_INT",
    "CHG_IN_OI",
    "TIMESTAMP",
];

/// Market segment of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    CashMarket,
    Derivatives,
}

impl Segment {
    /// The (canonical, legacy) table pair for this segment.
    pub fn tables(self) -> (TableId, TableId) {
        match self {
            Segment::CashMarket => (TableId::CashMarketUdiff, TableId::CashMarketLegacy),
            Segment::Derivatives => (TableId::DerivativesUdiff, TableId::DerivativesLegacy),
        }
    }

    pub fn uses_series(self) -> bool {
        matches!(self, Segment::CashMarket)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::CashMarket => f.write_str("CM"),
            Segment::Derivatives => f.write_str("FO"),
        }
    }
}

/// Identifier of a physical table and its schema variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableId {
    CashMarketLegacy,
    CashMarketUdiff,
    DerivativesLegacy,
    DerivativesUdiff,
}

impl TableId {
    pub const ALL: [TableId; 4] = [
        TableId::CashMarketLegacy,
        TableId::CashMarketUdiff,
        TableId::DerivativesLegacy,
        TableId::DerivativesUdiff,
    ];

    /// Physical table name as stored.
    pub fn table_name(self) -> &'static str {
        match self {
            TableId::CashMarketLegacy => "bhavcopies_cm",
            TableId::CashMarketUdiff => "bhavcopies_udiff",
            TableId::DerivativesLegacy => "FO_bhavCopies_CM",
            TableId::DerivativesUdiff => "FO_Bhavcopies_UDiFF",
        }
    }

    /// Look a table up by its physical name (case-insensitive, as the
    /// database folds unquoted identifiers).
    pub fn from_name(name: &str) -> Result<Self, BhavcopyError> {
        TableId::ALL
            .into_iter()
            .find(|t| t.table_name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| BhavcopyError::UnknownTable {
                name: name.to_string(),
            })
    }

    pub fn segment(self) -> Segment {
        match self {
            TableId::CashMarketLegacy | TableId::CashMarketUdiff => Segment::CashMarket,
            TableId::DerivativesLegacy | TableId::DerivativesUdiff => Segment::Derivatives,
        }
    }

    pub fn is_legacy(self) -> bool {
        matches!(self, TableId::CashMarketLegacy | TableId::DerivativesLegacy)
    }

    /// Fixed output column list, in schema order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            TableId::CashMarketLegacy => CASH_MARKET_LEGACY_COLUMNS,
            TableId::DerivativesLegacy => DERIVATIVES_LEGACY_COLUMNS,
            TableId::CashMarketUdiff | TableId::DerivativesUdiff => UDIFF_COLUMNS,
        }
    }

    /// Column holding the trade date.
    pub fn date_column(self) -> &'static str {
        if self.is_legacy() {
            "TIMESTAMP"
        } else {
            "TradDt"
        }
    }

    /// Column holding the instrument symbol.
    pub fn symbol_column(self) -> &'static str {
        if self.is_legacy() {
            "SYMBOL"
        } else {
            "TckrSymb"
        }
    }

    /// Column holding the series code; only cash-market tables filter on it.
    pub fn series_column(self) -> Option<&'static str> {
        match self {
            TableId::CashMarketLegacy => Some("SERIES"),
            TableId::CashMarketUdiff => Some("SctySrs"),
            TableId::DerivativesLegacy | TableId::DerivativesUdiff => None,
        }
    }

    /// Legacy-to-canonical mapping, for legacy tables.
    pub fn mapping(self) -> Option<&'static ColumnMapping> {
        match self {
            TableId::CashMarketLegacy => Some(&CASH_MARKET_MAPPING),
            TableId::DerivativesLegacy => Some(&DERIVATIVES_MAPPING),
            TableId::CashMarketUdiff | TableId::DerivativesUdiff => None,
        }
    }

    /// Number of bind parameters its query takes.
    pub fn parameter_count(self) -> usize {
        if self.series_column().is_some() {
            4
        } else {
            3
        }
    }

    pub fn column_index(self, name: &str) -> Option<usize> {
        self.columns().iter().position(|c| *c == name)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for TableId {
    type Err = BhavcopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableId::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for t in TableId::ALL {
            assert_eq!(TableId::from_name(t.table_name()).unwrap(), t);
        }
    }

    #[test]
    fn name_lookup_folds_case() {
        assert_eq!(
            "fo_bhavcopies_udiff".parse::<TableId>().unwrap(),
            TableId::DerivativesUdiff
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = TableId::from_name("bhavcopies_xyz").unwrap_err();
        assert_eq!(
            err,
            BhavcopyError::UnknownTable {
                name: "bhavcopies_xyz".into()
            }
        );
    }

    #[test]
    fn column_counts_match_schemas() {
        assert_eq!(TableId::CashMarketUdiff.columns().len(), 34);
        assert_eq!(TableId::DerivativesUdiff.columns().len(), 34);
        assert_eq!(TableId::CashMarketLegacy.columns().len(), 13);
        assert_eq!(TableId::DerivativesLegacy.columns().len(), 15);
    }

    #[test]
    fn predicate_columns_exist_in_output() {
        for t in TableId::ALL {
            assert!(t.column_index(t.date_column()).is_some(), "{t}");
            assert!(t.column_index(t.symbol_column()).is_some(), "{t}");
            if let Some(series) = t.series_column() {
                assert!(t.column_index(series).is_some(), "{t}");
            }
        }
    }

    #[test]
    fn only_cash_market_filters_series() {
        assert_eq!(TableId::CashMarketLegacy.parameter_count(), 4);
        assert_eq!(TableId::CashMarketUdiff.parameter_count(), 4);
        assert_eq!(TableId::DerivativesLegacy.parameter_count(), 3);
        assert_eq!(TableId::DerivativesUdiff.parameter_count(), 3);
    }

    #[test]
    fn segment_pairs_canonical_first() {
        assert_eq!(
            Segment::CashMarket.tables(),
            (TableId::CashMarketUdiff, TableId::CashMarketLegacy)
        );
        assert_eq!(
            Segment::Derivatives.tables(),
            (TableId::DerivativesUdiff, TableId::DerivativesLegacy)
        );
    }

    #[test]
    fn only_legacy_tables_carry_mappings() {
        for t in TableId::ALL {
            assert_eq!(t.mapping().is_some(), t.is_legacy());
        }
    }
}
