//! Legacy-to-canonical column name mapping.

use super::record::RecordSet;

/// A static legacy → canonical rename table.
#[derive(Debug)]
pub struct ColumnMapping {
    name: &'static str,
    pairs: &'static [(&'static str, &'static str)],
}

impl ColumnMapping {
    pub const fn new(name: &'static str, pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, pairs }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pairs(&self) -> &'static [(&'static str, &'static str)] {
        self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Canonical name for a legacy column, if mapped.
    pub fn canonical(&self, legacy: &str) -> Option<&'static str> {
        self.pairs
            .iter()
            .find(|(from, _)| *from == legacy)
            .map(|(_, to)| *to)
    }
}

/// Cash-market legacy (`bhavcopies_cm`) to UDIFF names.
pub static CASH_MARKET_MAPPING: ColumnMapping = ColumnMapping::new(
    "cash-market",
    &[
        ("SYMBOL", "TckrSymb"),
        ("SERIES", "SctySrs"),
        ("OPEN", "OpnPric"),
        ("HIGH", "HghPric"),
        ("LOW", "LwPric"),
        ("CLOSE", "ClsPric"),
        ("LAST", "LastPric"),
        ("PREVCLOSE", "PrvsClsgPric"),
        ("TOTTRDQTY", "TtlTradgVol"),
        ("TOTTRDVAL", "TtlTrfVal"),
        ("TIMESTAMP", "TradDt"),
        ("TOTALTRADES", "TtlNbOfTxsExctd"),
        ("ISIN", "ISIN"),
    ],
);

/// Derivatives legacy (`FO_bhavCopies_CM`) to UDIFF names.
pub static DERIVATIVES_MAPPING: ColumnMapping = ColumnMapping::new(
    "derivatives",
    &[
        ("INSTRUMENT", "FinInstrmTp"),
        ("SYMBOL", "TckrSymb"),
        ("EXPIRY_DT", "XpryDt"),
        ("STRIKE_PR", "StrkPric"),
        ("OPTION_TYP", "OptnTp"),
        ("OPEN", "OpnPric"),
        ("HIGH", "HghPric"),
        ("LOW", "LwPric"),
        ("CLOSE", "ClsPric"),
        ("SETTLE_PR", "SttlmPric"),
        ("CONTRACTS", "TtlTradgVol"),
        ("VAL_INLAKH", "TtlTrfVal"),
        ("OPEN_INT", "OpnIntrst"),
        ("CHG_IN_OI", "ChngInOpnIntrst"),
        ("TIMESTAMP", "TradDt"),
    ],
);

/// Rename every mapped column to its canonical name.
///
/// Unmapped columns pass through. A set already using canonical names comes
/// back unchanged.
pub fn map_columns(mut records: RecordSet, mapping: &ColumnMapping) -> RecordSet {
    records.rename_columns(|col| mapping.canonical(col).map(str::to_string));
    records
}
