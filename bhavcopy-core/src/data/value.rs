//! Scalar cell values and the join-key form used when matching rows.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

/// One cell of a record set.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::Timestamp(ts) => Some(ts.date()),
            _ => None,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Normalized form for equality matching during a merge.
    ///
    /// Numbers compare by value across `Int`, `Float` and `Decimal`, and
    /// `Null` matches `Null`.
    pub fn join_key(&self) -> JoinKey {
        match self {
            Value::Null => JoinKey::Null,
            Value::Bool(b) => JoinKey::Bool(*b),
            Value::Int(i) => JoinKey::Number(Decimal::from(*i).normalize()),
            Value::Decimal(d) => JoinKey::Number(d.normalize()),
            Value::Float(f) => match Decimal::from_f64(*f) {
                Some(d) => JoinKey::Number(d.normalize()),
                None => JoinKey::FloatBits(f.to_bits()),
            },
            Value::Text(s) => JoinKey::Text(s.clone()),
            Value::Date(d) => JoinKey::Date(*d),
            Value::Timestamp(ts) => JoinKey::Timestamp(*ts),
        }
    }

    /// Short name of the variant, used in dtype inference and diagnostics.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) | Value::Decimal(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Date(_) => ValueKind::Date,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Text,
    Date,
    Timestamp,
}

/// Hashable, normalized value used as a join key component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
    Null,
    Bool(bool),
    Number(Decimal),
    FloatBits(u64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{d}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Decimal(d) => match d.to_f64() {
                Some(x) => serializer.serialize_f64(x),
                None => serializer.collect_str(d),
            },
            Value::Text(s) => serializer.serialize_str(s),
            Value::Date(_) | Value::Timestamp(_) => serializer.collect_str(self),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn numbers_match_across_representations() {
        let int = Value::Int(3450).join_key();
        let float = Value::Float(3450.0).join_key();
        let dec = Value::Decimal(Decimal::from_str("3450.00").unwrap()).join_key();
        assert_eq!(int, float);
        assert_eq!(int, dec);
    }

    #[test]
    fn fractional_prices_match() {
        let float = Value::Float(3411.25).join_key();
        let dec = Value::Decimal(Decimal::from_str("3411.250").unwrap()).join_key();
        assert_eq!(float, dec);
    }

    #[test]
    fn null_matches_null_only() {
        assert_eq!(Value::Null.join_key(), Value::Null.join_key());
        assert_ne!(Value::Null.join_key(), Value::Int(0).join_key());
        assert_ne!(Value::Null.join_key(), Value::from("").join_key());
    }

    #[test]
    fn nan_has_a_stable_key() {
        assert_eq!(
            Value::Float(f64::NAN).join_key(),
            Value::Float(f64::NAN).join_key()
        );
    }

    #[test]
    fn display_renders_dates_canonically() {
        let d = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2023-01-02");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn serializes_to_plain_json() {
        let d = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let json = serde_json::to_string(&vec![
            Value::Null,
            Value::Int(7),
            Value::from("TCS"),
            Value::Date(d),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,7,"TCS","2023-01-02"]"#);
    }

    #[test]
    fn option_converts_to_null() {
        let none: Option<i64> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some(5_i64)), Value::Int(5));
    }
}
