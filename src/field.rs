//! Declared field types and the values converters produce
//!
//! `FieldType` names one half of a converter key; `FieldValue` is the
//! closed union a bound record is assembled from. Both are closed enums so
//! that adding a kind is a single compile-checked change.

use crate::value::{CellKind, Decimal};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;

/// Identifier of a declared record field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    Decimal,
    /// Calendar date, no time component
    Date,
    /// Calendar date and wall-clock time, no zone
    DateTime,
    /// Instant in UTC
    Timestamp,
    Text,
}

impl FieldType {
    /// The cell kind this field type materializes as on the write side
    /// unless a mapping overrides the converter
    pub fn default_cell_kind(&self) -> CellKind {
        match self {
            FieldType::Bool => CellKind::Bool,
            FieldType::Text => CellKind::String,
            _ => CellKind::Number,
        }
    }
}

/// A typed field value, the output of `from_cell` and input of `to_cell`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    /// Absent value (empty cell, optional field)
    Null,
    Bool(bool),
    /// All signed widths up to 64 bits
    Int(i64),
    /// 128-bit signed
    BigInt(i128),
    /// All unsigned widths up to 64 bits
    UInt(u64),
    /// 128-bit unsigned
    BigUint(u128),
    /// Both float widths; f32 values are carried widened
    Float(f64),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl FieldValue {
    /// Variant name for diagnostics
    pub fn variant(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::BigInt(_) => "bigint",
            FieldValue::UInt(_) => "uint",
            FieldValue::BigUint(_) => "biguint",
            FieldValue::Float(_) => "float",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Text(_) => "text",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The field type this value naturally carries, `None` for null
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(_) => Some(FieldType::Bool),
            FieldValue::Int(_) => Some(FieldType::I64),
            FieldValue::BigInt(_) => Some(FieldType::I128),
            FieldValue::UInt(_) => Some(FieldType::U64),
            FieldValue::BigUint(_) => Some(FieldType::U128),
            FieldValue::Float(_) => Some(FieldType::F64),
            FieldValue::Decimal(_) => Some(FieldType::Decimal),
            FieldValue::Date(_) => Some(FieldType::Date),
            FieldValue::DateTime(_) => Some(FieldType::DateTime),
            FieldValue::Timestamp(_) => Some(FieldType::Timestamp),
            FieldValue::Text(_) => Some(FieldType::Text),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::UInt(u) => i64::try_from(*u).ok(),
            FieldValue::BigInt(i) => i64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::BigInt(i) => write!(f, "{}", i),
            FieldValue::UInt(u) => write!(f, "{}", u),
            FieldValue::BigUint(u) => write!(f, "{}", u),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UInt(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        FieldValue::Decimal(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::DateTime(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => FieldValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cell_kinds() {
        assert_eq!(FieldType::Bool.default_cell_kind(), CellKind::Bool);
        assert_eq!(FieldType::Text.default_cell_kind(), CellKind::String);
        assert_eq!(FieldType::I32.default_cell_kind(), CellKind::Number);
        assert_eq!(FieldType::Timestamp.default_cell_kind(), CellKind::Number);
    }

    #[test]
    fn test_field_value_views() {
        assert_eq!(FieldValue::Int(7).as_f64(), Some(7.0));
        assert_eq!(FieldValue::UInt(7).as_i64(), Some(7));
        assert_eq!(FieldValue::from(Some("x")).as_str(), Some("x"));
        assert!(FieldValue::from(None::<i64>).is_null());
    }

    #[test]
    fn test_display_dates() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert_eq!(FieldValue::Date(d).to_string(), "2020-01-01");
    }
}
