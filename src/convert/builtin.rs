//! Built-in converter implementations
//!
//! One converter per `(FieldType, CellKind)` pair, covering booleans, every
//! integer width, both float widths, lexical decimals, three date
//! granularities and text - including the common cross-kind pairs
//! (number cell into text field, string cell into numeric field, and so
//! on). All date serials use the shared 1900/1904 epoch helpers below.

use super::{ConvertConfig, Converter, ConverterRegistry};
use crate::error::ConvertError;
use crate::field::{FieldType, FieldValue};
use crate::value::{CellKind, CellValue, Decimal, Number};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use std::sync::Arc;

/// A built-in converter: a claimed key plus two translation functions
struct BuiltinConverter {
    field_type: FieldType,
    cell_kind: CellKind,
    to_cell: fn(&FieldValue, &ConvertConfig) -> Result<CellValue, ConvertError>,
    from_cell: fn(&CellValue, &ConvertConfig) -> Result<FieldValue, ConvertError>,
}

impl Converter for BuiltinConverter {
    fn field_type(&self) -> FieldType {
        self.field_type
    }

    fn cell_kind(&self) -> CellKind {
        self.cell_kind
    }

    fn to_cell(&self, value: &FieldValue, cfg: &ConvertConfig) -> Result<CellValue, ConvertError> {
        (self.to_cell)(value, cfg)
    }

    fn from_cell(&self, cell: &CellValue, cfg: &ConvertConfig) -> Result<FieldValue, ConvertError> {
        (self.from_cell)(cell, cfg)
    }
}

// ---------------------------------------------------------------------------
// date serial helpers

fn serial_epoch(cfg: &ConvertConfig) -> NaiveDate {
    if cfg.epoch_1904 {
        // 1904 date system, used by workbooks produced on classic Mac Excel.
        NaiveDate::from_ymd_opt(1904, 1, 1).expect("valid epoch")
    } else {
        // 1899-12-30 absorbs the 1900 leap-year bug the file formats inherit.
        NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch")
    }
}

pub(crate) fn date_to_serial(date: NaiveDate, cfg: &ConvertConfig) -> i64 {
    (date - serial_epoch(cfg)).num_days()
}

pub(crate) fn datetime_to_serial(dt: NaiveDateTime, cfg: &ConvertConfig) -> f64 {
    let days = date_to_serial(dt.date(), cfg) as f64;
    days + dt.time().num_seconds_from_midnight() as f64 / 86_400.0
}

pub(crate) fn serial_to_date(serial: f64, cfg: &ConvertConfig) -> Option<NaiveDate> {
    serial_epoch(cfg).checked_add_signed(Duration::days(serial.floor() as i64))
}

pub(crate) fn serial_to_datetime(serial: f64, cfg: &ConvertConfig) -> Option<NaiveDateTime> {
    let date = serial_to_date(serial, cfg)?;
    // Round the day fraction to whole seconds; sub-second detail does not
    // survive the serial representation.
    let secs = (serial.fract() * 86_400.0).round() as i64;
    date.and_hms_opt(0, 0, 0)?.checked_add_signed(Duration::seconds(secs))
}

// ---------------------------------------------------------------------------
// shared parse helpers

fn expect_number<'a>(cell: &'a CellValue, ft: FieldType) -> Result<&'a Number, ConvertError> {
    match cell {
        CellValue::Number(n) => Ok(n),
        other => Err(ConvertError::Invalid {
            field_type: ft,
            value: other.as_string(),
        }),
    }
}

fn expect_string<'a>(cell: &'a CellValue, ft: FieldType) -> Result<&'a str, ConvertError> {
    match cell {
        CellValue::String(s) => Ok(s),
        other => Err(ConvertError::Invalid {
            field_type: ft,
            value: other.as_string(),
        }),
    }
}

fn mismatch(ft: FieldType, value: &FieldValue) -> ConvertError {
    ConvertError::FieldMismatch {
        field_type: ft,
        found: value.variant(),
    }
}

/// Parse a lexical numeral as an integer, tolerating a fractionless float
/// form ("42.0") but rejecting anything that loses value.
fn parse_int_lexical<T>(lexical: &str, ft: FieldType) -> Result<T, ConvertError>
where
    T: TryFrom<i128>,
{
    if let Ok(wide) = lexical.parse::<i128>() {
        return T::try_from(wide).map_err(|_| ConvertError::OutOfRange {
            field_type: ft,
            value: lexical.to_string(),
        });
    }
    let f: f64 = lexical.parse().map_err(|_| ConvertError::Invalid {
        field_type: ft,
        value: lexical.to_string(),
    })?;
    if f.fract() != 0.0 || !f.is_finite() || f < i128::MIN as f64 || f > i128::MAX as f64 {
        return Err(ConvertError::Invalid {
            field_type: ft,
            value: lexical.to_string(),
        });
    }
    T::try_from(f as i128).map_err(|_| ConvertError::OutOfRange {
        field_type: ft,
        value: lexical.to_string(),
    })
}

fn parse_bool_text(text: &str, ft: FieldType) -> Result<bool, ConvertError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConvertError::Invalid {
            field_type: ft,
            value: text.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// integer widths

macro_rules! signed_int_pair {
    ($registry:ident, $ft:ident, $ty:ty) => {{
        // number cell <-> integer field
        $registry.register(Arc::new(BuiltinConverter {
            field_type: FieldType::$ft,
            cell_kind: CellKind::Number,
            to_cell: |value, _| match value {
                FieldValue::Int(i) => {
                    let narrowed = <$ty>::try_from(*i).map_err(|_| ConvertError::OutOfRange {
                        field_type: FieldType::$ft,
                        value: i.to_string(),
                    })?;
                    Ok(CellValue::Number(Number::from_i64(narrowed as i64)))
                }
                other => Err(mismatch(FieldType::$ft, other)),
            },
            from_cell: |cell, _| {
                let n = expect_number(cell, FieldType::$ft)?;
                let v: $ty = parse_int_lexical(n.lexical(), FieldType::$ft)?;
                Ok(FieldValue::Int(v as i64))
            },
        }));
        // string cell <-> integer field
        $registry.register(Arc::new(BuiltinConverter {
            field_type: FieldType::$ft,
            cell_kind: CellKind::String,
            to_cell: |value, _| match value {
                FieldValue::Int(i) => Ok(CellValue::String(i.to_string())),
                other => Err(mismatch(FieldType::$ft, other)),
            },
            from_cell: |cell, _| {
                let s = expect_string(cell, FieldType::$ft)?;
                let v: $ty = parse_int_lexical(s.trim(), FieldType::$ft)?;
                Ok(FieldValue::Int(v as i64))
            },
        }));
    }};
}

macro_rules! unsigned_int_pair {
    ($registry:ident, $ft:ident, $ty:ty) => {{
        $registry.register(Arc::new(BuiltinConverter {
            field_type: FieldType::$ft,
            cell_kind: CellKind::Number,
            to_cell: |value, _| match value {
                FieldValue::UInt(u) => {
                    let narrowed = <$ty>::try_from(*u).map_err(|_| ConvertError::OutOfRange {
                        field_type: FieldType::$ft,
                        value: u.to_string(),
                    })?;
                    Ok(CellValue::Number(Number::from_u64(narrowed as u64)))
                }
                other => Err(mismatch(FieldType::$ft, other)),
            },
            from_cell: |cell, _| {
                let n = expect_number(cell, FieldType::$ft)?;
                let v: $ty = parse_int_lexical(n.lexical(), FieldType::$ft)?;
                Ok(FieldValue::UInt(v as u64))
            },
        }));
        $registry.register(Arc::new(BuiltinConverter {
            field_type: FieldType::$ft,
            cell_kind: CellKind::String,
            to_cell: |value, _| match value {
                FieldValue::UInt(u) => Ok(CellValue::String(u.to_string())),
                other => Err(mismatch(FieldType::$ft, other)),
            },
            from_cell: |cell, _| {
                let s = expect_string(cell, FieldType::$ft)?;
                let v: $ty = parse_int_lexical(s.trim(), FieldType::$ft)?;
                Ok(FieldValue::UInt(v as u64))
            },
        }));
    }};
}

// ---------------------------------------------------------------------------
// registration

/// Install the complete built-in converter set into a registry
pub fn register_defaults(registry: &mut ConverterRegistry) {
    signed_int_pair!(registry, I8, i8);
    signed_int_pair!(registry, I16, i16);
    signed_int_pair!(registry, I32, i32);
    signed_int_pair!(registry, I64, i64);
    unsigned_int_pair!(registry, U8, u8);
    unsigned_int_pair!(registry, U16, u16);
    unsigned_int_pair!(registry, U32, u32);
    unsigned_int_pair!(registry, U64, u64);

    // 128-bit widths carry exactly through the lexical representation.
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::I128,
        cell_kind: CellKind::Number,
        to_cell: |value, _| match value {
            FieldValue::BigInt(i) => Ok(CellValue::Number(Number::from_i128(*i))),
            other => Err(mismatch(FieldType::I128, other)),
        },
        from_cell: |cell, _| {
            let n = expect_number(cell, FieldType::I128)?;
            let v: i128 = parse_int_lexical(n.lexical(), FieldType::I128)?;
            Ok(FieldValue::BigInt(v))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::I128,
        cell_kind: CellKind::String,
        to_cell: |value, _| match value {
            FieldValue::BigInt(i) => Ok(CellValue::String(i.to_string())),
            other => Err(mismatch(FieldType::I128, other)),
        },
        from_cell: |cell, _| {
            let s = expect_string(cell, FieldType::I128)?;
            let v: i128 = parse_int_lexical(s.trim(), FieldType::I128)?;
            Ok(FieldValue::BigInt(v))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::U128,
        cell_kind: CellKind::Number,
        to_cell: |value, _| match value {
            FieldValue::BigUint(u) => Ok(CellValue::Number(Number::from_u128(*u))),
            other => Err(mismatch(FieldType::U128, other)),
        },
        from_cell: |cell, _| {
            let n = expect_number(cell, FieldType::U128)?;
            let v = n.as_u128().ok_or_else(|| ConvertError::Invalid {
                field_type: FieldType::U128,
                value: n.lexical().to_string(),
            })?;
            Ok(FieldValue::BigUint(v))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::U128,
        cell_kind: CellKind::String,
        to_cell: |value, _| match value {
            FieldValue::BigUint(u) => Ok(CellValue::String(u.to_string())),
            other => Err(mismatch(FieldType::U128, other)),
        },
        from_cell: |cell, _| {
            let s = expect_string(cell, FieldType::U128)?;
            let v = s.trim().parse::<u128>().map_err(|_| ConvertError::Invalid {
                field_type: FieldType::U128,
                value: s.to_string(),
            })?;
            Ok(FieldValue::BigUint(v))
        },
    }));

    // float widths
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::F64,
        cell_kind: CellKind::Number,
        to_cell: |value, _| match value {
            FieldValue::Float(f) => Ok(CellValue::Number(Number::from_f64(*f))),
            other => Err(mismatch(FieldType::F64, other)),
        },
        from_cell: |cell, _| {
            let n = expect_number(cell, FieldType::F64)?;
            Ok(FieldValue::Float(n.as_f64()))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::F64,
        cell_kind: CellKind::String,
        to_cell: |value, _| match value {
            FieldValue::Float(f) => Ok(CellValue::String(f.to_string())),
            other => Err(mismatch(FieldType::F64, other)),
        },
        from_cell: |cell, _| {
            let s = expect_string(cell, FieldType::F64)?;
            let f: f64 = s.trim().parse().map_err(|_| ConvertError::Invalid {
                field_type: FieldType::F64,
                value: s.to_string(),
            })?;
            Ok(FieldValue::Float(f))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::F32,
        cell_kind: CellKind::Number,
        to_cell: |value, _| match value {
            // Narrow first so the lexical form is the shortest f32 text,
            // not the widened f64 expansion.
            FieldValue::Float(f) => Ok(CellValue::Number(Number::from_f32(*f as f32))),
            other => Err(mismatch(FieldType::F32, other)),
        },
        from_cell: |cell, _| {
            let n = expect_number(cell, FieldType::F32)?;
            let f: f32 = n.lexical().parse().map_err(|_| ConvertError::Invalid {
                field_type: FieldType::F32,
                value: n.lexical().to_string(),
            })?;
            Ok(FieldValue::Float(f as f64))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::F32,
        cell_kind: CellKind::String,
        to_cell: |value, _| match value {
            FieldValue::Float(f) => Ok(CellValue::String((*f as f32).to_string())),
            other => Err(mismatch(FieldType::F32, other)),
        },
        from_cell: |cell, _| {
            let s = expect_string(cell, FieldType::F32)?;
            let f: f32 = s.trim().parse().map_err(|_| ConvertError::Invalid {
                field_type: FieldType::F32,
                value: s.to_string(),
            })?;
            Ok(FieldValue::Float(f as f64))
        },
    }));

    // lexical decimal
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Decimal,
        cell_kind: CellKind::Number,
        to_cell: |value, _| match value {
            FieldValue::Decimal(d) => {
                let n = Number::from_lexical(d.as_str()).ok_or_else(|| ConvertError::Invalid {
                    field_type: FieldType::Decimal,
                    value: d.to_string(),
                })?;
                Ok(CellValue::Number(n))
            }
            other => Err(mismatch(FieldType::Decimal, other)),
        },
        from_cell: |cell, _| {
            let n = expect_number(cell, FieldType::Decimal)?;
            let d = Decimal::parse(n.lexical()).ok_or_else(|| ConvertError::Invalid {
                field_type: FieldType::Decimal,
                value: n.lexical().to_string(),
            })?;
            Ok(FieldValue::Decimal(d))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Decimal,
        cell_kind: CellKind::String,
        to_cell: |value, _| match value {
            FieldValue::Decimal(d) => Ok(CellValue::String(d.to_string())),
            other => Err(mismatch(FieldType::Decimal, other)),
        },
        from_cell: |cell, _| {
            let s = expect_string(cell, FieldType::Decimal)?;
            let d = Decimal::parse(s).ok_or_else(|| ConvertError::Invalid {
                field_type: FieldType::Decimal,
                value: s.to_string(),
            })?;
            Ok(FieldValue::Decimal(d))
        },
    }));

    // booleans
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Bool,
        cell_kind: CellKind::Bool,
        to_cell: |value, _| match value {
            FieldValue::Bool(b) => Ok(CellValue::Bool(*b)),
            other => Err(mismatch(FieldType::Bool, other)),
        },
        from_cell: |cell, _| match cell {
            CellValue::Bool(b) => Ok(FieldValue::Bool(*b)),
            other => Err(ConvertError::Invalid {
                field_type: FieldType::Bool,
                value: other.as_string(),
            }),
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Bool,
        cell_kind: CellKind::String,
        to_cell: |value, _| match value {
            FieldValue::Bool(b) => Ok(CellValue::String(b.to_string())),
            other => Err(mismatch(FieldType::Bool, other)),
        },
        from_cell: |cell, _| {
            let s = expect_string(cell, FieldType::Bool)?;
            Ok(FieldValue::Bool(parse_bool_text(s, FieldType::Bool)?))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Bool,
        cell_kind: CellKind::Number,
        to_cell: |value, _| match value {
            FieldValue::Bool(b) => Ok(CellValue::Number(Number::from_i64(*b as i64))),
            other => Err(mismatch(FieldType::Bool, other)),
        },
        from_cell: |cell, _| {
            let n = expect_number(cell, FieldType::Bool)?;
            match n.as_i64() {
                Some(0) => Ok(FieldValue::Bool(false)),
                Some(_) => Ok(FieldValue::Bool(true)),
                None => Err(ConvertError::Invalid {
                    field_type: FieldType::Bool,
                    value: n.lexical().to_string(),
                }),
            }
        },
    }));

    // date granularities
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Date,
        cell_kind: CellKind::Number,
        to_cell: |value, cfg| match value {
            FieldValue::Date(d) => Ok(CellValue::Number(Number::from_i64(date_to_serial(*d, cfg)))),
            other => Err(mismatch(FieldType::Date, other)),
        },
        from_cell: |cell, cfg| {
            let n = expect_number(cell, FieldType::Date)?;
            let d = serial_to_date(n.as_f64(), cfg).ok_or_else(|| ConvertError::OutOfRange {
                field_type: FieldType::Date,
                value: n.lexical().to_string(),
            })?;
            Ok(FieldValue::Date(d))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Date,
        cell_kind: CellKind::String,
        to_cell: |value, _| match value {
            FieldValue::Date(d) => Ok(CellValue::String(d.format("%Y-%m-%d").to_string())),
            other => Err(mismatch(FieldType::Date, other)),
        },
        from_cell: |cell, _| {
            let s = expect_string(cell, FieldType::Date)?;
            let d = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                ConvertError::Invalid {
                    field_type: FieldType::Date,
                    value: s.to_string(),
                }
            })?;
            Ok(FieldValue::Date(d))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::DateTime,
        cell_kind: CellKind::Number,
        to_cell: |value, cfg| match value {
            FieldValue::DateTime(dt) => Ok(CellValue::Number(Number::from_f64(
                datetime_to_serial(*dt, cfg),
            ))),
            other => Err(mismatch(FieldType::DateTime, other)),
        },
        from_cell: |cell, cfg| {
            let n = expect_number(cell, FieldType::DateTime)?;
            let dt =
                serial_to_datetime(n.as_f64(), cfg).ok_or_else(|| ConvertError::OutOfRange {
                    field_type: FieldType::DateTime,
                    value: n.lexical().to_string(),
                })?;
            Ok(FieldValue::DateTime(dt))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::DateTime,
        cell_kind: CellKind::String,
        to_cell: |value, _| match value {
            FieldValue::DateTime(dt) => {
                Ok(CellValue::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            }
            other => Err(mismatch(FieldType::DateTime, other)),
        },
        from_cell: |cell, _| {
            let s = expect_string(cell, FieldType::DateTime)?;
            Ok(FieldValue::DateTime(parse_datetime_text(
                s,
                FieldType::DateTime,
            )?))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Timestamp,
        cell_kind: CellKind::Number,
        to_cell: |value, cfg| match value {
            FieldValue::Timestamp(ts) => Ok(CellValue::Number(Number::from_f64(
                datetime_to_serial(ts.naive_utc(), cfg),
            ))),
            other => Err(mismatch(FieldType::Timestamp, other)),
        },
        from_cell: |cell, cfg| {
            let n = expect_number(cell, FieldType::Timestamp)?;
            let dt =
                serial_to_datetime(n.as_f64(), cfg).ok_or_else(|| ConvertError::OutOfRange {
                    field_type: FieldType::Timestamp,
                    value: n.lexical().to_string(),
                })?;
            Ok(FieldValue::Timestamp(DateTime::from_naive_utc_and_offset(
                dt, Utc,
            )))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Timestamp,
        cell_kind: CellKind::String,
        to_cell: |value, _| match value {
            FieldValue::Timestamp(ts) => Ok(CellValue::String(ts.to_rfc3339())),
            other => Err(mismatch(FieldType::Timestamp, other)),
        },
        from_cell: |cell, _| {
            let s = expect_string(cell, FieldType::Timestamp)?;
            if let Ok(ts) = DateTime::parse_from_rfc3339(s.trim()) {
                return Ok(FieldValue::Timestamp(ts.with_timezone(&Utc)));
            }
            let naive = parse_datetime_text(s, FieldType::Timestamp)?;
            Ok(FieldValue::Timestamp(DateTime::from_naive_utc_and_offset(
                naive, Utc,
            )))
        },
    }));

    // text, including the cross-kind reads
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Text,
        cell_kind: CellKind::String,
        to_cell: |value, _| match value {
            FieldValue::Text(s) => Ok(CellValue::String(s.clone())),
            other => Err(mismatch(FieldType::Text, other)),
        },
        from_cell: |cell, cfg| {
            let s = expect_string(cell, FieldType::Text)?;
            let text = if cfg.trim_text { s.trim() } else { s };
            Ok(FieldValue::Text(text.to_string()))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Text,
        cell_kind: CellKind::Number,
        to_cell: |value, _| match value {
            FieldValue::Text(s) => {
                let n = Number::from_lexical(s).ok_or_else(|| ConvertError::Invalid {
                    field_type: FieldType::Text,
                    value: s.clone(),
                })?;
                Ok(CellValue::Number(n))
            }
            other => Err(mismatch(FieldType::Text, other)),
        },
        from_cell: |cell, _| {
            let n = expect_number(cell, FieldType::Text)?;
            Ok(FieldValue::Text(n.lexical().to_string()))
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Text,
        cell_kind: CellKind::Bool,
        to_cell: |value, _| match value {
            FieldValue::Text(s) => Ok(CellValue::Bool(parse_bool_text(s, FieldType::Text)?)),
            other => Err(mismatch(FieldType::Text, other)),
        },
        from_cell: |cell, _| match cell {
            CellValue::Bool(b) => Ok(FieldValue::Text(b.to_string())),
            other => Err(ConvertError::Invalid {
                field_type: FieldType::Text,
                value: other.as_string(),
            }),
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Text,
        cell_kind: CellKind::Formula,
        to_cell: |value, _| match value {
            FieldValue::Text(s) => Ok(CellValue::Formula(s.clone())),
            other => Err(mismatch(FieldType::Text, other)),
        },
        from_cell: |cell, _| match cell {
            CellValue::Formula(f) => Ok(FieldValue::Text(f.clone())),
            other => Err(ConvertError::Invalid {
                field_type: FieldType::Text,
                value: other.as_string(),
            }),
        },
    }));
    registry.register(Arc::new(BuiltinConverter {
        field_type: FieldType::Text,
        cell_kind: CellKind::Error,
        to_cell: |value, _| match value {
            FieldValue::Text(s) => Ok(CellValue::Error(s.clone())),
            other => Err(mismatch(FieldType::Text, other)),
        },
        from_cell: |cell, _| match cell {
            CellValue::Error(e) => Ok(FieldValue::Text(e.clone())),
            other => Err(ConvertError::Invalid {
                field_type: FieldType::Text,
                value: other.as_string(),
            }),
        },
    }));
}

fn parse_datetime_text(text: &str, ft: FieldType) -> Result<NaiveDateTime, ConvertError> {
    let s = text.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(ConvertError::Invalid {
        field_type: ft,
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ConverterRegistry {
        ConverterRegistry::with_defaults()
    }

    fn cfg() -> ConvertConfig {
        ConvertConfig::default()
    }

    #[test]
    fn test_i32_range_check() {
        let conv = registry().resolve(FieldType::I32, CellKind::Number).unwrap();
        let cell = CellValue::Number(Number::from_i64(i64::from(i32::MAX) + 1));
        let err = conv.from_cell(&cell, &cfg()).unwrap_err();
        assert!(matches!(err, ConvertError::OutOfRange { .. }));

        let ok = conv
            .from_cell(&CellValue::Number(Number::from_i64(42)), &cfg())
            .unwrap();
        assert_eq!(ok, FieldValue::Int(42));
    }

    #[test]
    fn test_int_from_fractionless_float() {
        let conv = registry().resolve(FieldType::I64, CellKind::Number).unwrap();
        let cell = CellValue::Number(Number::from_lexical("42.0").unwrap());
        assert_eq!(conv.from_cell(&cell, &cfg()).unwrap(), FieldValue::Int(42));

        let frac = CellValue::Number(Number::from_lexical("42.5").unwrap());
        assert!(conv.from_cell(&frac, &cfg()).is_err());
    }

    #[test]
    fn test_float_to_exact_decimal_text() {
        // The f32 path must not leak widening noise into the cell.
        let conv = registry().resolve(FieldType::F32, CellKind::Number).unwrap();
        let cell = conv.to_cell(&FieldValue::Float(95.62f32 as f64), &cfg()).unwrap();
        assert_eq!(cell, CellValue::Number(Number::from_lexical("95.62").unwrap()));
    }

    #[test]
    fn test_decimal_roundtrip_is_exact() {
        let conv = registry()
            .resolve(FieldType::Decimal, CellKind::Number)
            .unwrap();
        let d = Decimal::parse("0.30000000000000000000001").unwrap();
        let cell = conv.to_cell(&FieldValue::Decimal(d.clone()), &cfg()).unwrap();
        let back = conv.from_cell(&cell, &cfg()).unwrap();
        assert_eq!(back, FieldValue::Decimal(d));
    }

    #[test]
    fn test_date_serial_epoch() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        // Excel serial for 2020-01-01 in the 1900 system.
        assert_eq!(date_to_serial(d, &cfg()), 43831);
        assert_eq!(serial_to_date(43831.0, &cfg()), Some(d));
    }

    #[test]
    fn test_datetime_serial_roundtrip() {
        let dt = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(12, 30, 45)
            .unwrap();
        let serial = datetime_to_serial(dt, &cfg());
        assert!(serial > 43831.0 && serial < 43832.0);
        assert_eq!(serial_to_datetime(serial, &cfg()), Some(dt));
    }

    #[test]
    fn test_epoch_1904() {
        let cfg = ConvertConfig {
            epoch_1904: true,
            ..ConvertConfig::default()
        };
        let d = NaiveDate::from_ymd_opt(1904, 1, 2).unwrap();
        assert_eq!(date_to_serial(d, &cfg), 1);
    }

    #[test]
    fn test_timestamp_string_forms() {
        let conv = registry()
            .resolve(FieldType::Timestamp, CellKind::String)
            .unwrap();
        let rfc = CellValue::String("2020-01-01T12:30:45+00:00".into());
        let plain = CellValue::String("2020-01-01 12:30:45".into());
        assert_eq!(
            conv.from_cell(&rfc, &cfg()).unwrap(),
            conv.from_cell(&plain, &cfg()).unwrap()
        );
    }

    #[test]
    fn test_text_from_number_cell() {
        let conv = registry().resolve(FieldType::Text, CellKind::Number).unwrap();
        let cell = CellValue::Number(Number::from_lexical("5.20").unwrap());
        assert_eq!(
            conv.from_cell(&cell, &cfg()).unwrap(),
            FieldValue::Text("5.20".into())
        );
    }

    #[test]
    fn test_bool_text_forms() {
        let conv = registry().resolve(FieldType::Bool, CellKind::String).unwrap();
        for (text, expected) in [("true", true), ("NO", false), ("1", true)] {
            let cell = CellValue::String(text.into());
            assert_eq!(
                conv.from_cell(&cell, &cfg()).unwrap(),
                FieldValue::Bool(expected)
            );
        }
        assert!(conv
            .from_cell(&CellValue::String("maybe".into()), &cfg())
            .is_err());
    }

    #[test]
    fn test_i128_exact_through_lexical() {
        let conv = registry().resolve(FieldType::I128, CellKind::Number).unwrap();
        let big = FieldValue::BigInt(i128::MAX - 1);
        let cell = conv.to_cell(&big, &cfg()).unwrap();
        assert_eq!(conv.from_cell(&cell, &cfg()).unwrap(), big);
    }
}
