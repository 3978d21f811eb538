//! Shared record types for integration tests

use chrono::NaiveDate;
use sheetstream::{Decimal, FieldMapping, FieldType, FieldValue, Record, Result, Schema};
use std::sync::OnceLock;

/// Two-field schema used by the simple read/write scenarios
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleRow {
    pub name: String,
    pub score: Option<f64>,
}

impl Record for SimpleRow {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("SimpleRow")
                .field(FieldMapping::new("name", FieldType::Text).label("姓名"))
                .field(FieldMapping::new("score", FieldType::F64).label("分数"))
                .build()
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![self.name.as_str().into(), self.score.into()]
    }

    fn from_fields(fields: Vec<FieldValue>) -> Result<Self> {
        let mut it = fields.into_iter();
        Ok(SimpleRow {
            name: it
                .next()
                .and_then(|f| f.as_str().map(String::from))
                .unwrap_or_default(),
            score: it.next().and_then(|f| f.as_f64()),
        })
    }
}

pub fn simple_rows(count: usize) -> Vec<SimpleRow> {
    (0..count)
        .map(|i| SimpleRow {
            name: format!("姓名{}", i),
            score: Some(i as f64 + 0.5),
        })
        .collect()
}

/// Schema covering every built-in convertible field family
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRow {
    pub flag: bool,
    pub small: i64,
    pub big: i128,
    pub ratio: f64,
    pub exact: Decimal,
    pub day: NaiveDate,
    pub label: String,
}

impl Record for TypedRow {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("TypedRow")
                .field(FieldMapping::new("flag", FieldType::Bool))
                .field(FieldMapping::new("small", FieldType::I32))
                .field(FieldMapping::new("big", FieldType::I128))
                .field(FieldMapping::new("ratio", FieldType::F64))
                .field(FieldMapping::new("exact", FieldType::Decimal))
                .field(FieldMapping::new("day", FieldType::Date))
                .field(FieldMapping::new("label", FieldType::Text))
                .build()
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            self.flag.into(),
            self.small.into(),
            FieldValue::BigInt(self.big),
            self.ratio.into(),
            self.exact.clone().into(),
            self.day.into(),
            self.label.as_str().into(),
        ]
    }

    fn from_fields(fields: Vec<FieldValue>) -> Result<Self> {
        let mut it = fields.into_iter();
        let flag = it.next().and_then(|f| f.as_bool()).unwrap_or_default();
        let small = it.next().and_then(|f| f.as_i64()).unwrap_or_default();
        let big = match it.next() {
            Some(FieldValue::BigInt(v)) => v,
            _ => 0,
        };
        let ratio = it.next().and_then(|f| f.as_f64()).unwrap_or_default();
        let exact = match it.next() {
            Some(FieldValue::Decimal(d)) => d,
            _ => Decimal::parse("0").unwrap(),
        };
        let day = it
            .next()
            .and_then(|f| f.as_date())
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        let label = it
            .next()
            .and_then(|f| f.as_str().map(String::from))
            .unwrap_or_default();
        Ok(TypedRow {
            flag,
            small,
            big,
            ratio,
            exact,
            day,
            label,
        })
    }
}

pub fn typed_rows() -> Vec<TypedRow> {
    vec![
        TypedRow {
            flag: true,
            small: 1,
            big: i128::MAX - 7,
            ratio: 95.62,
            exact: Decimal::parse("0.30000000000000000000001").unwrap(),
            day: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            label: "测试".to_string(),
        },
        TypedRow {
            flag: false,
            small: -42,
            big: -1,
            ratio: 0.0,
            exact: Decimal::parse("1").unwrap(),
            day: NaiveDate::from_ymd_opt(1999, 12, 31).unwrap(),
            label: "second".to_string(),
        },
    ]
}
