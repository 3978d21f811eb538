//! # sheetstream
//!
//! A streaming, row-oriented spreadsheet I/O engine: typed record schemas
//! bound over weakly-typed cells, listener-based reads, hook-extensible
//! writes and template fill.
//!
//! ## Features
//!
//! - **Streaming Read**: rows dispatch to listeners one at a time; the
//!   whole document is never materialized
//! - **Typed Binding**: a declarative per-field schema maps records onto
//!   columns through a registry of bidirectional converters
//! - **Streaming Write**: rows go straight to the container with constant
//!   memory, with style/merge/hyperlink hooks at well-defined points
//! - **Template Fill**: `{name}` placeholders and `{.name}` repeating row
//!   blocks, preserving template styles, merges and images
//! - **Three Container Kinds**: zip/XML (`.xlsx`), legacy binary (`.xls`,
//!   read-only) and delimited text (`.csv`)
//!
//! ## Quick Start
//!
//! ### Declaring a record schema
//!
//! ```rust
//! use std::sync::OnceLock;
//! use sheetstream::{FieldMapping, FieldType, FieldValue, Record, Schema};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! impl Record for Person {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::builder("Person")
//!                 .field(FieldMapping::new("name", FieldType::Text).label("姓名"))
//!                 .field(FieldMapping::new("age", FieldType::I64))
//!                 .build()
//!         })
//!     }
//!
//!     fn to_fields(&self) -> Vec<FieldValue> {
//!         vec![self.name.as_str().into(), self.age.into()]
//!     }
//!
//!     fn from_fields(fields: Vec<FieldValue>) -> sheetstream::Result<Self> {
//!         let mut it = fields.into_iter();
//!         Ok(Person {
//!             name: it.next().and_then(|f| f.as_str().map(String::from)).unwrap_or_default(),
//!             age: it.next().and_then(|f| f.as_i64()).unwrap_or_default(),
//!         })
//!     }
//! }
//! ```
//!
//! ### Writing and reading back
//!
//! ```rust,no_run
//! # use std::sync::OnceLock;
//! # use sheetstream::{FieldMapping, FieldType, FieldValue, Record, Schema};
//! # #[derive(Clone)]
//! # struct Person { name: String, age: i64 }
//! # impl Record for Person {
//! #     fn schema() -> &'static Schema {
//! #         static S: OnceLock<Schema> = OnceLock::new();
//! #         S.get_or_init(|| Schema::builder("Person")
//! #             .field(FieldMapping::new("name", FieldType::Text))
//! #             .field(FieldMapping::new("age", FieldType::I64))
//! #             .build())
//! #     }
//! #     fn to_fields(&self) -> Vec<FieldValue> { vec![self.name.as_str().into(), self.age.into()] }
//! #     fn from_fields(f: Vec<FieldValue>) -> sheetstream::Result<Self> {
//! #         let mut it = f.into_iter();
//! #         Ok(Person {
//! #             name: it.next().and_then(|v| v.as_str().map(String::from)).unwrap_or_default(),
//! #             age: it.next().and_then(|v| v.as_i64()).unwrap_or_default(),
//! #         })
//! #     }
//! # }
//! use sheetstream::{SheetHandle, SheetReader, SheetWriter};
//!
//! # fn main() -> sheetstream::Result<()> {
//! let people = vec![Person { name: "Alice".into(), age: 30 }];
//!
//! let mut writer = SheetWriter::create("people.xlsx")?;
//! writer.write(&people, &SheetHandle::new("People"))?;
//! writer.finish()?;
//!
//! let mut reader = SheetReader::open("people.xlsx")?;
//! let back: Vec<Person> = reader.sheet("People").read_all()?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Filling a template
//!
//! ```rust,no_run
//! use sheetstream::{FillMap, SheetHandle, SheetWriter};
//!
//! # fn main() -> sheetstream::Result<()> {
//! let mut writer = SheetWriter::with_template("out.xlsx", "template.xlsx")?;
//! let rows: Vec<FillMap> = (0..10)
//!     .map(|i| {
//!         let mut row = FillMap::new();
//!         row.insert("name".into(), format!("Zhang San{}", i).into());
//!         row
//!     })
//!     .collect();
//! let sheet = SheetHandle::default();
//! writer.fill(&rows, &sheet)?;
//! writer.fill(&rows, &sheet)?; // appends ten more blocks
//! writer.finish()?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod convert;
pub mod error;
pub mod field;
pub mod fill;
pub mod read;
pub mod schema;
pub mod value;
pub mod write;

pub use codec::{ContainerKind, RowEvent, RowStream, SheetSelector, SheetSink, SheetSource};
pub use convert::{ConvertConfig, Converter, ConverterKey, ConverterRegistry};
pub use error::{ConvertError, Result, SheetError};
pub use field::{FieldType, FieldValue};
pub use fill::{to_fill_map, FillItem, FillMap};
pub use read::{
    CollectListener, PageListener, PipelineState, RowContext, RowListener, SheetReader, SheetScope,
};
pub use schema::{FieldMapping, Record, Schema, SchemaBuilder};
pub use value::{
    CellKind, CellStyle, CellValue, Decimal, ImageFormat, ImageRef, MergeRegion, Number, StyledCell,
};
pub use write::{
    CellWriteContext, LoopMergeStrategy, RowWriteContext, SheetHandle, SheetWriter,
    SheetWriterBuilder, WriteHandler,
};
