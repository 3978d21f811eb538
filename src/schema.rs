//! Declarative schema descriptions and the record/row binder
//!
//! A [`Schema`] is built once per record type through [`SchemaBuilder`] and
//! describes, per field: the target column (explicit index or positional
//! order), the header label, an optional converter override and write-side
//! style hints. [`Schema::bind`] resolves the description against a
//! converter registry into a [`Binding`] - the ordered (column, field,
//! converter) layout both pipelines run on. Resolution failures surface
//! there, before any I/O starts.
//!
//! # Examples
//!
//! ```
//! use std::sync::OnceLock;
//! use sheetstream::{FieldMapping, FieldType, FieldValue, Record, Schema};
//!
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

use crate::convert::{ConvertConfig, Converter, ConverterRegistry};
use crate::error::{ConvertError, Result, SheetError};
use crate::field::{FieldType, FieldValue};
use crate::value::{CellKind, CellStyle, CellValue, StyledCell};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A record type that can pass through the binder
///
/// `to_fields`/`from_fields` exchange values in the schema's declaration
/// order, not in column order; the binder owns the column layout.
pub trait Record: Sized {
    /// The cached, per-type schema description
    fn schema() -> &'static Schema;

    /// Field values in declaration order
    fn to_fields(&self) -> Vec<FieldValue>;

    /// Rebuild a record from field values in declaration order
    fn from_fields(fields: Vec<FieldValue>) -> Result<Self>;
}

/// Declares how one field of a record type maps onto a column
#[derive(Clone)]
pub struct FieldMapping {
    name: &'static str,
    field_type: FieldType,
    column: Option<u32>,
    label: Option<String>,
    converter: Option<Arc<dyn Converter>>,
    style: Option<CellStyle>,
    width: Option<f64>,
}

impl FieldMapping {
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        FieldMapping {
            name,
            field_type,
            column: None,
            label: None,
            converter: None,
            style: None,
            width: None,
        }
    }

    /// Pin this field to an explicit zero-based column
    pub fn column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }

    /// Header label; defaults to the field name
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Explicit converter for this field, taking priority over the
    /// registry when the incoming/outgoing cell kind matches its claim
    pub fn converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Write-side style preset for this field's data cells
    pub fn style(mut self, style: CellStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Write-side column width hint
    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn header_label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.name)
    }
}

impl fmt::Debug for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMapping")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("column", &self.column)
            .field("label", &self.label)
            .field("has_converter", &self.converter.is_some())
            .field("style", &self.style)
            .finish()
    }
}

/// Declarative description of a record type, built once and cached
#[derive(Debug, Clone)]
pub struct Schema {
    type_name: &'static str,
    fields: Vec<FieldMapping>,
}

impl Schema {
    pub fn builder(type_name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            type_name,
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    /// Resolve the declaration into an ordered column layout, failing fast
    /// on duplicate explicit columns or unresolvable converters
    pub fn bind(&self, registry: &ConverterRegistry) -> Result<Binding> {
        let mut by_column: BTreeMap<u32, usize> = BTreeMap::new();

        // Explicit indices claim their columns first.
        for (decl, mapping) in self.fields.iter().enumerate() {
            if let Some(col) = mapping.column {
                if by_column.insert(col, decl).is_some() {
                    return Err(SheetError::Construction {
                        type_name: self.type_name.to_string(),
                        field: mapping.name.to_string(),
                        reason: format!("column {} is declared twice", col),
                    });
                }
            }
        }

        // Positional fields fill the remaining gaps in declaration order.
        let mut next_free = 0u32;
        for (decl, mapping) in self.fields.iter().enumerate() {
            if mapping.column.is_none() {
                while by_column.contains_key(&next_free) {
                    next_free += 1;
                }
                by_column.insert(next_free, decl);
                next_free += 1;
            }
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        for (column, decl) in by_column {
            let mapping = &self.fields[decl];
            if mapping.converter.is_none() {
                let write_kind = mapping.field_type.default_cell_kind();
                if registry.resolve(mapping.field_type, write_kind).is_err() {
                    return Err(SheetError::Construction {
                        type_name: self.type_name.to_string(),
                        field: mapping.name.to_string(),
                        reason: format!(
                            "no converter registered for {:?} <-> {:?}",
                            mapping.field_type, write_kind
                        ),
                    });
                }
            }
            fields.push(BoundField {
                decl_index: decl,
                name: mapping.name,
                field_type: mapping.field_type,
                column,
                label: mapping.header_label().to_string(),
                converter: mapping.converter.clone(),
                style: mapping.style,
                width: mapping.width,
            });
        }

        Ok(Binding {
            type_name: self.type_name,
            field_count: self.fields.len(),
            fields,
        })
    }
}

/// Builder for [`Schema`]
pub struct SchemaBuilder {
    type_name: &'static str,
    fields: Vec<FieldMapping>,
}

impl SchemaBuilder {
    pub fn field(mut self, mapping: FieldMapping) -> Self {
        self.fields.push(mapping);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            type_name: self.type_name,
            fields: self.fields,
        }
    }
}

/// One field of a resolved layout
#[derive(Clone, Debug)]
pub struct BoundField {
    pub(crate) decl_index: usize,
    pub(crate) name: &'static str,
    pub(crate) field_type: FieldType,
    pub(crate) column: u32,
    pub(crate) label: String,
    converter: Option<Arc<dyn Converter>>,
    pub(crate) style: Option<CellStyle>,
    pub(crate) width: Option<f64>,
}

/// A per-cell binding failure, wrapped into `SheetError::Conversion` by the
/// pipelines once the sheet/row context is known
#[derive(Debug)]
pub(crate) struct BindCellError {
    pub field: &'static str,
    pub col: u32,
    pub source: ConvertError,
}

/// The resolved (column, field, converter) layout for one record type
#[derive(Clone, Debug)]
pub struct Binding {
    type_name: &'static str,
    field_count: usize,
    fields: Vec<BoundField>,
}

impl Binding {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[BoundField] {
        &self.fields
    }

    /// Header cells in column order, gaps left empty
    pub fn header_cells(&self) -> Vec<StyledCell> {
        let mut cells = Vec::new();
        for field in &self.fields {
            while cells.len() < field.column as usize {
                cells.push(StyledCell::from(CellValue::Empty));
            }
            cells.push(StyledCell::new(
                CellValue::String(field.label.clone()),
                CellStyle::HeaderBold,
            ));
        }
        cells
    }

    /// Column positions for each field, honoring a parsed header row when
    /// one is available: a field whose label appears in the header binds to
    /// that column, everything else keeps its layout position.
    pub(crate) fn column_layout(&self, header: Option<&IndexMap<u32, String>>) -> Vec<(u32, usize)> {
        self.fields
            .iter()
            .enumerate()
            .map(|(slot, field)| {
                let col = header
                    .and_then(|map| {
                        map.iter()
                            .find(|(_, label)| label.as_str() == field.label)
                            .map(|(col, _)| *col)
                    })
                    .unwrap_or(field.column);
                (col, slot)
            })
            .collect()
    }

    /// Bind one row of cells into declaration-ordered field values
    pub(crate) fn bind_row(
        &self,
        cells: &[CellValue],
        layout: &[(u32, usize)],
        registry: &ConverterRegistry,
        cfg: &ConvertConfig,
    ) -> std::result::Result<Vec<FieldValue>, BindCellError> {
        static EMPTY: CellValue = CellValue::Empty;
        let mut out = vec![FieldValue::Null; self.field_count];
        for (col, slot) in layout {
            let field = &self.fields[*slot];
            let cell = cells.get(*col as usize).unwrap_or(&EMPTY);
            let value = if cell.is_empty() {
                FieldValue::Null
            } else {
                let converter = self.reader_converter(field, cell.kind(), registry).map_err(
                    |source| BindCellError {
                        field: field.name,
                        col: *col,
                        source,
                    },
                )?;
                converter.from_cell(cell, cfg).map_err(|source| BindCellError {
                    field: field.name,
                    col: *col,
                    source,
                })?
            };
            out[field.decl_index] = value;
        }
        Ok(out)
    }

    /// Materialize declaration-ordered field values into column-ordered,
    /// styled cells (gaps left empty)
    pub(crate) fn unbind_record(
        &self,
        values: &[FieldValue],
        registry: &ConverterRegistry,
        cfg: &ConvertConfig,
    ) -> std::result::Result<Vec<StyledCell>, BindCellError> {
        static NULL: FieldValue = FieldValue::Null;
        let mut cells = Vec::new();
        for field in &self.fields {
            while cells.len() < field.column as usize {
                cells.push(StyledCell::from(CellValue::Empty));
            }
            let value = values.get(field.decl_index).unwrap_or(&NULL);
            let cell = if value.is_null() {
                CellValue::Empty
            } else {
                let converter = self
                    .writer_converter(field, registry)
                    .map_err(|source| BindCellError {
                        field: field.name,
                        col: field.column,
                        source,
                    })?;
                converter.to_cell(value, cfg).map_err(|source| BindCellError {
                    field: field.name,
                    col: field.column,
                    source,
                })?
            };
            cells.push(StyledCell::new(cell, field.effective_style()));
        }
        Ok(cells)
    }

    fn reader_converter(
        &self,
        field: &BoundField,
        incoming: CellKind,
        registry: &ConverterRegistry,
    ) -> std::result::Result<Arc<dyn Converter>, ConvertError> {
        if let Some(conv) = &field.converter {
            if conv.cell_kind() == incoming {
                return Ok(Arc::clone(conv));
            }
        }
        registry.resolve(field.field_type, incoming)
    }

    fn writer_converter(
        &self,
        field: &BoundField,
        registry: &ConverterRegistry,
    ) -> std::result::Result<Arc<dyn Converter>, ConvertError> {
        if let Some(conv) = &field.converter {
            return Ok(Arc::clone(conv));
        }
        registry.resolve(field.field_type, field.field_type.default_cell_kind())
    }
}

impl BoundField {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The style hint, with a readable default for date-like fields
    pub(crate) fn effective_style(&self) -> CellStyle {
        if let Some(style) = self.style {
            return style;
        }
        match self.field_type {
            FieldType::Date => CellStyle::DateDefault,
            FieldType::DateTime | FieldType::Timestamp => CellStyle::DateTimestamp,
            _ => CellStyle::Default,
        }
    }
}

/// Build the header snapshot from the first physical row's cells
pub(crate) fn header_map_from_cells(cells: &[CellValue]) -> IndexMap<u32, String> {
    let mut map = IndexMap::new();
    for (col, cell) in cells.iter().enumerate() {
        if !cell.is_empty() {
            map.insert(col as u32, cell.as_string());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ConverterRegistry {
        ConverterRegistry::with_defaults()
    }

    fn two_field_schema() -> Schema {
        Schema::builder("TwoField")
            .field(FieldMapping::new("name", FieldType::Text).label("姓名"))
            .field(FieldMapping::new("score", FieldType::F64))
            .build()
    }

    #[test]
    fn test_positional_layout() {
        let binding = two_field_schema().bind(&registry()).unwrap();
        let cols: Vec<u32> = binding.fields().iter().map(|f| f.column()).collect();
        assert_eq!(cols, vec![0, 1]);
        assert_eq!(binding.fields()[0].label(), "姓名");
    }

    #[test]
    fn test_explicit_columns_take_precedence() {
        // "first" is positional, "pinned" claims column 0, so "first"
        // shifts to the next free column.
        let schema = Schema::builder("Mixed")
            .field(FieldMapping::new("first", FieldType::Text))
            .field(FieldMapping::new("pinned", FieldType::Text).column(0))
            .field(FieldMapping::new("third", FieldType::Text))
            .build();
        let binding = schema.bind(&registry()).unwrap();
        let layout: Vec<(&str, u32)> = binding
            .fields()
            .iter()
            .map(|f| (f.name(), f.column()))
            .collect();
        assert_eq!(layout, vec![("pinned", 0), ("first", 1), ("third", 2)]);
    }

    #[test]
    fn test_duplicate_explicit_column_fails() {
        let schema = Schema::builder("Dup")
            .field(FieldMapping::new("a", FieldType::Text).column(1))
            .field(FieldMapping::new("b", FieldType::Text).column(1))
            .build();
        let err = schema.bind(&registry()).unwrap_err();
        assert!(matches!(err, SheetError::Construction { .. }));
    }

    #[test]
    fn test_unresolvable_converter_fails_before_io() {
        let schema = two_field_schema();
        let err = schema.bind(&ConverterRegistry::empty()).unwrap_err();
        match err {
            SheetError::Construction { field, .. } => assert_eq!(field, "name"),
            other => panic!("expected construction error, got {other}"),
        }
    }

    #[test]
    fn test_bind_row_in_declaration_order() {
        let binding = two_field_schema().bind(&registry()).unwrap();
        let layout = binding.column_layout(None);
        let cells = vec![
            CellValue::String("张三".into()),
            CellValue::from(95.5f64),
        ];
        let fields = binding
            .bind_row(&cells, &layout, &registry(), &ConvertConfig::default())
            .unwrap();
        assert_eq!(fields[0], FieldValue::Text("张三".into()));
        assert_eq!(fields[1], FieldValue::Float(95.5));
    }

    #[test]
    fn test_header_rebinds_columns() {
        let binding = two_field_schema().bind(&registry()).unwrap();
        // Header has the two labels swapped relative to the layout.
        let mut header = IndexMap::new();
        header.insert(0u32, "score".to_string());
        header.insert(1u32, "姓名".to_string());
        let layout = binding.column_layout(Some(&header));
        assert_eq!(layout, vec![(1, 0), (0, 1)]);
    }

    #[test]
    fn test_unbind_styles_and_gaps() {
        let schema = Schema::builder("Gapped")
            .field(FieldMapping::new("name", FieldType::Text))
            .field(FieldMapping::new("when", FieldType::Date).column(2))
            .build();
        let binding = schema.bind(&registry()).unwrap();
        let values = vec![
            FieldValue::Text("x".into()),
            FieldValue::Date(chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
        ];
        let cells = binding
            .unbind_record(&values, &registry(), &ConvertConfig::default())
            .unwrap();
        assert_eq!(cells.len(), 3);
        assert!(cells[1].value.is_empty());
        assert_eq!(cells[2].style, CellStyle::DateDefault);
    }

    #[test]
    fn test_empty_cell_binds_null() {
        let binding = two_field_schema().bind(&registry()).unwrap();
        let layout = binding.column_layout(None);
        let fields = binding
            .bind_row(&[], &layout, &registry(), &ConvertConfig::default())
            .unwrap();
        assert!(fields[0].is_null());
        assert!(fields[1].is_null());
    }
}
