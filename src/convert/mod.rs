//! Bidirectional converters between declared field types and cell values
//!
//! Resolution is exact-key-first: a converter is looked up by the precise
//! `(FieldType, CellKind)` pair and a miss is an error, never an implicit
//! narrowing. Cross-kind coercions (reading a numeric cell into a text
//! field, a string cell into an integer field) exist only because a
//! converter is registered for that exact pair; the built-ins cover the
//! common ones and callers can register their own, overriding built-ins.
//!
//! The registry is session-scoped. There is no process-wide converter
//! state; each reader/writer owns its own registry and passes it through
//! the pipeline explicitly.

pub mod builtin;

use crate::error::ConvertError;
use crate::field::{FieldType, FieldValue};
use crate::value::{CellKind, CellValue};
use indexmap::IndexMap;
use std::sync::Arc;

/// Lookup key: the declared field type paired with the cell variant
pub type ConverterKey = (FieldType, CellKind);

/// Session-wide conversion options
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertConfig {
    /// Trim surrounding whitespace when reading text cells into text fields
    pub trim_text: bool,
    /// Interpret date serials against the 1904 epoch instead of 1900
    pub epoch_1904: bool,
}

/// A bidirectional field/cell translator
///
/// One implementation claims exactly one `(FieldType, CellKind)` pair and
/// must translate both directions for it.
pub trait Converter: Send + Sync {
    /// The declared field type this converter claims
    fn field_type(&self) -> FieldType;

    /// The cell variant this converter claims
    fn cell_kind(&self) -> CellKind;

    /// Translate a typed field value into a cell of the claimed kind
    fn to_cell(&self, value: &FieldValue, cfg: &ConvertConfig) -> Result<CellValue, ConvertError>;

    /// Translate a cell of the claimed kind into a typed field value
    fn from_cell(&self, cell: &CellValue, cfg: &ConvertConfig) -> Result<FieldValue, ConvertError>;
}

impl std::fmt::Debug for dyn Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("field_type", &self.field_type())
            .field("cell_kind", &self.cell_kind())
            .finish()
    }
}

/// Session-scoped converter registry
///
/// `register` inserts or overrides by key; the last registration wins for
/// the remainder of the session. `resolve` never falls back to another
/// key.
#[derive(Clone)]
pub struct ConverterRegistry {
    map: IndexMap<ConverterKey, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// A registry with no converters at all
    pub fn empty() -> Self {
        ConverterRegistry {
            map: IndexMap::new(),
        }
    }

    /// A registry preloaded with the built-in converter set
    pub fn with_defaults() -> Self {
        let mut registry = ConverterRegistry::empty();
        builtin::register_defaults(&mut registry);
        registry
    }

    /// Insert a converter, overriding any earlier registration for its key
    pub fn register(&mut self, converter: Arc<dyn Converter>) {
        let key = (converter.field_type(), converter.cell_kind());
        self.map.insert(key, converter);
    }

    /// Exact-key lookup
    pub fn resolve(
        &self,
        field_type: FieldType,
        cell_kind: CellKind,
    ) -> Result<Arc<dyn Converter>, ConvertError> {
        self.map
            .get(&(field_type, cell_kind))
            .cloned()
            .ok_or(ConvertError::Unsupported {
                field_type,
                cell_kind,
            })
    }

    /// Whether any converter is registered for the key
    pub fn contains(&self, field_type: FieldType, cell_kind: CellKind) -> bool {
        self.map.contains_key(&(field_type, cell_kind))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Materialize a field value through the converter registered for its
    /// natural type's default cell kind; nulls become empty cells
    pub fn to_cell_natural(
        &self,
        value: &FieldValue,
        cfg: &ConvertConfig,
    ) -> Result<CellValue, ConvertError> {
        let Some(field_type) = value.field_type() else {
            return Ok(CellValue::Empty);
        };
        let converter = self.resolve(field_type, field_type.default_cell_kind())?;
        converter.to_cell(value, cfg)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        ConverterRegistry::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Number;

    struct UppercaseText;

    impl Converter for UppercaseText {
        fn field_type(&self) -> FieldType {
            FieldType::Text
        }

        fn cell_kind(&self) -> CellKind {
            CellKind::String
        }

        fn to_cell(&self, value: &FieldValue, _: &ConvertConfig) -> Result<CellValue, ConvertError> {
            Ok(CellValue::String(value.to_string().to_uppercase()))
        }

        fn from_cell(&self, cell: &CellValue, _: &ConvertConfig) -> Result<FieldValue, ConvertError> {
            Ok(FieldValue::Text(cell.as_string().to_uppercase()))
        }
    }

    #[test]
    fn test_unregistered_key_is_unsupported() {
        let registry = ConverterRegistry::empty();
        let err = registry.resolve(FieldType::I64, CellKind::Number).unwrap_err();
        assert_eq!(
            err,
            ConvertError::Unsupported {
                field_type: FieldType::I64,
                cell_kind: CellKind::Number,
            }
        );
    }

    #[test]
    fn test_registration_overrides() {
        let mut registry = ConverterRegistry::with_defaults();
        registry.register(Arc::new(UppercaseText));

        let conv = registry.resolve(FieldType::Text, CellKind::String).unwrap();
        let out = conv
            .from_cell(&CellValue::String("abc".into()), &ConvertConfig::default())
            .unwrap();
        assert_eq!(out, FieldValue::Text("ABC".into()));
    }

    #[test]
    fn test_no_implicit_narrowing() {
        let registry = ConverterRegistry::with_defaults();
        // A formula cell into an integer field has no registered pair.
        let err = registry
            .resolve(FieldType::I64, CellKind::Formula)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Unsupported { .. }));
    }

    #[test]
    fn test_defaults_cover_number_and_string_for_numerics() {
        let registry = ConverterRegistry::with_defaults();
        for ft in [FieldType::I8, FieldType::U64, FieldType::F32, FieldType::Decimal] {
            assert!(registry.contains(ft, CellKind::Number));
            assert!(registry.contains(ft, CellKind::String));
        }
        let cell = CellValue::Number(Number::from_i64(3));
        let conv = registry.resolve(FieldType::I8, CellKind::Number).unwrap();
        assert!(conv.from_cell(&cell, &ConvertConfig::default()).is_ok());
    }
}
