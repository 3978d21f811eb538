//! Error types for the sheetstream library

use crate::codec::ContainerKind;
use crate::field::FieldType;
use crate::value::CellKind;
use thiserror::Error;

/// Result type alias for sheetstream operations
pub type Result<T> = std::result::Result<T, SheetError>;

/// Main error type for all read/write pipeline operations
///
/// Variants fall into four classes: schema construction failures (fatal,
/// raised before any I/O), per-cell conversion failures (carry enough
/// context to pinpoint the failing cell), container failures (malformed or
/// unsupported file structure, bad sheet selectors), and resource failures
/// (the underlying stream is gone).
#[derive(Error, Debug)]
pub enum SheetError {
    /// A schema could not be constructed; raised before any I/O starts
    #[error("schema for `{type_name}`, field `{field}`: {reason}")]
    Construction {
        type_name: String,
        field: String,
        reason: String,
    },

    /// A specific cell's value could not be bound to its declared field
    #[error("sheet `{sheet}`, row {row}, column {col}, field `{field}`: {source}")]
    Conversion {
        sheet: String,
        row: u32,
        col: u32,
        field: String,
        #[source]
        source: ConvertError,
    },

    /// Invalid sheet name or sheet not found
    #[error("sheet `{sheet}` not found. Available sheets: {available}")]
    SheetNotFound { sheet: String, available: String },

    /// The container kind cannot do what was asked of it
    #[error("{feature} is not supported by {kind} containers")]
    Unsupported { kind: ContainerKind, feature: String },

    /// Malformed or unreadable container structure
    #[error("malformed container: {0}")]
    Malformed(String),

    /// A listener or write-hook asked for the pipeline to stop
    #[error("aborted by caller: {0}")]
    Aborted(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// True for the error classes that leave the pipeline unusable
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SheetError::Conversion { .. })
    }
}

/// A single field/cell translation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// No converter registered for this exact (field type, cell kind) pair
    #[error("no converter registered for {field_type:?} <-> {cell_kind:?}")]
    Unsupported {
        field_type: FieldType,
        cell_kind: CellKind,
    },

    /// The value parses but does not fit the declared width
    #[error("value `{value}` is out of range for {field_type:?}")]
    OutOfRange { field_type: FieldType, value: String },

    /// The value cannot be parsed as the declared type at all
    #[error("cannot interpret `{value}` as {field_type:?}")]
    Invalid { field_type: FieldType, value: String },

    /// A converter was handed a field value of the wrong variant
    #[error("converter for {field_type:?} received a {found} field value")]
    FieldMismatch {
        field_type: FieldType,
        found: &'static str,
    },
}

impl From<calamine::Error> for SheetError {
    fn from(err: calamine::Error) -> Self {
        SheetError::Malformed(err.to_string())
    }
}

impl From<calamine::XlsError> for SheetError {
    fn from(err: calamine::XlsError) -> Self {
        SheetError::Malformed(err.to_string())
    }
}

impl From<zip::result::ZipError> for SheetError {
    fn from(err: zip::result::ZipError) -> Self {
        SheetError::Malformed(err.to_string())
    }
}

impl From<csv::Error> for SheetError {
    fn from(err: csv::Error) -> Self {
        SheetError::Malformed(err.to_string())
    }
}
