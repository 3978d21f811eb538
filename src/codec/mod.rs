//! Container codec layer
//!
//! The pipelines never touch container bytes; they drive these traits. A
//! [`SheetSource`] demultiplexes a container into per-sheet [`RowEvent`]s,
//! a [`SheetSink`] accepts ordered cell values and container-level
//! features (merges, hyperlinks, images) the kind supports.
//!
//! Three kinds are wired in: zip/XML ([`ContainerKind::Xlsx`], streaming
//! both directions), legacy binary ([`ContainerKind::Xls`], read-only,
//! not streaming), and delimited text ([`ContainerKind::Csv`], no sheet
//! names, no styles/merges).

pub mod csv;
pub mod xls;
pub mod xlsx;

use crate::error::{Result, SheetError};
use crate::value::{CellValue, MergeRegion, StyledCell};
use std::fmt;
use std::path::Path;

/// One of the three supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContainerKind {
    /// Zip/XML workbook: styles, merges, formulas, true streaming
    Xlsx,
    /// Legacy binary workbook: read-only in this implementation
    Xls,
    /// Delimited text: single unnamed sheet, values only
    Csv,
}

impl ContainerKind {
    /// Guess the kind from a file extension
    pub fn from_path(path: &Path) -> Option<ContainerKind> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("xlsx" | "xlsm") => Some(ContainerKind::Xlsx),
            Some("xls") => Some(ContainerKind::Xls),
            Some("csv") => Some(ContainerKind::Csv),
            _ => None,
        }
    }

    /// Whether sheets carry names in this kind
    pub fn has_named_sheets(&self) -> bool {
        !matches!(self, ContainerKind::Csv)
    }

    pub fn supports_styles(&self) -> bool {
        !matches!(self, ContainerKind::Csv)
    }

    pub fn supports_merges(&self) -> bool {
        !matches!(self, ContainerKind::Csv)
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Xlsx => f.write_str("zip/XML"),
            ContainerKind::Xls => f.write_str("legacy binary"),
            ContainerKind::Csv => f.write_str("delimited-text"),
        }
    }
}

/// Selects a sheet by position or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// Zero-based position
    Index(usize),
    /// Sheet name; unsupported for kinds without named sheets
    Name(String),
}

impl From<usize> for SheetSelector {
    fn from(index: usize) -> Self {
        SheetSelector::Index(index)
    }
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_string())
    }
}

impl From<String> for SheetSelector {
    fn from(name: String) -> Self {
        SheetSelector::Name(name)
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Index(i) => write!(f, "index {}", i),
            SheetSelector::Name(n) => f.write_str(n),
        }
    }
}

/// One row of raw cells as produced by a source, consumed exactly once
#[derive(Debug, Clone, PartialEq)]
pub struct RowEvent {
    /// Absolute zero-based row index within the sheet
    pub row: u32,
    /// Cells ordered by column index; gaps are `CellValue::Empty`
    pub cells: Vec<CellValue>,
}

/// Sequential row access for one opened sheet
pub trait RowStream {
    /// The next row, or `None` at end of sheet
    fn next_row(&mut self) -> Result<Option<RowEvent>>;
}

/// Read side of a container
pub trait SheetSource {
    fn kind(&self) -> ContainerKind;

    /// Sheet names in workbook order; empty for kinds without named sheets
    fn sheet_names(&self) -> Vec<String>;

    fn sheet_count(&self) -> usize;

    /// Open one sheet for sequential row reads
    fn open_sheet(&mut self, index: usize) -> Result<Box<dyn RowStream + '_>>;

    /// Resolve a selector against the catalog, failing predictably for
    /// name lookup on kinds without named sheets
    fn resolve(&self, selector: &SheetSelector) -> Result<usize> {
        match selector {
            SheetSelector::Index(i) => {
                if *i < self.sheet_count() {
                    Ok(*i)
                } else {
                    Err(SheetError::SheetNotFound {
                        sheet: format!("index {}", i),
                        available: self.sheet_names().join(", "),
                    })
                }
            }
            SheetSelector::Name(name) => {
                if !self.kind().has_named_sheets() {
                    return Err(SheetError::Unsupported {
                        kind: self.kind(),
                        feature: "sheet selection by name".to_string(),
                    });
                }
                self.sheet_names()
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| SheetError::SheetNotFound {
                        sheet: name.clone(),
                        available: self.sheet_names().join(", "),
                    })
            }
        }
    }

    /// Display name for diagnostics and error context
    fn sheet_label(&self, index: usize) -> String {
        self.sheet_names()
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{}", index))
    }
}

/// Write side of a container
pub trait SheetSink {
    fn kind(&self) -> ContainerKind;

    /// Start (or restart into) a sheet; rows append from the top
    fn open_sheet(&mut self, name: &str, col_widths: &[(u32, f64)]) -> Result<()>;

    /// Append one row of styled cells to the current sheet
    fn append_row(&mut self, cells: &[StyledCell]) -> Result<()>;

    /// Rows written to the current sheet so far
    fn rows_written(&self) -> u32;

    /// Declare a merged region on the current sheet
    fn merge(&mut self, region: MergeRegion) -> Result<()>;

    /// Attach a hyperlink to a cell of the current sheet
    fn hyperlink(&mut self, row: u32, col: u32, url: &str) -> Result<()>;

    /// Flush all buffered container structures; called exactly once
    fn finish(self: Box<Self>) -> Result<()>;
}

impl std::fmt::Debug for dyn SheetSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetSink")
            .field("kind", &self.kind())
            .finish()
    }
}

/// Open a source for the kind implied by the file extension
pub fn open_source(path: &Path) -> Result<Box<dyn SheetSource>> {
    let kind = ContainerKind::from_path(path).ok_or_else(|| {
        SheetError::Malformed(format!("unrecognized container extension: {}", path.display()))
    })?;
    open_source_as(path, kind)
}

/// Open a source for an explicit kind
pub fn open_source_as(path: &Path, kind: ContainerKind) -> Result<Box<dyn SheetSource>> {
    match kind {
        ContainerKind::Xlsx => Ok(Box::new(xlsx::read::XlsxSource::open(path)?)),
        ContainerKind::Xls => Ok(Box::new(xls::XlsSource::open(path)?)),
        ContainerKind::Csv => Ok(Box::new(csv::CsvSource::open(path)?)),
    }
}

/// Create a sink for the kind implied by the file extension
pub fn open_sink(path: &Path) -> Result<Box<dyn SheetSink>> {
    let kind = ContainerKind::from_path(path).ok_or_else(|| {
        SheetError::Malformed(format!("unrecognized container extension: {}", path.display()))
    })?;
    open_sink_as(path, kind)
}

/// Create a sink for an explicit kind
pub fn open_sink_as(path: &Path, kind: ContainerKind) -> Result<Box<dyn SheetSink>> {
    match kind {
        ContainerKind::Xlsx => Ok(Box::new(xlsx::write::XlsxSink::create(path)?)),
        ContainerKind::Xls => Err(SheetError::Unsupported {
            kind: ContainerKind::Xls,
            feature: "writing".to_string(),
        }),
        ContainerKind::Csv => Ok(Box::new(csv::CsvSink::create(path)?)),
    }
}
