//! Hook-extensible write pipeline
//!
//! Records (or untyped rows and maps) are materialized into ordered cell
//! values through the schema binder, with registered [`WriteHandler`]s
//! invoked around each row and cell. Repeated `write` calls against the
//! same sheet handle continue row output; a call naming a new sheet
//! appends a new sheet. Finishing the writer consumes it, so writing
//! after finish is unrepresentable.
//!
//! # Examples
//!
//! ```no_run
//! use sheetstream::{LoopMergeStrategy, SheetHandle, SheetWriter};
//! # use sheetstream::{FieldMapping, FieldType, FieldValue, Record, Schema};
//! # struct Person;
//! # impl Record for Person {
//! #     fn schema() -> &'static Schema { unimplemented!() }
//! #     fn to_fields(&self) -> Vec<FieldValue> { unimplemented!() }
//! #     fn from_fields(_: Vec<FieldValue>) -> sheetstream::Result<Self> { unimplemented!() }
//! # }
//! # fn people() -> Vec<Person> { Vec::new() }
//!
//! # fn main() -> sheetstream::Result<()> {
//! let mut writer = SheetWriter::create("people.xlsx")?;
//! writer.register_handler(Box::new(LoopMergeStrategy::new(2, 0)));
//! let sheet = SheetHandle::new("People");
//! writer.write(&people(), &sheet)?;
//! writer.write(&people(), &sheet)?; // continues below the first batch
//! writer.finish()?;
//! # Ok(())
//! # }
//! ```

pub mod handler;

pub use handler::{CellWriteContext, LoopMergeStrategy, RowWriteContext, WriteHandler};

use crate::codec::{self, ContainerKind, SheetSink};
use crate::convert::{ConvertConfig, ConverterRegistry};
use crate::error::{Result, SheetError};
use crate::field::FieldValue;
use crate::fill::{FillItem, TemplateWriter};
use crate::schema::Record;
use crate::value::{CellValue, MergeRegion, StyledCell};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Names a target sheet across `write`/`fill` calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetHandle {
    name: String,
    headerless: bool,
}

impl SheetHandle {
    pub fn new(name: impl Into<String>) -> Self {
        SheetHandle {
            name: name.into(),
            headerless: false,
        }
    }

    /// Suppress the header row for typed writes to this sheet
    pub fn headerless(mut self) -> Self {
        self.headerless = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for SheetHandle {
    fn default() -> Self {
        SheetHandle::new("Sheet1")
    }
}

enum Backend {
    Stream {
        sink: Box<dyn SheetSink>,
        /// Sheets that received a header row already
        headed: Vec<String>,
    },
    Template(TemplateWriter),
}

/// Writer over one output container, optionally template-backed
pub struct SheetWriter {
    backend: Backend,
    registry: ConverterRegistry,
    cfg: ConvertConfig,
    handlers: Vec<Box<dyn WriteHandler>>,
}

impl std::fmt::Debug for SheetWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetWriter")
            .field("cfg", &self.cfg)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl SheetWriter {
    /// Create a writer, inferring the container kind from the extension
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        SheetWriterBuilder::new(path).build()
    }

    /// Create a template-backed writer; `fill` calls become available
    pub fn with_template<P: AsRef<Path>, T: AsRef<Path>>(path: P, template: T) -> Result<Self> {
        SheetWriterBuilder::new(path).template(template).build()
    }

    pub fn builder<P: AsRef<Path>>(path: P) -> SheetWriterBuilder {
        SheetWriterBuilder::new(path)
    }

    /// The session's converter registry, for custom registrations
    pub fn registry_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.registry
    }

    pub fn config_mut(&mut self) -> &mut ConvertConfig {
        &mut self.cfg
    }

    /// Register a write hook; handlers run in registration order
    pub fn register_handler(&mut self, handler: Box<dyn WriteHandler>) {
        self.handlers.push(handler);
    }

    /// Write records through the schema binder
    ///
    /// The first typed write to a sheet emits the header row derived from
    /// the schema labels unless the handle is headerless.
    pub fn write<R: Record>(&mut self, records: &[R], sheet: &SheetHandle) -> Result<()> {
        let binding = R::schema().bind(&self.registry)?;

        let widths: Vec<(u32, f64)> = binding
            .fields()
            .iter()
            .filter_map(|f| f.width.map(|w| (f.column, w)))
            .collect();
        self.ensure_sheet(sheet, &widths)?;

        if !sheet.headerless && !self.sheet_has_header(sheet) {
            let header = binding.header_cells();
            self.emit_row(sheet, header, true)?;
            self.mark_header(sheet);
        }

        for record in records {
            let values = record.to_fields();
            let cells = binding
                .unbind_record(&values, &self.registry, &self.cfg)
                .map_err(|bind_err| SheetError::Conversion {
                    sheet: sheet.name.clone(),
                    row: self.rows_written(),
                    col: bind_err.col,
                    field: bind_err.field.to_string(),
                    source: bind_err.source,
                })?;
            self.emit_row(sheet, cells, false)?;
        }
        Ok(())
    }

    /// Write untyped rows of cell values; no header row is emitted
    pub fn write_rows(&mut self, rows: &[Vec<CellValue>], sheet: &SheetHandle) -> Result<()> {
        self.ensure_sheet(sheet, &[])?;
        for row in rows {
            let cells: Vec<StyledCell> = row.iter().cloned().map(StyledCell::from).collect();
            self.emit_row(sheet, cells, false)?;
        }
        Ok(())
    }

    /// Write column-indexed maps of field values; no header row is emitted
    pub fn write_maps(
        &mut self,
        rows: &[IndexMap<u32, FieldValue>],
        sheet: &SheetHandle,
    ) -> Result<()> {
        self.ensure_sheet(sheet, &[])?;
        for (i, map) in rows.iter().enumerate() {
            let width = map.keys().copied().max().map(|c| c + 1).unwrap_or(0);
            let mut cells = vec![StyledCell::from(CellValue::Empty); width as usize];
            for (col, value) in map {
                let cell = self.registry.to_cell_natural(value, &self.cfg).map_err(
                    |source| SheetError::Conversion {
                        sheet: sheet.name.clone(),
                        row: i as u32,
                        col: *col,
                        field: format!("column {}", col),
                        source,
                    },
                )?;
                cells[*col as usize] = StyledCell::from(cell);
            }
            self.emit_row(sheet, cells, false)?;
        }
        Ok(())
    }

    /// Fill a sequence into the template's repeating row block, one clone
    /// of the block per element, appended after any previously filled
    /// region
    ///
    /// Mixing `fill` and plain `write` on the same sheet shifts row
    /// positions in ways the engine does not reconcile; callers doing so
    /// own the resulting drift.
    pub fn fill<T: FillItem>(&mut self, items: &[T], _sheet: &SheetHandle) -> Result<()> {
        match &mut self.backend {
            Backend::Template(template) => template.fill(items, &self.cfg),
            Backend::Stream { sink, .. } => Err(SheetError::Unsupported {
                kind: sink.kind(),
                feature: "fill without a template".to_string(),
            }),
        }
    }

    /// Record scalar placeholder substitutions from a single object/map
    pub fn fill_one<T: FillItem>(&mut self, item: &T) -> Result<()> {
        match &mut self.backend {
            Backend::Template(template) => template.fill_one(item),
            Backend::Stream { sink, .. } => Err(SheetError::Unsupported {
                kind: sink.kind(),
                feature: "fill without a template".to_string(),
            }),
        }
    }

    /// Flush all buffered container structures exactly once
    pub fn finish(self) -> Result<()> {
        match self.backend {
            Backend::Stream { sink, .. } => sink.finish(),
            Backend::Template(template) => template.finish(&self.cfg),
        }
    }

    fn ensure_sheet(&mut self, sheet: &SheetHandle, widths: &[(u32, f64)]) -> Result<()> {
        match &mut self.backend {
            Backend::Stream { sink, .. } => sink.open_sheet(&sheet.name, widths),
            // The template writer owns a single sheet; nothing to open.
            Backend::Template(_) => Ok(()),
        }
    }

    fn sheet_has_header(&self, sheet: &SheetHandle) -> bool {
        match &self.backend {
            Backend::Stream { headed, .. } => headed.contains(&sheet.name),
            Backend::Template(_) => true,
        }
    }

    fn mark_header(&mut self, sheet: &SheetHandle) {
        if let Backend::Stream { headed, .. } = &mut self.backend {
            headed.push(sheet.name.clone());
        }
    }

    fn rows_written(&self) -> u32 {
        match &self.backend {
            Backend::Stream { sink, .. } => sink.rows_written(),
            Backend::Template(template) => template.rows_written(),
        }
    }

    /// Run the hooks and hand the row to the backend
    fn emit_row(&mut self, sheet: &SheetHandle, mut cells: Vec<StyledCell>, is_head: bool) -> Result<()> {
        let row = self.rows_written();

        {
            let mut ctx = RowWriteContext {
                sheet: &sheet.name,
                row,
                is_head,
                cells: &mut cells,
            };
            for handler in &mut self.handlers {
                handler.before_row(&mut ctx)?;
            }
        }

        let mut merges: Vec<MergeRegion> = Vec::new();
        let mut hyperlinks: Vec<(u32, String)> = Vec::new();
        for (col, cell) in cells.iter_mut().enumerate() {
            let mut hyperlink = None;
            let mut ctx = CellWriteContext {
                sheet: &sheet.name,
                row,
                col: col as u32,
                is_head,
                cell,
                merges: &mut merges,
                hyperlink: &mut hyperlink,
            };
            for handler in &mut self.handlers {
                handler.after_cell(&mut ctx)?;
            }
            if let Some(url) = hyperlink {
                hyperlinks.push((col as u32, url));
            }
        }

        match &mut self.backend {
            Backend::Stream { sink, .. } => {
                sink.append_row(&cells)?;
                for region in merges {
                    sink.merge(region)?;
                }
                for (col, url) in hyperlinks {
                    sink.hyperlink(row, col, &url)?;
                }
            }
            Backend::Template(template) => {
                template.append_cells(&cells, &self.cfg)?;
                for region in merges {
                    template.add_merge(region);
                }
                if !hyperlinks.is_empty() {
                    return Err(SheetError::Unsupported {
                        kind: ContainerKind::Xlsx,
                        feature: "hyperlinks on a template write".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builder for configured writers
pub struct SheetWriterBuilder {
    path: PathBuf,
    kind: Option<ContainerKind>,
    template: Option<PathBuf>,
    template_sheet: Option<crate::codec::SheetSelector>,
    registry: Option<ConverterRegistry>,
    cfg: ConvertConfig,
}

impl SheetWriterBuilder {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SheetWriterBuilder {
            path: path.as_ref().to_path_buf(),
            kind: None,
            template: None,
            template_sheet: None,
            registry: None,
            cfg: ConvertConfig::default(),
        }
    }

    /// Force a container kind instead of inferring it from the extension
    pub fn kind(mut self, kind: ContainerKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Base the output on a zip/XML template
    pub fn template<P: AsRef<Path>>(mut self, template: P) -> Self {
        self.template = Some(template.as_ref().to_path_buf());
        self
    }

    /// Which template sheet to fill; defaults to the first
    pub fn template_sheet(mut self, selector: impl Into<crate::codec::SheetSelector>) -> Self {
        self.template_sheet = Some(selector.into());
        self
    }

    /// Start from a custom converter registry
    pub fn registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(mut self, cfg: ConvertConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn build(self) -> Result<SheetWriter> {
        let registry = self.registry.unwrap_or_default();
        let backend = match self.template {
            Some(template) => {
                let selector = self
                    .template_sheet
                    .unwrap_or(crate::codec::SheetSelector::Index(0));
                Backend::Template(TemplateWriter::create(&template, &self.path, &selector)?)
            }
            None => {
                let sink = match self.kind {
                    Some(kind) => codec::open_sink_as(&self.path, kind)?,
                    None => codec::open_sink(&self.path)?,
                };
                Backend::Stream {
                    sink,
                    headed: Vec::new(),
                }
            }
        };
        Ok(SheetWriter {
            backend,
            registry,
            cfg: self.cfg,
            handlers: Vec::new(),
        })
    }
}
