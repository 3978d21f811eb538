//! Streaming read pipeline
//!
//! Drives a codec source row by row, binds each row through the schema
//! binder and dispatches to listeners - synchronously, on the calling
//! thread, in row order. No hidden worker threads: a listener that blocks
//! blocks the whole read, and the only suspension points are the codec
//! `next_row` calls and the listener callbacks themselves.
//!
//! # Examples
//!
//! ```no_run
//! use sheetstream::{CollectListener, SheetReader};
//! # use sheetstream::{FieldMapping, FieldType, FieldValue, Record, Schema};
//! # struct Person;
//! # impl Record for Person {
//! #     fn schema() -> &'static Schema { unimplemented!() }
//! #     fn to_fields(&self) -> Vec<FieldValue> { unimplemented!() }
//! #     fn from_fields(_: Vec<FieldValue>) -> sheetstream::Result<Self> { unimplemented!() }
//! # }
//!
//! # fn main() -> sheetstream::Result<()> {
//! let mut reader = SheetReader::open("people.xlsx")?;
//!
//! // Synchronous collection, for small sheets:
//! let people: Vec<Person> = reader.sheet(0).read_all()?;
//!
//! // Paginated, for bounded memory:
//! reader.sheet(0).read_paged::<Person, _>(100, |batch| {
//!     println!("batch of {}", batch.len());
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod listener;

pub use listener::{CollectListener, PageListener, RowContext, RowListener};

use crate::codec::{self, ContainerKind, SheetSelector, SheetSource};
use crate::convert::{ConvertConfig, ConverterRegistry};
use crate::error::{Result, SheetError};
use crate::field::FieldValue;
use crate::schema::{header_map_from_cells, Record};
use crate::value::CellValue;
use indexmap::IndexMap;
use std::path::Path;

/// Lifecycle of the read pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    SheetSelected,
    Streaming,
    Completed,
    Failed,
}

/// Reader over one opened container
///
/// Owns the underlying file handle exclusively for the session; concurrent
/// reads of the same handle are not a thing - open a second reader instead.
pub struct SheetReader {
    source: Box<dyn SheetSource>,
    registry: ConverterRegistry,
    cfg: ConvertConfig,
    state: PipelineState,
}

impl SheetReader {
    /// Open a container, inferring the kind from the file extension
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_source(codec::open_source(path.as_ref())?))
    }

    /// Open a container of an explicit kind
    pub fn open_as<P: AsRef<Path>>(path: P, kind: ContainerKind) -> Result<Self> {
        Ok(Self::from_source(codec::open_source_as(path.as_ref(), kind)?))
    }

    /// Wrap an already-open codec source
    pub fn from_source(source: Box<dyn SheetSource>) -> Self {
        SheetReader {
            source,
            registry: ConverterRegistry::with_defaults(),
            cfg: ConvertConfig::default(),
            state: PipelineState::Idle,
        }
    }

    /// The session's converter registry, for custom registrations
    pub fn registry_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.registry
    }

    /// The session's conversion options
    pub fn config_mut(&mut self) -> &mut ConvertConfig {
        &mut self.cfg
    }

    pub fn container_kind(&self) -> ContainerKind {
        self.source.kind()
    }

    /// Sheet names in workbook order; empty for kinds without named sheets
    pub fn sheet_names(&self) -> Vec<String> {
        self.source.sheet_names()
    }

    pub fn sheet_count(&self) -> usize {
        self.source.sheet_count()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Select a single sheet by index or name
    pub fn sheet(&mut self, selector: impl Into<SheetSelector>) -> SheetScope<'_> {
        self.state = PipelineState::SheetSelected;
        SheetScope {
            reader: self,
            selectors: vec![selector.into()],
            headerless: false,
            skip_unconvertible: false,
        }
    }

    /// Select several sheets; they stream sequentially in request order,
    /// each with its own header parse and completion cycle
    pub fn sheets<I, S>(&mut self, selectors: I) -> SheetScope<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<SheetSelector>,
    {
        self.state = PipelineState::SheetSelected;
        SheetScope {
            reader: self,
            selectors: selectors.into_iter().map(Into::into).collect(),
            headerless: false,
            skip_unconvertible: false,
        }
    }
}

/// One read call's sheet selection plus its options
pub struct SheetScope<'r> {
    reader: &'r mut SheetReader,
    selectors: Vec<SheetSelector>,
    headerless: bool,
    skip_unconvertible: bool,
}

impl<'r> SheetScope<'r> {
    /// Treat the first physical row as data, binding purely positionally
    pub fn headerless(mut self) -> Self {
        self.headerless = true;
        self
    }

    /// Skip rows whose cells cannot be bound instead of failing the read
    pub fn skip_unconvertible(mut self) -> Self {
        self.skip_unconvertible = true;
        self
    }

    /// Stream into a single listener
    pub fn read_with<R: Record>(self, listener: &mut dyn RowListener<R>) -> Result<()> {
        self.drive::<R>(&mut |event, ctx| match event {
            ReadEvent::Header(header) => listener.on_header(header, ctx),
            ReadEvent::Row(record) => listener.on_row(record, ctx),
            ReadEvent::Complete => listener.on_complete(ctx),
        })
    }

    /// Stream into several listeners, dispatched in registration order
    pub fn read_each<R: Record + Clone>(
        self,
        listeners: &mut [&mut dyn RowListener<R>],
    ) -> Result<()> {
        self.drive::<R>(&mut |event, ctx| {
            match event {
                ReadEvent::Header(header) => {
                    for listener in listeners.iter_mut() {
                        listener.on_header(header, ctx)?;
                    }
                }
                ReadEvent::Row(record) => {
                    for listener in listeners.iter_mut() {
                        listener.on_row(record.clone(), ctx)?;
                    }
                }
                ReadEvent::Complete => {
                    for listener in listeners.iter_mut() {
                        listener.on_complete(ctx)?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Collect every bound record into memory and return it directly
    ///
    /// Intended for small sheets; the caller owns the memory cost.
    pub fn read_all<R: Record>(self) -> Result<Vec<R>> {
        let mut collector = CollectListener::new();
        self.read_with::<R>(&mut collector)?;
        Ok(collector.into_rows())
    }

    /// Buffer bound records and flush batches of `batch_size`, plus a
    /// final partial batch at stream end
    pub fn read_paged<R, F>(self, batch_size: usize, callback: F) -> Result<()>
    where
        R: Record,
        F: FnMut(Vec<R>) -> Result<()>,
    {
        let mut pager = PageListener::new(batch_size, callback)?;
        self.read_with::<R>(&mut pager)
    }

    /// Typeless synchronous read: each row becomes an ordered map from
    /// column index to a kind-natural field value
    pub fn read_rows(self) -> Result<Vec<IndexMap<u32, FieldValue>>> {
        let headerless = self.headerless;
        let reader = self.reader;
        reader.guard_not_failed()?;

        let mut out = Vec::new();
        for selector in &self.selectors {
            let index = reader.source.resolve(selector).inspect_err(|_| {
                reader.state = PipelineState::Failed;
            })?;
            reader.state = PipelineState::Streaming;

            let mut stream = reader.source.open_sheet(index)?;
            let mut saw_header = headerless;
            while let Some(event) = stream.next_row()? {
                if !saw_header {
                    saw_header = true;
                    continue;
                }
                let mut row = IndexMap::new();
                for (col, cell) in event.cells.iter().enumerate() {
                    let value = natural_value(cell);
                    if !value.is_null() {
                        row.insert(col as u32, value);
                    }
                }
                out.push(row);
            }
        }
        reader.state = PipelineState::Completed;
        Ok(out)
    }

    /// The shared pipeline driver: resolve each selector, stream rows,
    /// bind, dispatch; sequential across sheets, no interleaving
    fn drive<R: Record>(
        self,
        dispatch: &mut dyn FnMut(ReadEvent<'_, R>, &RowContext) -> Result<()>,
    ) -> Result<()> {
        let reader = self.reader;
        reader.guard_not_failed()?;

        // Construction failures surface before any sheet is opened.
        let binding = R::schema().bind(&reader.registry).inspect_err(|_| {
            reader.state = PipelineState::Failed;
        })?;

        for selector in &self.selectors {
            let index = match reader.source.resolve(selector) {
                Ok(index) => index,
                Err(e) => {
                    reader.state = PipelineState::Failed;
                    return Err(e);
                }
            };
            let sheet_name = reader.source.sheet_label(index);
            reader.state = PipelineState::Streaming;
            tracing::debug!(sheet = %sheet_name, "streaming sheet");

            let mut ctx = RowContext {
                sheet_name: sheet_name.clone(),
                sheet_index: index,
                row: 0,
                header: None,
            };
            let mut layout = binding.column_layout(None);

            let result = (|| -> Result<()> {
                let mut stream = reader.source.open_sheet(index)?;
                let mut saw_header = self.headerless;
                while let Some(event) = stream.next_row()? {
                    ctx.row = event.row;
                    if !saw_header {
                        saw_header = true;
                        let header = header_map_from_cells(&event.cells);
                        layout = binding.column_layout(Some(&header));
                        dispatch(ReadEvent::Header(&header), &ctx)?;
                        ctx.header = Some(header);
                        continue;
                    }
                    let fields =
                        match binding.bind_row(&event.cells, &layout, &reader.registry, &reader.cfg)
                        {
                            Ok(fields) => fields,
                            Err(bind_err) => {
                                let err = SheetError::Conversion {
                                    sheet: sheet_name.clone(),
                                    row: event.row,
                                    col: bind_err.col,
                                    field: bind_err.field.to_string(),
                                    source: bind_err.source,
                                };
                                if self.skip_unconvertible {
                                    tracing::warn!(error = %err, "skipping unconvertible row");
                                    continue;
                                }
                                return Err(err);
                            }
                        };
                    let record = R::from_fields(fields)?;
                    dispatch(ReadEvent::Row(record), &ctx)?;
                }
                dispatch(ReadEvent::Complete, &ctx)?;
                Ok(())
            })();

            if let Err(e) = result {
                reader.state = PipelineState::Failed;
                return Err(e);
            }
        }

        reader.state = PipelineState::Completed;
        Ok(())
    }
}

impl SheetReader {
    fn guard_not_failed(&self) -> Result<()> {
        if self.state == PipelineState::Failed {
            return Err(SheetError::Malformed(
                "read pipeline is in a failed state; open a new reader".to_string(),
            ));
        }
        Ok(())
    }
}

/// One pipeline dispatch, routed to the matching listener callback
enum ReadEvent<'a, R> {
    Header(&'a IndexMap<u32, String>),
    Row(R),
    Complete,
}

/// Kind-natural conversion for typeless reads
fn natural_value(cell: &CellValue) -> FieldValue {
    match cell {
        CellValue::Empty => FieldValue::Null,
        CellValue::Bool(b) => FieldValue::Bool(*b),
        CellValue::Number(n) => match n.as_i64() {
            Some(i) if !n.lexical().contains(['.', 'e', 'E']) => FieldValue::Int(i),
            _ => FieldValue::Float(n.as_f64()),
        },
        CellValue::String(s) => FieldValue::Text(s.clone()),
        CellValue::Formula(f) => FieldValue::Text(f.clone()),
        CellValue::Error(e) => FieldValue::Text(e.clone()),
        CellValue::Image(_) => FieldValue::Null,
    }
}
