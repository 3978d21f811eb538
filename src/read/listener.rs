//! Listener interfaces for the streaming read pipeline

use crate::error::{Result, SheetError};
use indexmap::IndexMap;

/// Per-dispatch context handed to listener callbacks
#[derive(Debug, Clone)]
pub struct RowContext {
    pub(crate) sheet_name: String,
    pub(crate) sheet_index: usize,
    pub(crate) row: u32,
    pub(crate) header: Option<IndexMap<u32, String>>,
}

impl RowContext {
    /// Display name of the sheet being streamed
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Zero-based position of the sheet in the container
    pub fn sheet_index(&self) -> usize {
        self.sheet_index
    }

    /// Absolute zero-based row index of the current dispatch
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Header snapshot: column index to header label, when headers are on
    pub fn header(&self) -> Option<&IndexMap<u32, String>> {
        self.header.as_ref()
    }
}

/// Receives bound records as a sheet streams
///
/// Callbacks run synchronously on the reading thread, in row order and in
/// listener registration order; an error return propagates out of the read
/// call and fails the pipeline. A listener holding mutable accumulation
/// state should be freshly constructed per read session.
pub trait RowListener<R> {
    /// The parsed header row, before any data row
    fn on_header(&mut self, _header: &IndexMap<u32, String>, _ctx: &RowContext) -> Result<()> {
        Ok(())
    }

    /// One bound record
    fn on_row(&mut self, record: R, ctx: &RowContext) -> Result<()>;

    /// Sheet finished; the context carries the final header snapshot
    fn on_complete(&mut self, _ctx: &RowContext) -> Result<()> {
        Ok(())
    }
}

/// Collects every bound record plus the header map
///
/// # Examples
///
/// ```no_run
/// use sheetstream::{CollectListener, SheetReader};
/// # use sheetstream::{FieldMapping, FieldType, FieldValue, Record, Schema};
/// # struct Person;
/// # impl Record for Person {
/// #     fn schema() -> &'static Schema { unimplemented!() }
/// #     fn to_fields(&self) -> Vec<FieldValue> { unimplemented!() }
/// #     fn from_fields(_: Vec<FieldValue>) -> sheetstream::Result<Self> { unimplemented!() }
/// # }
///
/// # fn main() -> sheetstream::Result<()> {
/// let mut reader = SheetReader::open("people.xlsx")?;
/// let mut listener = CollectListener::new();
/// reader.sheet(0).read_with::<Person>(&mut listener)?;
/// println!("read {} records", listener.rows().len());
/// # Ok(())
/// # }
/// ```
pub struct CollectListener<R> {
    rows: Vec<R>,
    header: IndexMap<u32, String>,
    completed: bool,
}

impl<R> CollectListener<R> {
    pub fn new() -> Self {
        CollectListener {
            rows: Vec::new(),
            header: IndexMap::new(),
            completed: false,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    /// Header labels by column, captured from the last streamed sheet
    pub fn header(&self) -> &IndexMap<u32, String> {
        &self.header
    }

    /// Whether a completion notification arrived
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl<R> Default for CollectListener<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> RowListener<R> for CollectListener<R> {
    fn on_header(&mut self, header: &IndexMap<u32, String>, _ctx: &RowContext) -> Result<()> {
        self.header = header.clone();
        Ok(())
    }

    fn on_row(&mut self, record: R, _ctx: &RowContext) -> Result<()> {
        self.rows.push(record);
        Ok(())
    }

    fn on_complete(&mut self, ctx: &RowContext) -> Result<()> {
        if let Some(header) = ctx.header() {
            self.header = header.clone();
        }
        self.completed = true;
        Ok(())
    }
}

/// Buffers bound records and flushes them in fixed-size batches
///
/// The callback receives each full batch by value, plus a final partial
/// batch at stream end. Batch size must be at least 1.
pub struct PageListener<R, F>
where
    F: FnMut(Vec<R>) -> Result<()>,
{
    batch_size: usize,
    buffer: Vec<R>,
    callback: F,
}

impl<R, F> PageListener<R, F>
where
    F: FnMut(Vec<R>) -> Result<()>,
{
    pub fn new(batch_size: usize, callback: F) -> Result<Self> {
        if batch_size == 0 {
            return Err(SheetError::Construction {
                type_name: "PageListener".to_string(),
                field: "batch_size".to_string(),
                reason: "batch size must be at least 1".to_string(),
            });
        }
        Ok(PageListener {
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            callback,
        })
    }

    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        // Ownership of the batch contents moves to the callback.
        let batch = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
        (self.callback)(batch)
    }
}

impl<R, F> RowListener<R> for PageListener<R, F>
where
    F: FnMut(Vec<R>) -> Result<()>,
{
    fn on_row(&mut self, record: R, _ctx: &RowContext) -> Result<()> {
        self.buffer.push(record);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn on_complete(&mut self, _ctx: &RowContext) -> Result<()> {
        self.flush()
    }
}
