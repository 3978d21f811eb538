//! Write-hook extension points
//!
//! Handlers are invoked in registration order at two points: before a row
//! is materialized (the cells can still be replaced) and after each cell
//! is materialized (style, hyperlink and merge state can be mutated).
//! The value pipeline itself is never re-entered from a hook.

use crate::error::Result;
use crate::value::{CellValue, MergeRegion, StyledCell};

/// Context for [`WriteHandler::before_row`]
pub struct RowWriteContext<'a> {
    pub(crate) sheet: &'a str,
    pub(crate) row: u32,
    pub(crate) is_head: bool,
    pub(crate) cells: &'a mut Vec<StyledCell>,
}

impl RowWriteContext<'_> {
    pub fn sheet(&self) -> &str {
        self.sheet
    }

    /// Zero-based output row about to be written
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Whether this is a header row
    pub fn is_head(&self) -> bool {
        self.is_head
    }

    /// The row's cells, mutable before materialization
    pub fn cells_mut(&mut self) -> &mut Vec<StyledCell> {
        self.cells
    }
}

/// Context for [`WriteHandler::after_cell`]
pub struct CellWriteContext<'a> {
    pub(crate) sheet: &'a str,
    pub(crate) row: u32,
    pub(crate) col: u32,
    pub(crate) is_head: bool,
    pub(crate) cell: &'a mut StyledCell,
    pub(crate) merges: &'a mut Vec<MergeRegion>,
    pub(crate) hyperlink: &'a mut Option<String>,
}

impl CellWriteContext<'_> {
    pub fn sheet(&self) -> &str {
        self.sheet
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    /// Whether the cell belongs to a header row
    pub fn is_head(&self) -> bool {
        self.is_head
    }

    pub fn value(&self) -> &CellValue {
        &self.cell.value
    }

    /// Replace the cell's value
    pub fn set_value(&mut self, value: CellValue) {
        self.cell.value = value;
    }

    /// Override the cell's style preset
    pub fn set_style(&mut self, style: crate::value::CellStyle) {
        self.cell.style = style;
    }

    /// Attach a hyperlink to this cell
    pub fn set_hyperlink(&mut self, url: impl Into<String>) {
        *self.hyperlink = Some(url.into());
    }

    /// Declare a rectangular merged region; redeclaring an existing
    /// region is a no-op
    pub fn merge(&mut self, region: MergeRegion) {
        self.merges.push(region);
    }
}

/// Hook invoked as rows and cells are materialized
pub trait WriteHandler {
    fn before_row(&mut self, _ctx: &mut RowWriteContext<'_>) -> Result<()> {
        Ok(())
    }

    fn after_cell(&mut self, _ctx: &mut CellWriteContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Merges every `rows_per_group` data rows in one column
///
/// The grouping is anchored at the first data row the strategy sees, so
/// applying the same strategy over the same rows always yields the same
/// set of regions.
pub struct LoopMergeStrategy {
    rows_per_group: u32,
    column: u32,
    first_data_row: Option<u32>,
}

impl LoopMergeStrategy {
    pub fn new(rows_per_group: u32, column: u32) -> Self {
        LoopMergeStrategy {
            rows_per_group: rows_per_group.max(1),
            column,
            first_data_row: None,
        }
    }
}

impl WriteHandler for LoopMergeStrategy {
    fn after_cell(&mut self, ctx: &mut CellWriteContext<'_>) -> Result<()> {
        if ctx.is_head() || ctx.col() != self.column {
            return Ok(());
        }
        let first = *self.first_data_row.get_or_insert(ctx.row());
        let offset = ctx.row() - first;
        if offset % self.rows_per_group == 0 {
            ctx.merge(MergeRegion::new(
                ctx.row(),
                ctx.row() + self.rows_per_group - 1,
                self.column,
                self.column,
            ));
        }
        Ok(())
    }
}
