//! Legacy binary workbook codec (read-only)
//!
//! Reads go through calamine, which materializes each sheet's range before
//! iteration - the kind does not stream, and there is no maintained BIFF
//! writer to pair it with, so the sink side reports unsupported instead of
//! silently substituting another format.

use crate::codec::{ContainerKind, RowEvent, RowStream, SheetSource};
use crate::error::{Result, SheetError};
use crate::value::{CellValue, Number};
use calamine::{open_workbook, Data, Range, Reader, Xls};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read source for `.xls` workbooks
pub struct XlsSource {
    workbook: Xls<BufReader<File>>,
    names: Vec<String>,
}

impl XlsSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let workbook: Xls<_> = open_workbook(path.as_ref())?;
        let names = workbook.sheet_names().to_vec();
        tracing::debug!(sheets = names.len(), "opened legacy binary workbook");
        Ok(XlsSource { workbook, names })
    }
}

impl SheetSource for XlsSource {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Xls
    }

    fn sheet_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn sheet_count(&self) -> usize {
        self.names.len()
    }

    fn open_sheet(&mut self, index: usize) -> Result<Box<dyn RowStream + '_>> {
        let name = self
            .names
            .get(index)
            .ok_or_else(|| SheetError::SheetNotFound {
                sheet: format!("index {}", index),
                available: self.names.join(", "),
            })?
            .clone();
        let range = self.workbook.worksheet_range(&name)?;
        Ok(Box::new(XlsRowStream::new(range)))
    }
}

/// Iterator over a materialized sheet range
struct XlsRowStream {
    range: Range<Data>,
    start_row: u32,
    start_col: u32,
    next: usize,
}

impl XlsRowStream {
    fn new(range: Range<Data>) -> Self {
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        XlsRowStream {
            range,
            start_row,
            start_col,
            next: 0,
        }
    }
}

impl RowStream for XlsRowStream {
    fn next_row(&mut self) -> Result<Option<RowEvent>> {
        let (height, _) = self.range.get_size();
        if self.next >= height {
            return Ok(None);
        }
        let row_idx = self.next;
        self.next += 1;

        // Re-anchor the range offset so cells land on absolute columns.
        let mut cells = vec![CellValue::Empty; self.start_col as usize];
        let (_, width) = self.range.get_size();
        for col in 0..width {
            let data = self
                .range
                .get_value((self.start_row + row_idx as u32, self.start_col + col as u32));
            cells.push(match data {
                Some(d) => data_to_cell(d),
                None => CellValue::Empty,
            });
        }

        Ok(Some(RowEvent {
            row: self.start_row + row_idx as u32,
            cells,
        }))
    }
}

/// Map a calamine cell into the crate's cell union
fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Float(f) => CellValue::Number(Number::from_f64(*f)),
        Data::Int(i) => CellValue::Number(Number::from_i64(*i)),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(Number::from_f64(dt.as_f64())),
        Data::Error(e) => CellValue::Error(format!("{}", e)),
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_conversion() {
        assert_eq!(
            data_to_cell(&Data::String("test".to_string())),
            CellValue::String("test".into())
        );
        assert_eq!(
            data_to_cell(&Data::Int(42)),
            CellValue::Number(Number::from_i64(42))
        );
        assert_eq!(data_to_cell(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(data_to_cell(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_float_lexical() {
        let cell = data_to_cell(&Data::Float(5.2));
        assert_eq!(cell, CellValue::Number(Number::from_lexical("5.2").unwrap()));
    }
}
