//! Delimited-text codec
//!
//! One unnamed sheet, values only: no styles, no merges, no formula
//! semantics (formula text is written literally). Cell typing on read is
//! lexical - a field that parses as a number becomes a number cell,
//! everything else stays text - so the cross-kind converters decide what a
//! field ultimately means.

use crate::codec::{ContainerKind, RowEvent, RowStream, SheetSink, SheetSource};
use crate::error::{Result, SheetError};
use crate::value::{CellValue, MergeRegion, Number, StyledCell};
use csv::{ReaderBuilder, StringRecordsIntoIter, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Read side of a delimited-text container
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
}

impl CsvSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(SheetError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        Ok(CsvSource {
            path,
            delimiter: b',',
        })
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl SheetSource for CsvSource {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Csv
    }

    fn sheet_names(&self) -> Vec<String> {
        // No named-sheet concept in this kind.
        Vec::new()
    }

    fn sheet_count(&self) -> usize {
        1
    }

    fn open_sheet(&mut self, index: usize) -> Result<Box<dyn RowStream + '_>> {
        if index != 0 {
            return Err(SheetError::SheetNotFound {
                sheet: format!("index {}", index),
                available: "index 0".to_string(),
            });
        }
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_path(&self.path)?;
        Ok(Box::new(CsvRowStream {
            records: reader.into_records(),
            next_index: 0,
        }))
    }
}

struct CsvRowStream {
    records: StringRecordsIntoIter<File>,
    next_index: u32,
}

impl RowStream for CsvRowStream {
    fn next_row(&mut self) -> Result<Option<RowEvent>> {
        let Some(record) = self.records.next() else {
            return Ok(None);
        };
        let record = record?;
        let cells = record.iter().map(field_to_cell).collect();
        let row = self.next_index;
        self.next_index += 1;
        Ok(Some(RowEvent { row, cells }))
    }
}

fn field_to_cell(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Empty;
    }
    match Number::from_lexical(field) {
        Some(n) => CellValue::Number(n),
        None => CellValue::String(field.to_string()),
    }
}

/// Write side of a delimited-text container
pub struct CsvSink {
    writer: csv::Writer<File>,
    rows: u32,
    sheet_name: Option<String>,
}

impl CsvSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let writer = WriterBuilder::new()
            .flexible(true)
            .from_path(path.as_ref())?;
        Ok(CsvSink {
            writer,
            rows: 0,
            sheet_name: None,
        })
    }
}

impl SheetSink for CsvSink {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Csv
    }

    fn open_sheet(&mut self, name: &str, _col_widths: &[(u32, f64)]) -> Result<()> {
        match &self.sheet_name {
            // Re-targeting the same sheet continues row output.
            Some(current) if current == name => Ok(()),
            Some(_) => Err(SheetError::Unsupported {
                kind: ContainerKind::Csv,
                feature: "multiple sheets".to_string(),
            }),
            None => {
                self.sheet_name = Some(name.to_string());
                Ok(())
            }
        }
    }

    fn append_row(&mut self, cells: &[StyledCell]) -> Result<()> {
        let fields: Vec<String> = cells.iter().map(|c| c.value.as_string()).collect();
        self.writer.write_record(&fields)?;
        self.rows += 1;
        Ok(())
    }

    fn rows_written(&self) -> u32 {
        self.rows
    }

    fn merge(&mut self, _region: MergeRegion) -> Result<()> {
        Err(SheetError::Unsupported {
            kind: ContainerKind::Csv,
            feature: "merged regions".to_string(),
        })
    }

    fn hyperlink(&mut self, _row: u32, _col: u32, _url: &str) -> Result<()> {
        Err(SheetError::Unsupported {
            kind: ContainerKind::Csv,
            feature: "hyperlinks".to_string(),
        })
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.writer.flush().map_err(SheetError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SheetSelector;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_lexical_typing() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name,score").unwrap();
        writeln!(file, "Alice,95.5").unwrap();
        writeln!(file, "Bob,").unwrap();
        file.flush().unwrap();

        let mut source = CsvSource::open(file.path()).unwrap();
        let mut stream = source.open_sheet(0).unwrap();
        let header = stream.next_row().unwrap().unwrap();
        assert_eq!(header.cells[0], CellValue::String("name".into()));
        let alice = stream.next_row().unwrap().unwrap();
        assert_eq!(
            alice.cells[1],
            CellValue::Number(Number::from_lexical("95.5").unwrap())
        );
        let bob = stream.next_row().unwrap().unwrap();
        assert!(bob.cells[1].is_empty());
        assert!(stream.next_row().unwrap().is_none());
    }

    #[test]
    fn test_name_selection_fails_predictably() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b").unwrap();
        let source = CsvSource::open(file.path()).unwrap();
        let err = source
            .resolve(&SheetSelector::Name("Sheet1".into()))
            .unwrap_err();
        assert!(matches!(err, SheetError::Unsupported { .. }));
        assert_eq!(source.resolve(&SheetSelector::Index(0)).unwrap(), 0);
    }

    #[test]
    fn test_merge_is_unsupported() {
        let file = NamedTempFile::new().unwrap();
        let mut sink = CsvSink::create(file.path()).unwrap();
        sink.open_sheet("", &[]).unwrap();
        let err = sink.merge(MergeRegion::new(0, 1, 0, 0)).unwrap_err();
        assert!(matches!(err, SheetError::Unsupported { .. }));
    }

    #[test]
    fn test_roundtrip_values() {
        let file = NamedTempFile::new().unwrap();
        {
            let mut sink = Box::new(CsvSink::create(file.path()).unwrap());
            sink.open_sheet("", &[]).unwrap();
            sink.append_row(&[
                StyledCell::from(CellValue::from("名字")),
                StyledCell::from(CellValue::from(5.2f64)),
            ])
            .unwrap();
            sink.finish().unwrap();
        }
        let mut source = CsvSource::open(file.path()).unwrap();
        let mut stream = source.open_sheet(0).unwrap();
        let row = stream.next_row().unwrap().unwrap();
        assert_eq!(row.cells[0], CellValue::String("名字".into()));
        assert_eq!(row.cells[1].as_f64(), Some(5.2));
    }
}
