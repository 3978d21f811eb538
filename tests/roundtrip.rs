//! Write-then-read round trips across the container kinds

mod common;

use common::{simple_rows, typed_rows, SimpleRow, TypedRow};
use sheetstream::{
    CollectListener, ContainerKind, SheetError, SheetHandle, SheetReader, SheetWriter,
};
use tempfile::tempdir;

fn write_simple(path: &std::path::Path, count: usize) {
    let mut writer = SheetWriter::create(path).unwrap();
    writer
        .write(&simple_rows(count), &SheetHandle::new("Sheet1"))
        .unwrap();
    writer.finish().unwrap();
}

#[test]
fn test_roundtrip_xlsx() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("simple.xlsx");
    write_simple(&path, 10);

    let mut reader = SheetReader::open(&path).unwrap();
    let rows: Vec<SimpleRow> = reader.sheet(0).read_all().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].name, "姓名0");
    assert_eq!(rows, simple_rows(10));
}

#[test]
fn test_roundtrip_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("simple.csv");
    write_simple(&path, 10);

    let mut reader = SheetReader::open(&path).unwrap();
    let rows: Vec<SimpleRow> = reader.sheet(0).read_all().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].name, "姓名0");
    assert_eq!(rows, simple_rows(10));
}

#[test]
fn test_xls_write_fails_predictably() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("simple.xls");
    let err = SheetWriter::create(&path).unwrap_err();
    assert!(matches!(err, SheetError::Unsupported { kind, .. } if kind == ContainerKind::Xls));
}

#[test]
fn test_roundtrip_all_builtin_types() {
    for ext in ["xlsx", "csv"] {
        let dir = tempdir().unwrap();
        let path = dir.path().join(format!("typed.{}", ext));

        let expected = typed_rows();
        let mut writer = SheetWriter::create(&path).unwrap();
        writer.write(&expected, &SheetHandle::new("Typed")).unwrap();
        writer.finish().unwrap();

        let mut reader = SheetReader::open(&path).unwrap();
        let rows: Vec<TypedRow> = reader.sheet(0).read_all().unwrap();
        assert_eq!(rows, expected, "container kind {}", ext);
    }
}

#[test]
fn test_header_map_reaches_listener() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("head.xlsx");
    write_simple(&path, 3);

    let mut reader = SheetReader::open(&path).unwrap();
    let mut listener = CollectListener::<SimpleRow>::new();
    reader.sheet(0).read_with(&mut listener).unwrap();

    assert!(listener.is_completed());
    assert_eq!(listener.header().get(&0).map(String::as_str), Some("姓名"));
    assert_eq!(listener.header().get(&1).map(String::as_str), Some("分数"));
}

#[test]
fn test_sheet_selection_by_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("named.xlsx");
    {
        let mut writer = SheetWriter::create(&path).unwrap();
        writer
            .write(&simple_rows(1), &SheetHandle::new("simple"))
            .unwrap();
        writer.finish().unwrap();
    }

    let mut reader = SheetReader::open(&path).unwrap();
    assert_eq!(reader.sheet_names(), vec!["simple".to_string()]);
    let rows: Vec<SimpleRow> = reader.sheet("simple").read_all().unwrap();
    assert_eq!(rows.len(), 1);

    let err = reader.sheet("missing").read_all::<SimpleRow>().unwrap_err();
    assert!(matches!(err, SheetError::SheetNotFound { .. }));
}

#[test]
fn test_csv_rejects_name_selection() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.csv");
    write_simple(&path, 2);

    let mut reader = SheetReader::open(&path).unwrap();
    let err = reader.sheet("Sheet1").read_all::<SimpleRow>().unwrap_err();
    assert!(matches!(err, SheetError::Unsupported { kind, .. } if kind == ContainerKind::Csv));
}

#[test]
fn test_typeless_sync_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("untyped.xlsx");
    write_simple(&path, 4);

    let mut reader = SheetReader::open(&path).unwrap();
    let rows = reader.sheet(0).read_rows().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(
        rows[0].get(&0).and_then(|v| v.as_str().map(String::from)),
        Some("姓名0".to_string())
    );
}

#[test]
fn test_multiple_sheets_stream_sequentially() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("multi.xlsx");
    {
        let mut writer = SheetWriter::create(&path).unwrap();
        writer
            .write(&simple_rows(2), &SheetHandle::new("First"))
            .unwrap();
        writer
            .write(&simple_rows(3), &SheetHandle::new("Second"))
            .unwrap();
        writer.finish().unwrap();
    }

    let mut reader = SheetReader::open(&path).unwrap();
    let mut listener = CollectListener::<SimpleRow>::new();
    reader
        .sheets(["First", "Second"])
        .read_with(&mut listener)
        .unwrap();
    assert_eq!(listener.rows().len(), 5);
    assert_eq!(listener.rows()[0].name, "姓名0");
    assert_eq!(listener.rows()[2].name, "姓名0");
}

#[test]
fn test_same_sheet_write_continues_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("continued.xlsx");
    {
        let mut writer = SheetWriter::create(&path).unwrap();
        let sheet = SheetHandle::new("Sheet1");
        writer.write(&simple_rows(3), &sheet).unwrap();
        writer.write(&simple_rows(2), &sheet).unwrap();
        writer.finish().unwrap();
    }

    let mut reader = SheetReader::open(&path).unwrap();
    let rows: Vec<SimpleRow> = reader.sheet(0).read_all().unwrap();
    // One header row, then 3 + 2 data rows with no reset in between.
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[3].name, "姓名0");
}

#[test]
fn test_conversion_error_carries_cell_context() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "姓名,分数\nAlice,not-a-number\n").unwrap();

    let mut reader = SheetReader::open(&path).unwrap();
    let err = reader.sheet(0).read_all::<SimpleRow>().unwrap_err();
    match err {
        SheetError::Conversion {
            row, col, field, ..
        } => {
            assert_eq!(row, 1);
            assert_eq!(col, 1);
            assert_eq!(field, "score");
        }
        other => panic!("expected conversion error, got {other}"),
    }
}

#[test]
fn test_skip_unconvertible_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mixed.csv");
    std::fs::write(&path, "姓名,分数\nAlice,1.5\nBob,broken\nCarol,2.5\n").unwrap();

    let mut reader = SheetReader::open(&path).unwrap();
    let rows: Vec<SimpleRow> = reader.sheet(0).skip_unconvertible().read_all().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].name, "Carol");
}

#[test]
fn test_headerless_read_binds_positionally() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("noheader.csv");
    std::fs::write(&path, "Alice,1.5\nBob,2.5\n").unwrap();

    let mut reader = SheetReader::open(&path).unwrap();
    let rows: Vec<SimpleRow> = reader.sheet(0).headerless().read_all().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "Alice");
    assert_eq!(rows[0].score, Some(1.5));
}

#[test]
fn test_formula_text_roundtrip_xlsx() {
    use sheetstream::CellValue;

    let dir = tempdir().unwrap();
    let path = dir.path().join("formula.xlsx");
    {
        let mut writer = SheetWriter::create(&path).unwrap();
        writer
            .write_rows(
                &[vec![
                    CellValue::from(10i64),
                    CellValue::from(20i64),
                    CellValue::Formula("=A1+B1".to_string()),
                ]],
                &SheetHandle::new("Sheet1"),
            )
            .unwrap();
        writer.finish().unwrap();
    }

    let mut reader = SheetReader::open(&path).unwrap();
    let rows = reader.sheet(0).headerless().read_rows().unwrap();
    assert_eq!(
        rows[0].get(&2).and_then(|v| v.as_str().map(String::from)),
        Some("=A1+B1".to_string())
    );
}
