//! Template fill behavior
//!
//! Templates are generated on the fly: a workbook whose cells carry
//! literal `{name}` / `{.name}` tokens is a valid fill template.

use sheetstream::{
    CellValue, FillMap, SheetHandle, SheetReader, SheetWriter,
};
use tempfile::tempdir;

/// Build a template: a title row with a scalar placeholder, a repeating
/// block row and a footer.
fn write_template(path: &std::path::Path) {
    let mut writer = SheetWriter::create(path).unwrap();
    writer
        .write_rows(
            &[
                vec![CellValue::from("Report {title}")],
                vec![CellValue::from("{.name}"), CellValue::from("{.number}")],
                vec![CellValue::from("footer {title}")],
            ],
            &SheetHandle::new("Sheet1"),
        )
        .unwrap();
    writer.finish().unwrap();
}

fn people(count: usize, offset: usize) -> Vec<FillMap> {
    (0..count)
        .map(|i| {
            let mut row = FillMap::new();
            row.insert("name".into(), format!("Zhang San{}", offset + i).into());
            row.insert("number".into(), 5.2f64.into());
            row
        })
        .collect()
}

fn read_first_column(path: &std::path::Path) -> Vec<String> {
    let mut reader = SheetReader::open(path).unwrap();
    let rows = reader.sheet(0).headerless().read_rows().unwrap();
    rows.iter()
        .map(|row| {
            row.get(&0)
                .map(|v| v.to_string())
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn test_list_fill_repeats_block_in_order() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("template.xlsx");
    let output = dir.path().join("filled.xlsx");
    write_template(&template);

    let mut writer = SheetWriter::with_template(&output, &template).unwrap();
    let sheet = SheetHandle::default();
    writer.fill(&people(10, 0), &sheet).unwrap();
    writer.finish().unwrap();

    let col = read_first_column(&output);
    // Title row, ten repeated blocks, footer.
    assert_eq!(col.len(), 12);
    for (i, cell) in col[1..11].iter().enumerate() {
        assert_eq!(cell, &format!("Zhang San{}", i));
    }
}

#[test]
fn test_fill_append_property() {
    // Two fills of sizes M and K yield M+K blocks in call order.
    let dir = tempdir().unwrap();
    let template = dir.path().join("template.xlsx");
    let output = dir.path().join("appended.xlsx");
    write_template(&template);

    let mut writer = SheetWriter::with_template(&output, &template).unwrap();
    let sheet = SheetHandle::default();
    writer.fill(&people(10, 0), &sheet).unwrap();
    writer.fill(&people(4, 10), &sheet).unwrap();
    writer.finish().unwrap();

    let col = read_first_column(&output);
    assert_eq!(col.len(), 16);
    for (i, cell) in col[1..15].iter().enumerate() {
        assert_eq!(cell, &format!("Zhang San{}", i));
    }
}

#[test]
fn test_scalar_fill_substitutes_and_unresolved_stays_literal() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("template.xlsx");
    let output = dir.path().join("scalars.xlsx");
    write_template(&template);

    let mut writer = SheetWriter::with_template(&output, &template).unwrap();
    let mut scalars = FillMap::new();
    scalars.insert("title".into(), "Q3".into());
    writer.fill_one(&scalars).unwrap();
    writer.fill(&people(2, 0), &SheetHandle::default()).unwrap();
    writer.finish().unwrap();

    let col = read_first_column(&output);
    assert_eq!(col[0], "Report Q3");
    assert_eq!(col[3], "footer Q3");
}

#[test]
fn test_unfilled_template_keeps_placeholders() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("template.xlsx");
    let output = dir.path().join("untouched.xlsx");
    write_template(&template);

    let writer = SheetWriter::with_template(&output, &template).unwrap();
    writer.finish().unwrap();

    let col = read_first_column(&output);
    assert_eq!(col, vec!["Report {title}", "{.name}", "footer {title}"]);
}

#[test]
fn test_typed_values_survive_fill() {
    let dir = tempdir().unwrap();
    let template = dir.path().join("template.xlsx");
    let output = dir.path().join("typed.xlsx");
    write_template(&template);

    let mut writer = SheetWriter::with_template(&output, &template).unwrap();
    writer.fill(&people(1, 0), &SheetHandle::default()).unwrap();
    writer.finish().unwrap();

    let mut reader = SheetReader::open(&output).unwrap();
    let rows = reader.sheet(0).headerless().read_rows().unwrap();
    // A lone {.number} token bound to a float stays a numeric cell.
    assert_eq!(rows[1].get(&1).and_then(|v| v.as_f64()), Some(5.2));
}

#[test]
fn test_fill_without_template_is_an_error() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("plain.xlsx");
    let mut writer = SheetWriter::create(&output).unwrap();
    let err = writer
        .fill(&people(1, 0), &SheetHandle::default())
        .unwrap_err();
    assert!(matches!(err, sheetstream::SheetError::Unsupported { .. }));
}

#[test]
fn test_fill_preserves_template_merges_below_block() {
    // A merge on the footer row must shift down with the inserted rows.
    let dir = tempdir().unwrap();
    let template = dir.path().join("merged-template.xlsx");
    let output = dir.path().join("merged-filled.xlsx");

    {
        let mut writer = SheetWriter::create(&template).unwrap();
        writer.register_handler(Box::new(FooterMerge));
        writer
            .write_rows(
                &[
                    vec![CellValue::from("Report {title}")],
                    vec![CellValue::from("{.name}"), CellValue::from("{.number}")],
                    vec![CellValue::from("footer"), CellValue::from("wide")],
                ],
                &SheetHandle::new("Sheet1"),
            )
            .unwrap();
        writer.finish().unwrap();
    }

    let mut writer = SheetWriter::with_template(&output, &template).unwrap();
    writer.fill(&people(3, 0), &SheetHandle::default()).unwrap();
    writer.finish().unwrap();

    // The block grew from 1 row to 3, so the footer merge A3:B3 becomes A5:B5.
    let xml = read_sheet_xml(&output);
    assert!(xml.contains("<mergeCell ref=\"A5:B5\"/>"), "{}", xml);
}

/// Declares a merge across the footer row while the template is written
struct FooterMerge;

impl sheetstream::WriteHandler for FooterMerge {
    fn after_cell(&mut self, ctx: &mut sheetstream::CellWriteContext<'_>) -> sheetstream::Result<()> {
        if ctx.row() == 2 && ctx.col() == 0 {
            ctx.merge(sheetstream::MergeRegion::new(2, 2, 0, 1));
        }
        Ok(())
    }
}

fn read_sheet_xml(path: &std::path::Path) -> String {
    use std::io::Read;
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::BufReader::new(file)).unwrap();
    let mut entry = archive.by_name("xl/worksheets/sheet1.xml").unwrap();
    let mut xml = String::new();
    entry.read_to_string(&mut xml).unwrap();
    xml
}
