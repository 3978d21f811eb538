//! Write-hook behavior: merge strategies, styles, hyperlinks, converters

mod common;

use common::{simple_rows, SimpleRow};
use sheetstream::{
    CellKind, CellValue, ConvertConfig, ConvertError, Converter, FieldType, FieldValue,
    LoopMergeStrategy, SheetHandle, SheetReader, SheetWriter,
};
use std::sync::Arc;
use tempfile::tempdir;

fn read_sheet_xml(path: &std::path::Path) -> String {
    use std::io::Read;
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::BufReader::new(file)).unwrap();
    let mut entry = archive.by_name("xl/worksheets/sheet1.xml").unwrap();
    let mut xml = String::new();
    entry.read_to_string(&mut xml).unwrap();
    xml
}

#[test]
fn test_loop_merge_strategy_emits_regions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("merged.xlsx");
    {
        let mut writer = SheetWriter::create(&path).unwrap();
        // Merge every 2 rows in the 0th column.
        writer.register_handler(Box::new(LoopMergeStrategy::new(2, 0)));
        writer
            .write(&simple_rows(10), &SheetHandle::new("Sheet1"))
            .unwrap();
        writer.finish().unwrap();
    }

    let xml = read_sheet_xml(&path);
    assert!(xml.contains("<mergeCells count=\"5\">"), "{}", xml);
    // Header occupies row 1, so the first group covers rows 2-3.
    assert!(xml.contains("<mergeCell ref=\"A2:A3\"/>"));
    assert!(xml.contains("<mergeCell ref=\"A10:A11\"/>"));
}

#[test]
fn test_duplicate_merge_strategies_stay_idempotent() {
    // Registering the same strategy twice declares every region twice;
    // the sink's merge set must keep a single copy of each.
    let dir = tempdir().unwrap();
    let path = dir.path().join("twice.xlsx");
    {
        let mut writer = SheetWriter::create(&path).unwrap();
        writer.register_handler(Box::new(LoopMergeStrategy::new(2, 0)));
        writer.register_handler(Box::new(LoopMergeStrategy::new(2, 0)));
        writer
            .write(&simple_rows(10), &SheetHandle::new("Sheet1"))
            .unwrap();
        writer.finish().unwrap();
    }

    let xml = read_sheet_xml(&path);
    assert!(xml.contains("<mergeCells count=\"5\">"), "{}", xml);
}

#[test]
fn test_hyperlink_hook() {
    struct LinkFirstColumn;

    impl sheetstream::WriteHandler for LinkFirstColumn {
        fn after_cell(
            &mut self,
            ctx: &mut sheetstream::CellWriteContext<'_>,
        ) -> sheetstream::Result<()> {
            if !ctx.is_head() && ctx.col() == 0 {
                ctx.set_hyperlink("https://example.com/profile");
            }
            Ok(())
        }
    }

    let dir = tempdir().unwrap();
    let path = dir.path().join("links.xlsx");
    {
        let mut writer = SheetWriter::create(&path).unwrap();
        writer.register_handler(Box::new(LinkFirstColumn));
        writer
            .write(&simple_rows(2), &SheetHandle::new("Sheet1"))
            .unwrap();
        writer.finish().unwrap();
    }

    let xml = read_sheet_xml(&path);
    assert!(xml.contains("<hyperlinks>"), "{}", xml);
    assert!(xml.contains("<hyperlink ref=\"A2\""));
}

/// Masks text on the way out and back in
struct MaskedText;

impl Converter for MaskedText {
    fn field_type(&self) -> FieldType {
        FieldType::Text
    }

    fn cell_kind(&self) -> CellKind {
        CellKind::String
    }

    fn to_cell(&self, value: &FieldValue, _: &ConvertConfig) -> Result<CellValue, ConvertError> {
        Ok(CellValue::String(format!("masked:{}", value)))
    }

    fn from_cell(&self, cell: &CellValue, _: &ConvertConfig) -> Result<FieldValue, ConvertError> {
        let text = cell.as_string();
        Ok(FieldValue::Text(
            text.strip_prefix("masked:").unwrap_or(&text).to_string(),
        ))
    }
}

#[test]
fn test_session_converter_override() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("masked.xlsx");
    {
        let mut writer = SheetWriter::create(&path).unwrap();
        writer.registry_mut().register(Arc::new(MaskedText));
        writer
            .write(&simple_rows(2), &SheetHandle::new("Sheet1"))
            .unwrap();
        writer.finish().unwrap();
    }

    // A default session sees the masked text...
    let mut plain = SheetReader::open(&path).unwrap();
    let rows = plain.sheet(0).headerless().read_rows().unwrap();
    assert_eq!(
        rows[1].get(&0).map(|v| v.to_string()),
        Some("masked:姓名0".to_string())
    );

    // ...while a session with the override unmasks it.
    let mut reader = SheetReader::open(&path).unwrap();
    reader.registry_mut().register(Arc::new(MaskedText));
    let back: Vec<SimpleRow> = reader.sheet(0).read_all().unwrap();
    assert_eq!(back[0].name, "姓名0");
}

#[test]
fn test_image_cells_embed_media() {
    use sheetstream::{ImageFormat, ImageRef};

    // Smallest valid-enough PNG header for an embedding test.
    let png: Vec<u8> = vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
    ];

    let dir = tempdir().unwrap();
    let path = dir.path().join("images.xlsx");
    {
        let mut writer = SheetWriter::create(&path).unwrap();
        writer
            .write_rows(
                &[vec![
                    CellValue::from("logo"),
                    CellValue::Image(ImageRef::new(png.clone(), ImageFormat::Png)),
                ]],
                &SheetHandle::new("Sheet1"),
            )
            .unwrap();
        writer.finish().unwrap();
    }

    let file = std::fs::File::open(&path).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::BufReader::new(file)).unwrap();
    let names: Vec<String> = archive.file_names().map(String::from).collect();
    assert!(names.iter().any(|n| n == "xl/media/image1.png"), "{:?}", names);
    assert!(names.iter().any(|n| n == "xl/drawings/drawing1.xml"));

    use std::io::Read;
    let mut entry = archive.by_name("xl/worksheets/sheet1.xml").unwrap();
    let mut xml = String::new();
    entry.read_to_string(&mut xml).unwrap();
    assert!(xml.contains("<drawing r:id=\"rIdDr\"/>"), "{}", xml);
}
