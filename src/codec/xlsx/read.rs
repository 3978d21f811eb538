//! Streaming reader for zip/XML workbooks
//!
//! The shared-string table is loaded up front (cells reference it by
//! index); worksheet XML is decompressed on demand and scanned row by row
//! through a byte window, so memory stays bounded by the window plus the
//! SST regardless of sheet size.

use super::xml::decode_xml_entities;
use crate::codec::{ContainerKind, RowEvent, RowStream, SheetSource};
use crate::error::{Result, SheetError};
use crate::value::{letters_to_col, CellValue, Number};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use zip::ZipArchive;

/// Streaming source for `.xlsx` workbooks
pub struct XlsxSource {
    archive: ZipArchive<BufReader<File>>,
    names: Vec<String>,
    paths: Vec<String>,
    sst: Arc<Vec<String>>,
}

impl XlsxSource {
    /// Open a workbook and load its catalog and shared strings
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let sst = load_shared_strings(&mut archive)?;
        let (names, paths) = load_sheet_info(&mut archive)?;
        tracing::debug!(
            sheets = names.len(),
            shared_strings = sst.len(),
            "opened zip/XML workbook"
        );

        Ok(XlsxSource {
            archive,
            names,
            paths,
            sst: Arc::new(sst),
        })
    }
}

impl SheetSource for XlsxSource {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Xlsx
    }

    fn sheet_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn sheet_count(&self) -> usize {
        self.names.len()
    }

    fn open_sheet(&mut self, index: usize) -> Result<Box<dyn RowStream + '_>> {
        let path = self
            .paths
            .get(index)
            .ok_or_else(|| SheetError::SheetNotFound {
                sheet: format!("index {}", index),
                available: self.names.join(", "),
            })?
            .clone();
        let sst = Arc::clone(&self.sst);
        let entry = self.archive.by_name(&path)?;
        Ok(Box::new(XlsxRowStream::new(Box::new(entry), sst)))
    }
}

pub(crate) fn read_entry<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>> {
    match archive.by_name(name) {
        Ok(mut entry) => {
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Load the shared-string table; absent table means all strings are inline
pub(crate) fn load_shared_strings<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Vec<String>> {
    let xml = match read_entry(archive, "xl/sharedStrings.xml")? {
        Some(xml) => xml,
        None => return Ok(Vec::new()),
    };

    let mut sst = Vec::new();
    let mut pos = 0;
    while let Some(start) = xml[pos..].find("<si>") {
        let start = pos + start;
        let Some(end) = xml[start..].find("</si>") else {
            break;
        };
        let end = start + end + 5;
        // Concatenate every <t> body so rich-text runs survive.
        sst.push(collect_tag_bodies(&xml[start..end], "t"));
        pos = end;
    }
    Ok(sst)
}

/// Concatenate the text content of every `<tag ...>body</tag>` in a block
pub(crate) fn collect_tag_bodies(block: &str, tag: &str) -> String {
    let open_a = format!("<{}>", tag);
    let open_b = format!("<{} ", tag);
    let close = format!("</{}>", tag);
    let mut out = String::new();
    let mut pos = 0;
    loop {
        let next = match (block[pos..].find(&open_a), block[pos..].find(&open_b)) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        let tag_start = pos + next;
        let Some(body_rel) = block[tag_start..].find('>') else {
            break;
        };
        let body_start = tag_start + body_rel + 1;
        if block[..body_start].ends_with("/>") {
            pos = body_start;
            continue;
        }
        let Some(body_end) = block[body_start..].find(&close) else {
            break;
        };
        out.push_str(&decode_xml_entities(&block[body_start..body_start + body_end]));
        pos = body_start + body_end + close.len();
    }
    out
}

/// Parse sheet names and worksheet entry paths from workbook.xml and its
/// relationship part
pub(crate) fn load_sheet_info<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<(Vec<String>, Vec<String>)> {
    let workbook = read_entry(archive, "xl/workbook.xml")?
        .ok_or_else(|| SheetError::Malformed("missing xl/workbook.xml".to_string()))?;
    let rels = read_entry(archive, "xl/_rels/workbook.xml.rels")?
        .ok_or_else(|| SheetError::Malformed("missing xl/_rels/workbook.xml.rels".to_string()))?;

    let mut names = Vec::new();
    let mut rids = Vec::new();
    let mut pos = 0;
    while let Some(start) = workbook[pos..].find("<sheet ") {
        let start = pos + start;
        let Some(end) = workbook[start..].find("/>") else {
            break;
        };
        let end = start + end + 2;
        let tag = &workbook[start..end];
        match (attr_value(tag, "name"), attr_value(tag, "r:id")) {
            (Some(name), Some(rid)) => {
                names.push(decode_xml_entities(name));
                rids.push(rid.to_string());
            }
            _ => {
                return Err(SheetError::Malformed(
                    "sheet entry without name or relationship id".to_string(),
                ))
            }
        }
        pos = end;
    }

    let mut paths = Vec::new();
    for rid in &rids {
        let marker = format!("Id=\"{}\"", rid);
        let Some(rel_pos) = rels.find(&marker) else {
            return Err(SheetError::Malformed(format!(
                "workbook relationship {} not found",
                rid
            )));
        };
        let tag_start = rels[..rel_pos].rfind("<Relationship").unwrap_or(0);
        let tag_end = rels[rel_pos..]
            .find("/>")
            .map(|p| rel_pos + p + 2)
            .unwrap_or(rels.len());
        let tag = &rels[tag_start..tag_end];
        let Some(target) = attr_value(tag, "Target") else {
            return Err(SheetError::Malformed(format!(
                "workbook relationship {} has no target",
                rid
            )));
        };
        // Targets are relative to xl/ unless they start from the root.
        let path = match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{}", target),
        };
        paths.push(path);
    }

    Ok((names, paths))
}

/// Extract an attribute value from a single opening tag
pub(crate) fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {}=\"", name);
    let start = tag.find(&needle)? + needle.len();
    let end = tag[start..].find('"')?;
    Some(&tag[start..start + end])
}

/// Row iterator over one worksheet entry
///
/// Scans the decompressed XML through a byte window; rows never span an
/// extraction boundary mid-character because tags are ASCII.
pub struct XlsxRowStream<'a> {
    reader: BufReader<Box<dyn Read + 'a>>,
    sst: Arc<Vec<String>>,
    window: Vec<u8>,
    eof: bool,
    next_index: u32,
}

impl<'a> XlsxRowStream<'a> {
    fn new(entry: Box<dyn Read + 'a>, sst: Arc<Vec<String>>) -> Self {
        XlsxRowStream {
            reader: BufReader::with_capacity(64 * 1024, entry),
            sst,
            window: Vec::with_capacity(128 * 1024),
            eof: false,
            next_index: 0,
        }
    }

    /// Locate the next complete `<row ...>...</row>` (or self-closing row)
    /// in the window; `None` means more input is needed
    fn try_extract_row(&mut self) -> Result<Option<String>> {
        let Some(start) = find_row_open(&self.window) else {
            // Keep a small tail in case a tag straddles the boundary.
            if self.window.len() > 64 {
                let keep = self.window.len() - 16;
                self.window.drain(..keep);
            }
            return Ok(None);
        };
        if start > 0 {
            self.window.drain(..start);
        }

        let Some(open_end) = self.window.iter().position(|&b| b == b'>') else {
            return Ok(None);
        };
        if self.window[open_end - 1] == b'/' {
            // Self-closing empty row.
            let row: Vec<u8> = self.window.drain(..=open_end).collect();
            return Ok(Some(String::from_utf8_lossy(&row).into_owned()));
        }

        match find_subslice(&self.window, b"</row>") {
            Some(end) => {
                let row: Vec<u8> = self.window.drain(..end + 6).collect();
                Ok(Some(String::from_utf8_lossy(&row).into_owned()))
            }
            None => Ok(None),
        }
    }

    fn parse_row(&mut self, row_xml: &str) -> RowEvent {
        let open_end = row_xml.find('>').unwrap_or(row_xml.len());
        let open_tag = &row_xml[..open_end];
        let row = attr_value(open_tag, "r")
            .and_then(|r| r.parse::<u32>().ok())
            .map(|r| r - 1)
            .unwrap_or(self.next_index);
        self.next_index = row + 1;

        let mut cells: Vec<CellValue> = Vec::new();
        let mut pos = open_end;
        while let Some(found) = row_xml[pos..].find("<c") {
            let cell_start = pos + found;
            let rest = &row_xml[cell_start + 2..];
            if !rest.starts_with([' ', '>', '/']) {
                pos = cell_start + 2;
                continue;
            }

            let Some(tag_rel) = row_xml[cell_start..].find('>') else {
                break;
            };
            let tag_end = cell_start + tag_rel + 1;
            let open_tag = &row_xml[cell_start..tag_end];
            let (cell_end, inner) = if open_tag.ends_with("/>") {
                (tag_end, "")
            } else {
                match row_xml[tag_end..].find("</c>") {
                    Some(rel) => (tag_end + rel + 4, &row_xml[tag_end..tag_end + rel]),
                    None => break,
                }
            };

            let col = attr_value(open_tag, "r")
                .map(letters_to_col)
                .unwrap_or(cells.len() as u32) as usize;
            while cells.len() < col {
                cells.push(CellValue::Empty);
            }
            cells.push(self.decode_cell(open_tag, inner));
            pos = cell_end;
        }

        RowEvent { row, cells }
    }

    fn decode_cell(&self, open_tag: &str, inner: &str) -> CellValue {
        // A formula cell surfaces its literal text; cached values are not
        // re-derived here.
        if let Some(formula) = tag_body(inner, "f") {
            return CellValue::Formula(format!("={}", decode_xml_entities(formula)));
        }

        let cell_type = attr_value(open_tag, "t").unwrap_or("n");
        match cell_type {
            "s" => {
                let idx = tag_body(inner, "v").and_then(|v| v.parse::<usize>().ok());
                let text = idx
                    .and_then(|i| self.sst.get(i).cloned())
                    .unwrap_or_default();
                CellValue::String(text)
            }
            "inlineStr" => CellValue::String(collect_tag_bodies(inner, "t")),
            "str" => match tag_body(inner, "v") {
                Some(v) => CellValue::String(decode_xml_entities(v)),
                None => CellValue::Empty,
            },
            "b" => match tag_body(inner, "v") {
                Some(v) => CellValue::Bool(v.trim() != "0"),
                None => CellValue::Empty,
            },
            "e" => match tag_body(inner, "v") {
                Some(v) => CellValue::Error(decode_xml_entities(v)),
                None => CellValue::Empty,
            },
            "d" => match tag_body(inner, "v") {
                Some(v) => CellValue::String(decode_xml_entities(v)),
                None => CellValue::Empty,
            },
            _ => match tag_body(inner, "v") {
                Some(v) => match Number::from_lexical(v.trim()) {
                    Some(n) => CellValue::Number(n),
                    None => CellValue::String(decode_xml_entities(v)),
                },
                None => CellValue::Empty,
            },
        }
    }
}

impl RowStream for XlsxRowStream<'_> {
    fn next_row(&mut self) -> Result<Option<RowEvent>> {
        loop {
            if let Some(row_xml) = self.try_extract_row()? {
                return Ok(Some(self.parse_row(&row_xml)));
            }
            if self.eof {
                return Ok(None);
            }
            let mut chunk = [0u8; 32 * 1024];
            let n = self.reader.read(&mut chunk)?;
            if n == 0 {
                self.eof = true;
            } else {
                self.window.extend_from_slice(&chunk[..n]);
            }
        }
    }
}

/// Find the byte offset of the next `<row ` or `<row/>` opening
fn find_row_open(window: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = find_subslice(&window[from..], b"<row") {
        let at = from + rel;
        match window.get(at + 4) {
            // Reject <rowBreaks> and friends.
            Some(b' ') | Some(b'>') | Some(b'/') => return Some(at),
            Some(_) => from = at + 4,
            None => return None,
        }
    }
    None
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// The body of the first `<tag>` or `<tag ...>` element, undecoded
pub(crate) fn tag_body<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open_a = format!("<{}>", tag);
    let open_b = format!("<{} ", tag);
    let start = match xml.find(&open_a) {
        Some(p) => p + open_a.len(),
        None => {
            let p = xml.find(&open_b)?;
            p + xml[p..].find('>')? + 1
        }
    };
    let close = format!("</{}>", tag);
    let end = xml[start..].find(&close)?;
    Some(&xml[start..start + end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_over(xml: &str, sst: Vec<String>) -> Vec<RowEvent> {
        let cursor = std::io::Cursor::new(xml.as_bytes().to_vec());
        let mut stream = XlsxRowStream::new(Box::new(cursor), Arc::new(sst));
        let mut rows = Vec::new();
        while let Some(event) = stream.next_row().unwrap() {
            rows.push(event);
        }
        rows
    }

    #[test]
    fn test_typed_cells() {
        let xml = r#"<sheetData>
            <row r="1">
                <c r="A1" t="s"><v>0</v></c>
                <c r="B1"><v>5.2</v></c>
                <c r="C1" t="b"><v>1</v></c>
                <c r="D1" t="e"><v>#DIV/0!</v></c>
            </row>
        </sheetData>"#;
        let rows = stream_over(xml, vec!["hello".to_string()]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row, 0);
        assert_eq!(rows[0].cells[0], CellValue::String("hello".into()));
        assert_eq!(
            rows[0].cells[1],
            CellValue::Number(Number::from_lexical("5.2").unwrap())
        );
        assert_eq!(rows[0].cells[2], CellValue::Bool(true));
        assert_eq!(rows[0].cells[3], CellValue::Error("#DIV/0!".into()));
    }

    #[test]
    fn test_formula_text_wins() {
        let xml = r#"<row r="1"><c r="A1"><f>SUM(B1:B9)</f><v>45</v></c></row>"#;
        let rows = stream_over(xml, Vec::new());
        assert_eq!(rows[0].cells[0], CellValue::Formula("=SUM(B1:B9)".into()));
    }

    #[test]
    fn test_column_gaps_filled() {
        let xml = r#"<row r="3"><c r="C3"><v>7</v></c></row>"#;
        let rows = stream_over(xml, Vec::new());
        assert_eq!(rows[0].row, 2);
        assert_eq!(rows[0].cells.len(), 3);
        assert!(rows[0].cells[0].is_empty());
        assert!(rows[0].cells[1].is_empty());
    }

    #[test]
    fn test_inline_string_and_entities() {
        let xml = r#"<row r="1"><c r="A1" t="inlineStr"><is><t>a&amp;b</t></is></c></row>"#;
        let rows = stream_over(xml, Vec::new());
        assert_eq!(rows[0].cells[0], CellValue::String("a&b".into()));
    }

    #[test]
    fn test_self_closing_row() {
        let xml = r#"<row r="2"/><row r="3"><c r="A3"><v>1</v></c></row>"#;
        let rows = stream_over(xml, Vec::new());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 1);
        assert!(rows[0].cells.is_empty());
        assert_eq!(rows[1].row, 2);
    }

    #[test]
    fn test_rich_text_sst_block() {
        let block = "<si><r><t>Zhang</t></r><r><t> San</t></r></si>";
        assert_eq!(collect_tag_bodies(block, "t"), "Zhang San");
    }

    #[test]
    fn test_attr_value_scoped_to_tag() {
        let tag = r#"<c r="B2" s="3" t="s""#;
        assert_eq!(attr_value(tag, "r"), Some("B2"));
        assert_eq!(attr_value(tag, "s"), Some("3"));
        assert_eq!(attr_value(tag, "x"), None);
    }
}
