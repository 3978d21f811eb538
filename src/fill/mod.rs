//! Template fill engine
//!
//! Resolves `{name}` placeholders inside a pre-existing zip/XML template
//! against scalar values, and `{.name}` placeholders against sequence
//! elements by cloning the placeholder-bearing row block once per element.
//! Styles survive because every non-worksheet template part (styles,
//! shared strings, media, drawings) is copied into the output verbatim and
//! rendered cells keep the template's style indices; block merges are
//! cloned per repetition and merges below the block shift with it.
//!
//! Unresolved placeholders stay as literal template text - a partially
//! filled template is not an error.
//!
//! The first fill call freezes the region above the repeating block:
//! scalar placeholders there are substituted with the values known at that
//! moment and the rows are streamed out. Later scalar fills only affect
//! the region below the block, which is written at finish. This is what
//! keeps multi-pass list fills memory-bounded.

use crate::codec::xlsx::read::{
    attr_value, collect_tag_bodies, load_shared_strings, load_sheet_info, read_entry, tag_body,
};
use crate::codec::SheetSelector;
use crate::convert::ConvertConfig;
use crate::convert::builtin::{date_to_serial, datetime_to_serial};
use crate::error::{Result, SheetError};
use crate::field::FieldValue;
use crate::schema::Record;
use crate::value::{col_to_letters, letters_to_col, CellValue, MergeRegion, StyledCell};
use crate::codec::xlsx::xml::escape_xml;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// A string-keyed value mapping usable as a fill data source
pub type FillMap = IndexMap<String, FieldValue>;

/// A fill data source: resolves placeholder names to values
pub trait FillItem {
    fn value_of(&self, key: &str) -> Option<FieldValue>;
}

impl FillItem for FillMap {
    fn value_of(&self, key: &str) -> Option<FieldValue> {
        self.get(key).cloned()
    }
}

/// Build a [`FillMap`] from a record, keyed by schema field names
pub fn to_fill_map<R: Record>(record: &R) -> FillMap {
    let schema = R::schema();
    let values = record.to_fields();
    schema
        .fields()
        .iter()
        .zip(values)
        .map(|(mapping, value)| (mapping.name().to_string(), value))
        .collect()
}

/// One parsed chunk of a placeholder-bearing text cell
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Lit(String),
    /// `{name}` - resolved against scalar fills
    Var(String),
    /// `{.name}` - resolved against each sequence element
    ListVar(String),
}

fn parse_segments(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut lit = String::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let Some(close_rel) = rest[open..].find('}') else {
            break;
        };
        let name = &rest[open + 1..open + close_rel];
        if name.is_empty() || name.contains('{') {
            lit.push_str(&rest[..open + 1]);
            rest = &rest[open + 1..];
            continue;
        }
        lit.push_str(&rest[..open]);
        if !lit.is_empty() {
            segments.push(Segment::Lit(std::mem::take(&mut lit)));
        }
        match name.strip_prefix('.') {
            Some(list_name) => segments.push(Segment::ListVar(list_name.to_string())),
            None => segments.push(Segment::Var(name.to_string())),
        }
        rest = &rest[open + close_rel + 1..];
    }
    lit.push_str(rest);
    if !lit.is_empty() {
        segments.push(Segment::Lit(lit));
    }
    segments
}

fn has_placeholder(segments: &[Segment]) -> bool {
    segments
        .iter()
        .any(|s| matches!(s, Segment::Var(_) | Segment::ListVar(_)))
}

fn has_list_placeholder(segments: &[Segment]) -> bool {
    segments.iter().any(|s| matches!(s, Segment::ListVar(_)))
}

#[derive(Debug, Clone)]
enum CellTemplate {
    /// Re-emitted as-is apart from the rebuilt cell reference
    Raw {
        attrs: String,
        inner: Option<String>,
    },
    /// Text cell carrying placeholders; rendered per fill
    Text {
        style: Option<String>,
        segments: Vec<Segment>,
    },
}

#[derive(Debug, Clone)]
struct TemplateCell {
    col: u32,
    template: CellTemplate,
}

#[derive(Debug, Clone)]
struct TemplateRow {
    /// Zero-based row index in the template sheet
    row: u32,
    cells: Vec<TemplateCell>,
}

impl TemplateRow {
    fn has_list_placeholder(&self) -> bool {
        self.cells.iter().any(|c| match &c.template {
            CellTemplate::Text { segments, .. } => has_list_placeholder(segments),
            CellTemplate::Raw { .. } => false,
        })
    }
}

struct ParsedSheet {
    /// Worksheet XML up to and including `<sheetData>`
    head: String,
    /// Worksheet XML from `</sheetData>` on, mergeCells excised
    tail: String,
    prefix: Vec<TemplateRow>,
    block: Vec<TemplateRow>,
    suffix: Vec<TemplateRow>,
    merges: Vec<MergeRegion>,
    /// Zero-based template row index where the block starts
    block_start: u32,
}

/// Writes a filled copy of a template workbook
pub struct TemplateWriter {
    zip: ZipWriter<std::io::BufWriter<File>>,
    sheet: ParsedSheet,
    scalars: FillMap,
    frozen: bool,
    /// Zero-based index of the next output row
    next_row: u32,
    /// Block repetitions written so far
    reps: u32,
    /// Merges cloned from the block, already offset to output coordinates
    block_merges_out: Vec<MergeRegion>,
    extra_merges: Vec<MergeRegion>,
    finished_rows: u32,
}

impl TemplateWriter {
    /// Open the template, copy everything except the target sheet into the
    /// output, and prepare the target sheet for streaming fills
    pub(crate) fn create(
        template: &Path,
        output: &Path,
        selector: &SheetSelector,
    ) -> Result<Self> {
        let file = File::open(template)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;

        let sst = load_shared_strings(&mut archive)?;
        let (names, paths) = load_sheet_info(&mut archive)?;
        let index = match selector {
            SheetSelector::Index(i) => {
                if *i >= names.len() {
                    return Err(SheetError::SheetNotFound {
                        sheet: format!("index {}", i),
                        available: names.join(", "),
                    });
                }
                *i
            }
            SheetSelector::Name(name) => {
                names
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| SheetError::SheetNotFound {
                        sheet: name.clone(),
                        available: names.join(", "),
                    })?
            }
        };
        let sheet_path = paths[index].clone();
        let sheet_xml = read_entry(&mut archive, &sheet_path)?
            .ok_or_else(|| SheetError::Malformed(format!("missing {}", sheet_path)))?;
        let sheet = parse_template_sheet(&sheet_xml, &sst)?;
        tracing::debug!(
            sheet = %names[index],
            block_rows = sheet.block.len(),
            "parsed fill template"
        );

        let out = File::create(output)?;
        let mut zip = ZipWriter::new(std::io::BufWriter::with_capacity(64 * 1024, out));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() || entry.name() == sheet_path {
                continue;
            }
            let name = entry.name().to_string();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            zip.start_file(name, options)?;
            zip.write_all(&bytes)?;
        }

        // The target sheet is the last entry and stays open for streaming.
        zip.start_file(sheet_path, options)?;
        zip.write_all(sheet.head.as_bytes())?;

        Ok(TemplateWriter {
            zip,
            sheet,
            scalars: FillMap::new(),
            frozen: false,
            next_row: 0,
            reps: 0,
            block_merges_out: Vec::new(),
            extra_merges: Vec::new(),
            finished_rows: 0,
        })
    }

    /// Record scalar substitutions; before the freeze they apply to the
    /// whole sheet, afterwards only to the region below the block
    pub(crate) fn fill_one<T: FillItem>(&mut self, item: &T) -> Result<()> {
        for row in self.sheet.prefix.iter().chain(&self.sheet.block).chain(&self.sheet.suffix) {
            for cell in &row.cells {
                if let CellTemplate::Text { segments, .. } = &cell.template {
                    for segment in segments {
                        if let Segment::Var(name) = segment {
                            if let Some(value) = item.value_of(name) {
                                self.scalars.insert(name.clone(), value);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Clone the repeating block once per element, streaming each clone
    pub(crate) fn fill<T: FillItem>(&mut self, items: &[T], cfg: &ConvertConfig) -> Result<()> {
        self.freeze(cfg)?;
        if self.sheet.block.is_empty() {
            tracing::warn!("template has no {{.name}} block; list fill ignored");
            return Ok(());
        }
        let block_start = self.sheet.block_start;
        let block = self.sheet.block.clone();
        for item in items {
            let base = self.next_row;
            for (offset, row) in block.iter().enumerate() {
                let out_row = base + offset as u32;
                let xml = render_row_at(row, out_row, cfg, &|name, is_list| {
                    if is_list {
                        item.value_of(name)
                    } else {
                        self.scalars.get(name).cloned()
                    }
                });
                self.zip.write_all(xml.as_bytes())?;
            }
            let delta = base as i64 - block_start as i64;
            for merge in block_region_merges(&self.sheet) {
                self.block_merges_out.push(shift_region(merge, delta));
            }
            self.next_row = base + self.sheet.block.len() as u32;
            self.reps += 1;
        }
        Ok(())
    }

    /// Append a plain row at the current fill position
    pub(crate) fn append_cells(&mut self, cells: &[StyledCell], cfg: &ConvertConfig) -> Result<()> {
        self.freeze(cfg)?;
        let out_row = self.next_row;
        let mut xml = format!("<row r=\"{}\">", out_row + 1);
        for (col, cell) in cells.iter().enumerate() {
            if cell.value.is_empty() {
                continue;
            }
            xml.push_str(&render_value_cell(out_row, col as u32, None, &cell.value));
        }
        xml.push_str("</row>");
        self.zip.write_all(xml.as_bytes())?;
        self.next_row += 1;
        Ok(())
    }

    pub(crate) fn add_merge(&mut self, region: MergeRegion) {
        self.extra_merges.push(region);
    }

    pub(crate) fn rows_written(&self) -> u32 {
        self.next_row
    }

    /// Write the frozen region above the block
    fn freeze(&mut self, cfg: &ConvertConfig) -> Result<()> {
        if self.frozen {
            return Ok(());
        }
        self.frozen = true;
        let prefix = std::mem::take(&mut self.sheet.prefix);
        for row in &prefix {
            let xml = render_row_at(row, row.row, cfg, &|name, is_list| {
                if is_list {
                    None
                } else {
                    self.scalars.get(name).cloned()
                }
            });
            self.zip.write_all(xml.as_bytes())?;
        }
        self.sheet.prefix = prefix;
        self.next_row = self.sheet.block_start;
        Ok(())
    }

    /// Write the region below the block, the recomputed merges and the
    /// trailing worksheet XML, then close the container
    pub(crate) fn finish(mut self, cfg: &ConvertConfig) -> Result<()> {
        self.freeze(cfg)?;

        let block_len = self.sheet.block.len() as u32;
        let delta: i64 = if self.reps == 0 {
            // Untouched block rows stay in place, placeholders and all.
            let block = std::mem::take(&mut self.sheet.block);
            for row in &block {
                let xml = render_row_at(row, row.row, cfg, &|name, is_list| {
                    if is_list {
                        None
                    } else {
                        self.scalars.get(name).cloned()
                    }
                });
                self.zip.write_all(xml.as_bytes())?;
            }
            if !block.is_empty() {
                self.next_row = self.sheet.block_start + block_len;
            }
            self.block_merges_out = block_region_merges_from(&block, &self.sheet.merges);
            0
        } else {
            (self.reps as i64 - 1) * block_len as i64
        };

        let suffix = std::mem::take(&mut self.sheet.suffix);
        for row in &suffix {
            let out_row = (row.row as i64 + delta) as u32;
            let xml = render_row_at(row, out_row, cfg, &|name, is_list| {
                if is_list {
                    None
                } else {
                    self.scalars.get(name).cloned()
                }
            });
            self.zip.write_all(xml.as_bytes())?;
        }

        // Reassemble the merge set: above-block regions as declared,
        // block regions as cloned, below-block regions shifted.
        let block_start = self.sheet.block_start;
        let block_end = block_start + block_len;
        let mut merges: BTreeSet<MergeRegion> = BTreeSet::new();
        for region in &self.sheet.merges {
            if block_len == 0 || region.last_row < block_start {
                merges.insert(*region);
            } else if region.first_row >= block_end {
                merges.insert(shift_region(*region, delta));
            } else if region.first_row < block_start || region.last_row >= block_end {
                // Straddles the block boundary; kept as declared.
                merges.insert(*region);
            }
            // Regions fully inside the block arrive via block_merges_out.
        }
        merges.extend(self.block_merges_out.iter().copied());
        merges.extend(self.extra_merges.iter().copied());

        let mut tail = String::from("</sheetData>");
        if !merges.is_empty() {
            tail.push_str(&format!("<mergeCells count=\"{}\">", merges.len()));
            for region in &merges {
                tail.push_str(&format!("<mergeCell ref=\"{}\"/>", region.to_a1()));
            }
            tail.push_str("</mergeCells>");
        }
        tail.push_str(
            self.sheet
                .tail
                .strip_prefix("</sheetData>")
                .unwrap_or(&self.sheet.tail),
        );
        self.zip.write_all(tail.as_bytes())?;

        self.finished_rows = self.next_row;
        self.zip.finish()?;
        tracing::debug!(rows = self.finished_rows, reps = self.reps, "finished template fill");
        Ok(())
    }
}

/// Merges that sit entirely inside the template's block rows
fn block_region_merges(sheet: &ParsedSheet) -> Vec<MergeRegion> {
    block_region_merges_from(&sheet.block, &sheet.merges)
}

fn block_region_merges_from(block: &[TemplateRow], merges: &[MergeRegion]) -> Vec<MergeRegion> {
    let Some(first) = block.first() else {
        return Vec::new();
    };
    let Some(last) = block.last() else {
        return Vec::new();
    };
    merges
        .iter()
        .filter(|m| m.first_row >= first.row && m.last_row <= last.row)
        .copied()
        .collect()
}

fn shift_region(region: MergeRegion, delta: i64) -> MergeRegion {
    MergeRegion {
        first_row: (region.first_row as i64 + delta).max(0) as u32,
        last_row: (region.last_row as i64 + delta).max(0) as u32,
        first_col: region.first_col,
        last_col: region.last_col,
    }
}

/// Render a template row at an explicit output position
fn render_row_at(
    row: &TemplateRow,
    out_row: u32,
    cfg: &ConvertConfig,
    resolve: &dyn Fn(&str, bool) -> Option<FieldValue>,
) -> String {
    let mut xml = format!("<row r=\"{}\">", out_row + 1);
    for cell in &row.cells {
        match &cell.template {
            CellTemplate::Raw { attrs, inner } => {
                xml.push_str(&format!(
                    "<c r=\"{}{}\"{}",
                    col_to_letters(cell.col),
                    out_row + 1,
                    attrs
                ));
                match inner {
                    Some(body) => {
                        xml.push('>');
                        xml.push_str(body);
                        xml.push_str("</c>");
                    }
                    None => xml.push_str("/>"),
                }
            }
            CellTemplate::Text { style, segments } => {
                xml.push_str(&render_text_cell(
                    out_row,
                    cell.col,
                    style.as_deref(),
                    segments,
                    cfg,
                    resolve,
                ));
            }
        }
    }
    xml.push_str("</row>");
    xml
}

/// Render a placeholder cell: a lone resolved token keeps its value's
/// type, anything else concatenates into text
fn render_text_cell(
    row: u32,
    col: u32,
    style: Option<&str>,
    segments: &[Segment],
    cfg: &ConvertConfig,
    resolve: &dyn Fn(&str, bool) -> Option<FieldValue>,
) -> String {
    if segments.len() == 1 {
        let resolved = match &segments[0] {
            Segment::Var(name) => resolve(name, false),
            Segment::ListVar(name) => resolve(name, true),
            Segment::Lit(_) => None,
        };
        if let Some(value) = resolved {
            let cell = typed_cell(&value, cfg);
            return render_value_cell(row, col, style, &cell);
        }
    }

    let mut text = String::new();
    for segment in segments {
        match segment {
            Segment::Lit(s) => text.push_str(s),
            Segment::Var(name) => match resolve(name, false) {
                Some(value) => text.push_str(&value.to_string()),
                None => {
                    text.push('{');
                    text.push_str(name);
                    text.push('}');
                }
            },
            Segment::ListVar(name) => match resolve(name, true) {
                Some(value) => text.push_str(&value.to_string()),
                None => {
                    text.push_str("{.");
                    text.push_str(name);
                    text.push('}');
                }
            },
        }
    }
    render_value_cell(row, col, style, &CellValue::String(text))
}

/// Natural cell form of a field value for template rendering
fn typed_cell(value: &FieldValue, cfg: &ConvertConfig) -> CellValue {
    match value {
        FieldValue::Null => CellValue::Empty,
        FieldValue::Bool(b) => CellValue::Bool(*b),
        FieldValue::Int(i) => CellValue::from(*i),
        FieldValue::BigInt(i) => CellValue::Number(crate::value::Number::from_i128(*i)),
        FieldValue::UInt(u) => CellValue::Number(crate::value::Number::from_u64(*u)),
        FieldValue::BigUint(u) => CellValue::Number(crate::value::Number::from_u128(*u)),
        FieldValue::Float(f) => CellValue::from(*f),
        FieldValue::Decimal(d) => match crate::value::Number::from_lexical(d.as_str()) {
            Some(n) => CellValue::Number(n),
            None => CellValue::String(d.to_string()),
        },
        FieldValue::Date(d) => {
            CellValue::Number(crate::value::Number::from_i64(date_to_serial(*d, cfg)))
        }
        FieldValue::DateTime(dt) => {
            CellValue::Number(crate::value::Number::from_f64(datetime_to_serial(*dt, cfg)))
        }
        FieldValue::Timestamp(ts) => CellValue::Number(crate::value::Number::from_f64(
            datetime_to_serial(ts.naive_utc(), cfg),
        )),
        FieldValue::Text(s) => CellValue::String(s.clone()),
    }
}

/// Emit one `<c>` element for a concrete value, keeping the template style
fn render_value_cell(row: u32, col: u32, style: Option<&str>, value: &CellValue) -> String {
    let cell_ref = format!("{}{}", col_to_letters(col), row + 1);
    let style_attr = match style {
        Some(s) => format!(" s=\"{}\"", s),
        None => String::new(),
    };
    match value {
        CellValue::Empty => format!("<c r=\"{}\"{}/>", cell_ref, style_attr),
        CellValue::Bool(b) => format!(
            "<c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
            cell_ref,
            style_attr,
            if *b { 1 } else { 0 }
        ),
        CellValue::Number(n) => format!(
            "<c r=\"{}\"{}><v>{}</v></c>",
            cell_ref,
            style_attr,
            n.lexical()
        ),
        CellValue::String(s) => format!(
            "<c r=\"{}\"{} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
            cell_ref,
            style_attr,
            escape_xml(s)
        ),
        CellValue::Formula(f) => format!(
            "<c r=\"{}\"{}><f>{}</f></c>",
            cell_ref,
            style_attr,
            escape_xml(f.strip_prefix('=').unwrap_or(f))
        ),
        CellValue::Error(e) => format!(
            "<c r=\"{}\"{} t=\"e\"><v>{}</v></c>",
            cell_ref,
            style_attr,
            escape_xml(e)
        ),
        CellValue::Image(_) => format!("<c r=\"{}\"{}/>", cell_ref, style_attr),
    }
}

/// Split a worksheet XML string into head, rows, merges and tail
fn parse_template_sheet(xml: &str, sst: &[String]) -> Result<ParsedSheet> {
    let data_open = xml
        .find("<sheetData")
        .ok_or_else(|| SheetError::Malformed("worksheet has no sheetData".to_string()))?;
    let open_end_rel = xml[data_open..]
        .find('>')
        .ok_or_else(|| SheetError::Malformed("unterminated sheetData tag".to_string()))?;
    let open_end = data_open + open_end_rel;
    let self_closing = xml[..=open_end].ends_with("/>");

    let (head, body, tail) = if self_closing {
        (
            format!("{}<sheetData>", &xml[..data_open]),
            "",
            format!("</sheetData>{}", &xml[open_end + 1..]),
        )
    } else {
        let close = xml
            .find("</sheetData>")
            .ok_or_else(|| SheetError::Malformed("unterminated sheetData".to_string()))?;
        (
            xml[..=open_end].to_string(),
            &xml[open_end + 1..close],
            xml[close..].to_string(),
        )
    };

    let (tail, merges) = excise_merge_cells(&tail);
    let rows = parse_rows(body, sst);

    // The block is the first contiguous run of list-placeholder rows.
    let first_list = rows.iter().position(TemplateRow::has_list_placeholder);
    let (prefix, block, suffix, block_start) = match first_list {
        Some(start) => {
            let mut end = start + 1;
            while end < rows.len()
                && rows[end].has_list_placeholder()
                && rows[end].row == rows[end - 1].row + 1
            {
                end += 1;
            }
            let block_start = rows[start].row;
            let mut rows = rows;
            let suffix = rows.split_off(end);
            let block = rows.split_off(start);
            (rows, block, suffix, block_start)
        }
        None => {
            let after_last = rows.last().map(|r| r.row + 1).unwrap_or(0);
            (rows, Vec::new(), Vec::new(), after_last)
        }
    };

    Ok(ParsedSheet {
        head,
        tail,
        prefix,
        block,
        suffix,
        merges,
        block_start,
    })
}

/// Remove the mergeCells element from the trailing XML, returning the
/// cleaned tail and the parsed regions
fn excise_merge_cells(tail: &str) -> (String, Vec<MergeRegion>) {
    let Some(start) = tail.find("<mergeCells") else {
        return (tail.to_string(), Vec::new());
    };
    let end = match tail[start..].find("</mergeCells>") {
        Some(rel) => start + rel + "</mergeCells>".len(),
        None => match tail[start..].find("/>") {
            Some(rel) => start + rel + 2,
            None => return (tail.to_string(), Vec::new()),
        },
    };
    let element = &tail[start..end];

    let mut merges = Vec::new();
    let mut pos = 0;
    while let Some(found) = element[pos..].find("<mergeCell ") {
        let tag_start = pos + found;
        let Some(tag_end_rel) = element[tag_start..].find("/>") else {
            break;
        };
        let tag_end = tag_start + tag_end_rel + 2;
        if let Some(reference) = attr_value(&element[tag_start..tag_end], "ref") {
            if let Some(region) = parse_a1_range(reference) {
                merges.push(region);
            }
        }
        pos = tag_end;
    }

    let cleaned = format!("{}{}", &tail[..start], &tail[end..]);
    (cleaned, merges)
}

/// Parse an A1-style range ("A1:B2", or a single "A1") into a region
pub(crate) fn parse_a1_range(reference: &str) -> Option<MergeRegion> {
    fn corner(cell: &str) -> Option<(u32, u32)> {
        let digits_at = cell.find(|c: char| c.is_ascii_digit())?;
        let col = letters_to_col(cell);
        let row: u32 = cell[digits_at..].parse().ok()?;
        Some((row - 1, col))
    }
    let (first, last) = match reference.split_once(':') {
        Some((a, b)) => (corner(a)?, corner(b)?),
        None => {
            let c = corner(reference)?;
            (c, c)
        }
    };
    Some(MergeRegion {
        first_row: first.0,
        last_row: last.0,
        first_col: first.1,
        last_col: last.1,
    })
}

/// Parse the row elements of a sheetData body
fn parse_rows(body: &str, sst: &[String]) -> Vec<TemplateRow> {
    let mut rows = Vec::new();
    let mut pos = 0;
    let mut next_index = 0u32;
    while let Some(found) = body[pos..].find("<row") {
        let row_start = pos + found;
        let Some(open_end_rel) = body[row_start..].find('>') else {
            break;
        };
        let open_end = row_start + open_end_rel;
        let open_tag = &body[row_start..open_end];
        let row_index = attr_value(open_tag, "r")
            .and_then(|r| r.parse::<u32>().ok())
            .map(|r| r - 1)
            .unwrap_or(next_index);
        next_index = row_index + 1;

        let (row_end, inner) = if body[..=open_end].ends_with("/>") {
            (open_end + 1, "")
        } else {
            match body[open_end..].find("</row>") {
                Some(rel) => (open_end + rel + "</row>".len(), &body[open_end + 1..open_end + rel]),
                None => break,
            }
        };

        rows.push(TemplateRow {
            row: row_index,
            cells: parse_cells(inner, sst),
        });
        pos = row_end;
    }
    rows
}

fn parse_cells(row_inner: &str, sst: &[String]) -> Vec<TemplateCell> {
    let mut cells = Vec::new();
    let mut pos = 0;
    while let Some(found) = row_inner[pos..].find("<c") {
        let cell_start = pos + found;
        let rest = &row_inner[cell_start + 2..];
        if !rest.starts_with([' ', '>', '/']) {
            pos = cell_start + 2;
            continue;
        }
        let Some(tag_end_rel) = row_inner[cell_start..].find('>') else {
            break;
        };
        let tag_end = cell_start + tag_end_rel + 1;
        let open_tag = &row_inner[cell_start..tag_end];
        let (cell_end, inner) = if open_tag.ends_with("/>") {
            (tag_end, None)
        } else {
            match row_inner[tag_end..].find("</c>") {
                Some(rel) => (
                    tag_end + rel + "</c>".len(),
                    Some(&row_inner[tag_end..tag_end + rel]),
                ),
                None => break,
            }
        };

        let col = attr_value(open_tag, "r")
            .map(letters_to_col)
            .unwrap_or(cells.len() as u32);
        let style = attr_value(open_tag, "s").map(|s| s.to_string());
        let cell_type = attr_value(open_tag, "t").unwrap_or("n");

        // Only string cells can carry placeholders.
        let text = match (cell_type, inner) {
            ("s", Some(inner)) => tag_body(inner, "v")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .and_then(|idx| sst.get(idx).cloned()),
            ("inlineStr", Some(inner)) => Some(collect_tag_bodies(inner, "t")),
            _ => None,
        };

        let template = match text {
            Some(text) => {
                let segments = parse_segments(&text);
                if has_placeholder(&segments) {
                    CellTemplate::Text { style, segments }
                } else {
                    raw_template(open_tag, inner)
                }
            }
            None => raw_template(open_tag, inner),
        };
        cells.push(TemplateCell { col, template });
        pos = cell_end;
    }
    cells
}

/// Keep a cell verbatim, minus its `r` attribute (rebuilt on output)
fn raw_template(open_tag: &str, inner: Option<&str>) -> CellTemplate {
    let attr_region = open_tag
        .trim_start_matches("<c")
        .trim_end_matches('>')
        .trim_end_matches('/');
    let attrs = match attr_region.find(" r=\"") {
        Some(start) => {
            let after = &attr_region[start + 4..];
            match after.find('"') {
                Some(q) => format!("{}{}", &attr_region[..start], &after[q + 1..]),
                None => attr_region.to_string(),
            }
        }
        None => attr_region.to_string(),
    };
    CellTemplate::Raw {
        attrs,
        inner: inner.map(|s| s.to_string()),
    }
}
