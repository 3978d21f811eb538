//! Streaming writer for zip/XML workbooks
//!
//! Row XML goes straight into the output zip entry as rows are appended;
//! memory stays constant apart from the shared-string table. Merges,
//! hyperlinks and image anchors are buffered per sheet because their XML
//! lives after `sheetData`, and the boilerplate parts are emitted at
//! finish when the catalog is known.

use super::xml::{escape_xml, XmlWriter};
use crate::codec::{ContainerKind, SheetSink};
use crate::error::{Result, SheetError};
use crate::value::{col_to_letters, CellStyle, CellValue, MergeRegion, StyledCell};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Shared strings table that deduplicates strings across the workbook
pub struct SharedStrings {
    strings: Vec<String>,
    index: HashMap<String, u32>,
    total_refs: u64,
}

impl SharedStrings {
    pub fn new() -> Self {
        SharedStrings {
            strings: Vec::with_capacity(1024),
            index: HashMap::with_capacity(1024),
            total_refs: 0,
        }
    }

    /// Add a string and get its table index
    pub fn add(&mut self, s: &str) -> u32 {
        self.total_refs += 1;
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), idx);
        idx
    }

    pub fn unique_count(&self) -> usize {
        self.strings.len()
    }

    fn write_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<()> {
        writer.text("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")?;
        writer.open("sst")?;
        writer.attr("xmlns", NS_MAIN)?;
        writer.attr_int("count", self.total_refs)?;
        writer.attr_int("uniqueCount", self.strings.len() as u64)?;
        writer.seal()?;
        for s in &self.strings {
            writer.text("<si><t xml:space=\"preserve\">")?;
            writer.escaped(s)?;
            writer.text("</t></si>")?;
        }
        writer.close("sst")?;
        writer.flush()?;
        Ok(())
    }
}

impl Default for SharedStrings {
    fn default() -> Self {
        Self::new()
    }
}

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

struct CurrentSheet {
    index: usize,
    rows: u32,
}

struct SheetParts {
    name: String,
    merges: BTreeSet<MergeRegion>,
    hyperlinks: Vec<(String, String)>,
    /// (row, col, media index) anchors for the drawing part
    images: Vec<(u32, u32, usize)>,
}

/// Streaming sink for `.xlsx` workbooks
pub struct XlsxSink {
    zip: ZipWriter<BufWriter<File>>,
    shared: SharedStrings,
    sheets: Vec<SheetParts>,
    current: Option<CurrentSheet>,
    media: Vec<(String, Vec<u8>, &'static str)>,
    row_buf: Vec<u8>,
    col_cache: Vec<String>,
    flush_interval: u32,
}

impl XlsxSink {
    /// Create a workbook at the given path
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        let mut zip = ZipWriter::new(BufWriter::with_capacity(64 * 1024, file));
        let options = entry_options();

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;
        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(CORE_PROPS.as_bytes())?;
        zip.start_file("docProps/app.xml", options)?;
        zip.write_all(APP_PROPS.as_bytes())?;

        let col_cache = (0..64).map(col_to_letters).collect();

        Ok(XlsxSink {
            zip,
            shared: SharedStrings::new(),
            sheets: Vec::new(),
            current: None,
            media: Vec::new(),
            row_buf: Vec::with_capacity(8192),
            col_cache,
            flush_interval: 1000,
        })
    }

    /// Rows between forced flushes of the zip stream
    pub fn set_flush_interval(&mut self, interval: u32) {
        self.flush_interval = interval.max(1);
    }

    fn col_ref(&mut self, col: u32) -> &str {
        while self.col_cache.len() <= col as usize {
            let next = self.col_cache.len() as u32;
            self.col_cache.push(col_to_letters(next));
        }
        &self.col_cache[col as usize]
    }

    fn close_current_sheet(&mut self) -> Result<()> {
        let Some(current) = self.current.take() else {
            return Ok(());
        };
        let parts = &self.sheets[current.index];

        let mut tail = String::from("</sheetData>");
        if !parts.merges.is_empty() {
            tail.push_str(&format!("<mergeCells count=\"{}\">", parts.merges.len()));
            for region in &parts.merges {
                tail.push_str(&format!("<mergeCell ref=\"{}\"/>", region.to_a1()));
            }
            tail.push_str("</mergeCells>");
        }
        if !parts.hyperlinks.is_empty() {
            tail.push_str("<hyperlinks>");
            for (i, (cell_ref, _)) in parts.hyperlinks.iter().enumerate() {
                tail.push_str(&format!(
                    "<hyperlink ref=\"{}\" r:id=\"rIdHl{}\"/>",
                    cell_ref,
                    i + 1
                ));
            }
            tail.push_str("</hyperlinks>");
        }
        if !parts.images.is_empty() {
            tail.push_str("<drawing r:id=\"rIdDr\"/>");
        }
        tail.push_str("</worksheet>");
        self.zip.write_all(tail.as_bytes())?;
        Ok(())
    }

    fn write_cell(&mut self, buf: &mut Vec<u8>, row_num: u32, col: u32, cell: &StyledCell) {
        let mut itoa_buf = itoa::Buffer::new();

        if cell.value.is_empty() && cell.style == CellStyle::Default {
            return;
        }
        if let CellValue::Image(_) = cell.value {
            // Anchors were recorded by append_row; nothing inline to emit.
            return;
        }

        buf.extend_from_slice(b"<c r=\"");
        buf.extend_from_slice(self.col_ref(col).as_bytes());
        buf.extend_from_slice(itoa_buf.format(row_num).as_bytes());
        buf.push(b'"');
        if cell.style != CellStyle::Default {
            buf.extend_from_slice(b" s=\"");
            buf.extend_from_slice(itoa_buf.format(cell.style.index()).as_bytes());
            buf.push(b'"');
        }

        match &cell.value {
            CellValue::Empty | CellValue::Image(_) => {
                buf.extend_from_slice(b"/>");
            }
            CellValue::Bool(b) => {
                buf.extend_from_slice(b" t=\"b\"><v>");
                buf.push(if *b { b'1' } else { b'0' });
                buf.extend_from_slice(b"</v></c>");
            }
            CellValue::Number(n) => {
                buf.extend_from_slice(b"><v>");
                buf.extend_from_slice(n.lexical().as_bytes());
                buf.extend_from_slice(b"</v></c>");
            }
            CellValue::String(s) => {
                let idx = self.shared.add(s);
                buf.extend_from_slice(b" t=\"s\"><v>");
                buf.extend_from_slice(itoa_buf.format(idx).as_bytes());
                buf.extend_from_slice(b"</v></c>");
            }
            CellValue::Formula(f) => {
                let body = f.strip_prefix('=').unwrap_or(f);
                buf.extend_from_slice(b"><f>");
                buf.extend_from_slice(escape_xml(body).as_bytes());
                buf.extend_from_slice(b"</f></c>");
            }
            CellValue::Error(e) => {
                buf.extend_from_slice(b" t=\"e\"><v>");
                buf.extend_from_slice(escape_xml(e).as_bytes());
                buf.extend_from_slice(b"</v></c>");
            }
        }
    }

    fn write_catalog_parts(&mut self) -> Result<()> {
        let options = entry_options();

        // shared strings
        self.zip.start_file("xl/sharedStrings.xml", options)?;
        {
            let mut xml = XmlWriter::new(&mut self.zip);
            self.shared.write_xml(&mut xml)?;
        }

        // workbook
        self.zip.start_file("xl/workbook.xml", options)?;
        {
            let mut xml = XmlWriter::new(&mut self.zip);
            xml.text("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")?;
            xml.open("workbook")?;
            xml.attr("xmlns", NS_MAIN)?;
            xml.attr("xmlns:r", NS_REL)?;
            xml.seal()?;
            xml.open("sheets")?;
            xml.seal()?;
            for (i, parts) in self.sheets.iter().enumerate() {
                xml.open("sheet")?;
                xml.attr("name", &parts.name)?;
                xml.attr_int("sheetId", (i + 1) as u64)?;
                xml.attr("r:id", &format!("rId{}", i + 1))?;
                xml.seal_empty()?;
            }
            xml.close("sheets")?;
            xml.close("workbook")?;
            xml.flush()?;
        }

        // workbook relationships
        self.zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        {
            let mut xml = XmlWriter::new(&mut self.zip);
            xml.text("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")?;
            xml.open("Relationships")?;
            xml.attr(
                "xmlns",
                "http://schemas.openxmlformats.org/package/2006/relationships",
            )?;
            xml.seal()?;
            for i in 0..self.sheets.len() {
                xml.open("Relationship")?;
                xml.attr("Id", &format!("rId{}", i + 1))?;
                xml.attr("Type", &format!("{}/worksheet", NS_REL))?;
                xml.attr("Target", &format!("worksheets/sheet{}.xml", i + 1))?;
                xml.seal_empty()?;
            }
            let styles_rid = self.sheets.len() + 1;
            xml.open("Relationship")?;
            xml.attr("Id", &format!("rId{}", styles_rid))?;
            xml.attr("Type", &format!("{}/styles", NS_REL))?;
            xml.attr("Target", "styles.xml")?;
            xml.seal_empty()?;
            xml.open("Relationship")?;
            xml.attr("Id", &format!("rId{}", styles_rid + 1))?;
            xml.attr("Type", &format!("{}/sharedStrings", NS_REL))?;
            xml.attr("Target", "sharedStrings.xml")?;
            xml.seal_empty()?;
            xml.close("Relationships")?;
            xml.flush()?;
        }

        // style preset table, indices matching CellStyle
        self.zip.start_file("xl/styles.xml", options)?;
        self.zip.write_all(STYLE_SHEET.as_bytes())?;

        // per-sheet relationships and drawings
        for i in 0..self.sheets.len() {
            let (rels, has_images) = {
                let parts = &self.sheets[i];
                if parts.hyperlinks.is_empty() && parts.images.is_empty() {
                    continue;
                }
                let mut rels = String::from(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
                     <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
                );
                for (k, (_, url)) in parts.hyperlinks.iter().enumerate() {
                    rels.push_str(&format!(
                        "<Relationship Id=\"rIdHl{}\" Type=\"{}/hyperlink\" Target=\"{}\" TargetMode=\"External\"/>",
                        k + 1,
                        NS_REL,
                        escape_xml(url)
                    ));
                }
                if !parts.images.is_empty() {
                    rels.push_str(&format!(
                        "<Relationship Id=\"rIdDr\" Type=\"{}/drawing\" Target=\"../drawings/drawing{}.xml\"/>",
                        NS_REL,
                        i + 1
                    ));
                }
                rels.push_str("</Relationships>");
                (rels, !parts.images.is_empty())
            };
            self.zip
                .start_file(format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1), options)?;
            self.zip.write_all(rels.as_bytes())?;

            if has_images {
                self.write_drawing(i)?;
            }
        }

        // media payloads, stored uncompressed
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data, _) in &self.media {
            self.zip.start_file(format!("xl/media/{}", name), stored)?;
            self.zip.write_all(data)?;
        }

        // content types, written last when the part list is complete
        self.zip.start_file("[Content_Types].xml", options)?;
        {
            let mut xml = String::from(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
                 <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
                 <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
                 <Default Extension=\"xml\" ContentType=\"application/xml\"/>",
            );
            let mut seen_ext: BTreeSet<&str> = BTreeSet::new();
            for (_, _, content_type) in &self.media {
                seen_ext.insert(content_type);
            }
            for content_type in seen_ext {
                let ext = content_type.rsplit('/').next().unwrap_or("png");
                xml.push_str(&format!(
                    "<Default Extension=\"{}\" ContentType=\"{}\"/>",
                    ext, content_type
                ));
            }
            xml.push_str(
                "<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>",
            );
            for (i, parts) in self.sheets.iter().enumerate() {
                xml.push_str(&format!(
                    "<Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
                    i + 1
                ));
                if !parts.images.is_empty() {
                    xml.push_str(&format!(
                        "<Override PartName=\"/xl/drawings/drawing{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.drawing+xml\"/>",
                        i + 1
                    ));
                }
            }
            xml.push_str(
                "<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>\
                 <Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>\
                 <Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
                 <Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>\
                 </Types>",
            );
            self.zip.write_all(xml.as_bytes())?;
        }
        Ok(())
    }

    fn write_drawing(&mut self, sheet_idx: usize) -> Result<()> {
        let options = entry_options();
        let parts = &self.sheets[sheet_idx];

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <xdr:wsDr xmlns:xdr=\"http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing\" \
             xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
        );
        let mut rels = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        );
        for (k, (row, col, media_idx)) in parts.images.iter().enumerate() {
            xml.push_str(&format!(
                "<xdr:oneCellAnchor><xdr:from><xdr:col>{col}</xdr:col><xdr:colOff>0</xdr:colOff>\
                 <xdr:row>{row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>\
                 <xdr:ext cx=\"1905000\" cy=\"1905000\"/>\
                 <xdr:pic><xdr:nvPicPr><xdr:cNvPr id=\"{id}\" name=\"Image {id}\"/><xdr:cNvPicPr/></xdr:nvPicPr>\
                 <xdr:blipFill><a:blip xmlns:r=\"{ns}\" r:embed=\"rIdImg{id}\"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>\
                 <xdr:spPr><a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></xdr:spPr>\
                 </xdr:pic><xdr:clientData/></xdr:oneCellAnchor>",
                col = col,
                row = row,
                id = k + 1,
                ns = NS_REL,
            ));
            rels.push_str(&format!(
                "<Relationship Id=\"rIdImg{}\" Type=\"{}/image\" Target=\"../media/{}\"/>",
                k + 1,
                NS_REL,
                self.media[*media_idx].0
            ));
        }
        xml.push_str("</xdr:wsDr>");
        rels.push_str("</Relationships>");

        self.zip
            .start_file(format!("xl/drawings/drawing{}.xml", sheet_idx + 1), options)?;
        self.zip.write_all(xml.as_bytes())?;
        self.zip.start_file(
            format!("xl/drawings/_rels/drawing{}.xml.rels", sheet_idx + 1),
            options,
        )?;
        self.zip.write_all(rels.as_bytes())?;
        Ok(())
    }
}

impl SheetSink for XlsxSink {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Xlsx
    }

    fn open_sheet(&mut self, name: &str, col_widths: &[(u32, f64)]) -> Result<()> {
        if let Some(current) = &self.current {
            if self.sheets[current.index].name == name {
                return Ok(());
            }
        }
        if self.sheets.iter().any(|s| s.name == name) {
            // The earlier entry is already closed inside the zip stream.
            return Err(SheetError::Unsupported {
                kind: ContainerKind::Xlsx,
                feature: format!("reopening finalized sheet `{}`", name),
            });
        }

        self.close_current_sheet()?;

        let index = self.sheets.len();
        self.sheets.push(SheetParts {
            name: name.to_string(),
            merges: BTreeSet::new(),
            hyperlinks: Vec::new(),
            images: Vec::new(),
        });

        self.zip
            .start_file(format!("xl/worksheets/sheet{}.xml", index + 1), entry_options())?;
        let mut head = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <worksheet xmlns=\"{}\" xmlns:r=\"{}\">",
            NS_MAIN, NS_REL
        );
        if !col_widths.is_empty() {
            head.push_str("<cols>");
            for (col, width) in col_widths {
                head.push_str(&format!(
                    "<col min=\"{0}\" max=\"{0}\" width=\"{1}\" customWidth=\"1\"/>",
                    col + 1,
                    width
                ));
            }
            head.push_str("</cols>");
        }
        head.push_str("<sheetData>");
        self.zip.write_all(head.as_bytes())?;

        self.current = Some(CurrentSheet { index, rows: 0 });
        tracing::debug!(sheet = name, "opened worksheet for streaming write");
        Ok(())
    }

    fn append_row(&mut self, cells: &[StyledCell]) -> Result<()> {
        let current = self
            .current
            .as_mut()
            .ok_or_else(|| SheetError::Malformed("no active worksheet".to_string()))?;
        current.rows += 1;
        let row_num = current.rows;
        let sheet_index = current.index;

        // Record image anchors before serializing; the cells themselves are
        // emitted (or skipped) by write_cell.
        for (col, cell) in cells.iter().enumerate() {
            if let CellValue::Image(image) = &cell.value {
                let media_idx = self.media.len();
                let name = format!("image{}.{}", media_idx + 1, image.format.extension());
                self.media
                    .push((name, image.data.clone(), image.format.content_type()));
                self.sheets[sheet_index]
                    .images
                    .push((row_num - 1, col as u32, media_idx));
            }
        }

        let mut buf = std::mem::take(&mut self.row_buf);
        buf.clear();
        let mut itoa_buf = itoa::Buffer::new();
        buf.extend_from_slice(b"<row r=\"");
        buf.extend_from_slice(itoa_buf.format(row_num).as_bytes());
        buf.extend_from_slice(b"\">");
        for (col, cell) in cells.iter().enumerate() {
            self.write_cell(&mut buf, row_num, col as u32, cell);
        }
        buf.extend_from_slice(b"</row>");
        self.zip.write_all(&buf)?;
        self.row_buf = buf;

        if row_num % self.flush_interval == 0 {
            self.zip.flush()?;
        }
        Ok(())
    }

    fn rows_written(&self) -> u32 {
        self.current.as_ref().map(|c| c.rows).unwrap_or(0)
    }

    fn merge(&mut self, region: MergeRegion) -> Result<()> {
        let current = self
            .current
            .as_ref()
            .ok_or_else(|| SheetError::Malformed("no active worksheet".to_string()))?;
        // Set semantics: re-declaring an existing region is a no-op.
        self.sheets[current.index].merges.insert(region);
        Ok(())
    }

    fn hyperlink(&mut self, row: u32, col: u32, url: &str) -> Result<()> {
        let current = self
            .current
            .as_ref()
            .ok_or_else(|| SheetError::Malformed("no active worksheet".to_string()))?;
        let cell_ref = format!("{}{}", col_to_letters(col), row + 1);
        self.sheets[current.index]
            .hyperlinks
            .push((cell_ref, url.to_string()));
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.close_current_sheet()?;
        self.write_catalog_parts()?;
        self.zip.finish()?;
        tracing::debug!(
            sheets = self.sheets.len(),
            shared_strings = self.shared.unique_count(),
            "finished zip/XML workbook"
        );
        Ok(())
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

const CORE_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>sheetstream</dc:creator>
<cp:lastModifiedBy>sheetstream</cp:lastModifiedBy>
<dcterms:created xsi:type="dcterms:W3CDTF">2024-01-01T00:00:00Z</dcterms:created>
<dcterms:modified xsi:type="dcterms:W3CDTF">2024-01-01T00:00:00Z</dcterms:modified>
</cp:coreProperties>"#;

const APP_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>sheetstream</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
<AppVersion>1.0</AppVersion>
</Properties>"#;

/// Fixed style table; cellXfs indices line up with `CellStyle`
const STYLE_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="2">
<numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/>
<numFmt numFmtId="165" formatCode="yyyy\-mm\-dd\ hh:mm:ss"/>
</numFmts>
<fonts count="3">
<font><sz val="11"/><name val="Calibri"/></font>
<font><b/><sz val="11"/><name val="Calibri"/></font>
<font><i/><sz val="11"/><name val="Calibri"/></font>
</fonts>
<fills count="3">
<fill><patternFill patternType="none"/></fill>
<fill><patternFill patternType="gray125"/></fill>
<fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill>
</fills>
<borders count="2">
<border><left/><right/><top/><bottom/><diagonal/></border>
<border><left style="thin"/><right style="thin"/><top style="thin"/><bottom style="thin"/><diagonal/></border>
</borders>
<cellStyleXfs count="1">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
</cellStyleXfs>
<cellXfs count="11">
<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>
<xf numFmtId="3" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="4" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="10" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="165" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>
<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>
<xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="0" applyFont="1"/>
<xf numFmtId="0" fontId="0" fillId="2" borderId="0" xfId="0" applyFill="1"/>
<xf numFmtId="0" fontId="0" fillId="0" borderId="1" xfId="0" applyBorder="1"/>
</cellXfs>
</styleSheet>"#;
