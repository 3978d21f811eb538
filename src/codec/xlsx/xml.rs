//! Minimal buffered XML emitter for worksheet parts

use crate::error::Result;
use std::io::Write;

/// XML writer that batches small writes before touching the sink
pub struct XmlWriter<W: Write> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(writer: W) -> Self {
        XmlWriter {
            writer,
            buffer: Vec::with_capacity(8192),
        }
    }

    #[inline]
    pub fn raw(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > 4096 {
            self.flush_buffer()?;
        }
        Ok(())
    }

    #[inline]
    pub fn text(&mut self, s: &str) -> Result<()> {
        self.raw(s.as_bytes())
    }

    #[inline]
    pub fn open(&mut self, name: &str) -> Result<()> {
        self.raw(b"<")?;
        self.text(name)
    }

    #[inline]
    pub fn close(&mut self, name: &str) -> Result<()> {
        self.raw(b"</")?;
        self.text(name)?;
        self.raw(b">")
    }

    #[inline]
    pub fn attr(&mut self, name: &str, value: &str) -> Result<()> {
        self.raw(b" ")?;
        self.text(name)?;
        self.raw(b"=\"")?;
        self.escaped(value)?;
        self.raw(b"\"")
    }

    #[inline]
    pub fn attr_int(&mut self, name: &str, value: u64) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.raw(b" ")?;
        self.text(name)?;
        self.raw(b"=\"")?;
        self.raw(buf.format(value).as_bytes())?;
        self.raw(b"\"")
    }

    /// Close the current start tag
    #[inline]
    pub fn seal(&mut self) -> Result<()> {
        self.raw(b">")
    }

    /// Close the current start tag as a self-closing element
    #[inline]
    pub fn seal_empty(&mut self) -> Result<()> {
        self.raw(b"/>")
    }

    /// Write text content with XML escaping
    pub fn escaped(&mut self, text: &str) -> Result<()> {
        for byte in text.bytes() {
            match byte {
                b'&' => self.buffer.extend_from_slice(b"&amp;"),
                b'<' => self.buffer.extend_from_slice(b"&lt;"),
                b'>' => self.buffer.extend_from_slice(b"&gt;"),
                b'"' => self.buffer.extend_from_slice(b"&quot;"),
                b'\'' => self.buffer.extend_from_slice(b"&apos;"),
                _ => self.buffer.push(byte),
            }
        }
        if self.buffer.len() > 4096 {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.flush_buffer()?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Escape text into a fresh string, for callers assembling XML by hand
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Decode the five predefined XML entities
pub fn decode_xml_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
