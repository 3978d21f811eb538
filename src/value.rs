//! Cell-level data model shared by both pipelines
//!
//! `CellValue` is the weakly-typed union the codec layer produces and
//! consumes. Numbers keep the lexical text captured from the container so
//! that exact targets (arbitrary-precision decimal and the 128-bit integer
//! widths) never round-trip through an `f64`.

use std::fmt;

/// The variant tag of a [`CellValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellKind {
    Empty,
    Bool,
    Number,
    String,
    Formula,
    Error,
    Image,
}

/// Represents a single cell value in a worksheet
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// Boolean value
    Bool(bool),
    /// Numeric value, lexical form preserved
    Number(Number),
    /// String value
    String(String),
    /// Formula text (e.g. "=SUM(A1:A10)"); never evaluated
    Formula(String),
    /// Error code (e.g. "#DIV/0!")
    Error(String),
    /// Image payload anchored at this cell
    Image(ImageRef),
}

impl CellValue {
    /// The variant tag, used as half of a converter key
    pub fn kind(&self) -> CellKind {
        match self {
            CellValue::Empty => CellKind::Empty,
            CellValue::Bool(_) => CellKind::Bool,
            CellValue::Number(_) => CellKind::Number,
            CellValue::String(_) => CellKind::String,
            CellValue::Formula(_) => CellKind::Formula,
            CellValue::Error(_) => CellKind::Error,
            CellValue::Image(_) => CellKind::Image,
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Convert cell value to its display string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => n.lexical().to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Formula(f) => f.clone(),
            CellValue::Error(e) => e.clone(),
            CellValue::Image(img) => format!("[image {} bytes]", img.data.len()),
        }
    }

    /// Try to view as a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(n.as_f64()),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to view as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Number(n) => n.as_i64().map(|i| i != 0),
            CellValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Number(Number::from_i64(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Number(Number::from_f64(f))
    }
}

/// Numeric cell payload
///
/// Containers store numbers as text (XML `<v>` bodies, CSV fields), so the
/// lexical form is the ground truth. Narrowing to `f64`/`i64` happens only
/// when a converter asks for that view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Number {
    lexical: String,
}

impl Number {
    /// Parse a lexical number; `None` if the text is not a plain decimal
    /// or scientific-notation numeral
    pub fn from_lexical(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let numeral = !trimmed.is_empty()
            && trimmed
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'.' | b'-' | b'+' | b'e' | b'E'));
        // The byte check rejects "inf"/"NaN", which f64 parsing accepts.
        if !numeral || trimmed.parse::<f64>().is_err() {
            return None;
        }
        Some(Number {
            lexical: trimmed.to_string(),
        })
    }

    pub fn from_i64(v: i64) -> Self {
        Number {
            lexical: v.to_string(),
        }
    }

    pub fn from_u64(v: u64) -> Self {
        Number {
            lexical: v.to_string(),
        }
    }

    pub fn from_i128(v: i128) -> Self {
        Number {
            lexical: v.to_string(),
        }
    }

    pub fn from_u128(v: u128) -> Self {
        Number {
            lexical: v.to_string(),
        }
    }

    pub fn from_f64(v: f64) -> Self {
        Number {
            lexical: v.to_string(),
        }
    }

    /// Shortest round-trippable form of an `f32`, without widening noise
    pub fn from_f32(v: f32) -> Self {
        Number {
            lexical: v.to_string(),
        }
    }

    /// The text exactly as it appears in (or will appear in) the container
    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn as_f64(&self) -> f64 {
        self.lexical.parse().unwrap_or(f64::NAN)
    }

    /// Exact integer view; falls back to a fractionless float within range
    pub fn as_i64(&self) -> Option<i64> {
        if let Ok(i) = self.lexical.parse::<i64>() {
            return Some(i);
        }
        let f = self.lexical.parse::<f64>().ok()?;
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            Some(f as i64)
        } else {
            None
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        self.lexical.parse::<i128>().ok()
    }

    pub fn as_u128(&self) -> Option<u128> {
        self.lexical.parse::<u128>().ok()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical)
    }
}

/// Arbitrary-precision decimal, transported lexically
///
/// Holds a normalized plain-decimal string: sign, integer digits, optional
/// fraction, no exponent, no redundant zeros. Equality is exact. The type
/// carries no arithmetic; the conversion layer only needs representation
/// transport between fields and cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decimal(String);

impl Decimal {
    /// Parse and normalize. Accepts optional sign, digits, optional
    /// fraction, optional exponent (expanded into plain form).
    pub fn parse(text: &str) -> Option<Self> {
        let s = text.trim();
        if s.is_empty() {
            return None;
        }
        let (negative, s) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let (mantissa, exp) = match s.find(['e', 'E']) {
            Some(pos) => {
                let exp: i32 = s[pos + 1..].parse().ok()?;
                (&s[..pos], exp)
            }
            None => (s, 0),
        };
        let (int_part, frac_part) = match mantissa.find('.') {
            Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        // Expand the exponent by moving the decimal point over the digits.
        let digits: Vec<u8> = int_part.bytes().chain(frac_part.bytes()).collect();
        let point = int_part.len() as i32 + exp;

        let mut int_digits = String::new();
        let mut frac_digits = String::new();
        for (i, b) in digits.iter().enumerate() {
            if (i as i32) < point {
                int_digits.push(*b as char);
            } else {
                frac_digits.push(*b as char);
            }
        }
        if point > digits.len() as i32 {
            for _ in 0..(point - digits.len() as i32) {
                int_digits.push('0');
            }
        }
        if point < 0 {
            let mut padded = String::new();
            for _ in 0..(-point) {
                padded.push('0');
            }
            padded.push_str(&frac_digits);
            frac_digits = padded;
        }

        let int_trimmed = int_digits.trim_start_matches('0');
        let frac_trimmed = frac_digits.trim_end_matches('0');
        let int_final = if int_trimmed.is_empty() { "0" } else { int_trimmed };

        let zero = int_final == "0" && frac_trimmed.is_empty();
        let mut out = String::new();
        if negative && !zero {
            out.push('-');
        }
        out.push_str(int_final);
        if !frac_trimmed.is_empty() {
            out.push('.');
            out.push_str(frac_trimmed);
        }
        Some(Decimal(out))
    }

    /// The normalized plain-decimal text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Decimal {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Decimal::parse(s).ok_or(())
    }
}

/// Supported embedded-image encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Raw image bytes anchored to a cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageRef {
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

impl ImageRef {
    pub fn new(data: Vec<u8>, format: ImageFormat) -> Self {
        ImageRef { data, format }
    }
}

/// Cell style presets for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellStyle {
    /// Default style - no formatting
    #[default]
    Default = 0,
    /// Bold text for headers
    HeaderBold = 1,
    /// Integer format with thousand separator (#,##0)
    NumberInteger = 2,
    /// Decimal format with 2 places (#,##0.00)
    NumberDecimal = 3,
    /// Percentage format (0.00%)
    NumberPercentage = 4,
    /// Date format (yyyy-mm-dd)
    DateDefault = 5,
    /// DateTime format (yyyy-mm-dd hh:mm:ss)
    DateTimestamp = 6,
    /// Bold text for emphasis
    TextBold = 7,
    /// Italic text for notes
    TextItalic = 8,
    /// Yellow background highlight
    HighlightYellow = 9,
    /// Thin borders on all sides
    BorderThin = 10,
}

impl CellStyle {
    /// The style table index used by the zip/XML sink
    pub fn index(&self) -> u32 {
        *self as u32
    }
}

/// Styled cell value (combines value with formatting)
#[derive(Debug, Clone, PartialEq)]
pub struct StyledCell {
    pub value: CellValue,
    pub style: CellStyle,
}

impl StyledCell {
    pub fn new(value: CellValue, style: CellStyle) -> Self {
        StyledCell { value, style }
    }
}

impl From<CellValue> for StyledCell {
    fn from(value: CellValue) -> Self {
        StyledCell {
            value,
            style: CellStyle::Default,
        }
    }
}

/// A rectangular merged region, all bounds inclusive and zero-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MergeRegion {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u32,
    pub last_col: u32,
}

impl MergeRegion {
    pub fn new(first_row: u32, last_row: u32, first_col: u32, last_col: u32) -> Self {
        MergeRegion {
            first_row,
            last_row,
            first_col,
            last_col,
        }
    }

    /// A1-style range reference, e.g. "A1:A2"
    pub fn to_a1(&self) -> String {
        format!(
            "{}{}:{}{}",
            col_to_letters(self.first_col),
            self.first_row + 1,
            col_to_letters(self.last_col),
            self.last_row + 1
        )
    }
}

/// Convert a zero-based column index to letters (0 -> A, 25 -> Z, 26 -> AA)
pub fn col_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        result.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    result
}

/// Parse the column part of an A1-style cell reference (A1 -> 0, AA3 -> 26)
pub fn letters_to_col(cell_ref: &str) -> u32 {
    let mut col = 0u32;
    for ch in cell_ref.chars() {
        if ch.is_ascii_alphabetic() {
            col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else {
            break;
        }
    }
    col.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(col_to_letters(0), "A");
        assert_eq!(col_to_letters(25), "Z");
        assert_eq!(col_to_letters(26), "AA");
        assert_eq!(letters_to_col("A1"), 0);
        assert_eq!(letters_to_col("Z1"), 25);
        assert_eq!(letters_to_col("AA7"), 26);
    }

    #[test]
    fn test_number_preserves_lexical() {
        let n = Number::from_lexical("0.30000000000000000000001").unwrap();
        assert_eq!(n.lexical(), "0.30000000000000000000001");
        assert!(Number::from_lexical("not a number").is_none());
    }

    #[test]
    fn test_number_integer_views() {
        let n = Number::from_lexical("42").unwrap();
        assert_eq!(n.as_i64(), Some(42));
        let big = Number::from_lexical("170141183460469231731687303715884105727").unwrap();
        assert_eq!(big.as_i128(), Some(i128::MAX));
        assert_eq!(big.as_i64(), None);
    }

    #[test]
    fn test_decimal_normalization() {
        assert_eq!(Decimal::parse("1.230").unwrap().as_str(), "1.23");
        assert_eq!(Decimal::parse("007").unwrap().as_str(), "7");
        assert_eq!(Decimal::parse("-0.0").unwrap().as_str(), "0");
        assert_eq!(Decimal::parse("1.5e3").unwrap().as_str(), "1500");
        assert_eq!(Decimal::parse("25e-3").unwrap().as_str(), "0.025");
        assert!(Decimal::parse("abc").is_none());
    }

    #[test]
    fn test_decimal_exact_equality() {
        let a = Decimal::parse("0.1000").unwrap();
        let b = Decimal::parse("0.1").unwrap();
        assert_eq!(a, b);
        let c = Decimal::parse("0.10000000000000000001").unwrap();
        assert_ne!(b, c);
    }

    #[test]
    fn test_merge_region_a1() {
        let region = MergeRegion::new(0, 1, 0, 0);
        assert_eq!(region.to_a1(), "A1:A2");
        let wide = MergeRegion::new(4, 4, 1, 3);
        assert_eq!(wide.to_a1(), "B5:D5");
    }

    #[test]
    fn test_cell_value_views() {
        let val = CellValue::from(42i64);
        assert_eq!(val.as_f64(), Some(42.0));
        assert_eq!(val.kind(), CellKind::Number);
        assert_eq!(CellValue::from("true").as_bool(), Some(true));
        assert!(CellValue::Empty.is_empty());
    }
}
