//! Raw worksheet grid shared by every loader

use std::borrow::Cow;

use chrono::{NaiveDateTime, Timelike};

use super::schema::TypeTag;

/// A raw cell value, as produced by a loader before any typing
#[derive(Debug, Clone)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    DateTime(NaiveDateTime),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

static EMPTY: CellValue = CellValue::Empty;

impl CellValue {
    /// Check if the cell holds no value at all
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Short name of the raw kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Text(_) => "text",
            CellValue::Int(_) => "integer",
            CellValue::Float(_) => "float",
            CellValue::DateTime(_) => "datetime",
        }
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Empty => Cow::Borrowed(""),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(format_float(*f)),
            CellValue::DateTime(dt) => Cow::Owned(format_datetime(dt)),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Int(i64::from(b))
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Empty,
        }
    }
}

/// Render a float the way a spreadsheet's "General" format does:
/// integral values without a fractional part, everything else in the
/// shortest form that round-trips.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{sign}inf")
    } else if f.fract() == 0.0 && f.abs() < 1e15 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

/// Canonical date/time text: `YYYY-MM-DD HH:MM:SS`, with microseconds only
/// when the value has a sub-second part.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

/// A positioned view of one cell (zero-based coordinates)
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub row: usize,
    pub column: usize,
    pub value: &'a CellValue,
}

/// Uniform in-memory grid over any supported source
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    title: String,
    rows: Vec<Vec<CellValue>>,
    column_count: usize,
    /// Column types declared by a typed source, by column position
    column_types: Vec<Option<TypeTag>>,
}

impl Worksheet {
    /// Create a worksheet from rows; rows may have different lengths
    pub fn new(title: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            title: title.into(),
            rows,
            column_count,
            column_types: Vec::new(),
        }
    }

    /// Attach the column types a typed source (Parquet) declares
    pub fn with_column_types(mut self, column_types: Vec<Option<TypeTag>>) -> Self {
        self.column_types = column_types;
        self
    }

    /// Declared type of a column, if the source carried one
    pub fn column_type(&self, column: usize) -> Option<TypeTag> {
        self.column_types.get(column).copied().flatten()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (width of the widest row)
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Get a row by index
    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Iterate rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Get a cell value; positions outside a (ragged) row read as empty
    pub fn get(&self, row: usize, column: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }

    /// Iterate the cells of a row across the full worksheet width
    pub fn cells(&self, row: usize) -> impl Iterator<Item = Cell<'_>> {
        (0..self.column_count).map(move |column| Cell {
            row,
            column,
            value: self.get(row, column),
        })
    }

    /// Drop the first `n` rows
    pub fn skip_rows(mut self, n: usize) -> Self {
        let n = n.min(self.rows.len());
        self.rows.drain(..n);
        self.column_count = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        self
    }

    /// Drop the `n` rows following the first one; used by sources whose first
    /// row is a synthesized header rather than data
    pub fn skip_records(mut self, n: usize) -> Self {
        if self.rows.is_empty() {
            return self;
        }
        let end = (n + 1).min(self.rows.len());
        self.rows.drain(1..end);
        self.column_count = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        self
    }
}
