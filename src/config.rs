//! Configuration handling for sheetconv

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::model::{CellValue, TypeTag};
use crate::parser::SourceFormat;

/// Default CSV delimiter
pub const DEFAULT_CSV_DELIMITER: u8 = b',';
/// Default table name used by the query stage
pub const DEFAULT_TABLE_NAME: &str = "xls";

/// Output format for typed tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    JsonLines,
    #[default]
    Parquet,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::JsonLines),
            "parquet" => Ok(OutputFormat::Parquet),
            _ => Err(Error::FormatUnsupported {
                extension: s.to_string(),
            }),
        }
    }
}

/// Case applied to the CSV header row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderCase {
    /// Column names exactly as they are in the table
    #[default]
    AsIs,
    Lower,
    Upper,
    /// No header row
    Skip,
}

impl std::str::FromStr for HeaderCase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "as-is" | "asis" | "keep" => Ok(HeaderCase::AsIs),
            "lower" => Ok(HeaderCase::Lower),
            "upper" => Ok(HeaderCase::Upper),
            "skip" | "none" => Ok(HeaderCase::Skip),
            _ => Err(Error::InvalidOption {
                message: format!("unknown header case: {s}"),
            }),
        }
    }
}

/// Worksheet selector: zero-based index or case-insensitive title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Index(usize),
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl std::str::FromStr for SheetSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().parse::<usize>() {
            Ok(index) => SheetSelector::Index(index),
            Err(_) => SheetSelector::Name(s.to_string()),
        })
    }
}

impl std::fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetSelector::Index(i) => write!(f, "#{i}"),
            SheetSelector::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// How to read the source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Force a source format instead of detecting it from the extension
    pub format: Option<SourceFormat>,
    /// Worksheet to read (spreadsheet formats only)
    pub sheet: SheetSelector,
    /// Number of leading rows to skip
    pub skip_rows: usize,
    /// Delimiter for CSV sources
    pub csv_delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            format: None,
            sheet: SheetSelector::default(),
            skip_rows: 0,
            csv_delimiter: DEFAULT_CSV_DELIMITER,
        }
    }
}

impl LoadOptions {
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_sheet(mut self, sheet: SheetSelector) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    pub fn with_csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }
}

/// How to serialize the typed table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub csv_delimiter: u8,
    pub csv_header: HeaderCase,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            csv_delimiter: DEFAULT_CSV_DELIMITER,
            csv_header: HeaderCase::default(),
        }
    }
}

impl OutputOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn with_csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    pub fn with_csv_header(mut self, header: HeaderCase) -> Self {
        self.csv_header = header;
        self
    }
}

/// Options of the direct (header + inference) ingestion path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOptions {
    /// Use these names instead of the cleaned header row
    pub column_names: Option<Vec<String>>,
    /// Explicit column types, by column name
    pub types: IndexMap<String, TypeTag>,
    /// Constant-valued columns appended after the source columns
    pub add_columns: IndexMap<String, CellValue>,
    /// Columns built and type-checked but left out of the output
    pub drop_columns: Vec<String>,
    /// Maximum number of data rows
    pub limit: Option<usize>,
    /// Materialize the synthetic `_index` column in front of the source columns
    pub include_index: bool,
}

impl IngestOptions {
    pub fn with_column_names(mut self, names: Vec<String>) -> Self {
        self.column_names = Some(names);
        self
    }

    pub fn with_type(mut self, column: impl Into<String>, type_tag: TypeTag) -> Self {
        self.types.insert(column.into(), type_tag);
        self
    }

    pub fn with_added_column(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.add_columns.insert(column.into(), value);
        self
    }

    pub fn with_drop_columns(mut self, columns: Vec<String>) -> Self {
        self.drop_columns = columns;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_index(mut self, include: bool) -> Self {
        self.include_index = include;
        self
    }
}

/// Options of the relational transform stage
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Name of the table the worksheet is loaded into
    pub table_name: String,
    /// SQL executed verbatim
    pub query: String,
    /// Name columns from the first row instead of A, B, C, ...
    pub use_first_row_as_header: bool,
    /// Output column types, by (lower-cased) output column name
    pub types: IndexMap<String, TypeTag>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            query: String::new(),
            use_first_row_as_header: false,
            types: IndexMap::new(),
        }
    }
}

impl QueryOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    pub fn with_first_row_as_header(mut self, enabled: bool) -> Self {
        self.use_first_row_as_header = enabled;
        self
    }

    /// Output names are lower-cased by the query stage, so the key is too
    pub fn with_type(mut self, column: impl AsRef<str>, type_tag: TypeTag) -> Self {
        self.types.insert(column.as_ref().to_lowercase(), type_tag);
        self
    }
}

/// Parameters of [`crate::task::convert`]
#[derive(Debug, Clone, Default)]
pub struct ConvertConfig {
    pub source: PathBuf,
    pub target: PathBuf,
    pub load: LoadOptions,
    pub ingest: IngestOptions,
    pub output: OutputOptions,
}

impl ConvertConfig {
    /// Create a new config with file paths
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_load(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    pub fn with_ingest(mut self, ingest: IngestOptions) -> Self {
        self.ingest = ingest;
        self
    }

    pub fn with_output(mut self, output: OutputOptions) -> Self {
        self.output = output;
        self
    }
}

/// Parameters of [`crate::task::query`]
#[derive(Debug, Clone, Default)]
pub struct QueryConfig {
    pub source: PathBuf,
    pub target: PathBuf,
    pub load: LoadOptions,
    pub query: QueryOptions,
    pub output: OutputOptions,
}

impl QueryConfig {
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            query: QueryOptions::new(query),
            ..Default::default()
        }
    }

    pub fn with_load(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    pub fn with_query(mut self, query: QueryOptions) -> Self {
        self.query = query;
        self
    }

    pub fn with_output(mut self, output: OutputOptions) -> Self {
        self.output = output;
        self
    }
}

/// Parameters of [`crate::task::to_xlsx`]
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub source: PathBuf,
    pub target: PathBuf,
    pub load: LoadOptions,
}

impl ExportConfig {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            load: LoadOptions::default(),
        }
    }

    pub fn with_load(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }
}

/// Split `name=value` pairs on the first `=`
pub fn parse_assignments<S: AsRef<str>>(items: &[S]) -> Result<IndexMap<String, String>> {
    items
        .iter()
        .map(|item| {
            let item = item.as_ref();
            item.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| Error::InvalidOption {
                    message: format!("expected name=value, got '{item}'"),
                })
        })
        .collect()
}

/// Parse `column=type` pairs
pub fn parse_types<S: AsRef<str>>(items: &[S]) -> Result<IndexMap<String, TypeTag>> {
    parse_assignments(items)?
        .into_iter()
        .map(|(name, type_name)| Ok((name, type_name.parse::<TypeTag>()?)))
        .collect()
}

/// Parse a single-byte delimiter; `\t` and `tab` mean a tab
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    match s.as_bytes() {
        [b] => Ok(*b),
        _ => Err(Error::InvalidOption {
            message: format!("delimiter must be a single byte, got '{s}'"),
        }),
    }
}
