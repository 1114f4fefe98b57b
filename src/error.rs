//! Error kinds shared by every stage, and the wrapper returned by tasks

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Convenience result type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure detected at any stage of a conversion
#[derive(Debug, Error)]
pub enum Error {
    /// File extension (or requested format name) has no loader/writer.
    #[error("unsupported file format: {extension}")]
    FormatUnsupported { extension: String },

    /// Sheet selector matched nothing.
    #[error("worksheet {selector} not found")]
    WorksheetNotFound { selector: String },

    /// Column names are still duplicated after resolution.
    #[error("column names are not unique: {names:?}")]
    ColumnNameConflict { names: Vec<String> },

    /// A value has no mapping to any column type.
    #[error("unsupported data type in column '{column}': {value}")]
    UnsupportedValueType { column: String, value: String },

    /// A value cannot be coerced to the type fixed for its column.
    #[error("cannot convert value '{value}' at row {row} column '{column}' to {expected}")]
    TypeCoercion {
        column: String,
        row: usize,
        value: String,
        expected: String,
    },

    /// A column ended up with the wrong number of values.
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// The embedded SQL engine rejected the table load or the query.
    #[error("sql error: {0}")]
    QueryExecution(#[from] rusqlite::Error),

    /// A source or target file could not be read or written.
    #[error("io error: {}: {source}", path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Malformed option value (type name, `name=value` pair, delimiter).
    #[error("invalid option: {message}")]
    InvalidOption { message: String },
}

impl Error {
    /// Attach the file path to an I/O failure
    pub fn file(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::File {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// The end-to-end operations exposed by [`crate::task`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Convert,
    Query,
    ToXlsx,
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Convert => write!(f, "convert"),
            Task::Query => write!(f, "query"),
            Task::ToXlsx => write!(f, "to-xlsx"),
        }
    }
}

/// Single error surfaced to callers: the failing task plus the original failure
#[derive(Debug, Error)]
#[error("{task} error: {source}")]
pub struct TaskError {
    pub task: Task,
    #[source]
    pub source: Error,
}

impl TaskError {
    pub fn new(task: Task, source: Error) -> Self {
        Self { task, source }
    }

    /// The underlying error kind
    pub fn kind(&self) -> &Error {
        &self.source
    }
}
