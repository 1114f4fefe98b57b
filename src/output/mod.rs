//! Serialization of typed tables

mod csv;
mod json;
mod parquet;
mod xlsx;

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::config::{OutputFormat, OutputOptions};
use crate::error::{Error, Result};
use crate::model::TypedTable;

pub use self::csv::CsvWriter;
pub use self::json::JsonWriter;
pub use self::parquet::ParquetWriter;
pub use self::xlsx::export_worksheet;

/// Trait for table writers
pub trait TableWriter {
    /// Serialize the visible columns of `table` to a writer
    fn write(&self, table: &TypedTable, writer: &mut dyn Write) -> Result<()>;
}

/// Factory for creating table writers
pub struct WriterFactory;

impl WriterFactory {
    /// Create a writer based on the output options
    pub fn create(options: &OutputOptions) -> Box<dyn TableWriter> {
        match options.format {
            OutputFormat::Csv => Box::new(CsvWriter::new(options.csv_delimiter, options.csv_header)),
            OutputFormat::Json => Box::new(JsonWriter::new()),
            OutputFormat::JsonLines => Box::new(JsonWriter::lines()),
            OutputFormat::Parquet => Box::new(ParquetWriter::new()),
        }
    }
}

/// Serialize a table in the requested format
pub fn write_table(
    table: &TypedTable,
    options: &OutputOptions,
    writer: &mut dyn Write,
) -> Result<()> {
    WriterFactory::create(options).write(table, writer)
}

/// Render a table in memory, then write the target file in one go
pub fn write_table_to_path(
    table: &TypedTable,
    options: &OutputOptions,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let mut buffer = Vec::new();
    write_table(table, options, &mut buffer)?;
    std::fs::write(path, &buffer).map_err(|e| Error::file(path, e))?;
    debug!(
        format = ?options.format,
        path = %path.display(),
        bytes = buffer.len(),
        "table written"
    );
    Ok(())
}
