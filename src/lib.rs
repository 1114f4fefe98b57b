//! sheetconv - typed conversion of spreadsheet-like files
//!
//! Loads XLS, XLSX, CSV, JSON, JSON Lines and Parquet sources into one
//! worksheet model, infers a type per column (optionally through an SQL
//! query run on an embedded SQLite database) and writes CSV, JSON, JSON Lines
//! or Parquet.

pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod output;
pub mod parser;
pub mod query;
pub mod task;

pub use config::{ConvertConfig, ExportConfig, QueryConfig};
pub use error::{Error, Result, TaskError};
pub use model::{TypedTable, Worksheet};
