//! Loader layer: every supported source becomes a [`Worksheet`]

mod csv;
mod excel;
mod json;
mod parquet;

use std::path::Path;

use tracing::debug;

use crate::config::LoadOptions;
use crate::error::{Error, Result};
use crate::model::Worksheet;

pub use self::csv::CsvLoader;
pub use self::excel::{days_to_datetime, excel_serial_to_datetime, legacy_epoch, ExcelLoader};
pub use self::json::JsonLoader;
pub use self::parquet::ParquetLoader;

/// Capability shared by every per-format loader
pub trait Loader: Send + Sync {
    /// Load a worksheet from a file
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Worksheet>;
}

/// Supported source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Legacy binary spreadsheet (BIFF)
    Xls,
    /// XML spreadsheet (Office Open XML, including the binary `.xlsb` variant)
    Xlsx,
    Csv,
    /// A JSON document holding an array of objects
    Json,
    /// One JSON object per line
    JsonLines,
    Parquet,
}

/// Extension to format table
const EXTENSIONS: &[(&str, SourceFormat)] = &[
    ("xls", SourceFormat::Xls),
    ("xlt", SourceFormat::Xls),
    ("xlsx", SourceFormat::Xlsx),
    ("xlsm", SourceFormat::Xlsx),
    ("xlsb", SourceFormat::Xlsx),
    ("csv", SourceFormat::Csv),
    ("json", SourceFormat::Json),
    ("jsonl", SourceFormat::JsonLines),
    ("ndjson", SourceFormat::JsonLines),
    ("parquet", SourceFormat::Parquet),
    ("pq", SourceFormat::Parquet),
];

static XLS_LOADER: ExcelLoader = ExcelLoader { legacy: true };
static XLSX_LOADER: ExcelLoader = ExcelLoader { legacy: false };
static JSON_LOADER: JsonLoader = JsonLoader { lines: false };
static JSONL_LOADER: JsonLoader = JsonLoader { lines: true };

impl SourceFormat {
    /// Look up a format by file extension (case-insensitive, leading dot allowed)
    pub fn from_extension(ext: &str) -> Result<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, format)| *format)
            .ok_or(Error::FormatUnsupported { extension: ext })
    }

    /// Detect the format of a path from its extension, or from its content
    /// when the path has no extension at all
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::from_extension(ext),
            None => detect_format(path)
                .map(Self::from_extension)
                .unwrap_or_else(|| {
                    Err(Error::FormatUnsupported {
                        extension: String::new(),
                    })
                }),
        }
    }

    /// The loader implementing this format
    pub fn loader(self) -> &'static dyn Loader {
        match self {
            SourceFormat::Xls => &XLS_LOADER,
            SourceFormat::Xlsx => &XLSX_LOADER,
            SourceFormat::Csv => &CsvLoader,
            SourceFormat::Json => &JSON_LOADER,
            SourceFormat::JsonLines => &JSONL_LOADER,
            SourceFormat::Parquet => &ParquetLoader,
        }
    }

    /// Whether the sheet selector means anything for this format
    pub fn is_spreadsheet(self) -> bool {
        matches!(self, SourceFormat::Xls | SourceFormat::Xlsx)
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s)
    }
}

/// Load a worksheet, selecting the loader from the options or the file extension
pub fn load_worksheet(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Worksheet> {
    let path = path.as_ref();
    let format = match options.format {
        Some(format) => format,
        None => SourceFormat::from_path(path)?,
    };

    let sheet = format.loader().load(path, options)?;
    debug!(
        ?format,
        path = %path.display(),
        title = sheet.title(),
        rows = sheet.row_count(),
        columns = sheet.column_count(),
        "worksheet loaded"
    );
    Ok(sheet)
}

/// Open a source file, naming it in the error
pub(crate) fn open_source(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| Error::file(path, e))
}

/// Detect file format from content (for files without extension)
pub fn detect_format(path: &Path) -> Option<&'static str> {
    use std::fs::File;
    use std::io::{BufRead, BufReader, Read};

    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; 8];
    let bytes_read = reader.read(&mut buffer).ok()?;

    if bytes_read < 4 {
        return None;
    }

    // Check for Parquet magic bytes
    if &buffer[0..4] == b"PAR1" {
        return Some("parquet");
    }

    // Check for Excel ZIP format (xlsx)
    if &buffer[0..4] == b"PK\x03\x04" {
        return Some("xlsx");
    }

    // Check for old Excel format (xls)
    if &buffer[0..4] == b"\xD0\xCF\x11\xE0" {
        return Some("xls");
    }

    // Try to detect JSON
    reader.seek_relative(-(bytes_read as i64)).ok()?;
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let trimmed = line.trim();
    if trimmed.starts_with('[') {
        return Some("json");
    }
    if trimmed.starts_with('{') {
        // A complete object on the first line means one record per line
        return Some(if trimmed.ends_with('}') { "jsonl" } else { "json" });
    }

    // Default to CSV
    Some("csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(SourceFormat::from_extension("XLS").unwrap(), SourceFormat::Xls);
        assert_eq!(SourceFormat::from_extension(".xlt").unwrap(), SourceFormat::Xls);
        assert_eq!(SourceFormat::from_extension("xlsm").unwrap(), SourceFormat::Xlsx);
        assert_eq!(
            SourceFormat::from_extension("ndjson").unwrap(),
            SourceFormat::JsonLines
        );
        assert!(matches!(
            SourceFormat::from_extension("txt"),
            Err(Error::FormatUnsupported { extension }) if extension == "txt"
        ));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            SourceFormat::from_path(Path::new("dir/data.Parquet")).unwrap(),
            SourceFormat::Parquet
        );
        assert!(SourceFormat::from_path(Path::new("data.doc")).is_err());
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["gone.csv", "gone.json", "gone.parquet", "gone.xlsx", "gone.xls"] {
            let path = dir.path().join(name);
            let err = load_worksheet(&path, &LoadOptions::default()).unwrap_err();
            match err {
                Error::File { path: reported, .. } => assert_eq!(reported, path),
                other => panic!("unexpected error for {name}: {other}"),
            }
        }
    }

    #[test]
    fn test_detect_format_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records");
        std::fs::write(&path, "{\"a\": 1}\n{\"a\": 2}\n").unwrap();
        assert_eq!(SourceFormat::from_path(&path).unwrap(), SourceFormat::JsonLines);

        let path = dir.path().join("plain");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert_eq!(SourceFormat::from_path(&path).unwrap(), SourceFormat::Csv);
    }
}
