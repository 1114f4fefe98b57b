//! CSV file loader

use std::io::BufReader;
use std::path::Path;

use crate::config::LoadOptions;
use crate::error::Result;
use crate::model::{CellValue, Worksheet};

use super::{open_source, Loader};

/// Loader for delimited text files; every field stays text
pub struct CsvLoader;

impl Loader for CsvLoader {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Worksheet> {
        let file = open_source(path)?;
        let reader = BufReader::new(file);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(options.csv_delimiter)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(record.iter().map(parse_cell_value).collect());
        }

        Ok(Worksheet::new(title_of(path), rows).skip_rows(options.skip_rows))
    }
}

/// Fields are kept verbatim; an empty field is an empty cell
fn parse_cell_value(s: &str) -> CellValue {
    if s.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(s.to_string())
    }
}

/// Worksheet title for single-table sources: the file stem
pub(crate) fn title_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_value() {
        assert_eq!(parse_cell_value(""), CellValue::Empty);
        assert_eq!(parse_cell_value("42"), CellValue::Text("42".to_string()));
        assert_eq!(parse_cell_value(" x "), CellValue::Text(" x ".to_string()));
    }

    #[test]
    fn test_load_ragged_with_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "title\na|b|c\n1|2\n").unwrap();

        let options = LoadOptions::default()
            .with_csv_delimiter(b'|')
            .with_skip_rows(1);
        let sheet = CsvLoader.load(&path, &options).unwrap();

        assert_eq!(sheet.title(), "data");
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.column_count(), 3);
        assert_eq!(sheet.get(0, 2), &CellValue::Text("c".to_string()));
        assert_eq!(sheet.get(1, 2), &CellValue::Empty);
    }
}
