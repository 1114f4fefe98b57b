//! JSON and JSON Lines loaders

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::LoadOptions;
use crate::error::{Error, Result};
use crate::model::{CellValue, Worksheet};

use super::csv::title_of;
use super::Loader;

/// Loader for record documents
pub struct JsonLoader {
    /// One object per line instead of a single document
    pub(crate) lines: bool,
}

impl Loader for JsonLoader {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Worksheet> {
        let text = fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
        let records = if self.lines {
            parse_lines(&text)?
        } else {
            parse_document(&text)?
        };

        let rows = records_to_rows(&records);
        Ok(Worksheet::new(title_of(path), rows).skip_records(options.skip_rows))
    }
}

/// Parse a whole document; a document that is not a single JSON value is
/// retried as JSON Lines, reporting the original error if that fails too
fn parse_document(text: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(value) => Ok(vec![value]),
        Err(err) => {
            debug!(error = %err, "not a single JSON document, retrying as JSON Lines");
            parse_lines(text).map_err(|_| Error::Json(err))
        }
    }
}

fn parse_lines(text: &str) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    for (line_num, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            warn!(line = line_num + 1, "ignoring blank line");
            continue;
        }
        records.push(serde_json::from_str(line)?);
    }
    Ok(records)
}

/// Header row from the keys of the first object, then one row per record
fn records_to_rows(records: &[Value]) -> Vec<Vec<CellValue>> {
    let keys: Vec<String> = match records.first() {
        Some(Value::Object(obj)) => obj.keys().cloned().collect(),
        Some(_) => vec!["value".to_string()],
        None => return Vec::new(),
    };

    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(keys.iter().map(|k| CellValue::Text(k.clone())).collect());
    for record in records {
        let cells = match record {
            Value::Object(obj) => object_cells(obj, &keys),
            // Non-object item: put in first column
            other => vec![json_value_to_cell(Some(other))],
        };
        rows.push(cells);
    }
    rows
}

fn object_cells(obj: &Map<String, Value>, keys: &[String]) -> Vec<CellValue> {
    keys.iter().map(|key| json_value_to_cell(obj.get(key))).collect()
}

fn json_value_to_cell(value: Option<&Value>) -> CellValue {
    match value {
        None | Some(Value::Null) => CellValue::Empty,
        Some(Value::Bool(b)) => CellValue::from(*b),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        Some(Value::String(s)) => CellValue::Text(s.clone()),
        Some(nested @ (Value::Array(_) | Value::Object(_))) => CellValue::Text(nested.to_string()),
    }
}
