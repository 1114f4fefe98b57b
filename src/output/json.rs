//! JSON and JSON Lines output

use std::io::Write;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::model::{format_datetime, format_float, Column, TypedTable, Value};

use super::TableWriter;

/// JSON writer: a pretty-printed array, or one compact object per line
pub struct JsonWriter {
    lines: bool,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self { lines: false }
    }

    pub fn lines() -> Self {
        Self { lines: true }
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableWriter for JsonWriter {
    fn write(&self, table: &TypedTable, writer: &mut dyn Write) -> Result<()> {
        let columns: Vec<&Column> = table.visible_columns().collect();

        if self.lines {
            for row in 0..table.row_count() {
                serde_json::to_writer(
                    &mut *writer,
                    &JsonRow {
                        columns: &columns,
                        row,
                    },
                )?;
                writer.write_all(b"\n")?;
            }
        } else {
            serde_json::to_writer_pretty(
                &mut *writer,
                &JsonRows {
                    columns: &columns,
                    row_count: table.row_count(),
                },
            )?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Serializes all rows as an array without materializing them
struct JsonRows<'a> {
    columns: &'a [&'a Column],
    row_count: usize,
}

impl Serialize for JsonRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.row_count))?;
        for row in 0..self.row_count {
            seq.serialize_element(&JsonRow {
                columns: self.columns,
                row,
            })?;
        }
        seq.end()
    }
}

/// One row as an object, keys in column order
struct JsonRow<'a> {
    columns: &'a [&'a Column],
    row: usize,
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in self.columns {
            map.serialize_entry(&column.name, &JsonValue(&column.values[self.row]))?;
        }
        map.end()
    }
}

struct JsonValue<'a>(&'a Value);

impl Serialize for JsonValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Double(f) if !f.is_finite() => serializer.serialize_str(&format_float(*f)),
            Value::Double(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
                serializer.serialize_i64(*f as i64)
            }
            Value::Double(f) => serializer.serialize_f64(*f),
            Value::DateTime(dt) => serializer.serialize_str(&format_datetime(dt)),
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}
