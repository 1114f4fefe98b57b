//! Parquet output

use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType as ArrowType, Field, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::Result;
use crate::model::{Column, TypeTag, TypedTable, Value};

use super::TableWriter;

/// Parquet writer: one record batch, Snappy compression, nullable columns
#[derive(Default)]
pub struct ParquetWriter;

impl ParquetWriter {
    pub fn new() -> Self {
        Self
    }
}

impl TableWriter for ParquetWriter {
    fn write(&self, table: &TypedTable, writer: &mut dyn Write) -> Result<()> {
        let columns: Vec<&Column> = table.visible_columns().collect();

        let fields: Vec<Field> = columns
            .iter()
            .map(|c| Field::new(c.name.clone(), arrow_type(c.type_tag), true))
            .collect();
        let schema = Arc::new(Schema::new(fields));
        let arrays: Vec<ArrayRef> = columns.iter().map(|c| column_array(c)).collect();

        let options = RecordBatchOptions::new().with_row_count(Some(table.row_count()));
        let batch = RecordBatch::try_new_with_options(schema.clone(), arrays, &options)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        // ArrowWriter needs a Send sink
        let mut buffer = Vec::new();
        let mut arrow_writer = ArrowWriter::try_new(&mut buffer, schema, Some(props))?;
        arrow_writer.write(&batch)?;
        arrow_writer.close()?;

        writer.write_all(&buffer)?;
        Ok(())
    }
}

/// Arrow type of a column; unresolved columns are written as strings
pub fn arrow_type(type_tag: Option<TypeTag>) -> ArrowType {
    match type_tag {
        Some(TypeTag::Integer) => ArrowType::Int64,
        Some(TypeTag::Double) => ArrowType::Float64,
        Some(TypeTag::DateTime) => ArrowType::Timestamp(TimeUnit::Microsecond, None),
        Some(TypeTag::String) | None => ArrowType::Utf8,
    }
}

fn column_array(column: &Column) -> ArrayRef {
    let values = &column.values;
    match column.type_tag {
        Some(TypeTag::Integer) => Arc::new(Int64Array::from_iter(values.iter().map(|v| match v {
            Value::Integer(i) => Some(*i),
            _ => None,
        }))),
        Some(TypeTag::Double) => Arc::new(Float64Array::from_iter(values.iter().map(|v| match v {
            Value::Double(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }))),
        Some(TypeTag::DateTime) => Arc::new(TimestampMicrosecondArray::from_iter(values.iter().map(
            |v| match v {
                Value::DateTime(dt) => Some(dt.and_utc().timestamp_micros()),
                _ => None,
            },
        ))),
        Some(TypeTag::String) | None => {
            Arc::new(StringArray::from_iter(values.iter().map(|v| match v {
                Value::Null => None,
                other => Some(other.display().into_owned()),
            })))
        }
    }
}
