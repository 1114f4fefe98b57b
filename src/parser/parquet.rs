//! Parquet file loader

use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType as ArrowType, Date32Type, Date64Type, Float64Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType,
};
use arrow::temporal_conversions::{
    date32_to_datetime, date64_to_datetime, timestamp_ms_to_datetime, timestamp_ns_to_datetime,
    timestamp_s_to_datetime, timestamp_us_to_datetime,
};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::config::LoadOptions;
use crate::error::{Error, Result};
use crate::model::{CellValue, TypeTag, Worksheet};

use super::csv::title_of;
use super::{open_source, Loader};

/// Loader for Parquet files: field names, then one row per record
pub struct ParquetLoader;

impl Loader for ParquetLoader {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Worksheet> {
        let file = open_source(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let reader = builder.build()?;

        let mut rows: Vec<Vec<CellValue>> = vec![schema
            .fields()
            .iter()
            .map(|field| CellValue::Text(field.name().clone()))
            .collect()];

        for batch_result in reader {
            let batch = batch_result?;
            let columns = batch
                .columns()
                .iter()
                .map(column_cells)
                .collect::<Result<Vec<_>>>()?;

            for row_idx in 0..batch.num_rows() {
                rows.push(columns.iter().map(|col| col[row_idx].clone()).collect());
            }
        }

        let column_types = schema
            .fields()
            .iter()
            .map(|field| declared_type(field.data_type()))
            .collect();
        Ok(Worksheet::new(title_of(path), rows)
            .with_column_types(column_types)
            .skip_records(options.skip_rows))
    }
}

/// Column type implied by the file schema; text and booleans are left to
/// inference, which gives the same answer for any non-null value
fn declared_type(data_type: &ArrowType) -> Option<TypeTag> {
    match data_type {
        t if t.is_integer() => Some(TypeTag::Integer),
        t if t.is_floating() => Some(TypeTag::Double),
        ArrowType::Date32 | ArrowType::Date64 | ArrowType::Timestamp(_, _) => {
            Some(TypeTag::DateTime)
        }
        _ => None,
    }
}

/// Convert one arrow column into raw cells
fn column_cells(array: &ArrayRef) -> Result<Vec<CellValue>> {
    let len = array.len();
    let cells = match array.data_type() {
        ArrowType::Boolean => {
            let arr = array.as_boolean();
            (0..len)
                .map(|i| cell_if_valid(array, i, || CellValue::from(arr.value(i))))
                .collect()
        }
        t if t.is_integer() => {
            let ints = cast(array, &ArrowType::Int64)?;
            let arr = ints.as_primitive::<Int64Type>();
            (0..len)
                .map(|i| cell_if_valid(&ints, i, || CellValue::Int(arr.value(i))))
                .collect()
        }
        t if t.is_floating() => {
            let floats = cast(array, &ArrowType::Float64)?;
            let arr = floats.as_primitive::<Float64Type>();
            (0..len)
                .map(|i| cell_if_valid(&floats, i, || CellValue::Float(arr.value(i))))
                .collect()
        }
        ArrowType::Utf8 | ArrowType::LargeUtf8 | ArrowType::Utf8View => {
            let strings = cast(array, &ArrowType::Utf8)?;
            let arr = strings.as_string::<i32>();
            (0..len)
                .map(|i| cell_if_valid(&strings, i, || CellValue::Text(arr.value(i).to_string())))
                .collect()
        }
        ArrowType::Date32 => {
            let arr = array.as_primitive::<Date32Type>();
            temporal_cells(array, |i| date32_to_datetime(arr.value(i)))?
        }
        ArrowType::Date64 => {
            let arr = array.as_primitive::<Date64Type>();
            temporal_cells(array, |i| date64_to_datetime(arr.value(i)))?
        }
        ArrowType::Timestamp(unit, _) => match unit {
            TimeUnit::Second => {
                let arr = array.as_primitive::<TimestampSecondType>();
                temporal_cells(array, |i| timestamp_s_to_datetime(arr.value(i)))?
            }
            TimeUnit::Millisecond => {
                let arr = array.as_primitive::<TimestampMillisecondType>();
                temporal_cells(array, |i| timestamp_ms_to_datetime(arr.value(i)))?
            }
            TimeUnit::Microsecond => {
                let arr = array.as_primitive::<TimestampMicrosecondType>();
                temporal_cells(array, |i| timestamp_us_to_datetime(arr.value(i)))?
            }
            TimeUnit::Nanosecond => {
                let arr = array.as_primitive::<TimestampNanosecondType>();
                temporal_cells(array, |i| timestamp_ns_to_datetime(arr.value(i)))?
            }
        },
        _ => {
            // Fallback: convert to string
            let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
            (0..len)
                .map(|i| cell_if_valid(array, i, || CellValue::Text(formatter.value(i).to_string())))
                .collect()
        }
    };
    Ok(cells)
}

fn cell_if_valid(array: &ArrayRef, i: usize, value: impl FnOnce() -> CellValue) -> CellValue {
    if array.is_null(i) {
        CellValue::Empty
    } else {
        value()
    }
}

fn temporal_cells(
    array: &ArrayRef,
    convert: impl Fn(usize) -> Option<chrono::NaiveDateTime>,
) -> Result<Vec<CellValue>> {
    (0..array.len())
        .map(|i| {
            if array.is_null(i) {
                return Ok(CellValue::Empty);
            }
            convert(i)
                .map(CellValue::DateTime)
                .ok_or_else(|| Error::UnsupportedValueType {
                    column: String::new(),
                    value: format!("out of range {} value", array.data_type()),
                })
        })
        .collect()
}
