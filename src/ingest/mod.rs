//! Direct ingestion: header row + data rows → typed table

mod coerce;
mod names;

use tracing::debug;

use crate::config::IngestOptions;
use crate::error::{Error, Result};
use crate::model::{CellValue, TypeTag, TypedTable, Worksheet, INDEX_COLUMN_NAME};

pub use self::coerce::{infer_type, modern_epoch, parse_datetime, ColumnBuilder, ColumnState};
pub use self::names::{check_unique, clean_key, column_letter, column_name, resolve_column_names};

/// Where a column's values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnSource {
    /// Zero-based data-row offset
    Index,
    /// Worksheet column
    Cell(usize),
}

/// Build a typed table from a worksheet whose first row is the header
///
/// The `_index` column, when present, holds the zero-based offset of each
/// data row. Error rows are 1-based worksheet rows (the header is row 1).
/// Explicit types win over the column types a typed source declares; the
/// rest are inferred from their first non-null value.
pub fn ingest_worksheet(sheet: &Worksheet, options: &IngestOptions) -> Result<TypedTable> {
    let sources = column_sources(sheet, options)?;

    let data_rows = sheet.row_count().saturating_sub(1);
    let row_count = options.limit.map_or(data_rows, |limit| data_rows.min(limit));

    let mut builders: Vec<(ColumnSource, ColumnBuilder)> = sources
        .into_iter()
        .map(|(name, source)| {
            let declared = match source {
                ColumnSource::Cell(col) => sheet.column_type(col),
                ColumnSource::Index => None,
            };
            let builder = if source == ColumnSource::Index || name == INDEX_COLUMN_NAME {
                ColumnBuilder::with_type(name, TypeTag::Double)
            } else {
                match options.types.get(&name).copied().or(declared) {
                    Some(tag) => ColumnBuilder::with_type(name, tag),
                    None => ColumnBuilder::new(name),
                }
            };
            (source, builder)
        })
        .collect();

    for offset in 0..row_count {
        let row = offset + 1;
        for (source, builder) in &mut builders {
            match source {
                ColumnSource::Index => builder.push(row + 1, &CellValue::Int(offset as i64))?,
                ColumnSource::Cell(col) => builder.push(row + 1, sheet.get(row, *col))?,
            }
        }
    }

    let mut table = TypedTable::new(row_count);
    for (_, builder) in builders {
        table.insert(builder.finish())?;
    }

    for (name, constant) in &options.add_columns {
        if table.column(name).is_some() {
            return Err(Error::ColumnNameConflict {
                names: vec![name.clone()],
            });
        }
        let mut builder = match options.types.get(name) {
            Some(tag) => ColumnBuilder::with_type(name.as_str(), *tag),
            None => ColumnBuilder::new(name.as_str()),
        };
        let value = builder.coerce(0, constant)?;
        builder.extend_with(value, row_count);
        table.insert(builder.finish())?;
    }

    for name in &options.drop_columns {
        if table.column(name).is_none() {
            debug!(column = %name, "drop requested for unknown column");
        }
        table.hide(name);
    }

    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        "worksheet ingested"
    );
    Ok(table)
}

/// Column names paired with where their values come from
fn column_sources(sheet: &Worksheet, options: &IngestOptions) -> Result<Vec<(String, ColumnSource)>> {
    let mut sources: Vec<(String, ColumnSource)> = match &options.column_names {
        Some(names) => names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let source = if name == INDEX_COLUMN_NAME {
                    ColumnSource::Index
                } else {
                    ColumnSource::Cell(i)
                };
                (name.clone(), source)
            })
            .collect(),
        None => {
            let header = sheet.row(0).unwrap_or_default();
            resolve_column_names(header)?
                .into_iter()
                .enumerate()
                .skip(1)
                .map(|(position, name)| (name, ColumnSource::Cell(position - 1)))
                .collect()
        }
    };

    if options.include_index && !sources.iter().any(|(name, _)| name == INDEX_COLUMN_NAME) {
        sources.insert(0, (INDEX_COLUMN_NAME.to_string(), ColumnSource::Index));
    }

    check_unique(&sources.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>())?;
    Ok(sources)
}
