//! Relational transform stage: load a worksheet into SQLite, run one query,
//! type the result

mod store;

use tracing::debug;

use crate::config::QueryOptions;
use crate::error::{Error, Result};
use crate::ingest::{check_unique, column_name, parse_datetime, resolve_column_names, ColumnBuilder};
use crate::model::{format_datetime, CellValue, TypedTable, Worksheet};

pub use self::store::{
    quote_identifier, ColumnDef, RelationalStore, ResultColumn, ResultSet, SqliteStore, StoreValue,
};

/// Declared type of source columns holding date/time values
const TEMPORAL_DECL_TYPE: &str = "TIMESTAMP";

/// Run `options.query` against the worksheet loaded as `options.table_name`
///
/// In positional mode the table has columns `_index, A, B, ...` and holds
/// every worksheet row; in header mode the first row names the columns and
/// is not inserted. `_index` is the 1-based ordinal of each inserted row.
pub fn run_query(sheet: &Worksheet, options: &QueryOptions) -> Result<TypedTable> {
    let mut store = SqliteStore::open()?;
    run_query_with(&mut store, sheet, options)
}

/// [`run_query`] against a caller-provided store
pub fn run_query_with(
    store: &mut dyn RelationalStore,
    sheet: &Worksheet,
    options: &QueryOptions,
) -> Result<TypedTable> {
    let (names, first_data_row) = if options.use_first_row_as_header {
        let header = sheet.row(0).unwrap_or_default();
        (resolve_column_names(header)?, 1)
    } else {
        let names: Vec<String> = (0..=sheet.column_count()).map(column_name).collect();
        (names, 0)
    };
    let width = names.len() - 1;

    let rows: Vec<Vec<StoreValue>> = (first_data_row..sheet.row_count())
        .enumerate()
        .map(|(ordinal, row)| {
            let mut values = Vec::with_capacity(width + 1);
            values.push(StoreValue::Integer(ordinal as i64 + 1));
            values.extend((0..width).map(|col| store_value(sheet.get(row, col))));
            values
        })
        .collect();

    let columns: Vec<ColumnDef> = names
        .into_iter()
        .enumerate()
        .map(|(position, name)| {
            let temporal = position > 0
                && (first_data_row..sheet.row_count())
                    .any(|row| matches!(sheet.get(row, position - 1), CellValue::DateTime(_)));
            ColumnDef {
                name,
                decl_type: temporal.then_some(TEMPORAL_DECL_TYPE),
            }
        })
        .collect();

    store.create_table(&options.table_name, &columns)?;
    let inserted = store.insert_rows(&options.table_name, &columns, rows)?;
    debug!(
        table = %options.table_name,
        rows = inserted,
        columns = columns.len(),
        "worksheet loaded into store"
    );

    let result = store.execute(&options.query)?;
    debug!(
        rows = result.rows.len(),
        columns = result.columns.len(),
        "query executed"
    );
    type_result(result, options)
}

/// Convert a raw cell for storage; date/times are stored as canonical text
fn store_value(cell: &CellValue) -> StoreValue {
    match cell {
        CellValue::Empty => StoreValue::Null,
        CellValue::Text(s) => StoreValue::Text(s.clone()),
        CellValue::Int(i) => StoreValue::Integer(*i),
        CellValue::Float(f) => StoreValue::Real(*f),
        CellValue::DateTime(dt) => StoreValue::Text(format_datetime(dt)),
    }
}

/// Build the typed table from a result set: lower-cased unique names,
/// override types by output name, lazy inference otherwise
fn type_result(result: ResultSet, options: &QueryOptions) -> Result<TypedTable> {
    let names: Vec<String> = result
        .columns
        .iter()
        .map(|c| c.name.to_lowercase())
        .collect();
    check_unique(&names)?;

    let mut builders: Vec<ColumnBuilder> = names
        .into_iter()
        .map(|name| match options.types.get(&name) {
            Some(tag) => ColumnBuilder::with_type(name, *tag),
            None => ColumnBuilder::new(name),
        })
        .collect();

    for (i, row) in result.rows.iter().enumerate() {
        for ((value, column), builder) in row.iter().zip(&result.columns).zip(&mut builders) {
            let cell = result_cell(builder.name(), column, value)?;
            builder.push(i + 1, &cell)?;
        }
    }

    let mut table = TypedTable::new(result.rows.len());
    for builder in builders {
        table.insert(builder.finish())?;
    }
    Ok(table)
}

fn result_cell(name: &str, column: &ResultColumn, value: &StoreValue) -> Result<CellValue> {
    Ok(match value {
        StoreValue::Null => CellValue::Empty,
        StoreValue::Integer(i) => CellValue::Int(*i),
        StoreValue::Real(f) => CellValue::Float(*f),
        StoreValue::Text(s) if column.is_temporal() => match parse_datetime(s) {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Text(s.clone()),
        },
        StoreValue::Text(s) => CellValue::Text(s.clone()),
        StoreValue::Blob(b) => {
            return Err(Error::UnsupportedValueType {
                column: name.to_string(),
                value: format!("blob of {} bytes", b.len()),
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{TypeTag, Value};

    fn sample() -> Worksheet {
        let day = NaiveDate::from_ymd_opt(2021, 9, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Worksheet::new(
            "sheet",
            vec![
                vec!["Label".into(), "Date".into(), "Count".into()],
                vec!["one".into(), CellValue::DateTime(day), CellValue::Int(10)],
                vec!["two".into(), CellValue::Empty, CellValue::Int(20)],
            ],
        )
    }

    #[test]
    fn test_positional_mode() {
        let options = QueryOptions::new("select _index, A, c / 100.0 as col2 from xls");
        let table = run_query(&sample(), &options).unwrap();

        assert_eq!(table.column_names(), vec!["_index", "a", "col2"]);
        assert_eq!(table.row_count(), 3);
        let index = table.column("_index").unwrap();
        assert_eq!(
            index.values,
            vec![Value::Double(1.0), Value::Double(2.0), Value::Double(3.0)]
        );
        // The header row is data in positional mode; its text divides to 0
        let col2 = table.column("col2").unwrap();
        assert_eq!(col2.type_tag, Some(TypeTag::Double));
        assert_eq!(col2.values[1], Value::Double(0.1));
    }

    #[test]
    fn test_header_mode_keeps_dates() {
        let options = QueryOptions::new("select label, date, count from xls where count > 5")
            .with_first_row_as_header(true)
            .with_type("count", TypeTag::Integer);
        let table = run_query(&sample(), &options).unwrap();

        assert_eq!(table.row_count(), 2);
        let date = table.column("date").unwrap();
        assert_eq!(date.type_tag, Some(TypeTag::DateTime));
        assert_eq!(date.values[1], Value::Null);
        assert_eq!(
            table.column("count").unwrap().values,
            vec![Value::Integer(10), Value::Integer(20)]
        );
        assert_eq!(
            table.column("label").unwrap().values[0],
            Value::String("one".into())
        );
    }

    #[test]
    fn test_header_mode_index_is_one_based() {
        let options = QueryOptions::new("select _index from xls").with_first_row_as_header(true);
        let table = run_query(&sample(), &options).unwrap();
        assert_eq!(
            table.column("_index").unwrap().values,
            vec![Value::Double(1.0), Value::Double(2.0)]
        );
    }

    #[test]
    fn test_custom_table_name() {
        let options = QueryOptions::new("select count(*) as n from data").with_table_name("data");
        let table = run_query(&sample(), &options).unwrap();
        assert_eq!(table.column("n").unwrap().values, vec![Value::Double(3.0)]);
    }

    #[test]
    fn test_query_errors() {
        let err = run_query(&sample(), &QueryOptions::new("select nope from xls")).unwrap_err();
        assert!(matches!(err, Error::QueryExecution(_)));

        let err = run_query(&sample(), &QueryOptions::new("select A, a from xls")).unwrap_err();
        assert!(matches!(err, Error::ColumnNameConflict { .. }));

        let err = run_query(&sample(), &QueryOptions::new("select x'00' as b")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValueType { .. }));
    }
}
