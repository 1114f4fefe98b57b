//! Data model: raw worksheets on the way in, typed tables on the way out

mod schema;
mod sheet;
mod table;

pub use schema::{TypeTag, INDEX_COLUMN_NAME};
pub use sheet::{format_datetime, format_float, Cell, CellValue, Worksheet};
pub use table::{Column, TypedTable, Value};
