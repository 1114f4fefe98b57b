//! Typed columns and the table handed to the writers

use std::borrow::Cow;

use chrono::NaiveDateTime;
use indexmap::{IndexMap, IndexSet};

use super::schema::TypeTag;
use super::sheet::{format_datetime, format_float};
use crate::error::{Error, Result};

/// A value after coercion to its column's type
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Double(f64),
    DateTime(NaiveDateTime),
    String(String),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text rendering used by delimited output; null renders empty
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Integer(i) => Cow::Owned(i.to_string()),
            Value::Double(f) => Cow::Owned(format_float(*f)),
            Value::DateTime(dt) => Cow::Owned(format_datetime(dt)),
            Value::String(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name (unique within a table)
    pub name: String,
    /// Fixed type; `None` when every value was null and nothing declared a type
    pub type_tag: Option<TypeTag>,
    /// Values in row order
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, type_tag: Option<TypeTag>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            type_tag,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Columns sharing one row count, in insertion order
#[derive(Debug, Clone, Default)]
pub struct TypedTable {
    columns: IndexMap<String, Column>,
    hidden: IndexSet<String>,
    row_count: usize,
}

impl TypedTable {
    /// Create an empty table whose columns must all hold `row_count` values
    pub fn new(row_count: usize) -> Self {
        Self {
            columns: IndexMap::new(),
            hidden: IndexSet::new(),
            row_count,
        }
    }

    /// Append a column, enforcing unique names and the shared row count
    pub fn insert(&mut self, column: Column) -> Result<()> {
        if self.columns.contains_key(&column.name) {
            return Err(Error::ColumnNameConflict {
                names: vec![column.name],
            });
        }
        if column.len() != self.row_count {
            return Err(Error::RowCountMismatch {
                column: column.name,
                expected: self.row_count,
                actual: column.values.len(),
            });
        }
        self.columns.insert(column.name.clone(), column);
        Ok(())
    }

    /// Keep the column in the table but exclude it from serialization
    pub fn hide(&mut self, name: &str) {
        if self.columns.contains_key(name) {
            self.hidden.insert(name.to_string());
        }
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden.contains(name)
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// All columns, hidden ones included
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Columns that are written out
    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .values()
            .filter(move |c| !self.hidden.contains(&c.name))
    }

    /// Names of all columns in insertion order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns, hidden ones included
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
