//! Embedded relational store behind a narrow interface

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use crate::error::Result;

/// A scalar as exchanged with the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// One result column: its name and the declared type of the source column
/// it comes from, when it maps directly to one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    pub name: String,
    pub decl_type: Option<String>,
}

impl ResultColumn {
    /// Whether the declared type marks date/time values stored as text
    pub fn is_temporal(&self) -> bool {
        self.decl_type.as_deref().is_some_and(|t| {
            let t = t.to_uppercase();
            t.contains("TIMESTAMP") || t.contains("DATE")
        })
    }
}

/// Rows produced by a query, with the result metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<StoreValue>>,
}

/// A source column definition: name and optional declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub decl_type: Option<&'static str>,
}

/// The operations the query stage needs from a relational engine
pub trait RelationalStore {
    fn create_table(&mut self, table: &str, columns: &[ColumnDef]) -> Result<()>;

    /// Insert rows in one transaction; returns the number of rows inserted
    fn insert_rows(
        &mut self,
        table: &str,
        columns: &[ColumnDef],
        rows: Vec<Vec<StoreValue>>,
    ) -> Result<usize>;

    /// Run one statement verbatim and collect its result
    fn execute(&mut self, query: &str) -> Result<ResultSet>;
}

/// In-memory SQLite database, private to its owner
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }
}

/// Double-quote an identifier
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl RelationalStore for SqliteStore {
    fn create_table(&mut self, table: &str, columns: &[ColumnDef]) -> Result<()> {
        let defs: Vec<String> = columns
            .iter()
            .map(|c| match c.decl_type {
                Some(decl) => format!("{} {decl}", quote_identifier(&c.name)),
                None => quote_identifier(&c.name),
            })
            .collect();
        let sql = format!("CREATE TABLE {} ({})", quote_identifier(table), defs.join(", "));
        debug!(%sql, "creating table");
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    fn insert_rows(
        &mut self,
        table: &str,
        columns: &[ColumnDef],
        rows: Vec<Vec<StoreValue>>,
    ) -> Result<usize> {
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} VALUES ({placeholders})",
            quote_identifier(table)
        );

        let tx = self.conn.transaction()?;
        let count = rows.len();
        {
            let mut stmt = tx.prepare_cached(&sql)?;
            for row in rows {
                stmt.execute(params_from_iter(row.into_iter().map(SqlValue::from)))?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    fn execute(&mut self, query: &str) -> Result<ResultSet> {
        let mut stmt = self.conn.prepare(query)?;
        let columns: Vec<ResultColumn> = stmt
            .columns()
            .iter()
            .map(|c| ResultColumn {
                name: c.name().to_string(),
                decl_type: c.decl_type().map(str::to_string),
            })
            .collect();

        let width = columns.len();
        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(StoreValue::from(row.get_ref(i)?));
            }
            rows.push(values);
        }

        Ok(ResultSet { columns, rows })
    }
}

impl From<StoreValue> for SqlValue {
    fn from(value: StoreValue) -> Self {
        match value {
            StoreValue::Null => SqlValue::Null,
            StoreValue::Integer(i) => SqlValue::Integer(i),
            StoreValue::Real(f) => SqlValue::Real(f),
            StoreValue::Text(s) => SqlValue::Text(s),
            StoreValue::Blob(b) => SqlValue::Blob(b),
        }
    }
}

impl From<ValueRef<'_>> for StoreValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => StoreValue::Null,
            ValueRef::Integer(i) => StoreValue::Integer(i),
            ValueRef::Real(f) => StoreValue::Real(f),
            ValueRef::Text(t) => StoreValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => StoreValue::Blob(b.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn defs() -> Vec<ColumnDef> {
        vec![
            ColumnDef {
                name: "id".into(),
                decl_type: None,
            },
            ColumnDef {
                name: "when".into(),
                decl_type: Some("TIMESTAMP"),
            },
        ]
    }

    #[test]
    fn test_round_trip_with_decl_type() {
        let mut store = SqliteStore::open().unwrap();
        store.create_table("t", &defs()).unwrap();
        let inserted = store
            .insert_rows(
                "t",
                &defs(),
                vec![
                    vec![StoreValue::Integer(1), StoreValue::Text("2021-09-07 00:00:00".into())],
                    vec![StoreValue::Real(2.5), StoreValue::Null],
                ],
            )
            .unwrap();
        assert_eq!(inserted, 2);

        let result = store.execute("select id, \"when\", id * 2 as twice from t").unwrap();
        assert_eq!(result.columns.len(), 3);
        assert!(result.columns[1].is_temporal());
        assert!(!result.columns[0].is_temporal());
        assert_eq!(result.columns[2].decl_type, None);
        assert_eq!(result.rows[0][0], StoreValue::Integer(1));
        assert_eq!(result.rows[1][2], StoreValue::Real(5.0));
        assert_eq!(result.rows[1][1], StoreValue::Null);
    }

    #[test]
    fn test_engine_errors_surface() {
        let mut store = SqliteStore::open().unwrap();
        let err = store.execute("select * from missing").unwrap_err();
        assert!(matches!(err, Error::QueryExecution(_)));
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
