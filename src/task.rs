//! End-to-end operations; each surfaces exactly one [`TaskError`]

use tracing::info;

use crate::config::{ConvertConfig, ExportConfig, QueryConfig};
use crate::error::{Error, Result, Task, TaskError};
use crate::ingest::ingest_worksheet;
use crate::output::{export_worksheet, write_table_to_path};
use crate::parser::load_worksheet;
use crate::query::run_query;

/// Load the source, type it from its header row and write the target
pub fn convert(config: &ConvertConfig) -> std::result::Result<(), TaskError> {
    run(Task::Convert, || {
        info!(
            source = %config.source.display(),
            target = %config.target.display(),
            format = ?config.output.format,
            "converting"
        );
        let sheet = load_worksheet(&config.source, &config.load)?;
        let table = ingest_worksheet(&sheet, &config.ingest)?;
        write_table_to_path(&table, &config.output, &config.target)?;
        info!(
            rows = table.row_count(),
            columns = table.visible_columns().count(),
            "conversion done"
        );
        Ok(())
    })
}

/// Load the source into the relational store, run the query and write the
/// typed result
pub fn query(config: &QueryConfig) -> std::result::Result<(), TaskError> {
    run(Task::Query, || {
        info!(
            source = %config.source.display(),
            target = %config.target.display(),
            table = %config.query.table_name,
            "querying"
        );
        let sheet = load_worksheet(&config.source, &config.load)?;
        let table = run_query(&sheet, &config.query)?;
        write_table_to_path(&table, &config.output, &config.target)?;
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            "query done"
        );
        Ok(())
    })
}

/// Re-save the selected worksheet of any supported source as `.xlsx`
pub fn to_xlsx(config: &ExportConfig) -> std::result::Result<(), TaskError> {
    run(Task::ToXlsx, || {
        info!(
            source = %config.source.display(),
            target = %config.target.display(),
            "exporting worksheet"
        );
        let sheet = load_worksheet(&config.source, &config.load)?;
        let bytes = export_worksheet(&sheet)?;
        std::fs::write(&config.target, bytes).map_err(|e| Error::file(&config.target, e))?;
        info!(rows = sheet.row_count(), "export done");
        Ok(())
    })
}

fn run(task: Task, body: impl FnOnce() -> Result<()>) -> std::result::Result<(), TaskError> {
    body().map_err(|source| TaskError::new(task, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_wrapped_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConvertConfig::new(dir.path().join("data.txt"), dir.path().join("out.csv"));
        let err = convert(&config).unwrap_err();

        assert_eq!(err.task, Task::Convert);
        assert!(matches!(err.kind(), Error::FormatUnsupported { .. }));
        assert_eq!(err.to_string(), "convert error: unsupported file format: txt");
        assert!(!dir.path().join("out.csv").exists());
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("missing.csv");
        let config = QueryConfig::new(&source, dir.path().join("out.csv"), "select * from xls");
        let err = query(&config).unwrap_err();
        assert_eq!(err.task, Task::Query);
        assert!(matches!(err.kind(), Error::File { path, .. } if path == &source));
        let expected = format!("query error: io error: {}:", source.display());
        assert!(err.to_string().starts_with(&expected));
    }

    #[test]
    fn test_unwritable_target_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("data.csv");
        std::fs::write(&source, "a\n1\n").unwrap();
        let target = dir.path().join("no_such_dir").join("out.csv");

        let err = to_xlsx(&ExportConfig::new(&source, &target)).unwrap_err();
        assert!(matches!(err.kind(), Error::File { path, .. } if path == &target));
    }
}
