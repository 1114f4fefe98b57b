//! Delimited text output

use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::config::HeaderCase;
use crate::error::Result;
use crate::model::TypedTable;

use super::TableWriter;

/// CSV writer: minimal quoting, `\n` line endings
pub struct CsvWriter {
    delimiter: u8,
    header: HeaderCase,
}

impl CsvWriter {
    pub fn new(delimiter: u8, header: HeaderCase) -> Self {
        Self { delimiter, header }
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CSV_DELIMITER, HeaderCase::default())
    }
}

impl TableWriter for CsvWriter {
    fn write(&self, table: &TypedTable, writer: &mut dyn Write) -> Result<()> {
        let mut csv_writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(writer);

        let columns: Vec<_> = table.visible_columns().collect();

        match self.header {
            HeaderCase::AsIs => csv_writer.write_record(columns.iter().map(|c| c.name.as_str()))?,
            HeaderCase::Lower => {
                csv_writer.write_record(columns.iter().map(|c| c.name.to_lowercase()))?
            }
            HeaderCase::Upper => {
                csv_writer.write_record(columns.iter().map(|c| c.name.to_uppercase()))?
            }
            HeaderCase::Skip => {}
        }

        for row in 0..table.row_count() {
            csv_writer.write_record(columns.iter().map(|c| c.values[row].display().into_owned()))?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Column, TypeTag, Value};

    fn table() -> TypedTable {
        let day = NaiveDate::from_ymd_opt(2021, 9, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut table = TypedTable::new(2);
        table
            .insert(Column::new(
                "Label",
                Some(TypeTag::String),
                vec![Value::String("one, two".into()), Value::String("three".into())],
            ))
            .unwrap();
        table
            .insert(Column::new(
                "date",
                Some(TypeTag::DateTime),
                vec![Value::DateTime(day), Value::Null],
            ))
            .unwrap();
        table
            .insert(Column::new(
                "n",
                Some(TypeTag::Double),
                vec![Value::Double(10.0), Value::Double(0.25)],
            ))
            .unwrap();
        table
    }

    fn render(writer: CsvWriter, table: &TypedTable) -> String {
        let mut out = Vec::new();
        writer.write(table, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_default_csv() {
        assert_eq!(
            render(CsvWriter::default(), &table()),
            "Label,date,n\n\"one, two\",2021-09-07 00:00:00,10\nthree,,0.25\n"
        );
    }

    #[test]
    fn test_header_as_is_or_lowered() {
        let mut table = table();
        table.hide("n");
        assert_eq!(
            render(CsvWriter::new(b',', HeaderCase::AsIs), &table),
            "Label,date\n\"one, two\",2021-09-07 00:00:00\nthree,\n"
        );
        assert_eq!(
            render(CsvWriter::new(b',', HeaderCase::Lower), &table),
            "label,date\n\"one, two\",2021-09-07 00:00:00\nthree,\n"
        );
    }

    #[test]
    fn test_header_case_and_delimiter() {
        let mut table = table();
        table.hide("date");
        assert_eq!(
            render(CsvWriter::new(b'|', HeaderCase::Upper), &table),
            "LABEL|N\none, two|10\nthree|0.25\n"
        );
        assert_eq!(
            render(CsvWriter::new(b';', HeaderCase::Skip), &table),
            "one, two;10\nthree;0.25\n"
        );
    }
}
