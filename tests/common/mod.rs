//! Fixtures shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};

/// Serial number of 2021-09-07 in the 1900 date system
pub const SERIAL_2021_09_07: f64 = 44446.0;

/// The CSV every source of the sample data converts to, pipe-delimited
pub const SAMPLE_PIPE_CSV: &str = "label|date|count\n\
one|2021-09-07 00:00:00|10\n\
two|2021-09-08 00:00:00|20\n\
three|2021-09-09 00:00:00|30\n";

/// Write the sample workbook: a date-formatted column and numbers
pub fn sample_xlsx(dir: &Path) -> PathBuf {
    let path = dir.join("sample.xlsx");
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Data").unwrap();
    sheet.write_string(0, 0, "Label").unwrap();
    sheet.write_string(0, 1, "Date").unwrap();
    sheet.write_string(0, 2, "Count").unwrap();
    for (i, label) in ["one", "two", "three"].iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *label).unwrap();
        sheet
            .write_number_with_format(row, 1, SERIAL_2021_09_07 + i as f64, &date_format)
            .unwrap();
        sheet.write_number(row, 2, (i as f64 + 1.0) * 10.0).unwrap();
    }

    let other = workbook.add_worksheet();
    other.set_name("Other").unwrap();
    other.write_string(0, 0, "only").unwrap();
    other.write_number(1, 0, 1.5).unwrap();

    workbook.save(&path).unwrap();
    path
}

/// A workbook whose single sheet is built from string/number cells
pub fn xlsx_from_rows(dir: &Path, name: &str, rows: &[Vec<Cell>]) -> PathBuf {
    let path = dir.join(name);
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(r as u32, c as u16, *s).unwrap();
                }
                Cell::Number(n) => {
                    sheet.write_number(r as u32, c as u16, *n).unwrap();
                }
                Cell::Blank => {}
            }
        }
    }
    workbook.save(&path).unwrap();
    path
}

/// Fixture cell
pub enum Cell {
    Text(&'static str),
    Number(f64),
    Blank,
}

pub fn sample_csv(dir: &Path) -> PathBuf {
    let path = dir.join("sample.csv");
    std::fs::write(
        &path,
        "Label,Date,Count\n\
         one,2021-09-07 00:00:00,10\n\
         two,2021-09-08 00:00:00,20\n\
         three,2021-09-09 00:00:00,30\n",
    )
    .unwrap();
    path
}

pub fn sample_json(dir: &Path) -> PathBuf {
    let path = dir.join("sample.json");
    std::fs::write(
        &path,
        r#"[
  {"Label": "one", "Date": "2021-09-07 00:00:00", "Count": 10},
  {"Label": "two", "Date": "2021-09-08 00:00:00", "Count": 20},
  {"Label": "three", "Date": "2021-09-09 00:00:00", "Count": 30}
]"#,
    )
    .unwrap();
    path
}

pub fn sample_jsonl(dir: &Path) -> PathBuf {
    let path = dir.join("sample.jsonl");
    std::fs::write(
        &path,
        "{\"Label\": \"one\", \"Date\": \"2021-09-07 00:00:00\", \"Count\": 10}\n\
         {\"Label\": \"two\", \"Date\": \"2021-09-08 00:00:00\", \"Count\": 20}\n\
         {\"Label\": \"three\", \"Date\": \"2021-09-09 00:00:00\", \"Count\": 30}\n",
    )
    .unwrap();
    path
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
