//! Export of a raw worksheet as a new `.xlsx` workbook

use rust_xlsxwriter::{Format, Workbook};

use crate::error::{Error, Result};
use crate::model::{CellValue, Worksheet};
use crate::parser::legacy_epoch;

/// Number format applied to date/time cells
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
/// Longest sheet name the format allows
const MAX_SHEET_NAME: usize = 31;

/// Write the grid into a single-sheet workbook and return the file bytes
pub fn export_worksheet(sheet: &Worksheet) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(DATETIME_FORMAT);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(sheet.title()))?;

    for r in 0..sheet.row_count() {
        let xrow = u32::try_from(r).map_err(|_| out_of_range("row", r))?;
        for cell in sheet.cells(r) {
            let xcol = u16::try_from(cell.column).map_err(|_| out_of_range("column", cell.column))?;
            match cell.value {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(xrow, xcol, s)?;
                }
                CellValue::Int(i) => {
                    worksheet.write_number(xrow, xcol, *i as f64)?;
                }
                CellValue::Float(f) => {
                    worksheet.write_number(xrow, xcol, *f)?;
                }
                CellValue::DateTime(dt) => {
                    worksheet.write_number_with_format(xrow, xcol, serial_of(dt), &date_format)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Days (with fraction) since the spreadsheet epoch
fn serial_of(dt: &chrono::NaiveDateTime) -> f64 {
    let millis = (*dt - legacy_epoch().and_time(chrono::NaiveTime::default())).num_milliseconds();
    millis as f64 / 86_400_000.0
}

/// A valid sheet name derived from the source title
fn sheet_name(title: &str) -> String {
    let name: String = title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME)
        .collect();
    let name = name.trim_matches('\'').to_string();
    if name.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        name
    }
}

fn out_of_range(what: &str, index: usize) -> Error {
    Error::InvalidOption {
        message: format!("{what} {index} is beyond the xlsx limits"),
    }
}
