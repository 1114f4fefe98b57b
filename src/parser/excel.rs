//! Spreadsheet loaders (xls, xlsx, xlsm, xlsb)

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{Data, Range, Reader, Xls, Xlsb, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::config::{LoadOptions, SheetSelector};
use crate::error::{Error, Result};
use crate::model::{CellValue, Worksheet};

use super::{open_source, Loader};

/// Day zero of spreadsheet serial dates (the 1900 date system, shifted by the
/// fictitious 1900-02-29)
pub fn legacy_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Parser for spreadsheet files
pub struct ExcelLoader {
    /// Legacy binary format (`.xls`)
    pub(crate) legacy: bool,
}

impl Loader for ExcelLoader {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<Worksheet> {
        let reader = BufReader::new(open_source(path)?);
        let (title, range) = if self.legacy {
            let mut workbook: Xls<BufReader<File>> =
                Xls::new(reader).map_err(calamine::Error::from)?;
            select_range::<BufReader<File>, _>(&mut workbook, &options.sheet)?
        } else if is_xlsb(path) {
            let mut workbook: Xlsb<BufReader<File>> =
                Xlsb::new(reader).map_err(calamine::Error::from)?;
            select_range::<BufReader<File>, _>(&mut workbook, &options.sheet)?
        } else {
            let mut workbook: Xlsx<BufReader<File>> =
                Xlsx::new(reader).map_err(calamine::Error::from)?;
            select_range::<BufReader<File>, _>(&mut workbook, &options.sheet)?
        };

        let rows = grid_from_range(&range)?;
        Ok(Worksheet::new(title, rows).skip_rows(options.skip_rows))
    }
}

fn is_xlsb(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsb"))
}

/// Pick a sheet by zero-based index or case-insensitive title
fn select_range<R, W>(workbook: &mut W, selector: &SheetSelector) -> Result<(String, Range<Data>)>
where
    R: std::io::Read + std::io::Seek,
    W: Reader<R>,
    calamine::Error: From<W::Error>,
{
    let names = workbook.sheet_names();
    let title = match selector {
        SheetSelector::Index(index) => names.get(*index).cloned(),
        SheetSelector::Name(name) => names
            .iter()
            .find(|n| n.to_lowercase() == name.to_lowercase())
            .cloned(),
    }
    .ok_or_else(|| Error::WorksheetNotFound {
        selector: selector.to_string(),
    })?;

    let range = workbook
        .worksheet_range(&title)
        .map_err(calamine::Error::from)?;
    Ok((title, range))
}

/// Materialize the used range as a grid anchored at A1
fn grid_from_range(range: &Range<Data>) -> Result<Vec<Vec<CellValue>>> {
    let (start_row, start_col) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return Ok(Vec::new()),
    };

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col];
        for cell in row {
            cells.push(convert_cell(cell)?);
        }
        // Trailing empties carry no information and would widen the sheet
        while cells.last().is_some_and(CellValue::is_empty) {
            cells.pop();
        }
        rows.push(cells);
    }
    Ok(rows)
}

/// Midnight of `epoch` plus a (possibly fractional) number of days, rounded
/// to the millisecond
pub fn days_to_datetime(epoch: NaiveDate, days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let millis = (days * 86_400_000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}

/// Convert a spreadsheet serial number (days since [`legacy_epoch`])
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    days_to_datetime(legacy_epoch(), serial)
}

/// Raw values are preserved; only cells the workbook itself flags as dates
/// become date/times, converted from their serial number right away.
fn convert_cell(cell: &Data) -> Result<CellValue> {
    Ok(match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => {
            // Check if it's actually an integer
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Int(i64::from(*b)),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_datetime(serial)
                .map(CellValue::DateTime)
                .ok_or_else(|| Error::UnsupportedValueType {
                    column: String::new(),
                    value: format!("date serial {serial}"),
                })?
        }
        Data::DateTimeIso(s) => parse_iso(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    })
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_serial_zero_is_legacy_epoch() {
        assert_eq!(excel_serial_to_datetime(0.0), Some(ymd_hms(1899, 12, 30, 0, 0, 0)));
    }

    #[test]
    fn test_serial_with_time() {
        // 2021-09-07 is serial 44446
        assert_eq!(
            excel_serial_to_datetime(44446.5),
            Some(ymd_hms(2021, 9, 7, 12, 0, 0))
        );
        assert_eq!(excel_serial_to_datetime(f64::NAN), None);
    }

    #[test]
    fn test_legacy_and_binary_workbooks_dispatch_to_their_readers() {
        let dir = tempfile::tempdir().unwrap();
        for (name, legacy) in [("bad.xls", true), ("bad.xlsb", false)] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"not a workbook at all").unwrap();
            let err = ExcelLoader { legacy }
                .load(&path, &LoadOptions::default())
                .unwrap_err();
            assert!(matches!(err, Error::Spreadsheet(_)), "{name}: {err}");
        }
        assert!(is_xlsb(Path::new("book.XLSB")));
        assert!(!is_xlsb(Path::new("book.xlsx")));
    }

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Float(10.0)).unwrap(), CellValue::Int(10));
        assert_eq!(convert_cell(&Data::Float(0.5)).unwrap(), CellValue::Float(0.5));
        assert_eq!(convert_cell(&Data::Bool(true)).unwrap(), CellValue::Int(1));
        assert_eq!(
            convert_cell(&Data::String(" x ".into())).unwrap(),
            CellValue::Text(" x ".into())
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2021-09-07T00:00:00".into())).unwrap(),
            CellValue::DateTime(ymd_hms(2021, 9, 7, 0, 0, 0))
        );
    }
}
