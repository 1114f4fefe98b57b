//! Lazy per-column type fixation and value coercion

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};
use crate::model::{CellValue, Column, TypeTag, Value};
use crate::parser::days_to_datetime;

/// Day zero for numbers coerced into a date/time column: `1` is 1900-01-02
pub fn modern_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default()
}

/// Free-text date/time patterns, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
];

const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Parse free-text date/time; zoned values are normalized to UTC
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.naive_utc());
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Type a raw value would fix its column to; `None` for nulls
pub fn infer_type(column: &str, value: &CellValue) -> Result<Option<TypeTag>> {
    Ok(match value {
        _ if is_blank(value) => None,
        CellValue::Empty => None,
        CellValue::Text(_) => Some(TypeTag::String),
        CellValue::Int(_) => Some(TypeTag::Double),
        CellValue::Float(f) if !f.is_finite() => {
            return Err(Error::UnsupportedValueType {
                column: column.to_string(),
                value: value.to_string(),
            })
        }
        CellValue::Float(_) => Some(TypeTag::Double),
        CellValue::DateTime(_) => Some(TypeTag::DateTime),
    })
}

/// Type fixation state of one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnState {
    /// No non-null value seen yet and no override
    #[default]
    Unresolved,
    Resolved(TypeTag),
}

impl ColumnState {
    pub fn type_tag(self) -> Option<TypeTag> {
        match self {
            ColumnState::Unresolved => None,
            ColumnState::Resolved(tag) => Some(tag),
        }
    }
}

/// Accumulates the values of one column, fixing its type on the first
/// non-null value and coercing every later value to it
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    name: String,
    state: ColumnState,
    values: Vec<Value>,
}

impl ColumnBuilder {
    /// Builder whose type is inferred lazily
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ColumnState::Unresolved,
            values: Vec::new(),
        }
    }

    /// Builder whose type is fixed up front
    pub fn with_type(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            state: ColumnState::Resolved(type_tag),
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ColumnState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append a raw value read from `row` (used in error reports only)
    pub fn push(&mut self, row: usize, value: &CellValue) -> Result<()> {
        let value = self.coerce(row, value)?;
        self.values.push(value);
        Ok(())
    }

    /// Coerce a raw value without storing it, fixing the type if needed
    pub fn coerce(&mut self, row: usize, value: &CellValue) -> Result<Value> {
        let trimmed;
        let value = match value {
            CellValue::Text(s) if s.trim().len() != s.len() => {
                trimmed = CellValue::Text(s.trim().to_string());
                &trimmed
            }
            other => other,
        };

        let type_tag = match self.state {
            ColumnState::Resolved(tag) => tag,
            ColumnState::Unresolved => match infer_type(&self.name, value)? {
                Some(tag) => {
                    self.state = ColumnState::Resolved(tag);
                    tag
                }
                None => return Ok(Value::Null),
            },
        };

        coerce_value(type_tag, value).ok_or_else(|| Error::TypeCoercion {
            column: self.name.clone(),
            row,
            value: value.to_string(),
            expected: type_tag.to_string(),
        })
    }

    /// Append an already coerced value `count` times
    pub fn extend_with(&mut self, value: Value, count: usize) {
        self.values.extend(std::iter::repeat(value).take(count));
    }

    pub fn finish(self) -> Column {
        Column::new(self.name, self.state.type_tag(), self.values)
    }
}

/// Coerce a (trimmed) raw value to `type_tag`; `None` when impossible
///
/// Empty cells and blank text are null whatever the type, the same rule
/// inference applies before the type is fixed.
fn coerce_value(type_tag: TypeTag, value: &CellValue) -> Option<Value> {
    if is_blank(value) {
        return Some(Value::Null);
    }
    match type_tag {
        TypeTag::String => match value {
            CellValue::Text(s) => Some(Value::String(s.clone())),
            _ => None,
        },
        TypeTag::Double => match value {
            CellValue::Int(i) => Some(Value::Double(*i as f64)),
            CellValue::Float(f) => Some(Value::Double(*f)),
            CellValue::Text(s) => s.parse::<f64>().ok().map(Value::Double),
            _ => None,
        },
        TypeTag::Integer => match value {
            CellValue::Int(i) => Some(Value::Integer(*i)),
            CellValue::Float(f) if f.fract() == 0.0 && f.is_finite() => {
                Some(Value::Integer(*f as i64))
            }
            CellValue::Text(s) => s.parse::<i64>().ok().map(Value::Integer),
            _ => None,
        },
        TypeTag::DateTime => match value {
            CellValue::DateTime(dt) => Some(Value::DateTime(*dt)),
            CellValue::Int(0) => Some(Value::Null),
            CellValue::Float(f) if *f == 0.0 => Some(Value::Null),
            CellValue::Int(i) => days_to_datetime(modern_epoch(), *i as f64).map(Value::DateTime),
            CellValue::Float(f) => days_to_datetime(modern_epoch(), *f).map(Value::DateTime),
            CellValue::Text(s) => parse_datetime(s).map(Value::DateTime),
            CellValue::Empty => Some(Value::Null),
        },
    }
}

fn is_blank(value: &CellValue) -> bool {
    match value {
        CellValue::Empty => true,
        CellValue::Text(s) => s.trim().is_empty(),
        _ => false,
    }
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
    fn test_infer_type() {
        assert_eq!(infer_type("c", &CellValue::Empty).unwrap(), None);
        assert_eq!(infer_type("c", &CellValue::from("  ")).unwrap(), None);
        assert_eq!(infer_type("c", &CellValue::Int(3)).unwrap(), Some(TypeTag::Double));
        assert_eq!(infer_type("c", &CellValue::from("x")).unwrap(), Some(TypeTag::String));
        assert_eq!(
            infer_type("c", &CellValue::DateTime(ymd_hms(2021, 1, 1, 0, 0, 0))).unwrap(),
            Some(TypeTag::DateTime)
        );
        assert!(matches!(
            infer_type("c", &CellValue::Float(f64::INFINITY)),
            Err(Error::UnsupportedValueType { .. })
        ));
    }

    #[test]
    fn test_type_fixed_by_first_value() {
        let mut builder = ColumnBuilder::new("amount");
        builder.push(2, &CellValue::Empty).unwrap();
        assert_eq!(builder.state(), ColumnState::Unresolved);
        builder.push(3, &CellValue::Int(10)).unwrap();
        builder.push(4, &CellValue::from(" 2.5 ")).unwrap();
        builder.push(5, &CellValue::from("")).unwrap();

        let err = builder.push(6, &CellValue::from("abc")).unwrap_err();
        match err {
            Error::TypeCoercion {
                column, row, value, ..
            } => {
                assert_eq!(column, "amount");
                assert_eq!(row, 6);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }

        let column = builder.finish();
        assert_eq!(column.type_tag, Some(TypeTag::Double));
        assert_eq!(
            column.values,
            vec![Value::Null, Value::Double(10.0), Value::Double(2.5), Value::Null]
        );
    }

    #[test]
    fn test_string_column_rejects_numbers() {
        let mut builder = ColumnBuilder::new("label");
        builder.push(1, &CellValue::from(" one ")).unwrap();
        assert!(matches!(
            builder.push(2, &CellValue::Int(5)),
            Err(Error::TypeCoercion { .. })
        ));
        builder.push(3, &CellValue::from("")).unwrap();
        assert_eq!(
            builder.finish().values,
            vec![Value::String("one".into()), Value::Null]
        );
    }

    #[test]
    fn test_blank_text_is_null_before_and_after_fixation() {
        let mut builder = ColumnBuilder::new("c");
        builder.push(1, &CellValue::from("  ")).unwrap();
        builder.push(2, &CellValue::from("x")).unwrap();
        builder.push(3, &CellValue::from("  ")).unwrap();

        let column = builder.finish();
        assert_eq!(column.type_tag, Some(TypeTag::String));
        assert_eq!(
            column.values,
            vec![Value::Null, Value::String("x".into()), Value::Null]
        );
    }

    #[test]
    fn test_integer_override() {
        let mut builder = ColumnBuilder::with_type("n", TypeTag::Integer);
        builder.push(1, &CellValue::Float(4.0)).unwrap();
        builder.push(2, &CellValue::from("7")).unwrap();
        assert!(builder.push(3, &CellValue::Float(4.5)).is_err());
        assert_eq!(
            builder.finish().values,
            vec![Value::Integer(4), Value::Integer(7)]
        );
    }

    #[test]
    fn test_datetime_modern_epoch() {
        let mut builder = ColumnBuilder::with_type("when", TypeTag::DateTime);
        builder.push(1, &CellValue::Int(1)).unwrap();
        builder.push(2, &CellValue::Int(0)).unwrap();
        builder.push(3, &CellValue::Float(1.5)).unwrap();
        builder.push(4, &CellValue::from("2021-09-07")).unwrap();
        assert_eq!(
            builder.finish().values,
            vec![
                Value::DateTime(ymd_hms(1900, 1, 2, 0, 0, 0)),
                Value::Null,
                Value::DateTime(ymd_hms(1900, 1, 2, 12, 0, 0)),
                Value::DateTime(ymd_hms(2021, 9, 7, 0, 0, 0)),
            ]
        );
    }

    #[test]
    fn test_parse_datetime() {
        let expected = ymd_hms(2021, 9, 7, 13, 45, 0);
        assert_eq!(parse_datetime("2021-09-07T13:45:00"), Some(expected));
        assert_eq!(parse_datetime("2021-09-07 13:45"), Some(expected));
        assert_eq!(parse_datetime("2021-09-07T15:45:00+02:00"), Some(expected));
        assert_eq!(
            parse_datetime("7 Sep 2021"),
            Some(ymd_hms(2021, 9, 7, 0, 0, 0))
        );
        assert_eq!(
            parse_datetime("September 7, 2021"),
            Some(ymd_hms(2021, 9, 7, 0, 0, 0))
        );
        assert_eq!(
            parse_datetime("07.09.2021"),
            Some(ymd_hms(2021, 9, 7, 0, 0, 0))
        );
        assert_eq!(parse_datetime("not a date"), None);
    }
}
