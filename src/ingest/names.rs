//! Column naming: header cleaning, positional letters, de-duplication

use std::collections::BTreeSet;

use indexmap::IndexMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::{CellValue, INDEX_COLUMN_NAME};

/// Characters removed outright from a header
const DROPPED: &[char] = &['€', '$', '£', '¥'];

/// Characters collapsed (in runs) into a single underscore
const SEPARATORS: &[char] = &[
    ' ', '\'', '"', '<', '>', '(', ')', '[', ']', '.', ',', '/', '_', '-',
];

/// Normalize a header into a column name: lowercase ASCII-ish identifier,
/// separators collapsed into `_`, diacritics and currency symbols removed
pub fn clean_key(key: &str) -> String {
    let lowered = key.trim().to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut in_separator = false;
    for c in lowered.nfd() {
        if DROPPED.contains(&c) || is_combining_mark(c) {
            continue;
        }
        if SEPARATORS.contains(&c) || c.is_whitespace() {
            if !in_separator {
                out.push('_');
                in_separator = true;
            }
        } else {
            out.push(c);
            in_separator = false;
        }
    }

    out.trim_matches('_').nfc().collect()
}

/// Spreadsheet column letter of a 1-based position: 1 → `A`, 27 → `AA`
pub fn column_letter(position: usize) -> String {
    let mut n = position;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Positional column name: 0 is the index column, then `A`, `B`, ...
pub fn column_name(n: usize) -> String {
    if n == 0 {
        INDEX_COLUMN_NAME.to_string()
    } else {
        column_letter(n)
    }
}

/// Column names from a header row, the index column first
///
/// Header cell `i` sits at position `i + 1`. Trailing empty cells are
/// ignored, an interior empty cell is named after its column letter, and a
/// name seen before gets its column letter appended (`a`, `a_b`).
pub fn resolve_column_names(header: &[CellValue]) -> Result<Vec<String>> {
    let width = header
        .iter()
        .rposition(|cell| !cell.is_empty())
        .map_or(0, |last| last + 1);

    let mut cleaned: Vec<String> = Vec::with_capacity(width);
    let mut names = Vec::with_capacity(width + 1);
    names.push(INDEX_COLUMN_NAME.to_string());
    for (i, cell) in header[..width].iter().enumerate() {
        let letter = column_letter(i + 1).to_lowercase();
        let mut name = clean_key(&cell.display());
        if name.is_empty() {
            name = letter.clone();
        }
        // Only the cleaned headers count as "seen"; suffixed names may still clash
        let resolved = if cleaned.contains(&name) {
            format!("{name}_{letter}")
        } else {
            name.clone()
        };
        cleaned.push(name);
        names.push(resolved);
    }

    check_unique(&names)?;
    Ok(names)
}

/// Fail with every name that appears more than once
pub fn check_unique<S: AsRef<str>>(names: &[S]) -> Result<()> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for name in names {
        *counts.entry(name.as_ref()).or_default() += 1;
    }

    let duplicates: BTreeSet<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(Error::ColumnNameConflict {
            names: duplicates.into_iter().collect(),
        })
    }
}
