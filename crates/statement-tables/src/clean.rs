use crate::model::{RawRow, Row};

/// Trims every cell, turns absent cells into empty strings and drops rows
/// left without any content.
pub fn clean_rows(rows: &[RawRow]) -> Vec<Row> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.as_deref().map(str::trim).unwrap_or_default().to_string())
                .collect::<Row>()
        })
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect()
}

/// Whether a raw row has at least one cell with visible text.
pub(crate) fn has_content(row: &[Option<String>]) -> bool {
    row.iter()
        .any(|cell| cell.as_deref().is_some_and(|text| !text.trim().is_empty()))
}
