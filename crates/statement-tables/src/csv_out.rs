use std::io;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ExtractError;
use crate::model::Row;

fn write_rows<W: io::Write>(writer: &mut Writer<W>, rows: &[Row]) -> Result<(), ExtractError> {
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes cleaned rows to `path`. Rows may differ in length.
pub fn write_csv(path: &Path, rows: &[Row], delimiter: u8) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;
    write_rows(&mut writer, rows)
}
