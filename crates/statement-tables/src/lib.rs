//! Recovers transaction tables from bank-statement PDFs.
//!
//! Text layout is tried first; documents it cannot read fall back to page
//! geometry (ruled grids, then whitespace alignment). Tables from every page
//! are merged into one row sequence with repeated headers removed.

mod clean;
mod csv_out;
mod error;
mod geometry;
mod header;
mod layout;
mod merge;
mod model;
mod options;
mod pdf_reader;
mod strategy;
mod table_parse;
mod text_layout;

use std::path::Path;

use tracing::debug;

pub use clean::clean_rows;
pub use csv_out::write_csv;
pub use error::{ExtractError, GeometryError};
pub use geometry::{AlignmentDetector, GeometryExtractor, GridLineDetector, TableDetector};
pub use header::{DEFAULT_HEADER_COLUMNS, HeaderMatch, HeaderMatcher};
pub use layout::{PageLayout, Segment, TextFragment};
pub use merge::{MIN_TABLE_ROWS, TableMerger};
pub use model::{
    ExtractionMethod, ExtractionResult, PageTable, PageText, RawCell, RawRow, Row,
};
pub use options::{ExtractOptions, PageSelection};
pub use pdf_reader::{Document, PageSource};
pub use strategy::{MIN_PRIMARY_ROWS, StrategySelector};
pub use text_layout::TextLayoutExtractor;

fn extract_document(
    document: Document,
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractError> {
    let document = document.select_pages(options.pages.as_ref())?;
    debug!(pages = document.page_count(), "document loaded");
    StrategySelector::new(options).extract(&document)
}

/// Extracts the merged transaction rows of an in-memory PDF.
pub fn extract_pdf_bytes(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractError> {
    options.validate()?;
    extract_document(Document::from_bytes(input_pdf.to_vec())?, options)
}

/// Extracts the merged transaction rows of the PDF at `input_pdf`.
pub fn extract_pdf(
    input_pdf: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionResult, ExtractError> {
    options.validate()?;
    extract_document(Document::open(input_pdf)?, options)
}
