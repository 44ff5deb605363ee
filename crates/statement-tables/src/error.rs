use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to decode content stream of page {page}: {source}")]
    ContentStream { page: u32, source: lopdf::Error },

    #[error("invalid page selection: {0}")]
    InvalidPageSelection(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no pages available after applying selection")]
    NoPagesSelected,

    #[error("geometry extraction failed: {0}")]
    Geometry(#[from] GeometryError),
}

/// Failure of one geometry sub-strategy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("no ruled grid found in document")]
    NoRulingLines,

    #[error("page {page} has too many ruling lines ({rulings})")]
    TooManyRulings { page: u32, rulings: usize },

    #[error("ruled grid on page {page} is too large ({cells} cells)")]
    GridTooLarge { page: u32, cells: usize },

    #[error("whitespace alignment failed: {0}")]
    AlignmentFailed(String),
}

impl GeometryError {
    /// Whether the next geometry sub-strategy should be tried instead of
    /// failing the extraction.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NoRulingLines | Self::TooManyRulings { .. } | Self::GridTooLarge { .. } => true,
            Self::AlignmentFailed(_) => false,
        }
    }
}
