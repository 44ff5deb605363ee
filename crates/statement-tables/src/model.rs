/// A single extracted cell. `None` marks a cell the strategy found no text for.
pub type RawCell = Option<String>;

/// An uncleaned row, exactly as a strategy recovered it.
pub type RawRow = Vec<RawCell>;

/// A cleaned row: every cell trimmed, absent cells turned into empty strings.
pub type Row = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

/// A candidate table recovered from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTable {
    pub page: u32,
    pub rows: Vec<RawRow>,
}

impl PageTable {
    #[must_use]
    pub fn new(page: u32, rows: Vec<RawRow>) -> Self {
        Self { page, rows }
    }

    /// Builds a table from fully populated text cells.
    #[must_use]
    pub fn from_text_rows(page: u32, rows: Vec<Vec<String>>) -> Self {
        Self {
            page,
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Some).collect())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    TextLayout,
    GeometryBased,
}

impl ExtractionMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextLayout => "text-layout",
            Self::GeometryBased => "geometry-based",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merged rows of one extractor before cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergedRows {
    pub rows: Vec<RawRow>,
    pub pages_processed: usize,
    pub method: ExtractionMethod,
}

/// Final outcome of one extraction call.
///
/// `total_rows` counts the merged rows before cleaning, so it can be larger
/// than `rows.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub rows: Vec<Row>,
    pub pages_processed: usize,
    pub method_used: ExtractionMethod,
    pub total_rows: usize,
}
