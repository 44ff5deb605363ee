use tracing::debug;

use crate::header::HeaderMatcher;
use crate::merge::TableMerger;
use crate::model::{ExtractionMethod, MergedRows, PageTable, PageText};
use crate::table_parse::{soft_split_line_into_cells, split_line_into_cells};

/// Recovers tables from page text by reading column breaks out of the
/// whitespace between words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLayoutExtractor {
    min_cols: usize,
}

impl TextLayoutExtractor {
    #[must_use]
    pub fn new(min_cols: usize) -> Self {
        Self {
            min_cols: min_cols.max(2),
        }
    }

    /// Candidate tables of one page, in reading order.
    #[must_use]
    pub fn page_tables(&self, page: &PageText) -> Vec<PageTable> {
        let mut tables = Vec::new();
        let mut current_rows: Vec<Vec<String>> = Vec::new();

        let flush_current = |rows: &mut Vec<Vec<String>>, tables: &mut Vec<PageTable>| {
            if rows.is_empty() {
                return;
            }
            tables.push(PageTable::from_text_rows(
                page.page_number,
                std::mem::take(rows),
            ));
        };

        for line in page.text.lines() {
            let cells = self.line_cells(line);
            if cells.len() >= self.min_cols {
                current_rows.push(cells);
            } else {
                flush_current(&mut current_rows, &mut tables);
            }
        }

        flush_current(&mut current_rows, &mut tables);
        tables
    }

    fn line_cells(&self, line: &str) -> Vec<String> {
        let cells = split_line_into_cells(line);
        if cells.len() >= self.min_cols {
            return cells;
        }

        let soft_cells = soft_split_line_into_cells(line);
        let has_numeric = soft_cells
            .iter()
            .any(|cell| cell.chars().any(|ch| ch.is_ascii_digit()));
        let looks_like_sentence = ['.', '!', '?', ':']
            .iter()
            .any(|punctuation| line.trim_end().ends_with(*punctuation));
        if soft_cells.len() >= self.min_cols
            && !looks_like_sentence
            && (has_numeric || soft_cells.len() <= 6)
        {
            soft_cells
        } else {
            cells
        }
    }

    pub(crate) fn extract(&self, pages: &[PageText], matcher: &dyn HeaderMatcher) -> MergedRows {
        let mut merger = TableMerger::new(matcher);
        let mut pages_processed = 0;

        for page in pages {
            let before = merger.accepted_tables();
            for table in self.page_tables(page) {
                merger.offer(table.rows);
            }
            let accepted = merger.accepted_tables() - before;

            debug!(
                page = page.page_number,
                accepted, "text-layout tables merged"
            );
            if accepted > 0 {
                pages_processed += 1;
            }
        }

        MergedRows {
            rows: merger.into_rows(),
            pages_processed,
            method: ExtractionMethod::TextLayout,
        }
    }
}

impl Default for TextLayoutExtractor {
    fn default() -> Self {
        Self::new(2)
    }
}
