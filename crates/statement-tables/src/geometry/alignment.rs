use crate::error::GeometryError;
use crate::layout::{PageLayout, TextFragment, join_fragments};
use crate::model::{PageTable, RawRow};
use crate::table_parse::split_cells_with_offsets;

use super::TableDetector;

/// Text sitting between two horizontal gaps on one line.
#[derive(Debug, Clone)]
struct Chunk {
    x0: f32,
    x1: f32,
    text: String,
}

/// Finds tables without ruled lines by lining up the gaps between words.
///
/// Consecutive text lines that split into at least `min_cols` chunks form a
/// table region; columns are the merged horizontal extents of the chunks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentDetector {
    /// Minimum chunks a line needs to belong to a table.
    pub min_cols: usize,
    /// Gap, in character widths, that separates two chunks on a line.
    pub column_gap: f32,
    /// Baselines closer than this share a line, as a share of the font size.
    pub line_tolerance: f32,
}

impl Default for AlignmentDetector {
    fn default() -> Self {
        Self {
            min_cols: 2,
            column_gap: 1.5,
            line_tolerance: 0.5,
        }
    }
}

impl AlignmentDetector {
    /// Splits fragments that carry runs of spaces into their own pieces, so
    /// a whole table line drawn with a single operator still yields columns.
    fn pieces(page: &PageLayout) -> Vec<TextFragment> {
        let mut pieces = Vec::new();
        for fragment in &page.fragments {
            let char_width = fragment.char_width();
            for (offset, text) in split_cells_with_offsets(&fragment.text) {
                pieces.push(TextFragment {
                    x: fragment.x + offset as f32 * char_width,
                    y: fragment.y,
                    width: text.chars().count() as f32 * char_width,
                    font_size: fragment.font_size,
                    text,
                });
            }
        }
        pieces
    }

    fn lines(&self, mut pieces: Vec<TextFragment>) -> Vec<Vec<TextFragment>> {
        pieces.sort_by(|left, right| right.y.total_cmp(&left.y).then(left.x.total_cmp(&right.x)));

        let mut lines: Vec<Vec<TextFragment>> = Vec::new();
        for piece in pieces {
            if let Some(line) = lines.last_mut() {
                let anchor = &line[0];
                let tolerance = (anchor.font_size * self.line_tolerance).max(1.0);
                if (anchor.y - piece.y).abs() <= tolerance {
                    line.push(piece);
                    continue;
                }
            }
            lines.push(vec![piece]);
        }

        for line in &mut lines {
            line.sort_by(|left, right| left.x.total_cmp(&right.x));
        }
        lines
    }

    fn chunks(&self, line: &[TextFragment]) -> Vec<Chunk> {
        let mut groups: Vec<Vec<&TextFragment>> = Vec::new();
        for piece in line {
            if let Some(group) = groups.last_mut() {
                if let Some(previous) = group.last() {
                    let gap = piece.x - previous.right();
                    if gap < previous.char_width() * self.column_gap {
                        group.push(piece);
                        continue;
                    }
                }
            }
            groups.push(vec![piece]);
        }

        groups
            .into_iter()
            .filter_map(|group| {
                let first = group.first()?;
                let x0 = first.x;
                let x1 = group.iter().map(|piece| piece.right()).fold(x0, f32::max);
                Some(Chunk {
                    x0,
                    x1,
                    text: join_fragments(group.iter().copied()),
                })
            })
            .collect()
    }

    fn region_table(page_number: u32, region: &[Vec<Chunk>]) -> PageTable {
        let mut extents = region
            .iter()
            .flatten()
            .map(|chunk| (chunk.x0, chunk.x1))
            .collect::<Vec<_>>();
        extents.sort_by(|left, right| left.0.total_cmp(&right.0));

        let mut columns: Vec<(f32, f32)> = Vec::new();
        for (x0, x1) in extents {
            if let Some(column) = columns.last_mut() {
                if x0 <= column.1 {
                    column.1 = column.1.max(x1);
                    continue;
                }
            }
            columns.push((x0, x1));
        }

        let rows = region
            .iter()
            .map(|line| {
                let mut row: RawRow = vec![None; columns.len()];
                for chunk in line {
                    let Some(index) = columns
                        .iter()
                        .position(|(start, end)| chunk.x0 >= *start && chunk.x0 <= *end)
                    else {
                        continue;
                    };
                    match &mut row[index] {
                        Some(existing) => {
                            existing.push(' ');
                            existing.push_str(&chunk.text);
                        }
                        slot @ None => *slot = Some(chunk.text.clone()),
                    }
                }
                row
            })
            .collect();

        PageTable::new(page_number, rows)
    }

    fn page_tables(&self, page: &PageLayout) -> Result<Vec<PageTable>, GeometryError> {
        if let Some(fragment) = page
            .fragments
            .iter()
            .find(|fragment| !(fragment.x.is_finite() && fragment.y.is_finite()))
        {
            return Err(GeometryError::AlignmentFailed(format!(
                "text '{}' on page {} has no finite position",
                fragment.text.trim(),
                page.page_number
            )));
        }

        let mut tables = Vec::new();
        let mut region: Vec<Vec<Chunk>> = Vec::new();
        for line in self.lines(Self::pieces(page)) {
            let chunks = self.chunks(&line);
            if chunks.len() >= self.min_cols {
                region.push(chunks);
                continue;
            }
            if region.len() >= 2 {
                tables.push(Self::region_table(page.page_number, &region));
            }
            region.clear();
        }
        if region.len() >= 2 {
            tables.push(Self::region_table(page.page_number, &region));
        }

        Ok(tables)
    }
}

impl TableDetector for AlignmentDetector {
    fn name(&self) -> &'static str {
        "whitespace-alignment"
    }

    fn detect(&self, pages: &[PageLayout]) -> Result<Vec<PageTable>, GeometryError> {
        let mut tables = Vec::new();
        for page in pages {
            tables.extend(self.page_tables(page)?);
        }
        Ok(tables)
    }
}
