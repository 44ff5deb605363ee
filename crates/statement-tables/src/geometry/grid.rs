use crate::error::GeometryError;
use crate::layout::{PageLayout, Segment, TextFragment, join_fragments};
use crate::model::{PageTable, RawRow};

use super::{TableDetector, cluster_positions};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ruling {
    Horizontal { y: f32, x0: f32, x1: f32 },
    Vertical { x: f32, y0: f32, y1: f32 },
}

impl Ruling {
    fn from_segment(segment: &Segment, tolerance: f32) -> Option<Self> {
        if segment.is_horizontal(tolerance) {
            Some(Self::Horizontal {
                y: (segment.y1 + segment.y2) / 2.0,
                x0: segment.x1.min(segment.x2),
                x1: segment.x1.max(segment.x2),
            })
        } else if segment.is_vertical(tolerance) {
            Some(Self::Vertical {
                x: (segment.x1 + segment.x2) / 2.0,
                y0: segment.y1.min(segment.y2),
                y1: segment.y1.max(segment.y2),
            })
        } else {
            None
        }
    }

    fn crosses(&self, other: &Self, tolerance: f32) -> bool {
        match (*self, *other) {
            (Self::Horizontal { y, x0, x1 }, Self::Vertical { x, y0, y1 })
            | (Self::Vertical { x, y0, y1 }, Self::Horizontal { y, x0, x1 }) => {
                x >= x0 - tolerance
                    && x <= x1 + tolerance
                    && y >= y0 - tolerance
                    && y <= y1 + tolerance
            }
            _ => false,
        }
    }
}

/// Union-find over ruling indices.
struct Components {
    parent: Vec<usize>,
}

impl Components {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parent[index] != index {
            self.parent[index] = self.parent[self.parent[index]];
            index = self.parent[index];
        }
        index
    }

    fn union(&mut self, left: usize, right: usize) {
        let left = self.find(left);
        let right = self.find(right);
        if left != right {
            self.parent[right] = left;
        }
    }
}

/// Finds tables drawn with ruled lines: every connected set of crossing
/// horizontal and vertical rules forms one grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLineDetector {
    /// Distance within which rules snap together and count as crossing.
    pub tolerance: f32,
    /// Shorter segments are ignored.
    pub min_rule_length: f32,
    /// Grids with more cells than this are rejected.
    pub max_cells: usize,
    /// Pages with more rules than this are not searched for grids.
    pub max_rulings: usize,
}

impl Default for GridLineDetector {
    fn default() -> Self {
        Self {
            tolerance: 2.0,
            min_rule_length: 5.0,
            max_cells: 20_000,
            max_rulings: 2_000,
        }
    }
}

impl GridLineDetector {
    fn rulings(&self, page: &PageLayout) -> Vec<Ruling> {
        page.segments
            .iter()
            .filter(|segment| segment.length() >= self.min_rule_length)
            .filter_map(|segment| Ruling::from_segment(segment, self.tolerance))
            .collect()
    }

    fn page_tables(&self, page: &PageLayout) -> Result<Vec<PageTable>, GeometryError> {
        let rulings = self.rulings(page);
        if rulings.len() > self.max_rulings {
            return Err(GeometryError::TooManyRulings {
                page: page.page_number,
                rulings: rulings.len(),
            });
        }

        // Only a horizontal and a vertical rule can cross.
        let (horizontal, vertical): (Vec<usize>, Vec<usize>) = (0..rulings.len())
            .partition(|index| matches!(rulings[*index], Ruling::Horizontal { .. }));
        let mut components = Components::new(rulings.len());
        for &left in &horizontal {
            for &right in &vertical {
                if rulings[left].crosses(&rulings[right], self.tolerance) {
                    components.union(left, right);
                }
            }
        }

        let mut groups: Vec<(usize, Vec<Ruling>)> = Vec::new();
        for (index, ruling) in rulings.iter().enumerate() {
            let root = components.find(index);
            match groups.iter_mut().find(|(group_root, _)| *group_root == root) {
                Some((_, members)) => members.push(*ruling),
                None => groups.push((root, vec![*ruling])),
            }
        }

        let mut tables = Vec::new();
        for (_, members) in groups {
            if let Some(table) = self.grid_table(page, &members)? {
                tables.push(table);
            }
        }

        // Top of the page first.
        tables.sort_by(|left, right| right.0.total_cmp(&left.0));
        Ok(tables.into_iter().map(|(_, table)| table).collect())
    }

    /// Builds the table of one connected grid, keyed by its top edge.
    fn grid_table(
        &self,
        page: &PageLayout,
        members: &[Ruling],
    ) -> Result<Option<(f32, PageTable)>, GeometryError> {
        let mut ys = Vec::new();
        let mut xs = Vec::new();
        for ruling in members {
            match *ruling {
                Ruling::Horizontal { y, .. } => ys.push(y),
                Ruling::Vertical { x, .. } => xs.push(x),
            }
        }

        let mut ys = cluster_positions(ys, self.tolerance);
        ys.reverse();
        let xs = cluster_positions(xs, self.tolerance);
        if ys.len() < 2 || xs.len() < 2 {
            return Ok(None);
        }

        let cells = (ys.len() - 1) * (xs.len() - 1);
        if cells > self.max_cells {
            return Err(GeometryError::GridTooLarge {
                page: page.page_number,
                cells,
            });
        }

        let mut grid: Vec<Vec<Vec<&TextFragment>>> = vec![vec![Vec::new(); xs.len() - 1]; ys.len() - 1];
        let mut fragments = page.fragments.iter().collect::<Vec<_>>();
        fragments.sort_by(|left, right| right.y.total_cmp(&left.y).then(left.x.total_cmp(&right.x)));

        for fragment in fragments {
            let anchor_x = fragment.x + fragment.char_width() / 2.0;
            let anchor_y = fragment.y + fragment.font_size * 0.3;
            let column = xs.windows(2).position(|edge| anchor_x >= edge[0] && anchor_x < edge[1]);
            let row = ys.windows(2).position(|edge| anchor_y <= edge[0] && anchor_y > edge[1]);
            if let (Some(row), Some(column)) = (row, column) {
                grid[row][column].push(fragment);
            }
        }

        let rows = grid
            .into_iter()
            .map(|cells| {
                cells
                    .into_iter()
                    .map(|fragments| {
                        let text = join_fragments(fragments);
                        (!text.is_empty()).then_some(text)
                    })
                    .collect::<RawRow>()
            })
            .collect();

        Ok(Some((ys[0], PageTable::new(page.page_number, rows))))
    }
}

impl TableDetector for GridLineDetector {
    fn name(&self) -> &'static str {
        "grid-line"
    }

    /// Fails with [`GeometryError::NoRulingLines`] unless at least one page
    /// holds a grid of two or more rows and columns of edges; stray rules
    /// such as underlines do not count.
    fn detect(&self, pages: &[PageLayout]) -> Result<Vec<PageTable>, GeometryError> {
        let mut tables = Vec::new();
        for page in pages {
            tables.extend(self.page_tables(page)?);
        }
        if tables.is_empty() {
            return Err(GeometryError::NoRulingLines);
        }
        Ok(tables)
    }
}
