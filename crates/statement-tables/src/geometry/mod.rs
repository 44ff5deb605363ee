//! Table recovery from page geometry: ruled grids first, then columns
//! inferred from how text lines up.

mod alignment;
mod grid;

use tracing::debug;

use crate::error::GeometryError;
use crate::header::HeaderMatcher;
use crate::layout::PageLayout;
use crate::merge::TableMerger;
use crate::model::{ExtractionMethod, MergedRows, PageTable};

pub use alignment::AlignmentDetector;
pub use grid::GridLineDetector;

/// One way of finding tables in page layouts.
pub trait TableDetector {
    fn name(&self) -> &'static str;

    fn detect(&self, pages: &[PageLayout]) -> Result<Vec<PageTable>, GeometryError>;
}

/// The two geometry sub-strategies, tried grid-line first.
pub struct GeometryExtractor {
    grid: Box<dyn TableDetector>,
    alignment: Box<dyn TableDetector>,
}

impl GeometryExtractor {
    #[must_use]
    pub fn new(grid: Box<dyn TableDetector>, alignment: Box<dyn TableDetector>) -> Self {
        Self { grid, alignment }
    }

    pub fn grid_tables(&self, pages: &[PageLayout]) -> Result<Vec<PageTable>, GeometryError> {
        let tables = self.grid.detect(pages)?;
        debug!(detector = self.grid.name(), tables = tables.len(), "grid-line tables found");
        Ok(tables)
    }

    pub fn alignment_tables(&self, pages: &[PageLayout]) -> Result<Vec<PageTable>, GeometryError> {
        let tables = self.alignment.detect(pages)?;
        debug!(
            detector = self.alignment.name(),
            tables = tables.len(),
            "whitespace-alignment tables found"
        );
        Ok(tables)
    }

    /// Merges the tables of whichever sub-strategy ran.
    ///
    /// `pages_processed` is the number of tables found, not distinct pages.
    pub(crate) fn merge(tables: Vec<PageTable>, matcher: &dyn HeaderMatcher) -> MergedRows {
        let pages_processed = tables.len();
        let mut merger = TableMerger::new(matcher);
        for table in tables {
            merger.offer(table.rows);
        }
        debug!(
            found = pages_processed,
            accepted = merger.accepted_tables(),
            "geometry tables merged"
        );

        MergedRows {
            rows: merger.into_rows(),
            pages_processed,
            method: ExtractionMethod::GeometryBased,
        }
    }
}

/// Collapses nearby positions into their mean, ascending.
pub(crate) fn cluster_positions(mut values: Vec<f32>, tolerance: f32) -> Vec<f32> {
    values.sort_by(f32::total_cmp);

    let mut clusters: Vec<(f32, usize)> = Vec::new();
    for value in values {
        if let Some((sum, count)) = clusters.last_mut() {
            if value - *sum / *count as f32 <= tolerance {
                *sum += value;
                *count += 1;
                continue;
            }
        }
        clusters.push((value, 1));
    }

    clusters
        .into_iter()
        .map(|(sum, count)| sum / count as f32)
        .collect()
}
