use tracing::{debug, warn};

use crate::clean::clean_rows;
use crate::error::ExtractError;
use crate::geometry::{AlignmentDetector, GeometryExtractor, GridLineDetector, TableDetector};
use crate::header::HeaderMatcher;
use crate::model::{ExtractionResult, MergedRows};
use crate::options::ExtractOptions;
use crate::pdf_reader::PageSource;
use crate::text_layout::TextLayoutExtractor;

/// Below this many merged rows the text-layout result is discarded and the
/// geometry fallback runs instead.
pub const MIN_PRIMARY_ROWS: usize = 2;

/// Runs the text-layout extractor and, when it recovers too little, the
/// geometry extractor. Whatever ran last is the answer, even when empty.
pub struct StrategySelector {
    primary: TextLayoutExtractor,
    fallback: GeometryExtractor,
    matcher: Box<dyn HeaderMatcher>,
}

impl StrategySelector {
    #[must_use]
    pub fn new(options: &ExtractOptions) -> Self {
        Self {
            primary: TextLayoutExtractor::new(options.min_cols),
            fallback: GeometryExtractor::new(
                Box::new(GridLineDetector::default()),
                Box::new(AlignmentDetector {
                    min_cols: options.min_cols,
                    ..AlignmentDetector::default()
                }),
            ),
            matcher: Box::new(options.header_match),
        }
    }

    /// Replaces the grid-line and whitespace-alignment detectors.
    #[must_use]
    pub fn with_detectors(
        mut self,
        grid: Box<dyn TableDetector>,
        alignment: Box<dyn TableDetector>,
    ) -> Self {
        self.fallback = GeometryExtractor::new(grid, alignment);
        self
    }

    /// Replaces the rule deciding whether a table's first row repeats the
    /// document header.
    #[must_use]
    pub fn with_header_matcher(mut self, matcher: impl HeaderMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn extract<S>(&self, source: &S) -> Result<ExtractionResult, ExtractError>
    where
        S: PageSource + ?Sized,
    {
        let pages = source.page_texts();
        let primary = self.primary.extract(&pages, self.matcher.as_ref());

        let merged = if primary.rows.len() >= MIN_PRIMARY_ROWS {
            debug!(rows = primary.rows.len(), "accepting text-layout result");
            primary
        } else {
            debug!(
                rows = primary.rows.len(),
                "text-layout result too small, running geometry fallback"
            );
            self.run_fallback(source)?
        };

        Ok(finish(merged))
    }

    fn run_fallback<S>(&self, source: &S) -> Result<MergedRows, ExtractError>
    where
        S: PageSource + ?Sized,
    {
        let layouts = source.page_layouts()?;
        let tables = match self.fallback.grid_tables(&layouts) {
            Ok(tables) => tables,
            Err(error) if error.is_recoverable() => {
                warn!(%error, "grid-line detection failed, falling back to whitespace alignment");
                self.fallback.alignment_tables(&layouts)?
            }
            Err(error) => return Err(error.into()),
        };

        Ok(GeometryExtractor::merge(tables, self.matcher.as_ref()))
    }
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new(&ExtractOptions::default())
    }
}

fn finish(merged: MergedRows) -> ExtractionResult {
    let total_rows = merged.rows.len();
    ExtractionResult {
        rows: clean_rows(&merged.rows),
        pages_processed: merged.pages_processed,
        method_used: merged.method,
        total_rows,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::StrategySelector;
    use crate::error::{ExtractError, GeometryError};
    use crate::geometry::TableDetector;
    use crate::layout::{PageLayout, Segment, TextFragment};
    use crate::model::{ExtractionMethod, PageTable, PageText, RawCell};
    use crate::options::ExtractOptions;
    use crate::pdf_reader::PageSource;

    struct FakeSource {
        texts: Vec<PageText>,
        layouts: Vec<PageLayout>,
        layout_calls: Cell<usize>,
    }

    impl FakeSource {
        fn new(pages: &[&str]) -> Self {
            Self {
                texts: pages
                    .iter()
                    .zip(1..)
                    .map(|(text, page_number)| PageText {
                        page_number,
                        text: (*text).to_string(),
                    })
                    .collect(),
                layouts: Vec::new(),
                layout_calls: Cell::new(0),
            }
        }

        fn with_layout(mut self, layout: PageLayout) -> Self {
            self.layouts.push(layout);
            self
        }
    }

    impl PageSource for FakeSource {
        fn page_texts(&self) -> Vec<PageText> {
            self.texts.clone()
        }

        fn page_layouts(&self) -> Result<Vec<PageLayout>, ExtractError> {
            self.layout_calls.set(self.layout_calls.get() + 1);
            Ok(self.layouts.clone())
        }
    }

    struct FixedDetector(Result<Vec<PageTable>, GeometryError>);

    impl TableDetector for FixedDetector {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn detect(&self, _pages: &[PageLayout]) -> Result<Vec<PageTable>, GeometryError> {
            self.0.clone()
        }
    }

    fn five_row_table() -> PageTable {
        let rows = [
            ["Date", "Description", "Amount"],
            ["01/04", "Rent", "900.00"],
            ["02/04", "Groceries", "45.10"],
            ["03/04", "Fuel", "60.00"],
            ["04/04", "Salary", "2500.00"],
        ]
        .iter()
        .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
        .collect();
        PageTable::from_text_rows(1, rows)
    }

    fn text(x: f32, y: f32, text: &str) -> TextFragment {
        TextFragment {
            x,
            y,
            width: text.chars().count() as f32 * 5.0,
            font_size: 10.0,
            text: text.to_string(),
        }
    }

    fn rule(x1: f32, y1: f32, x2: f32, y2: f32) -> Segment {
        Segment { x1, y1, x2, y2 }
    }

    /// Five statement lines in three columns, positioned but not ruled.
    fn aligned_statement() -> PageLayout {
        let lines = [
            ["Date", "Description", "Amount"],
            ["01/04", "Rent", "900.00"],
            ["02/04", "Groceries", "45.10"],
            ["03/04", "Fuel", "60.00"],
            ["04/04", "Salary", "2500.00"],
        ];
        let mut fragments = Vec::new();
        for (index, line) in lines.iter().enumerate() {
            let y = 700.0 - index as f32 * 14.0;
            fragments.push(text(50.0, y, line[0]));
            fragments.push(text(150.0, y, line[1]));
            fragments.push(text(320.0, y, line[2]));
        }
        PageLayout {
            page_number: 1,
            fragments,
            segments: Vec::new(),
        }
    }

    const PROSE: &str = "Thank you for banking with us.\nPlease review your statement carefully.";

    #[test]
    fn keeps_primary_result_without_computing_layouts() {
        let source = FakeSource::new(&["Date  Desc  Amount\n01/04  Rent  900.00"]);
        let selector = StrategySelector::default().with_detectors(
            Box::new(FixedDetector(Err(GeometryError::NoRulingLines))),
            Box::new(FixedDetector(Ok(vec![five_row_table()]))),
        );

        let result = selector.extract(&source).expect("extraction should succeed");
        assert_eq!(result.method_used, ExtractionMethod::TextLayout);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.pages_processed, 1);
        assert_eq!(source.layout_calls.get(), 0);
    }

    #[test]
    fn falls_through_to_alignment_when_grid_mode_fails() {
        let source = FakeSource::new(&[PROSE]);
        let selector = StrategySelector::default().with_detectors(
            Box::new(FixedDetector(Err(GeometryError::NoRulingLines))),
            Box::new(FixedDetector(Ok(vec![five_row_table()]))),
        );

        let result = selector.extract(&source).expect("extraction should succeed");
        assert_eq!(result.method_used, ExtractionMethod::GeometryBased);
        assert_eq!(result.rows.len(), 5);
        assert_eq!(result.total_rows, 5);
        assert_eq!(result.pages_processed, 1);
        assert_eq!(result.rows[0], vec!["Date", "Description", "Amount"]);
        assert_eq!(source.layout_calls.get(), 1);
    }

    #[test]
    fn empty_fallback_is_a_well_formed_result() {
        let source = FakeSource::new(&[PROSE]);
        let selector = StrategySelector::default().with_detectors(
            Box::new(FixedDetector(Err(GeometryError::NoRulingLines))),
            Box::new(FixedDetector(Ok(Vec::new()))),
        );

        let result = selector.extract(&source).expect("extraction should succeed");
        assert!(result.rows.is_empty());
        assert_eq!(result.pages_processed, 0);
        assert_eq!(result.method_used, ExtractionMethod::GeometryBased);
        assert_eq!(result.total_rows, 0);
    }

    #[test]
    fn grid_result_is_used_without_trying_alignment() {
        let source = FakeSource::new(&[PROSE]);
        let selector = StrategySelector::default().with_detectors(
            Box::new(FixedDetector(Ok(Vec::new()))),
            Box::new(FixedDetector(Ok(vec![five_row_table()]))),
        );

        let result = selector.extract(&source).expect("extraction should succeed");
        assert!(result.rows.is_empty());
        assert_eq!(result.method_used, ExtractionMethod::GeometryBased);
    }

    #[test]
    fn unrecoverable_geometry_errors_propagate() {
        let source = FakeSource::new(&[PROSE]);
        let selector = StrategySelector::default().with_detectors(
            Box::new(FixedDetector(Err(GeometryError::NoRulingLines))),
            Box::new(FixedDetector(Err(GeometryError::AlignmentFailed(
                "bad positions".to_string(),
            )))),
        );

        let error = selector.extract(&source).expect_err("alignment failure is fatal");
        assert!(matches!(
            error,
            ExtractError::Geometry(GeometryError::AlignmentFailed(_))
        ));
    }

    #[test]
    fn default_detectors_read_aligned_columns() {
        let source = FakeSource::new(&[PROSE]).with_layout(aligned_statement());

        let result = StrategySelector::default()
            .extract(&source)
            .expect("extraction should succeed");
        assert_eq!(result.method_used, ExtractionMethod::GeometryBased);
        assert_eq!(result.rows.len(), 5);
        assert_eq!(result.pages_processed, 1);
        assert_eq!(result.rows[3], vec!["03/04", "Fuel", "60.00"]);
    }

    #[test]
    fn stray_rule_does_not_block_alignment() {
        let mut layout = aligned_statement();
        layout.segments.push(rule(50.0, 760.0, 500.0, 760.0));
        let source = FakeSource::new(&[PROSE]).with_layout(layout);

        let result = StrategySelector::default()
            .extract(&source)
            .expect("extraction should succeed");
        assert_eq!(result.method_used, ExtractionMethod::GeometryBased);
        assert_eq!(result.rows.len(), 5);
    }

    #[test]
    fn default_detectors_read_ruled_grids() {
        let mut segments = [720.0, 700.0, 680.0, 660.0]
            .into_iter()
            .map(|y| rule(50.0, y, 300.0, y))
            .collect::<Vec<_>>();
        segments.extend([50.0, 150.0, 300.0].into_iter().map(|x| rule(x, 660.0, x, 720.0)));
        let layout = PageLayout {
            page_number: 1,
            fragments: vec![
                text(55.0, 705.0, "Date"),
                text(155.0, 705.0, "Amount"),
                text(55.0, 685.0, "01/04"),
                text(155.0, 685.0, "900.00"),
                text(55.0, 665.0, "02/04"),
                text(155.0, 665.0, "45.10"),
            ],
            segments,
        };
        let source = FakeSource::new(&[PROSE]).with_layout(layout);

        let result = StrategySelector::default()
            .extract(&source)
            .expect("extraction should succeed");
        assert_eq!(result.method_used, ExtractionMethod::GeometryBased);
        assert_eq!(
            result.rows,
            vec![
                vec!["Date", "Amount"],
                vec!["01/04", "900.00"],
                vec!["02/04", "45.10"],
            ]
        );
    }

    #[test]
    fn minimum_columns_apply_to_the_fallback() {
        let source = FakeSource::new(&[PROSE]).with_layout(aligned_statement());
        let options = ExtractOptions {
            min_cols: 4,
            ..ExtractOptions::default()
        };

        let result = StrategySelector::new(&options)
            .extract(&source)
            .expect("extraction should succeed");
        assert!(result.rows.is_empty());
        assert_eq!(result.method_used, ExtractionMethod::GeometryBased);
    }

    #[test]
    fn total_rows_counts_rows_before_cleaning() {
        let source = FakeSource::new(&[PROSE]);
        let table = PageTable::new(
            1,
            vec![
                vec![Some(" Date ".to_string()), None],
                vec![Some("01/04".to_string()), Some("5.00".to_string())],
            ],
        );
        let selector = StrategySelector::default().with_detectors(
            Box::new(FixedDetector(Ok(vec![table]))),
            Box::new(FixedDetector(Ok(Vec::new()))),
        );

        let result = selector.extract(&source).expect("extraction should succeed");
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.rows[0], vec!["Date", ""]);
    }

    #[test]
    fn injected_header_matcher_decides_deduplication() {
        let source = FakeSource::new(&[
            "Date  Desc  Amount\n01/04  Rent  900.00",
            "Date  Desc  Amount\n02/04  Fuel  60.00",
        ]);
        let never = |_: &[RawCell], _: &[RawCell]| false;
        let selector = StrategySelector::default().with_header_matcher(never);

        let result = selector.extract(&source).expect("extraction should succeed");
        assert_eq!(result.rows.len(), 4);
        assert_eq!(result.pages_processed, 2);
    }
}
