use crate::clean::has_content;
use crate::header::HeaderMatcher;
use crate::model::RawRow;

/// Tables with fewer rows than this are not transaction tables.
pub const MIN_TABLE_ROWS: usize = 2;

/// Folds page tables into one ordered row sequence, dropping repeated headers.
///
/// The first row of the first accepted table becomes the header signature and
/// stays fixed for the lifetime of the merger.
pub struct TableMerger<'m> {
    matcher: &'m dyn HeaderMatcher,
    rows: Vec<RawRow>,
    accepted_tables: usize,
}

impl<'m> TableMerger<'m> {
    pub fn new(matcher: &'m dyn HeaderMatcher) -> Self {
        Self {
            matcher,
            rows: Vec::new(),
            accepted_tables: 0,
        }
    }

    /// Filters out rows without content and merges what remains.
    ///
    /// Returns `false` when the table had fewer than [`MIN_TABLE_ROWS`]
    /// qualifying rows and was skipped.
    pub fn offer(&mut self, rows: Vec<RawRow>) -> bool {
        let Some(rows) = qualify_rows(rows) else {
            return false;
        };
        self.push_qualified(rows);
        true
    }

    fn push_qualified(&mut self, rows: Vec<RawRow>) {
        self.accepted_tables += 1;

        let Some(signature) = self.rows.first() else {
            self.rows.extend(rows);
            return;
        };

        let repeats_header = rows
            .first()
            .is_some_and(|first| self.matcher.is_repeated_header(first, signature));
        let skip = usize::from(repeats_header);
        self.rows.extend(rows.into_iter().skip(skip));
    }

    #[must_use]
    pub fn accepted_tables(&self) -> usize {
        self.accepted_tables
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<RawRow> {
        self.rows
    }
}

/// Keeps rows with content; `None` when too few remain to form a table.
pub(crate) fn qualify_rows(rows: Vec<RawRow>) -> Option<Vec<RawRow>> {
    let rows = rows
        .into_iter()
        .filter(|row| has_content(row))
        .collect::<Vec<_>>();
    (rows.len() >= MIN_TABLE_ROWS).then_some(rows)
}

#[cfg(test)]
mod tests {
    use super::{TableMerger, qualify_rows};
    use crate::header::{HeaderMatch, HeaderMatcher};
    use crate::model::RawRow;

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().map(|cell| Some((*cell).to_string())).collect()
    }

    fn header() -> RawRow {
        row(&["Date", "Description", "Amount"])
    }

    #[test]
    fn first_table_is_kept_whole_and_sets_signature() {
        let matcher = HeaderMatch::default();
        let mut merger = TableMerger::new(&matcher);
        assert!(merger.offer(vec![header(), row(&["01/04", "ATM", "20.00"])]));
        assert_eq!(merger.row_count(), 2);
        assert_eq!(merger.into_rows().first(), Some(&header()));
    }

    #[test]
    fn drops_repeated_header_on_later_tables() {
        let matcher = HeaderMatch::default();
        let mut merger = TableMerger::new(&matcher);
        merger.offer(vec![header(), row(&["01/04", "ATM", "20.00"])]);
        merger.offer(vec![header(), row(&["02/04", "Rent", "900.00"])]);

        assert_eq!(
            merger.into_rows(),
            vec![
                header(),
                row(&["01/04", "ATM", "20.00"]),
                row(&["02/04", "Rent", "900.00"]),
            ]
        );
    }

    #[test]
    fn keeps_first_row_when_it_is_not_a_header() {
        let matcher = HeaderMatch::default();
        let mut merger = TableMerger::new(&matcher);
        merger.offer(vec![header(), row(&["01/04", "ATM", "20.00"])]);
        merger.offer(vec![
            row(&["03/04", "Salary", "2500.00"]),
            row(&["04/04", "Coffee", "3.50"]),
        ]);
        assert_eq!(merger.row_count(), 4);
    }

    #[test]
    fn skips_tables_with_fewer_than_two_content_rows() {
        let matcher = HeaderMatch::default();
        let mut merger = TableMerger::new(&matcher);
        assert!(!merger.offer(vec![header(), vec![None, Some("  ".to_string())]]));
        assert_eq!(merger.accepted_tables(), 0);
        assert!(merger.into_rows().is_empty());
    }

    #[test]
    fn signature_never_changes_after_first_table() {
        let matcher = HeaderMatch::WholeRow;
        let mut merger = TableMerger::new(&matcher);
        merger.offer(vec![header(), row(&["01/04", "ATM", "20.00"])]);
        merger.offer(vec![row(&["Txn", "Memo", "Value"]), row(&["x", "y", "z"])]);
        merger.offer(vec![row(&["Txn", "Memo", "Value"]), row(&["p", "q", "r"])]);

        assert_eq!(merger.row_count(), 6);
        assert_eq!(merger.into_rows().first(), Some(&header()));
    }

    #[test]
    fn merged_length_matches_row_count_invariant() {
        let matcher = HeaderMatch::default();
        let tables = vec![
            vec![header(), row(&["01/04", "a", "1"]), row(&["02/04", "b", "2"])],
            vec![header(), row(&["03/04", "c", "3"])],
            vec![row(&["04/04", "d", "4"]), row(&["05/04", "e", "5"])],
            vec![row(&["DATE", "desc", "amount"]), row(&["06/04", "f", "6"])],
        ];

        let signature = tables[0][0].clone();
        let expected = tables[0].len()
            + tables[1..]
                .iter()
                .map(|table| {
                    table.len() - usize::from(matcher.is_repeated_header(&table[0], &signature))
                })
                .sum::<usize>();

        let mut merger = TableMerger::new(&matcher);
        for table in tables {
            merger.offer(table);
        }
        assert_eq!(merger.row_count(), expected);
        assert_eq!(expected, 7);
    }

    #[test]
    fn custom_matcher_controls_deduplication() {
        let keep_everything = |_: &[Option<String>], _: &[Option<String>]| false;
        let mut merger = TableMerger::new(&keep_everything);
        merger.offer(vec![header(), row(&["01/04", "a", "1"])]);
        merger.offer(vec![header(), row(&["02/04", "b", "2"])]);
        assert_eq!(merger.row_count(), 4);
    }

    #[test]
    fn qualification_filters_before_counting() {
        let rows = vec![header(), vec![None, None], row(&["01/04", "a", "1"])];
        assert_eq!(qualify_rows(rows).map(|rows| rows.len()), Some(2));
        assert_eq!(qualify_rows(vec![header(), vec![None]]), None);
    }
}
