use std::str::FromStr;

use crate::model::RawCell;

/// Number of leading columns compared by the default header rule.
pub const DEFAULT_HEADER_COLUMNS: usize = 3;

/// Decides whether a row repeats the document's header signature.
pub trait HeaderMatcher {
    fn is_repeated_header(&self, candidate: &[RawCell], signature: &[RawCell]) -> bool;
}

impl<F> HeaderMatcher for F
where
    F: Fn(&[RawCell], &[RawCell]) -> bool,
{
    fn is_repeated_header(&self, candidate: &[RawCell], signature: &[RawCell]) -> bool {
        self(candidate, signature)
    }
}

/// Built-in header rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMatch {
    /// Any one of the first `n` positions equal, ignoring case and
    /// surrounding whitespace.
    ///
    /// A single coincidental match (two rows that both start with a blank
    /// cell) is enough to count as a header.
    LeadingColumns(usize),
    /// Same length and every position equal, ignoring case and surrounding
    /// whitespace.
    WholeRow,
}

impl Default for HeaderMatch {
    fn default() -> Self {
        Self::LeadingColumns(DEFAULT_HEADER_COLUMNS)
    }
}

impl HeaderMatcher for HeaderMatch {
    fn is_repeated_header(&self, candidate: &[RawCell], signature: &[RawCell]) -> bool {
        if candidate.is_empty() || signature.is_empty() {
            return false;
        }

        match *self {
            Self::LeadingColumns(columns) => candidate
                .iter()
                .zip(signature)
                .take(columns)
                .any(|(left, right)| cells_equal(left, right)),
            Self::WholeRow => {
                candidate.len() == signature.len()
                    && candidate
                        .iter()
                        .zip(signature)
                        .all(|(left, right)| cells_equal(left, right))
            }
        }
    }
}

impl FromStr for HeaderMatch {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "leading" => Ok(Self::default()),
            "whole-row" | "whole_row" => Ok(Self::WholeRow),
            other => Err(format!(
                "unknown header match rule '{other}', expected leading or whole-row"
            )),
        }
    }
}

fn cells_equal(left: &RawCell, right: &RawCell) -> bool {
    let left = left.as_deref().unwrap_or_default().trim();
    let right = right.as_deref().unwrap_or_default().trim();
    left.to_lowercase() == right.to_lowercase()
}
