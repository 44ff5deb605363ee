use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::ExtractError;
use crate::header::HeaderMatch;

/// 1-based set of pages to read, parsed from strings like `1-3,5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }
}

fn parse_page_number(raw: &str, what: &str) -> Result<u32, String> {
    let page = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid {what}: '{}'", raw.trim()))?;
    if page == 0 {
        return Err("pages are 1-based".to_string());
    }
    Ok(page)
}

impl FromStr for PageSelection {
    type Err = ExtractError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_pages(value)
            .map(|pages| Self { pages })
            .map_err(ExtractError::InvalidPageSelection)
    }
}

fn parse_pages(value: &str) -> Result<BTreeSet<u32>, String> {
    let mut pages = BTreeSet::new();
    for token in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_page_number(start, "page range start")?;
                let end = parse_page_number(end, "page range end")?;
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            }
            None => {
                pages.insert(parse_page_number(token, "page number")?);
            }
        }
    }

    if pages.is_empty() {
        return Err("page selection cannot be empty".to_string());
    }

    Ok(pages)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Pages to read; `None` reads the whole document.
    pub pages: Option<PageSelection>,
    /// Minimum cells a text line needs to count as a table row.
    pub min_cols: usize,
    pub header_match: HeaderMatch,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pages: None,
            min_cols: 2,
            header_match: HeaderMatch::default(),
        }
    }
}

impl ExtractOptions {
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.min_cols < 2 {
            return Err(ExtractError::InvalidOption(
                "min_cols must be at least 2".to_string(),
            ));
        }
        if self.header_match == HeaderMatch::LeadingColumns(0) {
            return Err(ExtractError::InvalidOption(
                "header match needs at least one leading column".to_string(),
            ));
        }
        Ok(())
    }
}
