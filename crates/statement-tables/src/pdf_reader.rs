use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::UTF_16BE;
use lopdf::Object;
use lopdf::content::Content;
use tracing::debug;

use crate::error::ExtractError;
use crate::layout::{PageLayout, layout_from_operations};
use crate::model::PageText;
use crate::options::PageSelection;
use crate::table_parse::{soft_split_line_into_cells, split_line_into_cells};

/// Where the extractors read pages from.
pub trait PageSource {
    /// Text of every selected page, in page order.
    fn page_texts(&self) -> Vec<PageText>;

    /// Positioned text and rules of every selected page, in page order.
    fn page_layouts(&self) -> Result<Vec<PageLayout>, ExtractError>;
}

/// A loaded PDF. Owns the uploaded bytes for the length of one extraction.
pub struct Document {
    bytes: Vec<u8>,
    pdf: lopdf::Document,
    pages: Vec<(u32, lopdf::ObjectId)>,
}

impl Document {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ExtractError> {
        let pdf = lopdf::Document::load_mem(&bytes)?;
        let pages = pdf.get_pages().into_iter().collect();
        Ok(Self { bytes, pdf, pages })
    }

    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Restricts the document to the selected pages.
    pub fn select_pages(mut self, selection: Option<&PageSelection>) -> Result<Self, ExtractError> {
        if let Some(selection) = selection {
            self.pages.retain(|(page_number, _)| selection.contains(*page_number));
        }
        if self.pages.is_empty() {
            return Err(ExtractError::NoPagesSelected);
        }
        Ok(self)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_encodings(&self, page_id: lopdf::ObjectId) -> BTreeMap<Vec<u8>, &str> {
        self.pdf
            .get_page_fonts(page_id)
            .into_iter()
            .map(|(name, font)| (name, font.get_font_encoding()))
            .collect()
    }

    fn content_text(&self, page_id: lopdf::ObjectId) -> Option<String> {
        fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
            for operand in operands {
                match operand {
                    Object::String(bytes, _) => {
                        text.push_str(&decode_pdf_bytes(encoding, bytes));
                    }
                    Object::Array(items) => {
                        collect_text(text, encoding, items);
                        text.push(' ');
                    }
                    Object::Integer(value) if *value < -100 => text.push(' '),
                    _ => {}
                }
            }
        }

        let raw_content = self.pdf.get_page_content(page_id).ok()?;
        let content = Content::decode(&raw_content).ok()?;
        let encodings = self.page_encodings(page_id);

        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_encoding = None;
        for operation in content.operations {
            match operation.operator.as_str() {
                "Tf" => {
                    current_encoding = operation
                        .operands
                        .first()
                        .and_then(|operand| operand.as_name().ok())
                        .and_then(|font_name| encodings.get(font_name).copied());
                }
                "Tj" | "TJ" | "'" | "\"" => {
                    collect_text(&mut current, current_encoding, &operation.operands);
                }
                "T*" | "Td" | "TD" | "Tm" | "ET" => {
                    if !current.trim().is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
                _ => {}
            }
        }

        if !current.trim().is_empty() {
            lines.push(current);
        }

        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    fn page_layout(&self, page_number: u32, page_id: lopdf::ObjectId) -> Result<PageLayout, ExtractError> {
        let raw_content = self
            .pdf
            .get_page_content(page_id)
            .map_err(|source| ExtractError::ContentStream {
                page: page_number,
                source,
            })?;
        if raw_content.is_empty() {
            return Ok(PageLayout {
                page_number,
                ..PageLayout::default()
            });
        }

        let content = Content::decode(&raw_content).map_err(|source| {
            ExtractError::ContentStream {
                page: page_number,
                source,
            }
        })?;
        let encodings = self.page_encodings(page_id);
        Ok(layout_from_operations(
            page_number,
            &content.operations,
            &encodings,
        ))
    }
}

impl PageSource for Document {
    /// Picks, per page, the most table-like of three readings: pdf-extract's
    /// page text, the raw content-stream strings and lopdf's own extraction.
    /// Every candidate covers exactly one page.
    fn page_texts(&self) -> Vec<PageText> {
        let extracted_pages = match pdf_extract::extract_text_from_mem_by_pages(&self.bytes) {
            Ok(pages) => pages,
            Err(error) => {
                debug!(%error, "pdf-extract could not read document text");
                Vec::new()
            }
        };

        let mut out = Vec::with_capacity(self.pages.len());
        for (page_number, page_id) in &self.pages {
            let index = usize::try_from(page_number.saturating_sub(1)).unwrap_or(usize::MAX);

            let mut candidates = Vec::new();
            if let Some(text) = extracted_pages
                .get(index)
                .filter(|text| !text.trim().is_empty())
            {
                candidates.push(text.clone());
            }
            if let Some(text) = self.content_text(*page_id) {
                candidates.push(text);
            }
            if let Some(text) = self
                .pdf
                .extract_text(&[*page_number])
                .ok()
                .filter(|text| !text.trim().is_empty())
            {
                candidates.push(text);
            }

            out.push(PageText {
                page_number: *page_number,
                text: choose_best_text(&candidates),
            });
        }

        out
    }

    fn page_layouts(&self) -> Result<Vec<PageLayout>, ExtractError> {
        self.pages
            .iter()
            .map(|(page_number, page_id)| self.page_layout(*page_number, *page_id))
            .collect()
    }
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    if total == 0 {
        return false;
    }

    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

/// Decodes a PDF string operand, retrying as UTF-16 when the font encoding
/// produced garbage.
pub(crate) fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = lopdf::Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    let has_bom = bytes.starts_with(&[0xFE, 0xFF]);
    let wide_encoding = encoding.is_some_and(|name| {
        let lower = name.to_ascii_lowercase();
        ["utf16", "ucs2", "identity-h", "unicode"]
            .iter()
            .any(|hint| lower.contains(hint))
    });

    if has_bom || wide_encoding {
        let body = if has_bom { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(body);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).into_owned()
}

/// Scores how table-like a text candidate reads; higher is better.
fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut multi_cell_lines = 0_i64;
    let mut amount_like_lines = 0_i64;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        non_empty_lines += 1;

        if split_line_into_cells(line).len() >= 2 || soft_split_line_into_cells(line).len() >= 3 {
            multi_cell_lines += 1;
        }

        let has_digit = line.chars().any(|ch| ch.is_ascii_digit());
        if has_digit && (line.contains('/') || line.contains('.')) {
            amount_like_lines += 1;
        }
    }

    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };
    multi_cell_lines * 50 + amount_like_lines * 15 + non_empty_lines - broken_penalty
}

fn choose_best_text(candidates: &[String]) -> String {
    candidates
        .iter()
        .max_by_key(|text| extraction_quality_score(text))
        .cloned()
        .unwrap_or_default()
}
