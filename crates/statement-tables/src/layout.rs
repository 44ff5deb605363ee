use std::collections::BTreeMap;

use lopdf::Object;
use lopdf::content::Operation;

use crate::pdf_reader::decode_pdf_bytes;

/// Average glyph advance as a share of the font size; fonts are not measured.
const GLYPH_WIDTH_RATIO: f32 = 0.5;

/// Filled rectangles thinner than this are drawn rules, not boxes.
const RULE_THICKNESS: f32 = 2.0;

/// A run of text drawn at one position, in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub text: String,
}

impl TextFragment {
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Approximate width of one character of this fragment.
    #[must_use]
    pub fn char_width(&self) -> f32 {
        let chars = self.text.chars().count();
        if chars == 0 {
            self.font_size * GLYPH_WIDTH_RATIO
        } else {
            self.width / chars as f32
        }
    }
}

/// A straight painted line in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Segment {
    #[must_use]
    pub fn is_horizontal(&self, tolerance: f32) -> bool {
        (self.y1 - self.y2).abs() <= tolerance && (self.x1 - self.x2).abs() > tolerance
    }

    #[must_use]
    pub fn is_vertical(&self, tolerance: f32) -> bool {
        (self.x1 - self.x2).abs() <= tolerance && (self.y1 - self.y2).abs() > tolerance
    }

    #[must_use]
    pub fn length(&self) -> f32 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }
}

/// Positioned text and ruling lines of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub page_number: u32,
    pub fragments: Vec<TextFragment>,
    pub segments: Vec<Segment>,
}

/// Joins fragments already sorted left to right, inserting a space only where
/// the gap between them is visible.
pub(crate) fn join_fragments<'a>(fragments: impl IntoIterator<Item = &'a TextFragment>) -> String {
    let mut out = String::new();
    let mut previous: Option<&TextFragment> = None;
    for fragment in fragments {
        let text = fragment.text.trim();
        if text.is_empty() {
            continue;
        }
        if let Some(prev) = previous {
            let gap = fragment.x - prev.right();
            let same_line = (fragment.y - prev.y).abs() <= prev.font_size * 0.5;
            if !same_line || gap > prev.char_width() * 0.3 {
                out.push(' ');
            }
        }
        out.push_str(text);
        previous = Some(fragment);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f32, ty: f32) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self` applied first, then `other`.
    fn then(self, other: Self) -> Self {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Self([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    fn apply(self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    fn vertical_scale(self) -> f32 {
        self.0[2].hypot(self.0[3])
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, operand) in out.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(out)
}

/// Walks content stream operations, tracking just enough graphics and text
/// state to place text and rules on the page.
struct LayoutBuilder<'a> {
    encodings: &'a BTreeMap<Vec<u8>, &'a str>,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_size: f32,
    leading: f32,
    horizontal_scale: f32,
    encoding: Option<&'a str>,
    current_point: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
    pending_path: Vec<Segment>,
    layout: PageLayout,
}

impl<'a> LayoutBuilder<'a> {
    fn new(page_number: u32, encodings: &'a BTreeMap<Vec<u8>, &'a str>) -> Self {
        Self {
            encodings,
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_size: 12.0,
            leading: 0.0,
            horizontal_scale: 1.0,
            encoding: None,
            current_point: None,
            subpath_start: None,
            pending_path: Vec::new(),
            layout: PageLayout {
                page_number,
                ..PageLayout::default()
            },
        }
    }

    fn apply(&mut self, operation: &Operation) {
        let operands = operation.operands.as_slice();
        match operation.operator.as_str() {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => self.ctm = self.ctm_stack.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => {
                if let Some(values) = numbers::<6>(operands) {
                    self.ctm = Matrix(values).then(self.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(name) = operands.first().and_then(|operand| operand.as_name().ok()) {
                    self.encoding = self.encodings.get(name).copied();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.font_size = size;
                }
            }
            "TL" => {
                if let Some([leading]) = numbers::<1>(operands) {
                    self.leading = leading;
                }
            }
            "Tz" => {
                if let Some([scale]) = numbers::<1>(operands) {
                    self.horizontal_scale = scale / 100.0;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(values) = numbers::<6>(operands) {
                    self.text_matrix = Matrix(values);
                    self.line_matrix = self.text_matrix;
                }
            }
            "T*" => self.move_line(0.0, -self.leading),
            "Tj" => {
                if let Some(operand) = operands.first() {
                    self.show(operand);
                }
            }
            "'" => {
                self.move_line(0.0, -self.leading);
                if let Some(operand) = operands.first() {
                    self.show(operand);
                }
            }
            "\"" => {
                self.move_line(0.0, -self.leading);
                if let Some(operand) = operands.get(2) {
                    self.show(operand);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(..) => self.show(item),
                            other => {
                                if let Some(adjust) = number(other) {
                                    self.advance(-adjust / 1000.0 * self.font_size);
                                }
                            }
                        }
                    }
                }
            }
            "m" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    let point = self.ctm.apply(x, y);
                    self.current_point = Some(point);
                    self.subpath_start = Some(point);
                }
            }
            "l" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    let point = self.ctm.apply(x, y);
                    if let Some(from) = self.current_point {
                        self.push_segment(from, point);
                    }
                    self.current_point = Some(point);
                }
            }
            "h" => self.close_subpath(),
            "re" => {
                if let Some([x, y, width, height]) = numbers::<4>(operands) {
                    self.rectangle(x, y, width, height);
                }
            }
            "s" | "b" | "b*" => {
                self.close_subpath();
                self.paint();
            }
            "S" | "f" | "F" | "f*" | "B" | "B*" => self.paint(),
            "n" => self.discard_path(),
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn advance(&mut self, tx: f32) {
        self.text_matrix = Matrix::translation(tx * self.horizontal_scale, 0.0).then(self.text_matrix);
    }

    fn show(&mut self, operand: &Object) {
        let Object::String(bytes, _) = operand else {
            return;
        };
        let text = decode_pdf_bytes(self.encoding, bytes);
        let glyphs = text.chars().count();
        let advance = glyphs as f32 * self.font_size * GLYPH_WIDTH_RATIO;

        let placement = self.text_matrix.then(self.ctm);
        let (x, y) = placement.apply(0.0, 0.0);
        let (end_x, _) = placement.apply(advance * self.horizontal_scale, 0.0);

        if !text.trim().is_empty() {
            self.layout.fragments.push(TextFragment {
                x,
                y,
                width: (end_x - x).abs(),
                font_size: self.font_size * placement.vertical_scale(),
                text,
            });
        }
        self.advance(advance);
    }

    fn push_segment(&mut self, from: (f32, f32), to: (f32, f32)) {
        self.pending_path.push(Segment {
            x1: from.0,
            y1: from.1,
            x2: to.0,
            y2: to.1,
        });
    }

    fn close_subpath(&mut self) {
        if let (Some(from), Some(start)) = (self.current_point, self.subpath_start) {
            if from != start {
                self.push_segment(from, start);
            }
            self.current_point = Some(start);
        }
    }

    fn rectangle(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if height.abs() <= RULE_THICKNESS {
            let mid = y + height / 2.0;
            let from = self.ctm.apply(x, mid);
            let to = self.ctm.apply(x + width, mid);
            self.push_segment(from, to);
        } else if width.abs() <= RULE_THICKNESS {
            let mid = x + width / 2.0;
            let from = self.ctm.apply(mid, y);
            let to = self.ctm.apply(mid, y + height);
            self.push_segment(from, to);
        } else {
            let corners = [
                self.ctm.apply(x, y),
                self.ctm.apply(x + width, y),
                self.ctm.apply(x + width, y + height),
                self.ctm.apply(x, y + height),
            ];
            for index in 0..corners.len() {
                self.push_segment(corners[index], corners[(index + 1) % corners.len()]);
            }
        }
        let origin = self.ctm.apply(x, y);
        self.current_point = Some(origin);
        self.subpath_start = Some(origin);
    }

    fn paint(&mut self) {
        self.layout.segments.append(&mut self.pending_path);
        self.current_point = None;
        self.subpath_start = None;
    }

    fn discard_path(&mut self) {
        self.pending_path.clear();
        self.current_point = None;
        self.subpath_start = None;
    }

    fn finish(self) -> PageLayout {
        self.layout
    }
}

/// Builds the layout of one page from its decoded content operations.
pub(crate) fn layout_from_operations(
    page_number: u32,
    operations: &[Operation],
    encodings: &BTreeMap<Vec<u8>, &str>,
) -> PageLayout {
    let mut builder = LayoutBuilder::new(page_number, encodings);
    for operation in operations {
        builder.apply(operation);
    }
    builder.finish()
}
