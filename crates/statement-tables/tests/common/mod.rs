#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Text drawn at an absolute position with a 10pt font.
pub struct Placed<'a> {
    pub x: i64,
    pub y: i64,
    pub text: &'a str,
}

/// A stroked line from `(x1, y1)` to `(x2, y2)`.
pub struct Rule {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

fn save_pages(
    path: &Path,
    pages: Vec<Vec<Operation>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}

/// Page content for [`create_pages_pdf`].
pub enum FixturePage<'a> {
    /// Lines drawn inside one text object, advanced with `T*`.
    Lines(Vec<&'a str>),
    /// Each string drawn in its own text object at an absolute position.
    Placed(Vec<Placed<'a>>),
}

fn line_operations(lines: &[&str]) -> Vec<Operation> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("TL", vec![16.into()]),
        Operation::new("Td", vec![50.into(), 780.into()]),
    ];

    for (index, line) in lines.iter().enumerate() {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        if index + 1 < lines.len() {
            operations.push(Operation::new("T*", vec![]));
        }
    }
    operations.push(Operation::new("ET", vec![]));
    operations
}

fn placed_operations(texts: &[Placed<'_>], rules: &[Rule]) -> Vec<Operation> {
    let mut operations = Vec::new();
    for rule in rules {
        operations.push(Operation::new("m", vec![rule.x1.into(), rule.y1.into()]));
        operations.push(Operation::new("l", vec![rule.x2.into(), rule.y2.into()]));
        operations.push(Operation::new("S", vec![]));
    }
    for placed in texts {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![placed.x.into(), placed.y.into()]),
            Operation::new("Tj", vec![Object::string_literal(placed.text)]),
            Operation::new("ET", vec![]),
        ]);
    }
    operations
}

/// One page per entry, each line drawn with its own `Tj` on a new text line.
pub fn create_test_pdf(path: &Path, pages: &[Vec<&str>]) -> Result<(), Box<dyn std::error::Error>> {
    save_pages(path, pages.iter().map(|lines| line_operations(lines)).collect())
}

/// A single page of absolutely positioned text and stroked rules.
pub fn create_positioned_pdf(
    path: &Path,
    texts: &[Placed<'_>],
    rules: &[Rule],
) -> Result<(), Box<dyn std::error::Error>> {
    save_pages(path, vec![placed_operations(texts, rules)])
}

/// Pages drawn in different styles within one document.
pub fn create_pages_pdf(
    path: &Path,
    pages: &[FixturePage<'_>],
) -> Result<(), Box<dyn std::error::Error>> {
    let pages = pages
        .iter()
        .map(|page| match page {
            FixturePage::Lines(lines) => line_operations(lines),
            FixturePage::Placed(texts) => placed_operations(texts, &[]),
        })
        .collect();
    save_pages(path, pages)
}
