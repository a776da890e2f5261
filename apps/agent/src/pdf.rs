//! Plain-text PDF rendering.
//!
//! Generated documents are laid out as single-column Helvetica text on US
//! letter pages. Width measurement uses the standard Helvetica AFM widths
//! so the greedy wrapper matches what the viewer will actually render.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::errors::AppError;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 54.0;
const FONT_SIZE: f32 = 12.0;
const LEADING: f32 = 15.0;
/// Usable text width in em units: (612 - 2 * 54) / 12.
const TEXT_WIDTH_EM: f32 = 42.0;
const LINES_PER_PAGE: usize = 45;
/// Fallback width for characters outside the table.
const AVERAGE_CHAR_WIDTH: f32 = 0.513;
const SPACE_WIDTH: f32 = 0.278;

/// Helvetica advance widths for ASCII 32..=126, in em units (AFM / 1000).
#[rustfmt::skip]
static HELVETICA_WIDTHS: [f32; 95] = [
    0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, // space ! " # $ % & '
    0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278, // ( ) * + , - . /
    0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, // 0 1 2 3 4 5 6 7
    0.556, 0.556, 0.278, 0.278, 0.584, 0.584, 0.584, 0.556, // 8 9 : ; < = > ?
    1.015, 0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, // @ A B C D E F G
    0.722, 0.278, 0.500, 0.667, 0.556, 0.833, 0.722, 0.778, // H I J K L M N O
    0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, // P Q R S T U V W
    0.667, 0.667, 0.611, 0.278, 0.278, 0.278, 0.469, 0.556, // X Y Z [ \ ] ^ _
    0.333, 0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, // ` a b c d e f g
    0.556, 0.222, 0.222, 0.500, 0.222, 0.833, 0.556, 0.556, // h i j k l m n o
    0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, // p q r s t u v w
    0.500, 0.500, 0.500, 0.334, 0.260, 0.334, 0.584,        // x y z { | } ~
];

/// Where a generated document lands: `{folder}/{company}_{title}_{type}.pdf`.
/// Company and title keep their spacing, but path separators are replaced
/// so the file always lands inside `folder`.
pub fn output_path(folder: &Path, company: &str, title: &str, doc_type: &str) -> PathBuf {
    let company = sanitize_component(company);
    let title = sanitize_component(title);
    folder.join(format!("{company}_{title}_{doc_type}.pdf"))
}

fn sanitize_component(part: &str) -> String {
    part.replace(['/', '\\'], "-")
}

/// Render `text` to a PDF at `path`. The parent directory must already exist.
pub fn write_document(text: &str, path: &Path) -> Result<(), AppError> {
    let lines = wrap_text(text, TEXT_WIDTH_EM);
    let line_pages: Vec<&[String]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids = Vec::with_capacity(line_pages.len());
    for page_lines in &line_pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
            Operation::new("TL", vec![LEADING.into()]),
            Operation::new(
                "Td",
                vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN - FONT_SIZE).into()],
            ),
        ];
        for (i, line) in page_lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            if !line.is_empty() {
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(sanitize_line(line))],
                ));
            }
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| AppError::Pdf(format!("Cannot encode page content: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let page_count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    doc.save(path)
        .map_err(|e| AppError::Pdf(format!("Cannot write PDF {}: {e}", path.display())))?;

    Ok(())
}

/// Width of `text` in em units at font size 1.0.
fn measure_str(text: &str) -> f32 {
    text.chars()
        .map(|c| {
            if (' '..='~').contains(&c) {
                HELVETICA_WIDTHS[c as usize - 32]
            } else {
                AVERAGE_CHAR_WIDTH
            }
        })
        .sum()
}

/// Greedy word wrap. Blank input lines survive as empty strings so paragraph
/// breaks render. Words wider than the page get their own over-long line
/// rather than being split.
fn wrap_text(text: &str, max_width_em: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for raw_line in text.lines() {
        if raw_line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0.0f32;
        for word in raw_line.split_whitespace() {
            let word_width = measure_str(word);
            if current.is_empty() {
                current = word.to_string();
                current_width = word_width;
            } else if current_width + SPACE_WIDTH + word_width <= max_width_em {
                current.push(' ');
                current.push_str(word);
                current_width += SPACE_WIDTH + word_width;
            } else {
                lines.push(current);
                current = word.to_string();
                current_width = word_width;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Map common typographic characters onto the ASCII range the Type1 font
/// covers. Anything else becomes '?'.
fn sanitize_line(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2022}' => '-',
            ' '..='~' => c,
            _ => '?',
        })
        .collect()
}
