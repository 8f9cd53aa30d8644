//! HTML to PDF conversion.
//!
//! [`TextPdfRenderer`] does not lay out CSS. It walks the headings,
//! paragraphs and table rows of the document in order and sets them as text
//! on A4 pages with the built-in Helvetica and Courier fonts, starting a new
//! page when the current one is full.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use scraper::{ElementRef, Html, Selector};
use std::io::BufWriter;

use crate::error::{PipelineError, PipelineResult};

/// Converts a rendered HTML report into PDF bytes.
pub trait PdfRenderer: Send + Sync {
    fn render(&self, title: &str, html: &str) -> PipelineResult<Vec<u8>>;
}

/// A unit of text extracted from the HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Row { cells: Vec<String>, header: bool },
}

/// Text blocks of `html` in document order.
pub fn extract_blocks(html: &str) -> PipelineResult<Vec<Block>> {
    let document = Html::parse_document(html);
    let blocks = selector("h1, h2, h3, p, tr")?;
    let cells = selector("th, td")?;

    let mut out = Vec::new();
    for element in document.select(&blocks) {
        let block = match element.value().name() {
            "h1" => Block::Heading {
                level: 1,
                text: element_text(&element),
            },
            "h2" => Block::Heading {
                level: 2,
                text: element_text(&element),
            },
            "h3" => Block::Heading {
                level: 3,
                text: element_text(&element),
            },
            "tr" => {
                let row: Vec<ElementRef> = element.select(&cells).collect();
                Block::Row {
                    header: row.iter().all(|c| c.value().name() == "th"),
                    cells: row.iter().map(element_text).collect(),
                }
            },
            _ => Block::Paragraph(element_text(&element)),
        };
        out.push(block);
    }

    Ok(out)
}

fn selector(css: &str) -> PipelineResult<Selector> {
    Selector::parse(css).map_err(|e| PipelineError::Render(format!("Bad selector {:?}: {}", css, e)))
}

fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Greedy word wrap at `width` characters.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const TOP: f32 = 280.0;
const BOTTOM: f32 = 20.0;
const PARAGRAPH_WRAP: usize = 95;
const CELL_WIDTH: usize = 26;

/// Text-only renderer built on `printpdf`
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPdfRenderer;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
    mono_bold: IndirectFontRef,
}

struct Cursor<'d> {
    doc: &'d PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl Cursor<'_> {
    /// Reserve `height` mm, moving to a fresh page if it does not fit.
    fn advance(&mut self, height: f32) {
        if self.y - height < BOTTOM {
            let (page, layer) = self.doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Layer {}", self.pages + 1),
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
            self.pages += 1;
        }
        self.y -= height;
    }

    fn text(&mut self, text: &str, size: f32, height: f32, font: &IndirectFontRef) {
        self.advance(height);
        self.layer.use_text(text, size, Mm(MARGIN_LEFT), Mm(self.y), font);
    }
}

fn font(doc: &PdfDocumentReference, builtin: BuiltinFont) -> PipelineResult<IndirectFontRef> {
    doc.add_builtin_font(builtin)
        .map_err(|e| PipelineError::Render(format!("PDF font error: {e}")))
}

impl PdfRenderer for TextPdfRenderer {
    fn render(&self, title: &str, html: &str) -> PipelineResult<Vec<u8>> {
        let blocks = extract_blocks(html)?;

        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let fonts = Fonts {
            regular: font(&doc, BuiltinFont::Helvetica)?,
            bold: font(&doc, BuiltinFont::HelveticaBold)?,
            mono: font(&doc, BuiltinFont::Courier)?,
            mono_bold: font(&doc, BuiltinFont::CourierBold)?,
        };

        let mut cursor = Cursor {
            doc: &doc,
            layer: doc.get_page(page1).get_layer(layer1),
            y: TOP + 6.0,
            pages: 1,
        };

        for block in &blocks {
            match block {
                Block::Heading { level, text } => {
                    let (size, gap) = match level {
                        1 => (16.0, 9.0),
                        2 => (12.0, 9.0),
                        _ => (10.0, 6.0),
                    };
                    cursor.text(text, size, gap, &fonts.bold);
                },
                Block::Paragraph(text) => {
                    for line in wrap_text(text, PARAGRAPH_WRAP) {
                        cursor.text(&line, 9.0, 4.5, &fonts.regular);
                    }
                },
                Block::Row { cells, header } => {
                    let line = cells
                        .iter()
                        .map(|c| format!("{:<width$}", c, width = CELL_WIDTH))
                        .collect::<String>();
                    let font = if *header { &fonts.mono_bold } else { &fonts.mono };
                    cursor.text(line.trim_end(), 8.0, 4.0, font);
                },
            }
        }

        drop(cursor);

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| PipelineError::Render(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| PipelineError::Render(format!("PDF buffer error: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_blocks_in_document_order() {
        let html = "<html><body><h1>Lab</h1><p>Reported:   now</p>\
                    <table><tr><th>Analyte</th><th>Result</th></tr>\
                    <tr><td>Cocaine</td><td>0</td></tr></table>\
                    <h3>Group</h3></body></html>";

        assert_eq!(
            extract_blocks(html).unwrap(),
            vec![
                Block::Heading {
                    level: 1,
                    text: "Lab".to_string()
                },
                Block::Paragraph("Reported: now".to_string()),
                Block::Row {
                    cells: vec!["Analyte".to_string(), "Result".to_string()],
                    header: true
                },
                Block::Row {
                    cells: vec!["Cocaine".to_string(), "0".to_string()],
                    header: false
                },
                Block::Heading {
                    level: 3,
                    text: "Group".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert_eq!(wrap_text("", 5), Vec::<String>::new());
        assert_eq!(wrap_text("toolongword x", 4), vec!["toolongword", "x"]);
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let mut html = String::from("<h1>Lab</h1><table>");
        for i in 0..200 {
            html.push_str(&format!("<tr><td>row {}</td><td>{}</td></tr>", i, i * 2));
        }
        html.push_str("</table>");

        let bytes = TextPdfRenderer.render("Cumulative Report", &html).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
