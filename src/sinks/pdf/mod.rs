//! Built-in fallback PDF renderer.
//!
//! A deliberately small Markdown-to-PDF path for machines without a working
//! external converter: parse the assembled document into a block/inline tree
//! ([`blocks`]), wrap and paginate it ([`layout`]), and paint the pages here
//! with `printpdf` using the built-in Helvetica family plus Courier for code.
//!
//! Permanent limitations, documented rather than fixed: images are never
//! fetched or embedded (an image paints as the literal text
//! `[Image: <alt>] (<url>)`), and links paint as their text followed by the
//! URL in parentheses, since the output has no interactive hyperlinks.
//!
//! There are no retries here. If the drawing library fails, the error
//! surfaces as a [`RenderError`] and the run degrades to "Markdown
//! succeeded, PDF failed".

pub mod blocks;
pub mod layout;

use crate::config::PdfConfig;
use layout::{FontKind, PageMetrics, PT_PER_MM};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line as PdfLine, Mm, PdfDocument, Point, Rgb,
};
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to prepare PDF fonts: {0}")]
    Font(String),
    #[error("failed to write PDF: {0}")]
    Pdf(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
    mono: IndirectFontRef,
}

impl Fonts {
    fn get(&self, kind: FontKind) -> &IndirectFontRef {
        match kind {
            FontKind::Regular => &self.regular,
            FontKind::Bold => &self.bold,
            FontKind::Oblique => &self.oblique,
            FontKind::Mono => &self.mono,
        }
    }
}

/// Render `markdown` into a paginated PDF at `out`.
///
/// The document is written atomically: painted into a temp file beside the
/// destination, then renamed into place.
pub fn render(
    markdown: &str,
    title: &str,
    config: &PdfConfig,
    out: &Path,
) -> Result<(), RenderError> {
    let metrics = PageMetrics::from_config(config);
    let parsed = blocks::parse_blocks(markdown);
    let laid = layout::layout_blocks(&parsed, config, metrics.content_width_pt());
    let pages = layout::paginate(&laid, &metrics);

    let width = Mm(metrics.width_pt / PT_PER_MM);
    let height = Mm(metrics.height_pt / PT_PER_MM);
    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "content");

    let fonts = Fonts {
        regular: builtin(&doc, BuiltinFont::Helvetica)?,
        bold: builtin(&doc, BuiltinFont::HelveticaBold)?,
        oblique: builtin(&doc, BuiltinFont::HelveticaOblique)?,
        mono: builtin(&doc, BuiltinFont::Courier)?,
    };

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(width, height, "content");
            doc.get_page(page_index).get_layer(layer_index)
        };

        for line in &page.lines {
            let mut x_pt = line.x_pt;
            let y = Mm(line.y_pt / PT_PER_MM);
            for span in &line.spans {
                if span.text.is_empty() {
                    continue;
                }
                layer.use_text(
                    span.text.clone(),
                    span.size_pt,
                    Mm(x_pt / PT_PER_MM),
                    y,
                    fonts.get(span.font),
                );
                x_pt += layout::text_width_pt(&span.text, span.font, span.size_pt);
            }
        }

        for &rule_y in &page.rules {
            layer.set_outline_color(Color::Rgb(Rgb::new(0.6, 0.6, 0.6, None)));
            layer.set_outline_thickness(0.5);
            layer.add_line(PdfLine {
                points: vec![
                    (
                        Point::new(Mm(metrics.margin_pt / PT_PER_MM), Mm(rule_y / PT_PER_MM)),
                        false,
                    ),
                    (
                        Point::new(
                            Mm((metrics.width_pt - metrics.margin_pt) / PT_PER_MM),
                            Mm(rule_y / PT_PER_MM),
                        ),
                        false,
                    ),
                ],
                is_closed: false,
            });
        }
    }

    save_atomic(doc, out)
}

fn builtin(
    doc: &printpdf::PdfDocumentReference,
    font: BuiltinFont,
) -> Result<IndirectFontRef, RenderError> {
    doc.add_builtin_font(font)
        .map_err(|e| RenderError::Font(e.to_string()))
}

fn save_atomic(doc: printpdf::PdfDocumentReference, out: &Path) -> Result<(), RenderError> {
    let dir = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        doc.save(&mut writer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        writer.flush()?;
    }

    tmp.persist(out).map_err(|e| RenderError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = "\
# Combined Documentation

> **Source**: https://docs.site.io/

---

<!-- SOURCE: guides/setup.md -->

## Getting Started

Connect the *board* and **flash** it. See [the guide](https://docs.site.io/guides).

![Pinout](https://docs.site.io/images/pinout.png)

```yaml
sensor:
  - platform: gpio
```

- step one
- step two
";

    #[test]
    fn renders_a_non_empty_pdf() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let out = dir.path().join("out/site.pdf");
        render(SAMPLE, "Combined Documentation", &PdfConfig::default(), &out)
            .expect("render succeeds");

        let bytes = std::fs::read(&out).expect("output exists");
        assert!(!bytes.is_empty());
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_markdown_still_produces_a_pdf() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let out = dir.path().join("empty.pdf");
        render("", "Empty", &PdfConfig::default(), &out).expect("render succeeds");
        assert!(std::fs::metadata(&out).expect("output exists").len() > 0);
    }

    #[test]
    fn letter_page_size_is_honoured() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let out = dir.path().join("letter.pdf");
        let config = PdfConfig {
            page_size: crate::config::PageSize::Letter,
            ..PdfConfig::default()
        };
        render("# Title\n\nsome text\n", "T", &config, &out).expect("render succeeds");
        assert!(std::fs::metadata(&out).expect("output exists").len() > 0);
    }
}
