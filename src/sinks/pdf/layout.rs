//! Styling, line wrapping, and pagination for the built-in renderer.
//!
//! All arithmetic happens in points; page geometry is converted from the
//! configured millimetre sizes once. Character advances for the built-in
//! fonts are estimated with conservative per-font factors (no embedded
//! metrics are available), so wrapping errs on the side of breaking early
//! rather than running off the page edge.
//!
//! Layout and pagination are pure functions over the block tree: blocks in,
//! positioned lines out, no drawing here.

use crate::config::PdfConfig;
use crate::sinks::pdf::blocks::{Block, Inline, ListItem};

pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Leading as a multiple of the font size.
const LINE_SPACING: f32 = 1.3;
/// Indentation for block quotes, in points.
const QUOTE_INDENT_PT: f32 = 18.0;
/// Base indentation for list items, in points.
const LIST_INDENT_PT: f32 = 14.0;
/// Extra indentation per nesting level, in points.
const LIST_NEST_PT: f32 = 12.0;
/// Vertical space consumed by a horizontal rule, in points.
const RULE_HEIGHT_PT: f32 = 12.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FontKind {
    Regular,
    Bold,
    Oblique,
    Mono,
}

impl FontKind {
    /// Estimated advance width per character, as a fraction of the font
    /// size. Courier really is 0.6; the Helvetica factors are deliberately
    /// generous so wrapped lines stay inside the content box.
    fn advance_factor(self) -> f32 {
        match self {
            FontKind::Mono => 0.6,
            FontKind::Bold => 0.56,
            FontKind::Regular | FontKind::Oblique => 0.52,
        }
    }
}

/// Width of `text` at `size_pt` in the given font, in points.
pub fn text_width_pt(text: &str, font: FontKind, size_pt: f32) -> f32 {
    text.chars().count() as f32 * font.advance_factor() * size_pt
}

#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub text: String,
    pub font: FontKind,
    pub size_pt: f32,
}

#[derive(Clone, Debug, Default)]
pub struct Line {
    pub indent_pt: f32,
    pub spans: Vec<Span>,
}

/// One block, styled and wrapped but not yet assigned to a page.
pub struct LaidBlock {
    pub lines: Vec<Line>,
    pub leading_pt: f32,
    pub space_before_pt: f32,
    /// Code blocks move to a fresh page rather than splitting, when they fit
    /// on one page at all.
    pub keep_together: bool,
    pub is_rule: bool,
}

/// Page geometry derived from the configuration.
pub struct PageMetrics {
    pub width_pt: f32,
    pub height_pt: f32,
    pub margin_pt: f32,
}

impl PageMetrics {
    pub fn from_config(config: &PdfConfig) -> PageMetrics {
        let (w_mm, h_mm) = config.page_size.dimensions_mm();
        PageMetrics {
            width_pt: w_mm * PT_PER_MM,
            height_pt: h_mm * PT_PER_MM,
            margin_pt: config.margin_mm * PT_PER_MM,
        }
    }

    pub fn content_width_pt(&self) -> f32 {
        self.width_pt - 2.0 * self.margin_pt
    }

    fn usable_height_pt(&self) -> f32 {
        self.height_pt - 2.0 * self.margin_pt
    }
}

/// A line with its final position: `x` from the page's left edge, `y` the
/// baseline measured from the page's bottom edge (PDF coordinates).
pub struct PlacedLine {
    pub x_pt: f32,
    pub y_pt: f32,
    pub spans: Vec<Span>,
}

#[derive(Default)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
    /// Vertical positions of horizontal rules, from the page's bottom edge.
    pub rules: Vec<f32>,
}

/// Style and wrap every block to the content width.
pub fn layout_blocks(blocks: &[Block], config: &PdfConfig, width_pt: f32) -> Vec<LaidBlock> {
    let body = config.font_size_body_pt;
    let code = config.font_size_code_pt;
    let mut laid = Vec::with_capacity(blocks.len());

    for block in blocks {
        let laid_block = match block {
            Block::Heading { level, content } => {
                // level 1 only occurs for the synthetic book title
                let size = if *level == 1 {
                    config.font_size_title_pt
                } else {
                    config.heading_size_pt(*level)
                };
                LaidBlock {
                    lines: wrap_inlines(content, FontKind::Bold, size, width_pt, 0.0),
                    leading_pt: size * LINE_SPACING,
                    space_before_pt: size,
                    keep_together: true,
                    is_rule: false,
                }
            }
            Block::Paragraph(inlines) => LaidBlock {
                lines: wrap_inlines(inlines, FontKind::Regular, body, width_pt, 0.0),
                leading_pt: body * LINE_SPACING,
                space_before_pt: body * 0.6,
                keep_together: false,
                is_rule: false,
            },
            Block::Quote(inlines) => LaidBlock {
                lines: wrap_inlines(
                    inlines,
                    FontKind::Oblique,
                    body,
                    width_pt - QUOTE_INDENT_PT,
                    QUOTE_INDENT_PT,
                ),
                leading_pt: body * LINE_SPACING,
                space_before_pt: body * 0.6,
                keep_together: false,
                is_rule: false,
            },
            Block::CodeBlock(text) => LaidBlock {
                lines: layout_code(text, code, width_pt),
                leading_pt: code * LINE_SPACING,
                space_before_pt: body * 0.6,
                keep_together: true,
                is_rule: false,
            },
            Block::List(items) => LaidBlock {
                lines: layout_list(items, body, width_pt),
                leading_pt: body * LINE_SPACING,
                space_before_pt: body * 0.6,
                keep_together: false,
                is_rule: false,
            },
            Block::Image { alt, url } => {
                // images are never fetched: render the reference as text
                let placeholder = vec![Inline::Text(format!("[Image: {alt}] ({url})"))];
                LaidBlock {
                    lines: wrap_inlines(&placeholder, FontKind::Oblique, body, width_pt, 0.0),
                    leading_pt: body * LINE_SPACING,
                    space_before_pt: body * 0.6,
                    keep_together: false,
                    is_rule: false,
                }
            }
            Block::Rule => LaidBlock {
                lines: Vec::new(),
                leading_pt: 0.0,
                space_before_pt: 0.0,
                keep_together: false,
                is_rule: true,
            },
        };
        laid.push(laid_block);
    }

    laid
}

/// Assign laid-out lines to pages, breaking where the remaining vertical
/// space runs out.
pub fn paginate(laid: &[LaidBlock], metrics: &PageMetrics) -> Vec<Page> {
    let top = metrics.height_pt - metrics.margin_pt;
    let bottom = metrics.margin_pt;
    let mut pages = vec![Page::default()];
    let mut cursor = top;

    for block in laid {
        if block.is_rule {
            if cursor - RULE_HEIGHT_PT < bottom {
                pages.push(Page::default());
                cursor = top;
            }
            cursor -= RULE_HEIGHT_PT / 2.0;
            pages.last_mut().expect("at least one page").rules.push(cursor);
            cursor -= RULE_HEIGHT_PT / 2.0;
            continue;
        }
        if block.lines.is_empty() {
            continue;
        }

        // leading space, only when not already at the top of a page
        if cursor < top {
            cursor -= block.space_before_pt;
        }

        let height = block.lines.len() as f32 * block.leading_pt;
        let fits_on_fresh_page = height <= metrics.usable_height_pt();
        if block.keep_together && fits_on_fresh_page && cursor - height < bottom {
            pages.push(Page::default());
            cursor = top;
        }

        for line in &block.lines {
            if cursor - block.leading_pt < bottom {
                pages.push(Page::default());
                cursor = top;
            }
            cursor -= block.leading_pt;
            pages.last_mut().expect("at least one page").lines.push(PlacedLine {
                x_pt: metrics.margin_pt + line.indent_pt,
                y_pt: cursor,
                spans: line.spans.clone(),
            });
        }
    }

    pages
}

/// One word of styled text, the unit of wrapping.
struct Word {
    text: String,
    font: FontKind,
    size_pt: f32,
    hard_break: bool,
}

/// Flatten an inline tree into styled words and wrap them greedily.
fn wrap_inlines(
    inlines: &[Inline],
    base: FontKind,
    size_pt: f32,
    width_pt: f32,
    indent_pt: f32,
) -> Vec<Line> {
    let mut words = Vec::new();
    flatten(inlines, base, size_pt, &mut words);
    wrap_words(&words, width_pt.max(size_pt), indent_pt)
}

fn flatten(inlines: &[Inline], font: FontKind, size_pt: f32, out: &mut Vec<Word>) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => push_words(text, font, size_pt, out),
            Inline::Code(code) => push_words(code, FontKind::Mono, size_pt, out),
            Inline::Emphasis(children) => flatten(children, FontKind::Oblique, size_pt, out),
            Inline::Strong(children) => flatten(children, FontKind::Bold, size_pt, out),
            Inline::Link { text, url } => {
                // no interactive hyperlinks in the output: spell the URL out
                flatten(text, font, size_pt, out);
                push_words(&format!("({url})"), font, size_pt, out);
            }
            Inline::Image { alt, url } => {
                push_words(&format!("[Image: {alt}] ({url})"), FontKind::Oblique, size_pt, out);
            }
            Inline::Break => out.push(Word {
                text: String::new(),
                font,
                size_pt,
                hard_break: true,
            }),
        }
    }
}

fn push_words(text: &str, font: FontKind, size_pt: f32, out: &mut Vec<Word>) {
    for word in text.split_whitespace() {
        out.push(Word {
            text: word.to_string(),
            font,
            size_pt,
            hard_break: false,
        });
    }
}

fn wrap_words(words: &[Word], width_pt: f32, indent_pt: f32) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut current = Line {
        indent_pt,
        spans: Vec::new(),
    };
    let mut used = 0.0_f32;

    let mut flush = |current: &mut Line, used: &mut f32, lines: &mut Vec<Line>| {
        if !current.spans.is_empty() {
            lines.push(std::mem::replace(
                current,
                Line {
                    indent_pt,
                    spans: Vec::new(),
                },
            ));
        }
        *used = 0.0;
    };

    for word in words {
        if word.hard_break {
            flush(&mut current, &mut used, &mut lines);
            continue;
        }

        // chunk words that cannot fit a line on their own (long URLs)
        for piece in chunk_word(&word.text, word.font, word.size_pt, width_pt) {
            let piece_width = text_width_pt(&piece, word.font, word.size_pt);
            let space_width = text_width_pt(" ", word.font, word.size_pt);
            if !current.spans.is_empty() && used + space_width + piece_width > width_pt {
                flush(&mut current, &mut used, &mut lines);
            }
            let was_empty = current.spans.is_empty();
            append_span(&mut current, &piece, word.font, word.size_pt);
            used += if was_empty {
                piece_width
            } else {
                space_width + piece_width
            };
        }
    }
    flush(&mut current, &mut used, &mut lines);

    if lines.is_empty() {
        // an empty block still occupies one line so pagination stays simple
        lines.push(Line {
            indent_pt,
            spans: Vec::new(),
        });
    }
    lines
}

/// Split a single word into pieces no wider than `width_pt`.
fn chunk_word(text: &str, font: FontKind, size_pt: f32, width_pt: f32) -> Vec<String> {
    if text_width_pt(text, font, size_pt) <= width_pt {
        return vec![text.to_string()];
    }
    let max_chars = ((width_pt / (font.advance_factor() * size_pt)) as usize).max(1);
    text.chars()
        .collect::<Vec<char>>()
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Append a word to the line, merging into the last span when font and size
/// match.
fn append_span(line: &mut Line, word: &str, font: FontKind, size_pt: f32) {
    if let Some(last) = line.spans.last_mut() {
        if last.font == font && last.size_pt == size_pt {
            last.text.push(' ');
            last.text.push_str(word);
            return;
        }
        // a new span still needs the separating space before it
        last.text.push(' ');
    }
    line.spans.push(Span {
        text: word.to_string(),
        font,
        size_pt,
    });
}

/// Code lines are kept verbatim: no word wrapping, leading whitespace
/// preserved, over-long lines hard-split at the character capacity.
fn layout_code(code: &str, size_pt: f32, width_pt: f32) -> Vec<Line> {
    let max_chars = ((width_pt / (FontKind::Mono.advance_factor() * size_pt)) as usize).max(1);
    let mut lines = Vec::new();
    for raw in code.split('\n') {
        let chars: Vec<char> = raw.chars().collect();
        if chars.is_empty() {
            lines.push(Line {
                indent_pt: 0.0,
                spans: vec![Span {
                    text: String::new(),
                    font: FontKind::Mono,
                    size_pt,
                }],
            });
            continue;
        }
        for chunk in chars.chunks(max_chars) {
            lines.push(Line {
                indent_pt: 0.0,
                spans: vec![Span {
                    text: chunk.iter().collect(),
                    font: FontKind::Mono,
                    size_pt,
                }],
            });
        }
    }
    lines
}

fn layout_list(items: &[ListItem], size_pt: f32, width_pt: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    for item in items {
        let indent = LIST_INDENT_PT + f32::from(item.indent) * LIST_NEST_PT;
        let marker = match item.ordinal {
            Some(n) => format!("{n}. "),
            None => "• ".to_string(),
        };
        let marker_width = text_width_pt(&marker, FontKind::Regular, size_pt);
        let text_width = width_pt - indent - marker_width;

        let wrapped = wrap_inlines(
            &item.content,
            FontKind::Regular,
            size_pt,
            text_width,
            indent + marker_width,
        );
        for (i, mut line) in wrapped.into_iter().enumerate() {
            if i == 0 {
                line.indent_pt = indent;
                line.spans.insert(
                    0,
                    Span {
                        text: marker.clone(),
                        font: FontKind::Regular,
                        size_pt,
                    },
                );
            }
            lines.push(line);
        }
    }
    lines
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sinks::pdf::blocks::parse_blocks;

    fn metrics() -> PageMetrics {
        PageMetrics::from_config(&PdfConfig::default())
    }

    fn line_text(line: &Line) -> String {
        line.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }

    #[test]
    fn short_paragraph_is_one_line() {
        let inlines = vec![Inline::Text("hello world".to_string())];
        let lines = wrap_inlines(&inlines, FontKind::Regular, 10.0, 400.0, 0.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "hello world");
    }

    #[test]
    fn long_paragraph_wraps_within_width() {
        let text = "word ".repeat(200);
        let inlines = vec![Inline::Text(text)];
        let width = 200.0;
        let lines = wrap_inlines(&inlines, FontKind::Regular, 10.0, width, 0.0);
        assert!(lines.len() > 1);
        for line in &lines {
            let w: f32 = line
                .spans
                .iter()
                .map(|s| text_width_pt(&s.text, s.font, s.size_pt))
                .sum();
            assert!(w <= width + 1.0, "line too wide: {w}");
        }
    }

    #[test]
    fn oversized_word_is_chunked_not_lost() {
        let url = "x".repeat(500);
        let inlines = vec![Inline::Text(url.clone())];
        let lines = wrap_inlines(&inlines, FontKind::Regular, 10.0, 150.0, 0.0);
        let total: usize = lines.iter().map(|l| line_text(l).len()).sum();
        assert_eq!(total, url.len());
    }

    #[test]
    fn links_spell_out_their_url() {
        let inlines = vec![Inline::Link {
            text: vec![Inline::Text("docs".to_string())],
            url: "https://docs.site.io/a".to_string(),
        }];
        let lines = wrap_inlines(&inlines, FontKind::Regular, 10.0, 500.0, 0.0);
        assert_eq!(line_text(&lines[0]), "docs (https://docs.site.io/a)");
    }

    #[test]
    fn image_block_renders_as_literal_reference() {
        let blocks = parse_blocks("![Pic](https://docs.site.io/x.png)\n");
        let laid = layout_blocks(&blocks, &PdfConfig::default(), 500.0);
        let text = line_text(&laid[0].lines[0]);
        assert_eq!(text, "[Image: Pic] (https://docs.site.io/x.png)");
    }

    #[test]
    fn code_lines_keep_leading_whitespace() {
        let blocks = parse_blocks("```yaml\nsensor:\n  - platform: gpio\n```\n");
        let laid = layout_blocks(&blocks, &PdfConfig::default(), 500.0);
        let texts: Vec<String> = laid[0].lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["sensor:", "  - platform: gpio"]);
    }

    #[test]
    fn code_blocks_are_marked_keep_together() {
        let blocks = parse_blocks("```\ncode\n```\n");
        let laid = layout_blocks(&blocks, &PdfConfig::default(), 500.0);
        assert!(laid[0].keep_together);
    }

    #[test]
    fn list_items_get_markers_and_indent() {
        let blocks = parse_blocks("- alpha\n- beta\n\n1. one\n");
        let laid = layout_blocks(&blocks, &PdfConfig::default(), 500.0);
        let bullet_lines: Vec<String> = laid[0].lines.iter().map(line_text).collect();
        assert_eq!(bullet_lines, vec!["• alpha", "• beta"]);
        assert!(laid[0].lines[0].indent_pt > 0.0);
        let ordered_lines: Vec<String> = laid[1].lines.iter().map(line_text).collect();
        assert_eq!(ordered_lines, vec!["1. one"]);
    }

    #[test]
    fn pagination_starts_new_page_when_space_runs_out() {
        let many = "paragraph\n\n".repeat(300);
        let blocks = parse_blocks(&many);
        let metrics = metrics();
        let laid = layout_blocks(&blocks, &PdfConfig::default(), metrics.content_width_pt());
        let pages = paginate(&laid, &metrics);
        assert!(pages.len() > 1);
        for page in &pages {
            for line in &page.lines {
                assert!(line.y_pt >= metrics.margin_pt - 0.5);
                assert!(line.y_pt <= metrics.height_pt - metrics.margin_pt);
            }
        }
    }

    #[test]
    fn keep_together_block_moves_to_fresh_page() {
        // enough paragraphs to nearly fill page one, then a sizeable code block
        let mut md = "filler\n\n".repeat(50);
        md.push_str("```\n");
        md.push_str(&"line\n".repeat(20));
        md.push_str("```\n");
        let blocks = parse_blocks(&md);
        let metrics = metrics();
        let laid = layout_blocks(&blocks, &PdfConfig::default(), metrics.content_width_pt());
        let pages = paginate(&laid, &metrics);
        // the code block's lines are contiguous on one page
        let code_pages: Vec<usize> = pages
            .iter()
            .enumerate()
            .filter(|(_, p)| p.lines.iter().any(|l| line_text_of(l) == "line"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(code_pages.len(), 1, "code block split across pages");
    }

    fn line_text_of(line: &PlacedLine) -> String {
        line.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}
