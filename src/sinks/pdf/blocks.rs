//! Block/inline document model for the built-in renderer.
//!
//! The assembled Markdown is tokenised with `pulldown-cmark` into a small
//! plain-data tree covering the subset of Markdown that documentation pages
//! actually use: headings, paragraphs, lists (one nesting level), fenced and
//! indented code, block quotes, images, links, emphasis. Anything else
//! (tables, footnotes, raw HTML blocks) is skipped rather than mis-rendered.
//! The tree is rebuilt for every render call and discarded after pagination.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Link { text: Vec<Inline>, url: String },
    Image { alt: String, url: String },
    Break,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    /// 0 for top-level items, 1 for items of a nested list
    pub indent: u8,
    /// Position in an ordered list; `None` for bullet items
    pub ordinal: Option<u64>,
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph(Vec<Inline>),
    CodeBlock(String),
    List(Vec<ListItem>),
    Quote(Vec<Inline>),
    Image { alt: String, url: String },
    Rule,
}

/// Parse Markdown into the block model.
pub fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(markdown, Options::empty()) {
        builder.event(event);
    }
    builder.blocks
}

/// Concatenated plain text of a span tree, for image alt text.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    collect_plain(inlines, &mut out);
    out
}

fn collect_plain(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(t) | Inline::Code(t) => out.push_str(t),
            Inline::Emphasis(children) | Inline::Strong(children) => collect_plain(children, out),
            Inline::Link { text, .. } => collect_plain(text, out),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::Break => out.push(' '),
        }
    }
}

/// What an open inline collector belongs to.
enum Scope {
    /// A block-level container (paragraph, heading, list item)
    Block,
    Emphasis,
    Strong,
    Link(String),
    Image(String),
}

struct OpenList {
    next_ordinal: Option<u64>,
}

#[derive(Default)]
struct TreeBuilder {
    blocks: Vec<Block>,
    inline_stack: Vec<(Scope, Vec<Inline>)>,
    code: Option<String>,
    quote_depth: usize,
    list_stack: Vec<OpenList>,
    /// Items of the list currently being built, pre-allocated in document
    /// order (an inner item's `End` fires before its parent's).
    items: Vec<ListItem>,
    item_slots: Vec<usize>,
}

impl TreeBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => match &mut self.code {
                Some(buffer) => buffer.push_str(&text),
                None => self.push_inline(Inline::Text(text.into_string())),
            },
            Event::Code(code) => self.push_inline(Inline::Code(code.into_string())),
            Event::SoftBreak => self.push_inline(Inline::Text(" ".to_string())),
            Event::HardBreak => self.push_inline(Inline::Break),
            Event::Rule => self.blocks.push(Block::Rule),
            // raw HTML, math, footnotes, task markers: outside the supported subset
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                // paragraphs inside a list item merge into the item's content
                if self.item_slots.is_empty() {
                    self.inline_stack.push((Scope::Block, Vec::new()));
                }
            }
            Tag::Heading { .. } => self.inline_stack.push((Scope::Block, Vec::new())),
            Tag::BlockQuote(_) => self.quote_depth += 1,
            Tag::CodeBlock(_) => self.code = Some(String::new()),
            Tag::List(start) => self.list_stack.push(OpenList {
                next_ordinal: start,
            }),
            Tag::Item => {
                let ordinal = self.list_stack.last_mut().and_then(|list| {
                    let n = list.next_ordinal?;
                    list.next_ordinal = Some(n + 1);
                    Some(n)
                });
                let indent = (self.list_stack.len().saturating_sub(1) as u8).min(1);
                self.item_slots.push(self.items.len());
                self.items.push(ListItem {
                    indent,
                    ordinal,
                    content: Vec::new(),
                });
                self.inline_stack.push((Scope::Block, Vec::new()));
            }
            Tag::Emphasis => self.inline_stack.push((Scope::Emphasis, Vec::new())),
            Tag::Strong => self.inline_stack.push((Scope::Strong, Vec::new())),
            Tag::Link { dest_url, .. } => self
                .inline_stack
                .push((Scope::Link(dest_url.into_string()), Vec::new())),
            Tag::Image { dest_url, .. } => self
                .inline_stack
                .push((Scope::Image(dest_url.into_string()), Vec::new())),
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.item_slots.is_empty() {
                    let inlines = self.pop_block();
                    self.finish_paragraph(inlines);
                } else {
                    // space between paragraphs merged into one list item
                    self.push_inline(Inline::Text(" ".to_string()));
                }
            }
            TagEnd::Heading(level) => {
                let content = self.pop_block();
                self.blocks.push(Block::Heading {
                    level: level as u8,
                    content,
                });
            }
            TagEnd::BlockQuote(_) => self.quote_depth = self.quote_depth.saturating_sub(1),
            TagEnd::CodeBlock => {
                if let Some(buffer) = self.code.take() {
                    let code = buffer.trim_end_matches('\n').to_string();
                    self.blocks.push(Block::CodeBlock(code));
                }
            }
            TagEnd::Item => {
                let content = self.pop_block();
                if let Some(slot) = self.item_slots.pop() {
                    self.items[slot].content = content;
                }
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() && !self.items.is_empty() {
                    self.blocks.push(Block::List(std::mem::take(&mut self.items)));
                }
            }
            TagEnd::Emphasis => {
                if let Some((_, children)) = self.inline_stack.pop() {
                    self.push_inline(Inline::Emphasis(children));
                }
            }
            TagEnd::Strong => {
                if let Some((_, children)) = self.inline_stack.pop() {
                    self.push_inline(Inline::Strong(children));
                }
            }
            TagEnd::Link => {
                if let Some((scope, children)) = self.inline_stack.pop() {
                    if let Scope::Link(url) = scope {
                        self.push_inline(Inline::Link {
                            text: children,
                            url,
                        });
                    }
                }
            }
            TagEnd::Image => {
                if let Some((scope, children)) = self.inline_stack.pop() {
                    if let Scope::Image(url) = scope {
                        let alt = plain_text(&children);
                        self.push_inline(Inline::Image { alt, url });
                    }
                }
            }
            _ => {}
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        if let Some((_, collector)) = self.inline_stack.last_mut() {
            collector.push(inline);
        }
        // inline content outside any container (e.g. inside a skipped HTML
        // block) is dropped
    }

    fn pop_block(&mut self) -> Vec<Inline> {
        match self.inline_stack.pop() {
            Some((Scope::Block, inlines)) => inlines,
            Some(other) => {
                // unbalanced events; restore and return nothing
                self.inline_stack.push(other);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn finish_paragraph(&mut self, inlines: Vec<Inline>) {
        if self.quote_depth > 0 {
            self.blocks.push(Block::Quote(inlines));
            return;
        }
        // a paragraph that is exactly one image becomes an image block
        if inlines.len() == 1 {
            if let Inline::Image { alt, url } = &inlines[0] {
                self.blocks.push(Block::Image {
                    alt: alt.clone(),
                    url: url.clone(),
                });
                return;
            }
        }
        self.blocks.push(Block::Paragraph(inlines));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_headings_with_levels() {
        let blocks = parse_blocks("## Section\n\ntext\n");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], Block::Heading { level: 2, .. }));
        assert!(matches!(&blocks[1], Block::Paragraph(_)));
    }

    #[test]
    fn fenced_code_keeps_inner_text_verbatim() {
        let blocks = parse_blocks("```yaml\nsensor:\n  - platform: gpio\n```\n");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock("sensor:\n  - platform: gpio".to_string())]
        );
    }

    #[test]
    fn ordered_list_items_carry_ordinals() {
        let blocks = parse_blocks("3. three\n4. four\n");
        let Block::List(items) = &blocks[0] else {
            panic!("expected list, got {blocks:?}");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].ordinal, Some(3));
        assert_eq!(items[1].ordinal, Some(4));
    }

    #[test]
    fn nested_list_items_are_indented_in_document_order() {
        let blocks = parse_blocks("- outer\n  - inner\n- second\n");
        let Block::List(items) = &blocks[0] else {
            panic!("expected list, got {blocks:?}");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(plain_text(&items[0].content).trim(), "outer");
        assert_eq!(items[0].indent, 0);
        assert_eq!(plain_text(&items[1].content).trim(), "inner");
        assert_eq!(items[1].indent, 1);
        assert_eq!(plain_text(&items[2].content).trim(), "second");
    }

    #[test]
    fn standalone_image_becomes_image_block() {
        let blocks = parse_blocks("![Pic](https://docs.site.io/x.png)\n");
        assert_eq!(
            blocks,
            vec![Block::Image {
                alt: "Pic".to_string(),
                url: "https://docs.site.io/x.png".to_string(),
            }]
        );
    }

    #[test]
    fn inline_image_stays_inline() {
        let blocks = parse_blocks("before ![i](u.png) after\n");
        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert!(inlines
            .iter()
            .any(|i| matches!(i, Inline::Image { .. })));
    }

    #[test]
    fn quote_paragraphs_become_quote_blocks() {
        let blocks = parse_blocks("> careful now\n");
        assert!(matches!(&blocks[0], Block::Quote(_)));
    }

    #[test]
    fn emphasis_and_links_nest() {
        let blocks = parse_blocks("see *the [docs](https://d.example)*\n");
        let Block::Paragraph(inlines) = &blocks[0] else {
            panic!("expected paragraph");
        };
        let Some(Inline::Emphasis(children)) = inlines.iter().find(|i| matches!(i, Inline::Emphasis(_)))
        else {
            panic!("expected emphasis in {inlines:?}");
        };
        assert!(children.iter().any(|i| matches!(i, Inline::Link { .. })));
    }

    #[test]
    fn rules_and_html_comments() {
        let blocks = parse_blocks("a\n\n---\n\n<!-- SOURCE: x.md -->\n\nb\n");
        assert!(blocks.contains(&Block::Rule));
        // the HTML comment is skipped, both paragraphs survive
        let paragraphs = blocks
            .iter()
            .filter(|b| matches!(b, Block::Paragraph(_)))
            .count();
        assert_eq!(paragraphs, 2);
    }
}
