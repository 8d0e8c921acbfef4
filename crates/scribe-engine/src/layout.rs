//! Greedy word-wrap and top-down A4 pagination. Blocks become positioned
//! page items; lines that do not fit push a new page.

use scribe_core::blocks::{TextBlock, TextStyle};
use scribe_core::style::Color;

use crate::fonts;

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;

pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const DIVIDER_HEIGHT: f32 = 4.0;
const DOUBLE_RULE_GAP: f32 = 3.0;

/// A positioned drawing primitive. Coordinates are PDF user space: origin
/// bottom-left, y increasing upward.
#[derive(Clone, Debug, PartialEq)]
pub enum PageItem {
    Text {
        x: f32,
        baseline: f32,
        text: String,
        style: TextStyle,
    },
    Rule {
        x0: f32,
        x1: f32,
        y: f32,
        color: Color,
    },
}

#[derive(Clone, Debug, Default)]
pub struct Page {
    pub items: Vec<PageItem>,
}

/// Lay blocks out into pages.
pub fn paginate(blocks: &[TextBlock]) -> Vec<Page> {
    let mut layouter = Layouter::new();
    for block in blocks {
        layouter.push_block(block);
    }
    layouter.finish()
}

/// Greedy word wrap: words accumulate onto a line until the next word
/// would overflow. A single word wider than the line is broken by
/// character.
pub fn wrap(text: &str, style: &TextStyle, width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if fonts::text_width(style.face, style.size, &candidate) <= width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if fonts::text_width(style.face, style.size, word) <= width {
            current = word.to_string();
        } else {
            current = break_word(word, style, width, &mut lines);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn break_word(word: &str, style: &TextStyle, width: f32, lines: &mut Vec<String>) -> String {
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if fonts::text_width(style.face, style.size, &piece) > width && piece.chars().count() > 1 {
            let last = piece.pop().unwrap_or_default();
            lines.push(std::mem::take(&mut piece));
            piece.push(last);
        }
    }
    piece
}

struct Layouter {
    pages: Vec<Page>,
    current: Page,
    /// Distance from the page bottom to the next baseline position.
    cursor: f32,
}

impl Layouter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Page::default(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn push_block(&mut self, block: &TextBlock) {
        let leading = block.line_height_multiplier();
        match block {
            TextBlock::Title { text, style }
            | TextBlock::MetaLine { text, style }
            | TextBlock::SectionHeading { text, style }
            | TextBlock::SubHeading { text, style }
            | TextBlock::Paragraph { text, style } => {
                for line in wrap(text, style, CONTENT_WIDTH) {
                    self.push_line(MARGIN, line, style, style.size * leading);
                }
            }
            TextBlock::BulletList { items, glyph, style } => {
                let indent = fonts::text_width(style.face, style.size, glyph);
                let line_height = style.size * leading;
                for item in items {
                    let lines = wrap(item, style, CONTENT_WIDTH - indent);
                    for (i, line) in lines.into_iter().enumerate() {
                        if i == 0 {
                            self.push_line(MARGIN, format!("{glyph}{line}"), style, line_height);
                        } else {
                            self.push_line(MARGIN + indent, line, style, line_height);
                        }
                    }
                }
            }
            TextBlock::Divider { color, doubled } => {
                let needed = if *doubled {
                    DIVIDER_HEIGHT + DOUBLE_RULE_GAP
                } else {
                    DIVIDER_HEIGHT
                };
                self.ensure_room(needed);
                self.cursor -= DIVIDER_HEIGHT;
                self.current.items.push(PageItem::Rule {
                    x0: MARGIN,
                    x1: PAGE_WIDTH - MARGIN,
                    y: self.cursor,
                    color: *color,
                });
                if *doubled {
                    self.cursor -= DOUBLE_RULE_GAP;
                    self.current.items.push(PageItem::Rule {
                        x0: MARGIN,
                        x1: PAGE_WIDTH - MARGIN,
                        y: self.cursor,
                        color: *color,
                    });
                }
            }
        }
        self.cursor -= block.trailing_gap();
    }

    fn push_line(&mut self, x: f32, text: String, style: &TextStyle, line_height: f32) {
        self.ensure_room(line_height);
        self.cursor -= line_height;
        self.current.items.push(PageItem::Text {
            x,
            baseline: self.cursor,
            text,
            style: *style,
        });
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.cursor - needed < MARGIN {
            let full = std::mem::take(&mut self.current);
            self.pages.push(full);
            self.cursor = PAGE_HEIGHT - MARGIN;
        }
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.items.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}
