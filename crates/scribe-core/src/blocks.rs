use crate::style::{Color, FontFamily};

/// A concrete typeface request: family plus weight. The layout engine maps
/// this onto its metrics tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontFace {
    pub family: FontFamily,
    pub bold: bool,
}

impl FontFace {
    pub fn regular(family: FontFamily) -> FontFace {
        FontFace { family, bold: false }
    }

    pub fn bold(family: FontFamily) -> FontFace {
        FontFace { family, bold: true }
    }
}

/// Resolved style for one block of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub color: Color,
}

/// A unit of styled content emitted by the compiler and consumed by the
/// layout engine. Ephemeral — never persisted.
#[derive(Clone, Debug, PartialEq)]
pub enum TextBlock {
    Title { text: String, style: TextStyle },
    MetaLine { text: String, style: TextStyle },
    SectionHeading { text: String, style: TextStyle },
    SubHeading { text: String, style: TextStyle },
    Paragraph { text: String, style: TextStyle },
    BulletList { items: Vec<String>, glyph: String, style: TextStyle },
    Divider { color: Color, doubled: bool },
}

impl TextBlock {
    /// Line-height multiplier applied per wrapped line: tighter for the
    /// title, looser for body text.
    pub fn line_height_multiplier(&self) -> f32 {
        match self {
            TextBlock::Title { .. } => 1.2,
            TextBlock::MetaLine { .. } => 1.4,
            TextBlock::SectionHeading { .. } | TextBlock::SubHeading { .. } => 1.35,
            TextBlock::Paragraph { .. } | TextBlock::BulletList { .. } => 1.5,
            TextBlock::Divider { .. } => 1.0,
        }
    }

    /// Vertical gap inserted after the block, in points.
    pub fn trailing_gap(&self) -> f32 {
        match self {
            TextBlock::Title { .. } => 10.0,
            TextBlock::MetaLine { .. } => 6.0,
            TextBlock::SectionHeading { .. } => 8.0,
            TextBlock::SubHeading { .. } => 5.0,
            TextBlock::Paragraph { .. } => 8.0,
            TextBlock::BulletList { .. } => 8.0,
            TextBlock::Divider { .. } => 12.0,
        }
    }
}
