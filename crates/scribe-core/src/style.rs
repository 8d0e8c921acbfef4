use serde::{Deserialize, Serialize};

use crate::ids::{TemplateId, UserId};

/// An RGB color parsed from `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    /// Parse a `#rrggbb` hex string. Falls back to black on malformed
    /// input so a bad catalog row can never make a document unrenderable.
    pub fn parse(hex: &str) -> Color {
        let raw = hex.trim().trim_start_matches('#');
        // Length alone is not enough: slicing below needs char boundaries,
        // so non-ASCII input falls back before any indexing.
        if raw.len() != 6 || !raw.is_ascii() {
            return Color::BLACK;
        }
        let parse2 = |s: &str| u8::from_str_radix(s, 16).ok();
        match (parse2(&raw[0..2]), parse2(&raw[2..4]), parse2(&raw[4..6])) {
            (Some(r), Some(g), Some(b)) => Color { r, g, b },
            _ => Color::BLACK,
        }
    }
}

/// The seven named colors a template declares.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScheme {
    pub primary: String,
    pub secondary: String,
    pub heading: String,
    pub text: String,
    pub muted: String,
    pub background: String,
    pub divider: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    Serif,
    Sans,
    Mono,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    Banner,
    Simple,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStyle {
    Numbered,
    Plain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletStyle {
    Dot,
    Dash,
    Arrow,
}

impl BulletStyle {
    /// Glyph prepended to each bullet-list item.
    pub fn glyph(self) -> &'static str {
        match self {
            BulletStyle::Dot => "\u{2022} ",
            BulletStyle::Dash => "- ",
            BulletStyle::Arrow => "> ",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividerStyle {
    Line,
    Double,
    None,
}

/// Structural typography choices for a template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub header_style: HeaderStyle,
    pub section_style: SectionStyle,
    pub bullet_style: BulletStyle,
    pub divider_style: DividerStyle,
    pub font_family: FontFamily,
    pub title_size: f32,
    pub heading_size: f32,
    pub body_size: f32,
}

/// Resolved color/typography choices for one template. Always renderable:
/// the resolver guarantees a StyleSheet even for unknown template ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSheet {
    pub color_scheme: ColorScheme,
    pub structure: Structure,
}

impl StyleSheet {
    /// Built-in fallback used when a template id is absent, unknown, or
    /// omitted.
    pub fn classic_professional() -> StyleSheet {
        StyleSheet {
            color_scheme: ColorScheme {
                primary: "#1a365d".into(),
                secondary: "#2c5282".into(),
                heading: "#1a202c".into(),
                text: "#2d3748".into(),
                muted: "#718096".into(),
                background: "#ffffff".into(),
                divider: "#cbd5e0".into(),
            },
            structure: Structure {
                header_style: HeaderStyle::Banner,
                section_style: SectionStyle::Numbered,
                bullet_style: BulletStyle::Dot,
                divider_style: DividerStyle::Line,
                font_family: FontFamily::Serif,
                title_size: 24.0,
                heading_size: 14.0,
                body_size: 11.0,
            },
        }
    }
}

/// Catalog record owning a StyleSheet. Immutable once referenced by a
/// generated artifact.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub preview_color: String,
    pub is_default: bool,
    pub is_public: bool,
    pub usage_count: i64,
    pub user_id: Option<UserId>,
    pub style: StyleSheet,
}

pub const DEFAULT_TEMPLATE_NAME: &str = "Classic Professional";

impl Template {
    /// The built-in default catalog entry.
    pub fn classic_professional() -> Template {
        Template {
            id: TemplateId::new(),
            name: DEFAULT_TEMPLATE_NAME.into(),
            description: "Navy headings, serif body, numbered sections.".into(),
            preview_color: "#1a365d".into(),
            is_default: true,
            is_public: true,
            usage_count: 0,
            user_id: None,
            style: StyleSheet::classic_professional(),
        }
    }
}

/// Catalog summary row returned by the templates listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub preview_color: String,
}

impl From<&Template> for TemplateSummary {
    fn from(t: &Template) -> Self {
        TemplateSummary {
            id: t.id.clone(),
            name: t.name.clone(),
            description: t.description.clone(),
            preview_color: t.preview_color.clone(),
        }
    }
}
