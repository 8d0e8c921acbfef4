//! Turns a validated rubric document plus a stylesheet into PDF bytes and
//! a collision-resistant artifact name.

use scribe_core::blocks::{FontFace, TextBlock, TextStyle};
use scribe_core::outcome::DocumentMeta;
use scribe_core::rubric::{RubricDocument, RUBRIC};
use scribe_core::style::{Color, DividerStyle, SectionStyle, StyleSheet};

use crate::layout;
use crate::pdf;

/// A rendered artifact ready for the store.
#[derive(Clone, Debug)]
pub struct CompiledDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub page_count: usize,
}

/// Compile a document end to end: blocks, pages, bytes, name.
pub fn compile(meta: &DocumentMeta, doc: &RubricDocument, style: &StyleSheet) -> CompiledDocument {
    let blocks = build_blocks(meta, doc, style);
    let pages = layout::paginate(&blocks);
    let page_count = pages.len();
    let bytes = pdf::render(&pages);
    CompiledDocument {
        bytes,
        file_name: artifact_file_name(&meta.title),
        page_count,
    }
}

/// `slug(title)_{16 hex}.pdf` — the random suffix keeps repeated titles
/// from colliding in the flat artifact directory.
pub fn artifact_file_name(title: &str) -> String {
    let suffix: u64 = rand::random();
    format!("{}_{suffix:016x}.pdf", slug(title))
}

const SLUG_MAX_LEN: usize = 60;

/// Lowercased alphanumerics with runs of anything else collapsed to a
/// single hyphen, capped at 60 characters.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars() {
        if !c.is_ascii_alphanumeric() {
            pending_hyphen = true;
            continue;
        }
        // A separator and its character land together or not at all, so
        // the cap holds and the slug never ends with a hyphen.
        let sep = usize::from(pending_hyphen && !out.is_empty());
        if out.len() + sep + 1 > SLUG_MAX_LEN {
            break;
        }
        if sep == 1 {
            out.push('-');
        }
        pending_hyphen = false;
        out.push(c.to_ascii_lowercase());
    }
    if out.is_empty() {
        out.push_str("document");
    }
    out
}

/// Emit the block sequence for the whole document: title header, meta
/// line, divider, then the six stages in rubric order.
pub fn build_blocks(
    meta: &DocumentMeta,
    doc: &RubricDocument,
    style: &StyleSheet,
) -> Vec<TextBlock> {
    let fam = style.structure.font_family;
    let title_style = TextStyle {
        face: FontFace::bold(fam),
        size: style.structure.title_size,
        color: Color::parse(&style.color_scheme.primary),
    };
    let heading = TextStyle {
        face: FontFace::bold(fam),
        size: style.structure.heading_size,
        color: Color::parse(&style.color_scheme.heading),
    };
    let sub = TextStyle {
        face: FontFace::bold(fam),
        size: style.structure.body_size + 1.0,
        color: Color::parse(&style.color_scheme.secondary),
    };
    let body = TextStyle {
        face: FontFace::regular(fam),
        size: style.structure.body_size,
        color: Color::parse(&style.color_scheme.text),
    };
    let muted = TextStyle {
        face: FontFace::regular(fam),
        size: style.structure.body_size - 1.0,
        color: Color::parse(&style.color_scheme.muted),
    };
    let glyph = style.structure.bullet_style.glyph().to_string();
    let divider_color = Color::parse(&style.color_scheme.divider);

    let mut blocks = Vec::new();

    let title_text = match style.structure.header_style {
        scribe_core::style::HeaderStyle::Banner => meta.title.to_uppercase(),
        scribe_core::style::HeaderStyle::Simple => meta.title.clone(),
    };
    blocks.push(TextBlock::Title { text: title_text, style: title_style });

    let meta_line = meta_line(meta);
    if !meta_line.is_empty() {
        blocks.push(TextBlock::MetaLine { text: meta_line, style: muted });
    }
    if !meta.description.trim().is_empty() {
        blocks.push(TextBlock::MetaLine { text: meta.description.clone(), style: muted });
    }

    push_divider(&mut blocks, style.structure.divider_style, divider_color);

    let bullets = |items: &[String]| TextBlock::BulletList {
        items: items.to_vec(),
        glyph: glyph.clone(),
        style: body,
    };
    let para = |text: &str| TextBlock::Paragraph { text: text.to_string(), style: body };
    let subhead = |text: &str| TextBlock::SubHeading { text: text.to_string(), style: sub };

    for spec in &RUBRIC {
        let heading_text = match style.structure.section_style {
            SectionStyle::Numbered => {
                format!("Stage {}: {} ({} marks)", spec.number, spec.title, spec.marks)
            }
            SectionStyle::Plain => format!("{} ({} marks)", spec.title, spec.marks),
        };
        blocks.push(TextBlock::SectionHeading { text: heading_text, style: heading });

        match spec.number {
            1 => {
                blocks.push(subhead("Problem Statement"));
                blocks.push(para(&doc.stage1.problem_statement));
                blocks.push(subhead("Background"));
                blocks.push(para(&doc.stage1.background));
                blocks.push(subhead("Specifications"));
                blocks.push(bullets(&doc.stage1.specifications));
            }
            2 | 3 => {
                let ideas = if spec.number == 2 { &doc.stage2.ideas } else { &doc.stage3.ideas };
                for idea in ideas {
                    blocks.push(subhead(&idea.title));
                    blocks.push(para(&idea.description));
                    blocks.push(subhead("Merits"));
                    blocks.push(bullets(&idea.merits));
                    blocks.push(subhead("Demerits"));
                    blocks.push(bullets(&idea.demerits));
                }
            }
            4 => {
                let items: Vec<String> = doc
                    .stage4
                    .refinements
                    .iter()
                    .map(|r| format!("{}: {}", r.aspect, r.detail))
                    .collect();
                blocks.push(bullets(&items));
            }
            5 => {
                blocks.push(subhead("Description"));
                blocks.push(para(&doc.stage5.description));
                blocks.push(subhead("Justification"));
                blocks.push(para(&doc.stage5.justification));
            }
            6 => {
                blocks.push(subhead("Summary"));
                blocks.push(para(&doc.stage6.summary));
                blocks.push(subhead("Challenges"));
                blocks.push(bullets(&doc.stage6.challenges));
                blocks.push(subhead("Recommendations"));
                blocks.push(bullets(&doc.stage6.recommendations));
            }
            _ => unreachable!(),
        }
    }

    blocks
}

fn push_divider(blocks: &mut Vec<TextBlock>, style: DividerStyle, color: Color) {
    match style {
        DividerStyle::Line => blocks.push(TextBlock::Divider { color, doubled: false }),
        DividerStyle::Double => blocks.push(TextBlock::Divider { color, doubled: true }),
        DividerStyle::None => {}
    }
}

fn meta_line(meta: &DocumentMeta) -> String {
    [&meta.subject, &meta.level, &meta.author, &meta.school]
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim())
        .collect::<Vec<_>>()
        .join(" | ")
}
