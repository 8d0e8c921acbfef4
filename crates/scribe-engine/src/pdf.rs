//! Minimal PDF 1.4 writer. Pages of positioned items become content
//! streams referencing the base-14 fonts; no compression, no embedding.

use std::collections::BTreeMap;

use scribe_core::blocks::FontFace;
use scribe_core::style::Color;

use crate::fonts;
use crate::layout::{Page, PageItem, PAGE_HEIGHT, PAGE_WIDTH};

const RULE_WIDTH: f32 = 0.8;

/// Serialize laid-out pages into a complete PDF document.
pub fn render(pages: &[Page]) -> Vec<u8> {
    let font_names = collect_fonts(pages);
    let font_count = font_names.len();
    let page_count = pages.len();

    // Object layout: 1 catalog, 2 page tree, then fonts, then
    // (page, content) pairs.
    let first_font_obj = 3;
    let first_page_obj = first_font_obj + font_count;
    let total_objects = 2 + font_count + 2 * page_count;

    let mut out: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::with_capacity(total_objects);
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut push_obj = |out: &mut Vec<u8>, offsets: &mut Vec<usize>, id: usize, body: String| {
        offsets.push(out.len());
        out.extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    };

    push_obj(&mut out, &mut offsets, 1, "<< /Type /Catalog /Pages 2 0 R >>".to_string());

    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", first_page_obj + 2 * i))
        .collect();
    push_obj(
        &mut out,
        &mut offsets,
        2,
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), page_count),
    );

    // Objects must be written in id order for the xref table, so fonts go
    // out sorted by resource number, not by map order.
    let mut ordered_fonts: Vec<(&FontFace, &String)> = font_names.iter().collect();
    ordered_fonts.sort_by_key(|(_, name)| resource_index(name));
    for (face, name) in &ordered_fonts {
        let body = format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Name /{} /Encoding /WinAnsiEncoding >>",
            fonts::base_font_name(**face),
            name,
        );
        let id = first_font_obj + resource_index(name);
        push_obj(&mut out, &mut offsets, id, body);
    }

    let font_resources: Vec<String> = ordered_fonts
        .iter()
        .map(|(_, name)| format!("/{} {} 0 R", name, first_font_obj + resource_index(name)))
        .collect();
    let resources = format!("<< /Font << {} >> >>", font_resources.join(" "));

    for (i, page) in pages.iter().enumerate() {
        let page_id = first_page_obj + 2 * i;
        let content_id = page_id + 1;
        push_obj(
            &mut out,
            &mut offsets,
            page_id,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources {resources} /Contents {content_id} 0 R >>"
            ),
        );

        let stream = content_stream(page, &font_names);
        push_obj(
            &mut out,
            &mut offsets,
            content_id,
            format!("<< /Length {} >>\nstream\n{}endstream", stream.len(), stream),
        );
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", total_objects + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            total_objects + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}

/// Stable face -> resource-name assignment across the document.
fn collect_fonts(pages: &[Page]) -> BTreeMap<FontFace, String> {
    let mut faces: Vec<FontFace> = Vec::new();
    for page in pages {
        for item in &page.items {
            if let PageItem::Text { style, .. } = item {
                if !faces.contains(&style.face) {
                    faces.push(style.face);
                }
            }
        }
    }
    if faces.is_empty() {
        // A document with no text still needs a valid resource dictionary.
        faces.push(FontFace {
            family: scribe_core::style::FontFamily::Serif,
            bold: false,
        });
    }
    faces
        .into_iter()
        .enumerate()
        .map(|(i, face)| (face, format!("F{}", i + 1)))
        .collect()
}

fn resource_index(name: &str) -> usize {
    // Names are F1..Fn.
    name[1..].parse::<usize>().unwrap_or(1) - 1
}

fn content_stream(page: &Page, fonts: &BTreeMap<FontFace, String>) -> String {
    let mut s = String::new();
    for item in &page.items {
        match item {
            PageItem::Text { x, baseline, text, style } => {
                if text.is_empty() {
                    continue;
                }
                let name = &fonts[&style.face];
                let (r, g, b) = normalize(style.color);
                s.push_str(&format!(
                    "BT /{} {} Tf {r:.3} {g:.3} {b:.3} rg {x:.2} {baseline:.2} Td ({}) Tj ET\n",
                    name,
                    style.size,
                    escape_text(text),
                ));
            }
            PageItem::Rule { x0, x1, y, color } => {
                let (r, g, b) = normalize(*color);
                s.push_str(&format!(
                    "{r:.3} {g:.3} {b:.3} RG {RULE_WIDTH} w {x0:.2} {y:.2} m {x1:.2} {y:.2} l S\n"
                ));
            }
        }
    }
    s
}

fn normalize(c: Color) -> (f32, f32, f32) {
    (c.r as f32 / 255.0, c.g as f32 / 255.0, c.b as f32 / 255.0)
}

/// Escape a string for a PDF literal. Backslash and parens get escaped;
/// characters outside printable ASCII are replaced, matching the metrics
/// fallback.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\u{2022}' => out.push_str("\\225"),
            c if (' '..='~').contains(&c) => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
