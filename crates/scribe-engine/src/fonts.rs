//! Width metrics for the base-14 fonts the compiler renders with. Widths
//! are in 1/1000 em units from the Adobe AFM files, covering ASCII 32-126.

use scribe_core::blocks::FontFace;
use scribe_core::style::FontFamily;

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
static TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
static TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

const COURIER_WIDTH: u16 = 600;

/// PostScript base font name for a face, as referenced from the PDF font
/// dictionary.
pub fn base_font_name(face: FontFace) -> &'static str {
    match (face.family, face.bold) {
        (FontFamily::Serif, false) => "Times-Roman",
        (FontFamily::Serif, true) => "Times-Bold",
        (FontFamily::Sans, false) => "Helvetica",
        (FontFamily::Sans, true) => "Helvetica-Bold",
        (FontFamily::Mono, false) => "Courier",
        (FontFamily::Mono, true) => "Courier-Bold",
    }
}

/// Glyph advance in 1/1000 em. Characters outside the ASCII table use the
/// width of `o` as an estimate.
pub fn char_width_milli(face: FontFace, c: char) -> u16 {
    if face.family == FontFamily::Mono {
        return COURIER_WIDTH;
    }
    let table = match (face.family, face.bold) {
        (FontFamily::Serif, false) => &TIMES_ROMAN,
        (FontFamily::Serif, true) => &TIMES_BOLD,
        (FontFamily::Sans, false) => &HELVETICA,
        (FontFamily::Sans, true) => &HELVETICA_BOLD,
        (FontFamily::Mono, _) => unreachable!(),
    };
    let code = c as usize;
    if (32..=126).contains(&code) {
        table[code - 32]
    } else {
        table[b'o' as usize - 32]
    }
}

/// Advance width of a string at the given size, in points.
pub fn text_width(face: FontFace, size: f32, text: &str) -> f32 {
    let milli: u32 = text.chars().map(|c| char_width_milli(face, c) as u32).sum();
    milli as f32 * size / 1000.0
}
