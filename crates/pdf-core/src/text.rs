//! Text rendering with the built-in Helvetica font
//!
//! Overlay text uses one of the standard 14 fonts so no font program has to
//! be embedded. Strings are written as WinAnsi-encoded literal strings.

use crate::document::Color;

/// Page resource name used for the standard Helvetica font
pub const STANDARD_FONT_RESOURCE: &str = "FHelv";

/// WinAnsi code for characters in the 0x80..=0x9F block
fn win_ansi_high(c: char) -> Option<u8> {
    let code = match c {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(code)
}

/// Encode text as the body of a PDF literal string (without the parentheses)
///
/// Latin-1 maps to itself and the WinAnsi extras (curly quotes, dashes,
/// euro sign, ...) to their 0x80..=0x9F codes. Anything else becomes `?`.
/// Parentheses and backslashes are escaped; C0 and C1 control characters
/// are dropped.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            c if c.is_control() => {}
            c if (c as u32) <= 0xFF => out.push(c as u32 as u8),
            c => out.push(win_ansi_high(c).unwrap_or(b'?')),
        }
    }
    out
}

/// Generate PDF operators for a single line of text
///
/// # Arguments
/// * `text` - Text to render
/// * `x` - X coordinate of the baseline start (PDF coordinates)
/// * `y` - Y coordinate of the baseline (PDF coordinates, from bottom)
/// * `font_size` - Font size in points
/// * `color` - Fill color
///
/// # Returns
/// Vector of bytes containing the PDF operators
pub fn generate_text_operators(
    text: &str,
    x: f64,
    y: f64,
    font_size: f64,
    color: Color,
) -> Vec<u8> {
    let mut ops = Vec::new();

    ops.extend_from_slice(b"BT\n");
    ops.extend_from_slice(format!("{} {} {} rg\n", color.r, color.g, color.b).as_bytes());
    ops.extend_from_slice(format!("/{STANDARD_FONT_RESOURCE} {font_size} Tf\n").as_bytes());
    ops.extend_from_slice(format!("{x} {y} Td\n").as_bytes());
    ops.push(b'(');
    ops.extend_from_slice(&encode_win_ansi(text));
    ops.extend_from_slice(b") Tj\n");
    ops.extend_from_slice(b"ET\n");

    ops
}
