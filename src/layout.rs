//! TSPL label renderer.
//!
//! Deterministic, stateless text layout: the same record always produces the
//! same command stream. Geometry is fixed at 75x120mm with 8 dots/mm; fonts
//! 2/3/5 are the printer's built-in bitmap fonts (font 3 is 16x24 dots, which
//! is where the 36-character body line budget comes from).

use crate::candidate::{filter_meaningful_properties, LabelRecord};
use deunicode::deunicode;

/// Body font 3 fits this many characters per line.
pub const MAX_BODY_CHARS_PER_LINE: usize = 36;
/// Body rows available for description lines plus property slots.
const TOTAL_BODY_SLOTS: usize = 11;
/// Property keys and values are truncated to this many characters.
const FIELD_CHAR_CAP: usize = 38;
/// Inventory numbers print in digit groups of this size.
const ID_GROUP_SIZE: usize = 3;
/// Scan-code target, parameterized by the inventory number.
const QR_URL_PREFIX: &str = "https://i.bksp.in/";

const LINE_HEIGHT: u32 = 32;

/// Explicit substitutions applied before transliteration. These override
/// deunicode's defaults for symbols common in component datasheets (deunicode
/// would render `°` as `deg`, which reads badly in values like `25°C`).
const GLYPH_MAP: &[(&str, &str)] = &[
    ("µ", "u"),
    ("°", "'"),
    ("±", "+-"),
    ("℃", "'C"),
    ("…", "..."),
];

/// Greedy word wrap: extend the current line while the next word still fits
/// within `budget`, otherwise start a new line. Whitespace is normalized and
/// words are never split, so a word longer than the budget gets its own
/// (overlong) line.
pub fn wrap_text(text: &str, budget: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + word_len + 1 <= budget {
            current.push(' ');
            current.push_str(word);
            current_len += word_len + 1;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split a string into fixed-size chunks joined by `separator`:
/// `split_in_chunks("000123", 3, " ")` is `"000 123"`.
pub fn split_in_chunks(s: &str, group_size: usize, separator: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars
        .chunks(group_size)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Two-stage ASCII substitution: the explicit glyph map first, then
/// transliteration for whatever non-ASCII remains. The order matters; the map
/// intentionally overrides transliteration's defaults.
pub fn ascii_fold(text: &str) -> String {
    let mut out = text.to_string();
    for (from, to) in GLYPH_MAP {
        out = out.replace(from, to);
    }
    deunicode(&out)
}

fn truncate_chars(s: &str, cap: usize) -> String {
    s.chars().take(cap).collect()
}

/// Render a record into a complete, printer-ready TSPL program.
pub fn render(record: &LabelRecord) -> String {
    let mut program: Vec<String> = vec![
        "REM SIZE 75mm, 120mm".to_string(),
        "SIZE 75 mm, 120 mm".to_string(),
        "GAP 5mm".to_string(),
        "DENSITY 10".to_string(),
        "REFERENCE 0,24".to_string(),
        "CLS".to_string(),
    ];

    let grouped_id = split_in_chunks(&record.inventory_number, ID_GROUP_SIZE, " ");

    // Scannable short-id band at the top.
    program.push(format!("TEXT 20,14,\"3\",0,3,3,\"{grouped_id}\""));
    program.push("REVERSE 0,0,364,80".to_string());
    let mut y: u32 = 100;

    program.push(format!("TEXT 16,{y},\"5\",0,1,1,\"{}\"", record.model));
    y += 64;

    let description_lines = wrap_text(&record.description, MAX_BODY_CHARS_PER_LINE);
    for line in &description_lines {
        program.push(format!("TEXT 16,{y},\"3\",0,1,1,\"{line}\""));
        y += LINE_HEIGHT;
    }

    y += 24;

    // Whatever the description did not use is left for properties.
    let slots_left = TOTAL_BODY_SLOTS.saturating_sub(description_lines.len());
    let properties = filter_meaningful_properties(&record.properties);
    for (key, value) in properties.iter().take(slots_left) {
        program.push(format!(
            "TEXT 16,{y},\"3\",0,1,1,\"{}:\"",
            truncate_chars(key, FIELD_CHAR_CAP)
        ));
        y += LINE_HEIGHT;
        program.push(format!(
            "TEXT 16,{y},\"2\",0,1,1,\"{}\"",
            truncate_chars(value, FIELD_CHAR_CAP)
        ));
        y += LINE_HEIGHT;
    }

    // Footer: scan code plus the id band repeated for eyes-on reading.
    program.push(format!(
        "QRCODE 440,780,H,5,A,0,\"{QR_URL_PREFIX}{}\"",
        record.inventory_number
    ));
    program.push(format!("TEXT 20,794,\"3\",0,3,3,\"{grouped_id}\""));
    program.push("REVERSE 0,780,364,80".to_string());
    program.push("PRINT 1".to_string());
    program.push("END".to_string());

    ascii_fold(&program.join("\n"))
}
