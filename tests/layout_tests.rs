// Tests for the TSPL renderer: greedy word wrap, chunked ids, glyph folding
// and the full command stream for a known record.

use partmark::candidate::{DatasheetLinks, LabelRecord, ProviderKind};
use partmark::layout::{render, split_in_chunks, wrap_text, MAX_BODY_CHARS_PER_LINE};

fn record(inventory_number: &str) -> LabelRecord {
    LabelRecord {
        inventory_number: inventory_number.to_string(),
        model: "LM358N".to_string(),
        description: "Dual operational amplifier".to_string(),
        properties: vec![
            ("Voltage".to_string(), "5V".to_string()),
            ("RoHS".to_string(), "Yes".to_string()),
        ],
        datasheet: Some(DatasheetLinks::One("https://ds.example/lm358.pdf".to_string())),
        provider: ProviderKind::Digikey,
        source_url: "https://example.com/lm358n".to_string(),
    }
}

#[test]
fn wrap_respects_budget_and_never_splits_words() {
    let text = "Operational amplifier, dual, 1 MHz, 3 to 32 V, DIP-8 package";
    let lines = wrap_text(text, MAX_BODY_CHARS_PER_LINE);

    for line in &lines {
        assert!(
            line.chars().count() <= MAX_BODY_CHARS_PER_LINE,
            "line over budget: {line:?}"
        );
    }
    // No word was split: joining with single spaces reconstructs the
    // whitespace-normalized input.
    assert_eq!(lines.join(" "), text);
}

#[test]
fn wrap_normalizes_whitespace_on_reconstruction() {
    let text = "spread   over\n multiple\t\tkinds   of space";
    let lines = wrap_text(text, 20);
    assert_eq!(lines.join(" "), "spread over multiple kinds of space");
}

#[test]
fn wrap_pins_greedy_boundary() {
    // Ten 9-char words, 99 chars total. With a 36-char budget a line holds
    // exactly three words (9+1+9+1+9 = 29; a fourth would need 39).
    let text = "aaaaaaaaa bbbbbbbbb ccccccccc ddddddddd eeeeeeeee fffffffff \
                ggggggggg hhhhhhhhh iiiiiiiii jjjjjjjjj";
    let lines = wrap_text(text, 36);
    assert_eq!(
        lines,
        vec![
            "aaaaaaaaa bbbbbbbbb ccccccccc",
            "ddddddddd eeeeeeeee fffffffff",
            "ggggggggg hhhhhhhhh iiiiiiiii",
            "jjjjjjjjj",
        ]
    );
}

#[test]
fn wrap_exact_fit_boundary() {
    // "aaaa bbbb" is exactly 9 chars: fits a 9 budget on one line, while a
    // 8 budget forces the split.
    assert_eq!(wrap_text("aaaa bbbb", 9), vec!["aaaa bbbb"]);
    assert_eq!(wrap_text("aaaa bbbb", 8), vec!["aaaa", "bbbb"]);
}

#[test]
fn wrap_gives_overlong_word_its_own_line() {
    let lines = wrap_text("ok incomprehensibilities ok", 10);
    assert_eq!(lines, vec!["ok", "incomprehensibilities", "ok"]);
}

#[test]
fn wrap_empty_input_yields_no_lines() {
    assert!(wrap_text("", 36).is_empty());
    assert!(wrap_text("   ", 36).is_empty());
}

#[test]
fn chunked_id_display() {
    assert_eq!(split_in_chunks("000123", 3, " "), "000 123");
    assert_eq!(split_in_chunks("000123", 2, "-"), "00-01-23");
}

#[test]
fn render_emits_the_full_expected_program() {
    // RoHS is filtered out, the one-line description leaves ten property
    // slots, and the id band repeats at the bottom.
    let expected = "\
REM SIZE 75mm, 120mm
SIZE 75 mm, 120 mm
GAP 5mm
DENSITY 10
REFERENCE 0,24
CLS
TEXT 20,14,\"3\",0,3,3,\"000 042\"
REVERSE 0,0,364,80
TEXT 16,100,\"5\",0,1,1,\"LM358N\"
TEXT 16,164,\"3\",0,1,1,\"Dual operational amplifier\"
TEXT 16,220,\"3\",0,1,1,\"Voltage:\"
TEXT 16,252,\"2\",0,1,1,\"5V\"
QRCODE 440,780,H,5,A,0,\"https://i.bksp.in/000042\"
TEXT 20,794,\"3\",0,3,3,\"000 042\"
REVERSE 0,780,364,80
PRINT 1
END";
    assert_eq!(render(&record("000042")), expected);
}

#[test]
fn render_output_is_pure_ascii() {
    let mut record = record("000001");
    record.description = "Конденсатор 10µF ±5%, до 85℃".to_string();
    let program = render(&record);
    assert!(program.is_ascii(), "non-ASCII survived folding: {program}");
    assert!(program.contains("10uF +-5%"));
}

#[test]
fn render_caps_property_slots_by_description_length() {
    let mut record = record("000002");
    // Ten 9-char words wrap to four description lines at the 36-char budget.
    record.description = "aaaaaaaaa bbbbbbbbb ccccccccc ddddddddd eeeeeeeee fffffffff \
                          ggggggggg hhhhhhhhh iiiiiiiii jjjjjjjjj"
        .to_string();
    record.properties = (0..15)
        .map(|i| (format!("Key{i}"), format!("Value{i}")))
        .collect();

    let rendered = render(&record);
    // 4 description lines leave 7 property slots (11 - 4), two TEXT lines each.
    let property_lines = rendered
        .lines()
        .filter(|line| line.contains("Key") || line.contains("Value"))
        .count();
    assert_eq!(property_lines, 14);
    assert!(rendered.contains("Key6:"));
    assert!(!rendered.contains("Key7:"));
}
