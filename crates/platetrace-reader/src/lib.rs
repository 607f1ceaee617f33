//! License-plate grammar: validation, glyph correction, and span selection.
//!
//! Plates follow a fixed 7-slot letter/digit template. OCR engines routinely
//! confuse a handful of glyph pairs (0/O, 1/I, 3/J, 4/A, 6/G, 5/S); a slot
//! accepts either member of a confusable pair and canonicalization rewrites
//! it to the member its slot class demands.

use platetrace_types::{OcrSpan, PlateReading};

pub const PLATE_LEN: usize = 7;

/// Character class a slot of the canonical plate expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotClass {
    Letter,
    Digit,
}

use SlotClass::{Digit, Letter};

/// Canonical template: L L D D L L L.
pub const SLOT_CLASSES: [SlotClass; PLATE_LEN] =
    [Letter, Letter, Digit, Digit, Letter, Letter, Letter];

/// Letter form of a digit an OCR engine commonly misreads, if any.
fn digit_to_letter(c: char) -> Option<char> {
    match c {
        '0' => Some('O'),
        '1' => Some('I'),
        '3' => Some('J'),
        '4' => Some('A'),
        '5' => Some('S'),
        '6' => Some('G'),
        _ => None,
    }
}

/// Digit form of a letter an OCR engine commonly misreads, if any.
fn letter_to_digit(c: char) -> Option<char> {
    match c {
        'O' => Some('0'),
        'I' => Some('1'),
        'J' => Some('3'),
        'A' => Some('4'),
        'S' => Some('5'),
        'G' => Some('6'),
        _ => None,
    }
}

fn slot_accepts(class: SlotClass, c: char) -> bool {
    match class {
        Letter => c.is_ascii_uppercase() || digit_to_letter(c).is_some(),
        Digit => c.is_ascii_digit() || letter_to_digit(c).is_some(),
    }
}

fn canonical_slot_char(class: SlotClass, c: char) -> char {
    match class {
        Letter => digit_to_letter(c).unwrap_or(c),
        Digit => letter_to_digit(c).unwrap_or(c),
    }
}

/// True when `text` is exactly seven characters and every slot holds a
/// character its class accepts, counting confusable glyphs. Expects text the
/// caller has already upper-cased.
pub fn is_valid_plate(text: &str) -> bool {
    let mut chars = text.chars();
    for class in SLOT_CLASSES {
        let Some(c) = chars.next() else {
            return false;
        };
        if !slot_accepts(class, c) {
            return false;
        }
    }
    chars.next().is_none()
}

/// Rewrites a validated plate into canonical L L D D L L L form, replacing
/// each confusable glyph with the form its slot class demands.
pub fn canonicalize(text: &str) -> String {
    debug_assert!(
        is_valid_plate(text),
        "canonicalize requires validated input, got {text:?}"
    );
    text.chars()
        .zip(SLOT_CLASSES)
        .map(|(c, class)| canonical_slot_char(class, c))
        .collect()
}

/// Scans OCR spans in engine order and returns the canonical reading of the
/// first span that validates, with that span's confidence. Later spans are
/// never consulted once one is accepted.
pub fn read_plate(spans: &[OcrSpan]) -> Option<PlateReading> {
    for span in spans {
        let text = scrub(&span.text);
        if is_valid_plate(&text) {
            return Some(PlateReading {
                text: canonicalize(&text),
                confidence: span.confidence,
            });
        }
    }
    None
}

fn scrub(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}
