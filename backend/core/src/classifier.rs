//! Post-OCR field triage.
//!
//! Each OCR line is routed to one of two buckets:
//!
//! - lines containing any digit go to the numeric bucket, reduced to their
//!   digit run. An 18-digit run is kept as-is (national ID number), a run of
//!   8 or more digits is passed through [`format_date`], shorter runs are
//!   dropped.
//! - digit-free lines go to the text bucket when they are long enough and do
//!   not contain any stop phrase (printed card labels such as "اللقب").
//!
//! Lengths are counted in characters, not bytes.

use crate::date::format_date;
use crate::types::ClassifiedFields;

/// Printed labels and boilerplate found on the card. A line containing any
/// of these as a substring is never reported as a text field.
pub const DEFAULT_STOP_PHRASES: &[&str] = &[
    "Rh:",
    "بطاقة",
    "الديمقراطية",
    "الجمهورية",
    "سلطة",
    "تاررخ",
    "التعريف",
    "اللقب",
    "بلدية",
    "تاريخ",
    ":",
    "الجنس",
    "ائرية",
    "الإسم",
    "مكان",
];

/// Three-character tokens admitted despite the `> 3` length rule.
pub const SEX_MARKERS: &[&str] = &["ذكر"];

const NATIONAL_ID_DIGITS: usize = 18;
const MIN_DATE_DIGITS: usize = 8;
const MIN_TEXT_CHARS: usize = 3;

/// Rule-based classifier for OCR text.
#[derive(Debug, Clone)]
pub struct TextClassifier {
    stop_phrases: Vec<String>,
    sex_markers: Vec<String>,
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self {
            stop_phrases: DEFAULT_STOP_PHRASES.iter().map(|s| s.to_string()).collect(),
            sex_markers: SEX_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TextClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add stop phrases on top of the built-in list. Blank entries are ignored
    /// since an empty substring would match every line.
    pub fn with_extra_stop_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_phrases.extend(
            phrases
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.trim().is_empty()),
        );
        self
    }

    pub fn stop_phrases(&self) -> &[String] {
        &self.stop_phrases
    }

    /// Split `text` into lines and classify each one, preserving line order
    /// within each bucket.
    pub fn classify(&self, text: &str) -> ClassifiedFields {
        let mut fields = ClassifiedFields::default();

        for raw in text.split('\n') {
            let line = raw.trim();

            if line.chars().any(|c| ascii_digit(c).is_some()) {
                if let Some(value) = numeric_field(line) {
                    fields.lines_with_numbers.push(value);
                }
            } else if self.is_text_field(line) {
                fields.lines_with_strings.push(line.to_string());
            }
        }

        fields
    }

    fn is_text_field(&self, line: &str) -> bool {
        let len = line.chars().count();
        if len < MIN_TEXT_CHARS {
            return false;
        }
        if self.stop_phrases.iter().any(|p| line.contains(p.as_str())) {
            return false;
        }
        len > MIN_TEXT_CHARS || self.sex_markers.iter().any(|m| m == line)
    }
}

/// Classify with the built-in stop phrases.
pub fn classify_text(text: &str) -> ClassifiedFields {
    TextClassifier::default().classify(text)
}

fn numeric_field(line: &str) -> Option<String> {
    let digits: String = line.chars().filter_map(ascii_digit).collect();

    match digits.len() {
        NATIONAL_ID_DIGITS => Some(digits),
        n if n >= MIN_DATE_DIGITS => Some(format_date(&digits)),
        _ => None,
    }
}

/// Map ASCII, Arabic-Indic, and Extended Arabic-Indic digits to ASCII.
fn ascii_digit(c: char) -> Option<char> {
    let offset = match c {
        '0'..='9' => return Some(c),
        '\u{0660}'..='\u{0669}' => c as u32 - 0x0660,
        '\u{06F0}'..='\u{06F9}' => c as u32 - 0x06F0,
        _ => return None,
    };
    char::from_digit(offset, 10)
}
