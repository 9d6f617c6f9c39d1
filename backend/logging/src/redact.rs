//! Log Redaction Layer
//!
//! Masks national ID numbers and other long digit runs in OCR text prior to
//! logging. The API response is not affected.

use regex::Regex;
use std::sync::LazyLock;

// Separators OCR tends to insert between digit groups. Runs never cross a
// line break.
static DIGIT_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d(?:[ \t./-]?\d){7,}").unwrap());

/// Replace every run of 8 or more digits with `[REDACTED_ID]`.
pub fn redact_identity_numbers(input: &str) -> String {
    DIGIT_RUN_RE.replace_all(input, "[REDACTED_ID]").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_national_id_and_dates() {
        let raw = "رقم 109876543210987654\nتاريخ 1990.01.01";
        let clean = redact_identity_numbers(raw);
        assert!(!clean.contains("109876543210987654"));
        assert!(!clean.contains("1990.01.01"));
        assert_eq!(clean.matches("[REDACTED_ID]").count(), 2);
    }

    #[test]
    fn short_groups_on_separate_lines_stay_apart() {
        let raw = "1234\n5678\n90";
        assert_eq!(redact_identity_numbers(raw), raw);
    }

    #[test]
    fn masks_spaced_groups_within_a_line() {
        assert_eq!(
            redact_identity_numbers("ID 1098 7654 3210\nok"),
            "ID [REDACTED_ID]\nok"
        );
    }

    #[test]
    fn keeps_short_numbers_and_text() {
        let raw = "Rh: O+ 12 محمد";
        assert_eq!(redact_identity_numbers(raw), raw);
    }
}
