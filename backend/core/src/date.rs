//! Compact date reformatting for numeric OCR fields.

/// Reformat an 8-digit `YYYYMMDD` string as `YYYY/MM/DD`.
///
/// Anything that is not exactly eight ASCII digits is returned unchanged, so
/// the function is a no-op on its own output.
pub fn format_date(s: &str) -> String {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}/{}/{}", &s[..4], &s[4..6], &s[6..])
    } else {
        s.to_string()
    }
}
