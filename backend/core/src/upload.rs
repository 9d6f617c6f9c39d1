//! Upload filename checks.
//!
//! Only the extension is inspected; content sniffing happens later when the
//! image is decoded.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::UploadError;

/// Lowercase extensions accepted by `POST /ocr`.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// Whether `filename` carries an allowed extension (case-insensitive).
pub fn allowed_file(filename: &str) -> bool {
    extension(filename).is_some()
}

fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Reduce `filename` to a single safe path component.
///
/// Non-ASCII characters are dropped, path separators and whitespace runs
/// become `_`, anything outside `[A-Za-z0-9_.-]` is removed, and leading or
/// trailing dots and underscores are stripped. May return an empty string.
///
/// Unlike werkzeug there is no NFKD folding first, so accented letters are
/// removed rather than reduced to their base letter (`carte-é.png` becomes
/// `carte-.png`, not `carte-e.png`). Stored names are prefixed with the task
/// id, so this only affects readability.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Validate an uploaded filename and return the name to store it under.
///
/// When sanitising removes the stem or the extension (for example an
/// Arabic-only name), `upload.<ext>` is returned instead.
pub fn validate_upload(filename: &str) -> Result<String, UploadError> {
    if filename.trim().is_empty() {
        return Err(UploadError::MissingFile);
    }
    let ext = extension(filename).ok_or(UploadError::InvalidExtension)?;

    let safe = secure_filename(filename);
    if allowed_file(&safe) {
        Ok(safe)
    } else {
        Ok(format!("upload.{ext}"))
    }
}
