//! Filename sanitizing for derived output folders.

use regex::Regex;
use std::sync::LazyLock;

/// Characters that are invalid in Windows file names, plus `.`.
static UNSAFE_CHARS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:"*?<>|.]"#).unwrap());

/// Make a file stem safe to use as a folder name.
///
/// Each of `\ / : " * ? < > |` and `.` is replaced by `_`. Every other
/// character is kept, so the result has the same number of characters.
pub fn sanitize_stem(stem: &str) -> String {
    UNSAFE_CHARS_REGEX.replace_all(stem, "_").into_owned()
}
