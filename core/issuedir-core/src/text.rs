//! Text helpers for folder names.

use crate::patterns::{RE_EMOJI, RE_WHITESPACE_RUN};

/// Removes emoji and collapses the whitespace they leave behind.
pub fn strip_emoji(text: &str) -> String {
    let stripped = RE_EMOJI.replace_all(text, "");
    RE_WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Removes emoji but leaves spacing alone (for names still being edited).
pub fn strip_emoji_preserve_spaces(text: &str) -> String {
    RE_EMOJI.replace_all(text, "").into_owned()
}

/// Replaces characters that would turn a folder name into a path.
pub fn replace_path_separators(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            other => other,
        })
        .collect()
}
