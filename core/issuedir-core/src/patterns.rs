//! Compiled regex patterns for issue identifiers and title cleanup.
//!
//! Word boundaries are ASCII-only (`(?-u:\b)`) so an identifier next to a
//! non-ASCII letter still counts as a whole token.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Issue Identifier Regexes
// ═══════════════════════════════════════════════════════════════════════════════

/// A tracker issue key inside free-form text, e.g. `ENG-123`.
pub static RE_ISSUE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)[A-Z]{2,5}-[0-9]{1,5}(?-u:\b)").unwrap());

/// A complete, standalone issue key.
pub static RE_ISSUE_ID_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,5}-[0-9]{1,5}$").unwrap());

/// Issue-key-shaped token in a folder name (any number of digits).
pub static RE_FOLDER_ISSUE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)[A-Z]{2,5}-[0-9]+(?-u:\b)").unwrap());

// ═══════════════════════════════════════════════════════════════════════════════
// Cleanup Regexes
// ═══════════════════════════════════════════════════════════════════════════════

pub static RE_LEADING_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s-]+").unwrap());

pub static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Pictographs plus the joiners, selectors and modifiers that glue emoji sequences together.
pub static RE_EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[\p{Extended_Pictographic}\u{200D}\u{20E3}\u{FE0E}\u{FE0F}\u{1F1E6}-\u{1F1FF}\u{1F3FB}-\u{1F3FF}\u{E000}-\u{F8FF}\u{E0020}-\u{E007F}]",
    )
    .unwrap()
});
