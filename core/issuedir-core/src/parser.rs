//! Window title parsing.
//!
//! Tracker windows are titled like `"ENG-123 Fix login bug"` or
//! `"Linear - ENG-123 - Fix login bug"`. The first whole-token issue key wins;
//! everything after it becomes the issue title.

use crate::patterns::{RE_ISSUE_ID, RE_ISSUE_ID_EXACT, RE_LEADING_SEPARATORS};
use serde::{Deserialize, Serialize};

/// An issue key and the title text that followed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    id: String,
    title: String,
}

impl IssueRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// May be empty when the window only showed the key.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn into_parts(self) -> (String, String) {
        (self.id, self.title)
    }
}

/// Parses an issue key and title out of a window title.
///
/// Returns `None` when no key is present, which callers treat as
/// "no issue in focus". Matching is case-sensitive.
pub fn parse_issue_title(window_title: &str) -> Option<IssueRef> {
    let found = RE_ISSUE_ID.find(window_title)?;
    let rest = &window_title[found.end()..];
    let title = RE_LEADING_SEPARATORS.replace(rest, "");

    Some(IssueRef::new(found.as_str(), title.trim_end()))
}

pub fn extract_issue_id(window_title: &str) -> Option<String> {
    parse_issue_title(window_title).map(|issue| issue.id)
}

/// Normalizes a hand-typed key (`" eng-42 "` -> `"ENG-42"`).
pub fn normalize_issue_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn is_issue_id(candidate: &str) -> bool {
    RE_ISSUE_ID_EXACT.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(input: &str) -> Option<(String, String)> {
        parse_issue_title(input).map(IssueRef::into_parts)
    }

    fn pair(id: &str, title: &str) -> Option<(String, String)> {
        Some((id.to_string(), title.to_string()))
    }

    #[test]
    fn test_parses_standard_id_and_title() {
        assert_eq!(
            parsed("ENG-123 Fix login bug"),
            pair("ENG-123", "Fix login bug")
        );
    }

    #[test]
    fn test_strips_dash_separator_after_id() {
        assert_eq!(
            parsed("ENG-123 - Fix login bug"),
            pair("ENG-123", "Fix login bug")
        );
    }

    #[test]
    fn test_skips_app_prefix() {
        assert_eq!(
            parsed("Linear - ENG-123 Fix login bug"),
            pair("ENG-123", "Fix login bug")
        );
        assert_eq!(
            parsed("Linear - ENG-123 - Fix login bug"),
            pair("ENG-123", "Fix login bug")
        );
    }

    #[test]
    fn test_id_only_gives_empty_title() {
        assert_eq!(parsed("ENG-123"), pair("ENG-123", ""));
        assert_eq!(parsed("ENG-123   "), pair("ENG-123", ""));
    }

    #[test]
    fn test_accepts_boundary_lengths() {
        assert_eq!(extract_issue_id("AB-1").as_deref(), Some("AB-1"));
        assert_eq!(
            extract_issue_id("ABCDE-12345").as_deref(),
            Some("ABCDE-12345")
        );
    }

    #[test]
    fn test_rejects_out_of_range_ids() {
        assert!(parse_issue_title("A-123").is_none());
        assert!(parse_issue_title("ABCDEF-123").is_none());
        assert!(parse_issue_title("ENG-123456").is_none());
    }

    #[test]
    fn test_is_case_sensitive() {
        assert!(parse_issue_title("eng-123").is_none());
        assert!(parse_issue_title("Eng-123 Fix").is_none());
    }

    #[test]
    fn test_no_id_returns_none() {
        assert!(parse_issue_title("Fix login bug").is_none());
        assert!(parse_issue_title("").is_none());
    }

    #[test]
    fn test_id_mid_sentence_takes_trailing_words() {
        assert_eq!(parsed("Working on ENG-123 now"), pair("ENG-123", "now"));
    }

    #[test]
    fn test_embedded_ids_are_not_tokens() {
        assert!(parse_issue_title("xENG-123").is_none());
        assert!(parse_issue_title("ENG-123x").is_none());
        assert!(parse_issue_title("ENG-123_draft").is_none());
        assert_eq!(
            parsed("xENG-123 then OPS-9 deploy"),
            pair("OPS-9", "deploy")
        );
    }

    #[test]
    fn test_first_token_wins() {
        assert_eq!(
            parsed("ENG-1 blocks ENG-2"),
            pair("ENG-1", "blocks ENG-2")
        );
    }

    #[test]
    fn test_non_ascii_neighbours_still_bound_the_token() {
        assert_eq!(parsed("→ENG-7 Ship"), pair("ENG-7", "Ship"));
    }

    #[test]
    fn test_normalizes_typed_ids() {
        assert_eq!(normalize_issue_id("  eng-42 "), "ENG-42");
        assert!(is_issue_id("ENG-42"));
        assert!(!is_issue_id("ENG-42 extra"));
        assert!(!is_issue_id("eng-42"));
    }
}
