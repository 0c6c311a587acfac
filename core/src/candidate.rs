//! Candidates and their selection labels.
//!
//! This module provides:
//! - `Candidate`: one menu entry with its computed label
//! - `LabelRule`: the label assignment for a menu page
//!
//! Labels come from three sources, in priority order:
//! 1. explicit per-page labels from the engine, for indices within the page
//! 2. the schema's select keys, one character per index
//! 3. the digit `(index + 1) % 10`, cycling `1..9, 0`

use serde::{Deserialize, Serialize};

/// A single candidate with the label that selects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub comment: Option<String>,
    pub label: String,
}

impl Candidate {
    pub fn new<T: Into<String>, L: Into<String>>(text: T, comment: Option<String>, label: L) -> Self {
        Candidate {
            text: text.into(),
            comment,
            label: label.into(),
        }
    }

    /// Label as shown on screen, with an optional trailing separator.
    ///
    /// The separator is cosmetic; `label` is what the select key produces.
    pub fn display_label(&self, separator: Option<char>) -> String {
        match separator {
            Some(sep) => {
                let mut shown = String::with_capacity(self.label.len() + sep.len_utf8());
                shown.push_str(&self.label);
                shown.push(sep);
                shown
            }
            None => self.label.clone(),
        }
    }
}

/// Label assignment for the candidates of one menu snapshot.
#[derive(Debug, Clone)]
pub struct LabelRule<'a> {
    page_size: usize,
    explicit: Option<&'a [String]>,
    select_keys: Vec<char>,
}

impl<'a> LabelRule<'a> {
    pub fn new(page_size: usize, explicit: Option<&'a [String]>, select_keys: Option<&str>) -> Self {
        Self {
            page_size,
            explicit,
            select_keys: select_keys.map(|keys| keys.chars().collect()).unwrap_or_default(),
        }
    }

    /// Label for the candidate at `index`.
    ///
    /// An explicit list shorter than the page falls through to the next source
    /// for the indices it does not cover.
    pub fn label(&self, index: usize) -> String {
        if index < self.page_size {
            if let Some(label) = self.explicit.and_then(|labels| labels.get(index)) {
                return label.clone();
            }
        }
        if let Some(key) = self.select_keys.get(index) {
            return key.to_string();
        }
        ((index + 1) % 10).to_string()
    }

    /// Labels for indices `0..count`.
    pub fn labels(&self, count: usize) -> Vec<String> {
        (0..count).map(|i| self.label(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_keys_then_digits() {
        let rule = LabelRule::new(5, None, Some("asdfg"));
        assert_eq!(
            rule.labels(12),
            owned(&["a", "s", "d", "f", "g", "6", "7", "8", "9", "0", "1", "2"])
        );
    }

    #[test]
    fn test_explicit_labels_win_within_page() {
        let explicit = owned(&["①", "②", "③"]);
        let rule = LabelRule::new(3, Some(&explicit), Some("asd"));
        assert_eq!(rule.labels(3), owned(&["①", "②", "③"]));
    }

    #[test]
    fn test_explicit_labels_ignored_past_page() {
        let explicit = owned(&["A", "B", "C", "D"]);
        let rule = LabelRule::new(2, Some(&explicit), None);
        assert_eq!(rule.labels(4), owned(&["A", "B", "3", "4"]));
    }

    #[test]
    fn test_short_explicit_list_falls_through() {
        let explicit = owned(&["α"]);
        let rule = LabelRule::new(3, Some(&explicit), Some("jk"));
        assert_eq!(rule.labels(3), owned(&["α", "k", "3"]));
    }

    #[test]
    fn test_select_keys_cross_page_boundary() {
        // select keys apply by index regardless of page size
        let rule = LabelRule::new(2, None, Some("qwer"));
        assert_eq!(rule.labels(5), owned(&["q", "w", "e", "r", "5"]));
    }

    #[test]
    fn test_select_keys_are_chars_not_bytes() {
        let rule = LabelRule::new(9, None, Some("一二"));
        assert_eq!(rule.labels(3), owned(&["一", "二", "3"]));
    }

    #[test]
    fn test_display_label_separator() {
        let cand = Candidate::new("你好", None, "1");
        assert_eq!(cand.display_label(Some(' ')), "1 ");
        assert_eq!(cand.display_label(Some('.')), "1.");
        assert_eq!(cand.display_label(None), "1");
        assert_eq!(cand.label, "1");
    }
}
