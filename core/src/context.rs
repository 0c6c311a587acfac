//! Display-ready snapshots projected from raw engine buffers.
//!
//! Each query on the session handle produces a fresh, immutable value here.
//! Nothing keeps a reference into the engine's buffer: the projection copies
//! what it needs, and the buffer is released as soon as the copy is made.
//!
//! Only `Menu` carries computed data (candidate labels, see
//! [`crate::candidate::LabelRule`]); the other projections are field copies
//! with absent engine strings mapped to empty text.

use serde::{Deserialize, Serialize};

use crate::api::{RawCommit, RawComposition, RawContext, RawMenu, RawStatus};
use crate::candidate::{Candidate, LabelRule};

fn non_negative(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Text being composed, with cursor and selection in bytes of `preedit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    pub length: usize,
    pub cursor_pos: usize,
    pub sel_start: usize,
    pub sel_end: usize,
    pub preedit: String,
}

impl Composition {
    pub fn project(raw: &RawComposition) -> Self {
        Self {
            length: non_negative(raw.length),
            cursor_pos: non_negative(raw.cursor_pos),
            sel_start: non_negative(raw.sel_start),
            sel_end: non_negative(raw.sel_end),
            preedit: raw.preedit.clone().unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.preedit.is_empty()
    }
}

/// One page of candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub page_size: usize,
    pub page_no: usize,
    pub is_last_page: bool,
    pub highlighted_index: usize,
    pub candidates: Vec<Candidate>,
    pub select_keys: String,
}

impl Menu {
    /// Project a raw menu, labelling each candidate.
    ///
    /// The candidate count is the smaller of the engine's reported count and
    /// the number of candidates the buffer actually carries.
    pub fn project(raw: &RawMenu, explicit_labels: Option<&[String]>) -> Self {
        let reported = non_negative(raw.num_candidates);
        let count = reported.min(raw.candidates.len());
        if reported != raw.candidates.len() {
            tracing::warn!(
                reported,
                carried = raw.candidates.len(),
                "menu candidate count mismatch, clamping"
            );
        }

        let rule = LabelRule::new(
            non_negative(raw.page_size),
            explicit_labels,
            raw.select_keys.as_deref(),
        );
        let candidates = raw.candidates[..count]
            .iter()
            .enumerate()
            .map(|(i, c)| Candidate::new(c.text.clone(), c.comment.clone(), rule.label(i)))
            .collect();

        Self {
            page_size: non_negative(raw.page_size),
            page_no: non_negative(raw.page_no),
            is_last_page: raw.is_last_page,
            highlighted_index: non_negative(raw.highlighted_candidate_index),
            candidates,
            select_keys: raw.select_keys.clone().unwrap_or_default(),
        }
    }

    pub fn num_candidates(&self) -> usize {
        self.candidates.len()
    }

    pub fn has_prev_page(&self) -> bool {
        self.page_no != 0
    }

    pub fn has_next_page(&self) -> bool {
        !self.is_last_page
    }

    pub fn highlighted(&self) -> Option<&Candidate> {
        self.candidates.get(self.highlighted_index)
    }

    pub fn labels(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.label.clone()).collect()
    }
}

/// Composition and menu state after a key event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub composition: Composition,
    pub menu: Menu,
    pub commit_text_preview: Option<String>,
    pub raw_input: String,
    pub caret_pos: usize,
    /// Computed label of each candidate, in menu order.
    pub select_labels: Vec<String>,
}

impl Context {
    pub fn project(raw: &RawContext, raw_input: Option<String>, caret_pos: usize) -> Self {
        let menu = Menu::project(&raw.menu, raw.select_labels.as_deref());
        Self {
            composition: Composition::project(&raw.composition),
            select_labels: menu.labels(),
            menu,
            commit_text_preview: raw.commit_text_preview.clone(),
            raw_input: raw_input.unwrap_or_default(),
            caret_pos,
        }
    }

    pub fn has_menu(&self) -> bool {
        !self.menu.candidates.is_empty()
    }

    pub fn is_composing(&self) -> bool {
        !self.composition.is_empty()
    }
}

/// Session status flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub schema_id: String,
    pub schema_name: String,
    pub is_disabled: bool,
    pub is_composing: bool,
    pub is_ascii_mode: bool,
    pub is_full_shape: bool,
    pub is_simplified: bool,
    pub is_traditional: bool,
    pub is_ascii_punct: bool,
}

impl Status {
    pub fn project(raw: &RawStatus) -> Self {
        Self {
            schema_id: raw.schema_id.clone().unwrap_or_default(),
            schema_name: raw.schema_name.clone().unwrap_or_default(),
            is_disabled: raw.is_disabled,
            is_composing: raw.is_composing,
            is_ascii_mode: raw.is_ascii_mode,
            is_full_shape: raw.is_full_shape,
            is_simplified: raw.is_simplified,
            is_traditional: raw.is_traditional,
            is_ascii_punct: raw.is_ascii_punct,
        }
    }
}

/// Text the engine has committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub text: String,
}

impl Commit {
    /// `None` when the buffer holds no text.
    pub fn project(raw: &RawCommit) -> Option<Self> {
        raw.text.as_ref().map(|text| Self { text: text.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RawCandidate;

    fn raw_menu(count: usize, page_size: i32, select_keys: Option<&str>) -> RawMenu {
        RawMenu {
            page_size,
            page_no: 0,
            is_last_page: false,
            highlighted_candidate_index: 0,
            num_candidates: count as i32,
            candidates: (0..count)
                .map(|i| RawCandidate {
                    text: format!("cand{i}"),
                    comment: None,
                })
                .collect(),
            select_keys: select_keys.map(str::to_string),
        }
    }

    #[test]
    fn test_menu_labels_from_select_keys() {
        let menu = Menu::project(&raw_menu(12, 5, Some("asdfg")), None);
        assert_eq!(menu.num_candidates(), 12);
        assert_eq!(
            menu.labels(),
            vec!["a", "s", "d", "f", "g", "6", "7", "8", "9", "0", "1", "2"]
        );
        assert_eq!(menu.select_keys, "asdfg");
    }

    #[test]
    fn test_context_without_select_labels_field() {
        let raw = RawContext {
            menu: raw_menu(3, 5, None),
            select_labels: None,
            ..Default::default()
        };
        let ctx = Context::project(&raw, Some("ni".into()), 2);
        assert_eq!(ctx.select_labels, vec!["1", "2", "3"]);
        assert_eq!(ctx.raw_input, "ni");
        assert_eq!(ctx.caret_pos, 2);
        assert!(ctx.has_menu());
    }

    #[test]
    fn test_context_with_explicit_labels() {
        let raw = RawContext {
            menu: raw_menu(3, 3, Some("jkl")),
            select_labels: Some(vec!["①".into(), "②".into(), "③".into()]),
            ..Default::default()
        };
        let ctx = Context::project(&raw, None, 0);
        assert_eq!(ctx.select_labels, vec!["①", "②", "③"]);
        assert_eq!(ctx.menu.candidates[1].label, "②");
    }

    #[test]
    fn test_reported_count_larger_than_buffer_is_clamped() {
        let mut raw = raw_menu(2, 5, None);
        raw.num_candidates = 7;
        let menu = Menu::project(&raw, None);
        assert_eq!(menu.num_candidates(), 2);
        assert_eq!(menu.candidates.len(), 2);
    }

    #[test]
    fn test_reported_count_smaller_than_buffer_is_honoured() {
        let mut raw = raw_menu(4, 5, None);
        raw.num_candidates = 1;
        let menu = Menu::project(&raw, None);
        assert_eq!(menu.labels(), vec!["1"]);
    }

    #[test]
    fn test_paging_flags() {
        let mut raw = raw_menu(2, 5, None);
        raw.page_no = 1;
        raw.is_last_page = true;
        raw.highlighted_candidate_index = 1;
        let menu = Menu::project(&raw, None);
        assert!(menu.has_prev_page());
        assert!(!menu.has_next_page());
        assert_eq!(menu.highlighted().map(|c| c.text.as_str()), Some("cand1"));
    }

    #[test]
    fn test_empty_context_is_not_composing() {
        let ctx = Context::project(&RawContext::default(), None, 0);
        assert!(!ctx.is_composing());
        assert!(!ctx.has_menu());
        assert!(ctx.select_labels.is_empty());
    }

    #[test]
    fn test_status_and_commit_projection() {
        let status = Status::project(&RawStatus {
            schema_id: Some("luna_pinyin".into()),
            schema_name: None,
            is_ascii_mode: true,
            ..Default::default()
        });
        assert_eq!(status.schema_id, "luna_pinyin");
        assert_eq!(status.schema_name, "");
        assert!(status.is_ascii_mode);

        assert!(Commit::project(&RawCommit { text: None }).is_none());
        let commit = Commit::project(&RawCommit { text: Some("你好".into()) }).unwrap();
        assert_eq!(commit.text, "你好");
    }
}
