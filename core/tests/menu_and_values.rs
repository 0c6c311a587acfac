// core/tests/menu_and_values.rs
//
// Integration tests for what a host renders: labelled menus and decoded
// config trees, read through the session handle.

use std::path::Path;

use rime_bridge_core::api::{RawCandidate, RawComposition, RawContext, RawMenu};
use rime_bridge_core::testing::MemoryRime;
use rime_bridge_core::{Config, ConfigValue, EngineSession};
use serde_json::json;

fn started_with(api: MemoryRime) -> EngineSession<MemoryRime> {
    let mut session = EngineSession::new(api, Config::default());
    session
        .startup(Path::new("/usr/share/rime-data"), Path::new("/tmp/rime"), false)
        .unwrap();
    session
}

fn started() -> EngineSession<MemoryRime> {
    started_with(MemoryRime::with_sample_data())
}

fn type_ni(s: &EngineSession<MemoryRime>) {
    assert!(s.process_key('n' as i32, 0));
    assert!(s.process_key('i' as i32, 0));
}

#[test]
fn test_digit_labels_by_default() {
    let s = started();
    type_ni(&s);
    let ctx = s.get_context().unwrap();
    assert_eq!(ctx.menu.num_candidates(), 5);
    assert_eq!(ctx.select_labels, vec!["1", "2", "3", "4", "5"]);
    assert!(!ctx.menu.has_prev_page());
    assert!(ctx.menu.has_next_page());
    assert_eq!(ctx.menu.highlighted().map(|c| c.text.as_str()), Some("你"));
}

#[test]
fn test_schema_labels_replace_digits() {
    let s = started();
    assert!(s.select_schema("cangjie5"));
    type_ni(&s);
    let ctx = s.get_context().unwrap();
    assert_eq!(ctx.select_labels, vec!["①", "②", "③", "④", "⑤"]);
}

#[test]
fn test_select_keys_from_config() {
    let api = MemoryRime::with_sample_data();
    api.load_config(
        "default",
        r#"{
            "schema_list": [{"schema": "luna_pinyin"}],
            "menu": {"page_size": "3", "alternative_select_keys": "asdfghjkl"}
        }"#,
    )
    .unwrap();
    let s = started_with(api);
    type_ni(&s);
    let ctx = s.get_context().unwrap();
    // the schema's own page size wins over the default config
    assert_eq!(ctx.menu.page_size, 5);
    assert_eq!(ctx.select_labels, vec!["a", "s", "d", "f", "g"]);
    assert_eq!(ctx.menu.select_keys, "asdfghjkl");
}

#[test]
fn test_next_page_relabels_from_start() {
    let s = started();
    type_ni(&s);
    assert!(s.process_key(0xff56, 0));
    let ctx = s.get_context().unwrap();
    assert_eq!(ctx.menu.page_no, 1);
    assert!(ctx.menu.has_prev_page());
    assert_eq!(ctx.menu.candidates[0].text, "倪");
    assert_eq!(ctx.menu.candidates[0].label, "1");

    assert!(s.select_candidate_on_current_page(1));
    assert_eq!(s.get_commit().unwrap().text, "腻");
}

#[test]
fn test_short_explicit_labels_fall_through() {
    let s = started();
    let candidates: Vec<RawCandidate> = ["甲", "乙", "丙", "丁", "戊"]
        .iter()
        .map(|t| RawCandidate {
            text: t.to_string(),
            comment: None,
        })
        .collect();
    s.api().script_context(Some(RawContext {
        composition: RawComposition::default(),
        menu: RawMenu {
            page_size: 5,
            num_candidates: 4,
            candidates,
            select_keys: Some("xyzuv".to_string()),
            ..RawMenu::default()
        },
        commit_text_preview: None,
        select_labels: Some(vec!["A".to_string(), "B".to_string()]),
    }));

    let ctx = s.get_context().unwrap();
    assert_eq!(ctx.menu.num_candidates(), 4);
    assert_eq!(ctx.select_labels, vec!["A", "B", "z", "u"]);
    assert!(!ctx.is_composing());

    let shown = Config {
        label_separator: Some('.'),
        ..Config::default()
    }
    .display_labels(&ctx);
    assert_eq!(shown, vec!["A.", "B.", "z.", "u."]);
    assert_eq!(s.api().outstanding_buffers(), 0);
}

#[test]
fn test_config_value_matches_json() {
    let s = started();
    let schema_list = s.config_get_value("default", "schema_list").unwrap();
    assert_eq!(
        serde_json::Value::from(schema_list),
        json!([{"schema": "luna_pinyin"}, {"schema": "cangjie5"}])
    );

    let save_options = s.config_get_list("default", "switcher/save_options").unwrap();
    assert_eq!(save_options.len(), 3);
    assert_eq!(save_options[2], ConfigValue::from("simplification"));

    let menu = s.config_get_map("default", "menu").unwrap();
    assert_eq!(menu.get("page_size"), Some(&ConfigValue::from("5")));
    assert!(s.config_get_list("default", "menu").is_none());
}

#[test]
fn test_schema_value_and_info() {
    let s = started();
    let switches = s.schema_get_value("luna_pinyin", "switches").unwrap();
    assert_eq!(switches.as_list().map(<[ConfigValue]>::len), Some(3));
    assert_eq!(
        switches.get("@0/states/@last").and_then(ConfigValue::as_str),
        Some("西文")
    );

    let info = s.schema_info("luna_pinyin").unwrap();
    assert_eq!(info.name, "朙月拼音");
    assert_eq!(info.switches[0].reset, Some(0));
    assert!(s.schema_get_value("missing", "switches").is_none());
    assert_eq!(s.api().open_configs(), 0);
}
