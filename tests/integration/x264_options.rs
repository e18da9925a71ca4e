// Advanced option string tests

use encquery::engine::x264::{
    AdvancedOption, AdvancedOptionSet, X264Field, apply_field_change, apply_widget_change,
    canonicalize_name, standardize,
};
use encquery::engine::{EncodeSettings, generate_query, parse_query};
use proptest::prelude::*;

use crate::common::helpers::*;

#[test]
fn test_frameref_and_ref_are_the_same_option() {
    assert_eq!(canonicalize_name("frameref"), canonicalize_name("ref"));
    assert_eq!(canonicalize_name("ref"), "ref");
}

#[test]
fn test_deblock_widget_quirk() {
    let set = apply_widget_change(
        &AdvancedOptionSet::new(),
        &X264Field::Deblock {
            alpha: None,
            beta: Some(2),
        },
    );
    assert_eq!(set.value_of("deblock").as_deref(), Some("0,2"));

    let mut settings = EncodeSettings::default();
    settings.advanced_options = apply_widget_change(
        &set,
        &X264Field::Deblock {
            alpha: None,
            beta: None,
        },
    );
    assert!(!generate_query(&settings).contains("deblock"));
    assert!(!generate_query(&settings).contains("-x "));
}

#[test]
fn test_widget_edits_keep_unrelated_options() {
    let set = AdvancedOptionSet::parse("ref=4:me=umh:subme=9");
    let set = apply_widget_change(
        &set,
        &X264Field::Value {
            name: "me".to_string(),
            value: Some("esa".to_string()),
        },
    );
    let set = apply_field_change(&set, "bframes", Some("5"));
    assert_eq!(set.to_query_string(), "ref=4:me=esa:subq=9:bframes=5");

    let set = apply_widget_change(
        &set,
        &X264Field::Value {
            name: "me".to_string(),
            value: None,
        },
    );
    assert_eq!(set.to_query_string(), "ref=4:subq=9:bframes=5");
}

#[test]
fn test_unknown_options_pass_through() {
    let set = AdvancedOptionSet::parse("keyint=240:vbv-maxrate=9500");
    assert_eq!(set.len(), 2);
    assert_eq!(
        set.get("keyint"),
        Some(&AdvancedOption::NamedValue {
            name: "keyint".to_string(),
            value: "240".to_string()
        })
    );
}

#[test]
fn test_advanced_options_survive_query_roundtrip() {
    let mut settings = EncodeSettings::new("/in.mkv");
    settings.advanced_options = AdvancedOptionSet::parse("frameref=6:no_fast_pskip:psy-rd=0.9,0.2");
    let query = generate_query(&settings);
    assert!(query.contains("-x ref=6:no-fast-pskip=1:psy-rd=0.9,0.2"));
    assert_eq!(parse_query(&query).advanced_options, settings.advanced_options);
}

proptest! {
    #[test]
    fn prop_standardize_is_idempotent(raw in arb_x264_string()) {
        let once = standardize(&raw);
        prop_assert_eq!(standardize(&once), once);
    }

    #[test]
    fn prop_standardize_keeps_only_canonical_names(raw in arb_x264_string()) {
        for segment in standardize(&raw).split(':').filter(|s| !s.is_empty()) {
            let (name, _) = segment.split_once('=').unwrap();
            prop_assert_eq!(canonicalize_name(name), name);
        }
    }

    #[test]
    fn prop_option_set_never_holds_duplicates(raw in arb_x264_string()) {
        let set = AdvancedOptionSet::parse(&raw);
        let mut names: Vec<&str> = set.iter().map(|o| o.name()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        prop_assert_eq!(names.len(), total);
        prop_assert!(set.iter().all(|o| !o.is_default()));
    }
}
