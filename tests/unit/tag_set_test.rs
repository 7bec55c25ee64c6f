//! Unit tests for tag normalization (`TagSet`) and rename name merging.

use markshelf::types::tag::{merged_tag_name, TagSet};
use rstest::rstest;

#[rstest]
#[case(",tag1,tag2,", &["tag1", "tag2"])]
#[case("tag1, tag2 ,tag3", &["tag1", "tag2", "tag3"])]
#[case("  ", &[])]
#[case("", &[])]
#[case(",,,", &[])]
#[case("a,b,a", &["a", "b"])]
#[case("Rust,rust", &["Rust", "rust"])]
#[case("web dev,tools", &["web dev", "tools"])]
fn test_parse(#[case] raw: &str, #[case] expected: &[&str]) {
    assert_eq!(TagSet::parse(raw).as_slice(), expected);
}

#[test]
fn test_parse_all_unions_in_first_seen_order() {
    let set = TagSet::parse_all([",tag1,tag2,", "tag2,tag3", " "]);
    assert_eq!(set.as_slice(), ["tag1", "tag2", "tag3"]);
}

#[test]
fn test_to_delimited_round_trips() {
    let set = TagSet::parse(" b , a ,c");
    assert_eq!(set.to_delimited(), "b,a,c");
    assert_eq!(TagSet::parse(&set.to_delimited()), set);
}

#[test]
fn test_empty_set() {
    let set = TagSet::new();
    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert_eq!(set.to_delimited(), "");
    assert_eq!(TagSet::parse(""), set);
}

#[test]
fn test_serializes_as_json_array() {
    let set = TagSet::parse("tag1,tag2");
    assert_eq!(serde_json::to_string(&set).unwrap(), r#"["tag1","tag2"]"#);
}

#[rstest]
#[case("tag3,tag4", Some("tag3 tag4"))]
#[case("tag5", Some("tag5"))]
#[case(" ,tag3 , tag4, ", Some("tag3 tag4"))]
#[case("", None)]
#[case(" , ", None)]
fn test_merged_tag_name(#[case] raw: &str, #[case] expected: Option<&str>) {
    assert_eq!(merged_tag_name(raw).as_deref(), expected);
}
