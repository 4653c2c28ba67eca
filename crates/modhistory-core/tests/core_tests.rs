use modhistory_core::{
    CollectConfig, ExclusionRules, HierarchyNode, MetadataRecord, TimestampFormatter,
    WeekdayNames,
};
use std::time::{Duration, UNIX_EPOCH};

fn sample_tree() -> HierarchyNode {
    let mut root = HierarchyNode::empty_directory();
    root.insert(&["a"], None);
    root.insert(&["a", "empty"], None);
    root.insert(
        &["a", "c.log"],
        Some(MetadataRecord::new(
            "2024-01-01 월 09:00:00",
            "2024-01-02 화 10:30:00",
        )),
    );
    root.insert(
        &["top.rs"],
        Some(MetadataRecord::new(
            "2023-05-05 Fri 12:00:00",
            "2023-06-01 Thu 08:15:00",
        )),
    );
    root
}

#[test]
fn test_json_round_trip_preserves_paths_and_records() {
    let tree = sample_tree();
    let json = serde_json::to_string_pretty(&tree).unwrap();
    let back: HierarchyNode = serde_json::from_str(&json).unwrap();

    assert_eq!(back.paths(), tree.paths());
    assert_eq!(back, tree);
    assert!(back.get(&["a", "empty"]).unwrap().is_dir());
}

#[test]
fn test_json_shape_matches_snapshot_format() {
    let tree = sample_tree();
    let value = serde_json::to_value(&tree).unwrap();

    let record = &value["a"]["c.log"];
    assert_eq!(record["Date_of_creation"], "2024-01-01 월 09:00:00");
    assert_eq!(record["Modified_times"][0], "2024-01-02 화 10:30:00");
    assert_eq!(record["Last_modified"], "2024-01-02 화 10:30:00");
    assert_eq!(value["a"]["empty"], serde_json::json!({}));
}

#[test]
fn test_non_ascii_is_not_escaped() {
    let json = serde_json::to_string(&sample_tree()).unwrap();
    assert!(json.contains("월"));
    assert!(!json.contains("\\u"));
}

#[test]
fn test_inconsistent_record_is_rejected() {
    let json = r#"{
        "f": {
            "Date_of_creation": "x",
            "Modified_times": ["a", "b"],
            "Last_modified": "a"
        }
    }"#;
    // Falls back to parsing as a directory, whose children must be nodes.
    assert!(serde_json::from_str::<HierarchyNode>(json).is_err());

    let empty_history = r#"{"Date_of_creation": "x", "Modified_times": [], "Last_modified": "a"}"#;
    assert!(serde_json::from_str::<MetadataRecord>(empty_history).is_err());
}

#[test]
fn test_history_monotonicity() {
    let mut record = MetadataRecord::new("c", "m1");
    for next in ["m2", "m2", "m3", "m1"] {
        record.record_modification(next);
        assert_eq!(
            record.modification_history().last().map(String::as_str),
            Some(record.last_modified_display())
        );
    }
    assert_eq!(record.modification_history(), ["m1", "m2", "m3", "m1"]);
}

#[test]
fn test_formatter_and_rules_from_config() {
    let mut config = CollectConfig::new("/srv");
    config.weekday_names = WeekdayNames::Korean;
    config.exclude_extensions.insert("txt".to_string());

    let formatter = TimestampFormatter::new(config.weekday_names);
    let instant = UNIX_EPOCH + Duration::from_secs(0);
    assert!(formatter.format_in(instant, &chrono::Utc).contains(" 목 "));

    let rules = ExclusionRules::from_config(&config);
    assert!(rules.excludes_file("b.txt"));
    assert!(!rules.excludes_file("c.log"));
}
