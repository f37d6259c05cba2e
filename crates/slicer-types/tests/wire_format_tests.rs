use serde_json::json;
use slicer_types::*;

#[test]
fn test_sorter_state_wire_shape() {
    let sorter = SorterState::new(
        SortColumn::new("$timestamp - 0", SortType::Datetime).with_subtype(Some(Granularity::Month)),
        SortOrder::Descend,
    );
    let value = serde_json::to_value(&sorter).unwrap();
    assert_eq!(
        value,
        json!({
            "key": "$timestamp - 0",
            "order": "descend",
            "type": "datetime",
            "subtype": "month"
        })
    );
}

#[test]
fn test_group_cell_omits_missing_row_span() {
    let value = serde_json::to_value(GroupCell::value("US")).unwrap();
    assert_eq!(value, json!({"kind": "value", "value": "US"}));

    let value = serde_json::to_value(GroupCell::spanning("US", 0)).unwrap();
    assert_eq!(value, json!({"kind": "value", "value": "US", "row_span": 0}));
}

#[test]
fn test_series_record_flattens_record_fields() {
    let series = SeriesRecord {
        record: AggregateRecord::new(0, "IN", 3.0),
        period: Period::Current,
        data: vec![1.0, 2.0],
        buckets: vec![
            BucketValue {
                label: "Mar 1".to_string(),
                value: 1.0,
            },
            BucketValue {
                label: "Mar 2".to_string(),
                value: 2.0,
            },
        ],
        total: 3.0,
    };
    let value = serde_json::to_value(&series).unwrap();
    assert_eq!(value["label"], json!("IN"));
    assert_eq!(value["period"], json!("current"));
    assert_eq!(series.bucket("Mar 2"), Some(2.0));
    assert_eq!(series.bucket("Mar 3"), None);

    let parsed: SeriesRecord = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, series);
}

#[test]
fn test_visible_set_is_a_plain_label_list() {
    let visible: VisibleSet = serde_json::from_str(r#"["US", "IN"]"#).unwrap();
    assert_eq!(visible.len(), 2);
    assert!(visible.contains("IN"));
    assert!(!visible.contains("FR"));
}
