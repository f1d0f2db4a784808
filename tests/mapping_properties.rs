//! Property tests for path access, field mapping and merging

use mvnomap::{map_with_config, merge::merge_all, ArrayMergePolicy, FieldMapping, FieldPath, SourceField};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

fn arb_path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_key(), 1..4)
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[ -~]{0,12}".prop_map(Value::String),
    ]
}

/// Build `{ a: { b: { c: value } } }` for segments `[a, b, c]`
fn nest(segments: &[String], value: Value) -> Value {
    segments.iter().rev().fold(value, |inner, key| {
        let mut object = Map::new();
        object.insert(key.clone(), inner);
        Value::Object(object)
    })
}

proptest! {
    #[test]
    fn prop_write_then_read(segments in arb_path(), value in arb_scalar()) {
        let path = FieldPath::from_dotted(&segments.join("."));
        let mut record = json!({});

        path.write(&mut record, value.clone()).unwrap();

        prop_assert_eq!(path.read(&record), Some(&value));
        prop_assert_eq!(record, nest(&segments, value));
    }

    #[test]
    fn prop_present_source_is_copied(source_path in arb_path(), target_path in arb_path(), value in arb_scalar()) {
        let source = nest(&source_path, value.clone());
        let mappings = vec![FieldMapping::new(source_path.join(".").as_str(), &target_path.join("."))];

        let output = map_with_config(&source, &mappings).unwrap();

        prop_assert_eq!(output, nest(&target_path, value));
    }

    #[test]
    fn prop_absent_source_leaves_no_key(source_path in arb_path(), target in arb_key()) {
        let source = json!({"unrelated": 1});
        prop_assume!(source_path[0] != "unrelated");
        let mappings = vec![FieldMapping::new(source_path.join(".").as_str(), &target)];

        let output = map_with_config(&source, &mappings).unwrap();

        prop_assert_eq!(output, json!({}));
    }

    #[test]
    fn prop_first_present_candidate_wins(
        values in prop::collection::vec(prop::option::of(arb_scalar()), 1..6),
    ) {
        let mut source = Map::new();
        let mut candidates = Vec::new();
        for (i, value) in values.iter().enumerate() {
            let key = format!("c{}", i);
            if let Some(value) = value {
                source.insert(key.clone(), value.clone());
            }
            candidates.push(key);
        }
        let source = Value::Object(source);
        let field = SourceField::from(candidates.iter().map(String::as_str).collect::<Vec<_>>());

        let expected = values.iter().flatten().next();

        prop_assert_eq!(field.resolve(&source), expected);
    }

    #[test]
    fn prop_later_scalar_wins(key in arb_key(), first in arb_scalar(), second in arb_scalar()) {
        let a = json!({ key.clone(): first });
        let b = json!({ key.clone(): second.clone() });

        let merged = merge_all([&a, &b], ArrayMergePolicy::default());

        prop_assert_eq!(&merged[key.as_str()], &second);
    }
}

#[test]
fn test_scenario_a() {
    let source = json!({"name": "John", "age": 30});
    let mappings = vec![
        FieldMapping::new("name", "userName"),
        FieldMapping::new("age", "userAge"),
    ];

    assert_eq!(
        map_with_config(&source, &mappings).unwrap(),
        json!({"userName": "John", "userAge": 30})
    );
}

#[test]
fn test_scenario_b() {
    let source = json!({"primaryPhone": "555-1234", "contactPhone": "555-5678"});
    let mappings = vec![FieldMapping::new(
        vec!["secondaryPhone", "primaryPhone", "contactPhone"],
        "phone",
    )];

    assert_eq!(
        map_with_config(&source, &mappings).unwrap(),
        json!({"phone": "555-1234"})
    );
}
