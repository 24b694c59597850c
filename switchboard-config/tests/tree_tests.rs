use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use switchboard_config::{
    Choice, ConfigError, ConfigTree, EntryValue, FieldDescription, FieldType,
};

fn flat_schema() -> Vec<FieldDescription> {
    vec![
        FieldDescription::string("host"),
        FieldDescription::password("token"),
        FieldDescription::boolean("enabled"),
        FieldDescription::integer("port"),
        FieldDescription::enumeration("unit", ["celsius", "fahrenheit"]),
    ]
}

fn device_schema(min: usize) -> Vec<FieldDescription> {
    vec![FieldDescription::repeated(
        "devices",
        min,
        vec![
            FieldDescription::string("name"),
            FieldDescription::integer("address"),
        ],
    )]
}

fn auth_schema() -> Vec<FieldDescription> {
    vec![FieldDescription::nested_enum(
        "auth",
        vec![
            Choice::nested("none", vec![]),
            Choice::nested(
                "basic",
                vec![
                    FieldDescription::string("user"),
                    FieldDescription::password("password"),
                ],
            ),
        ],
    )]
}

// ── Structure ────────────────────────────────────────────────────

#[test]
fn structure_preserves_declaration_order() {
    let tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    let names: Vec<&str> = tree.names().collect();
    assert_eq!(names, ["host", "token", "enabled", "port", "unit"]);
    assert!(tree.is_configurable());
    assert_eq!(tree.len(), 5);
}

#[test]
fn empty_structure_is_not_configurable() {
    let tree = ConfigTree::from_structure(&[]).unwrap();
    assert!(!tree.is_configurable());
    assert!(tree.is_empty());
}

#[test]
fn initial_values() {
    let tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    assert_eq!(
        tree.get_config(),
        json!({
            "host": "",
            "token": "",
            "enabled": false,
            "port": -1,
            "unit": "celsius"
        })
    );
}

#[test]
fn entry_reports_declared_type() {
    let tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    assert_eq!(tree.entry("token").unwrap().field_type(), FieldType::Password);
    assert_eq!(tree.entry("unit").unwrap().field_type(), FieldType::Enum);
    assert_eq!(tree.entry("unit").unwrap().choices(), ["celsius", "fahrenheit"]);
}

#[test]
fn metadata_is_kept() {
    let schema = vec![FieldDescription::string("host")
        .with_description("Bridge address")
        .with_i18n("apps.bridge.host")];
    let tree = ConfigTree::from_structure(&schema).unwrap();
    let entry = tree.entry("host").unwrap();
    assert_eq!(entry.description(), Some("Bridge address"));
    assert_eq!(entry.i18n(), Some("apps.bridge.host"));
}

#[test]
fn redeclaring_a_field_replaces_it_in_place() {
    let mut tree = ConfigTree::for_owner("Hue");
    tree.set_structure(&flat_schema()).unwrap();
    tree.set_structure(&[FieldDescription::boolean("host")]).unwrap();
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.names().next(), Some("host"));
    assert_eq!(tree.entry("host").unwrap().field_type(), FieldType::Bool);
    assert_eq!(tree.owner(), Some("Hue"));
}

#[test]
fn structure_from_gateway_json() {
    let mut tree = ConfigTree::for_owner("Weather");
    tree.set_structure_json(&json!([{"name": "city", "type": "str"}]))
        .unwrap();
    assert_eq!(tree.get_config(), json!({"city": ""}));
}

#[test]
fn enum_without_choices_is_invalid() {
    let schema = vec![FieldDescription::new("mode", FieldType::Enum)];
    let err = ConfigTree::from_structure(&schema).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSchema { .. }));
}

#[test]
fn nested_enum_with_plain_choices_is_invalid() {
    let mut field = FieldDescription::enumeration("auth", ["none"]);
    field.field_type = FieldType::NestedEnum;
    let err = ConfigTree::from_structure(&[field]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSchema { .. }));
}

// ── Round trip ───────────────────────────────────────────────────

#[test]
fn scalar_round_trip() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    let payload = json!({
        "host": "10.0.0.4",
        "token": "s3cret",
        "enabled": true,
        "port": 8080,
        "unit": "fahrenheit"
    });
    tree.set_config(&payload).unwrap();
    assert_eq!(tree.get_config(), payload);
}

#[test]
fn int_from_numeric_string() {
    let mut tree = ConfigTree::from_structure(&[FieldDescription::integer("threshold")]).unwrap();
    tree.set_config(&json!({"threshold": "42"})).unwrap();
    assert_eq!(tree.get_config(), json!({"threshold": 42}));
}

#[test]
fn int_from_garbage_becomes_minus_one() {
    let mut tree = ConfigTree::from_structure(&[FieldDescription::integer("threshold")]).unwrap();
    tree.set_config(&json!({"threshold": "abc"})).unwrap();
    assert_eq!(tree.get_config(), json!({"threshold": -1}));
}

#[test]
fn int_coercions() {
    let mut tree = ConfigTree::from_structure(&[FieldDescription::integer("n")]).unwrap();
    for (input, expected) in [
        (json!(" 12px"), 12),
        (json!("-7"), -7),
        (json!(3.9), 3),
        (json!(null), -1),
        (json!(true), -1),
        (json!(""), -1),
    ] {
        tree.set_config(&json!({ "n": input })).unwrap();
        assert_eq!(tree.entry("n").unwrap().as_int(), Some(expected), "input {input}");
    }
}

#[test]
fn bool_uses_truthiness() {
    let mut tree = ConfigTree::from_structure(&[FieldDescription::boolean("on")]).unwrap();
    for (input, expected) in [
        (json!(1), true),
        (json!(0), false),
        (json!("yes"), true),
        (json!(""), false),
        (json!(null), false),
    ] {
        tree.set_config(&json!({ "on": input })).unwrap();
        assert_eq!(tree.entry("on").unwrap().as_bool(), Some(expected));
    }
}

#[test]
fn text_null_becomes_empty() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    tree.set_config(&json!({"host": null})).unwrap();
    assert_eq!(tree.get_config()["host"], json!(""));
}

#[test]
fn enum_write_is_not_validated() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    tree.set_config(&json!({"unit": "kelvin"})).unwrap();
    assert_eq!(tree.get_config()["unit"], json!("kelvin"));
}

#[test]
fn enum_keeps_numeric_payload_value() {
    let schema = vec![FieldDescription::enumeration("mode", ["1", "2"])];
    let mut tree = ConfigTree::from_structure(&schema).unwrap();
    tree.set_config(&json!({"mode": 2})).unwrap();
    assert_eq!(tree.get_config(), json!({"mode": 2}));
}

#[test]
fn text_keeps_non_string_payload_value() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    tree.set_config(&json!({"host": 5, "token": false})).unwrap();
    assert_eq!(tree.get_config()["host"], json!(5));
    assert_eq!(tree.get_config()["token"], json!(""));
    assert_eq!(tree.entry("host").unwrap().as_text(), None);
}

#[test]
fn numeric_enum_choices_from_gateway_json() {
    let mut tree = ConfigTree::new();
    tree.set_structure_json(&json!([{"name": "speed", "type": "enum", "choices": [1, 2, 3]}]))
        .unwrap();
    assert_eq!(tree.get_config(), json!({"speed": 1}));
    assert_eq!(tree.entry("speed").unwrap().choices(), [json!(1), json!(2), json!(3)]);

    let speed = tree.entry_mut("speed").unwrap();
    speed.select(3).unwrap();
    assert!(speed.select("3").is_err());
    assert_eq!(tree.get_config(), json!({"speed": 3}));
}

#[test]
fn failed_payload_leaves_tree_unchanged() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    tree.set_config(&json!({"host": "bridge.local", "port": 80})).unwrap();
    let before = tree.clone();

    let err = tree
        .set_config(&json!({"host": "other", "port": 443, "colour": "red"}))
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownField(_)));
    assert_eq!(tree, before);
}

#[test]
fn failed_nested_payload_leaves_tree_unchanged() {
    let mut tree = ConfigTree::from_structure(&device_schema(1)).unwrap();
    let before = tree.clone();
    tree.set_config(&json!({"devices": [{"name": "a", "address": 1}, {"colour": "red"}]}))
        .unwrap_err();
    assert_eq!(tree, before);
}

#[test]
fn partial_payload_keeps_other_fields() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    tree.set_config(&json!({"host": "bridge.local", "port": 80})).unwrap();
    tree.set_config(&json!({"port": 443})).unwrap();
    assert_eq!(tree.get_config()["host"], json!("bridge.local"));
    assert_eq!(tree.get_config()["port"], json!(443));
}

#[test]
fn nested_section_round_trip() {
    let schema = vec![FieldDescription::section(
        "mqtt",
        vec![
            FieldDescription::string("broker"),
            FieldDescription::integer("qos"),
        ],
    )];
    let mut tree = ConfigTree::from_structure(&schema).unwrap();
    let payload = json!({"mqtt": {"broker": "tcp://broker:1883", "qos": 1}});
    tree.set_config(&payload).unwrap();
    assert_eq!(tree.get_config(), payload);
}

proptest! {
    #[test]
    fn round_trip_of_text_bool_and_enum(
        host in "[a-z0-9.]{1,20}",
        token in "[ -~]{1,20}",
        enabled in any::<bool>(),
        fahrenheit in any::<bool>(),
        port in any::<i32>(),
    ) {
        let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
        let payload = json!({
            "host": host,
            "token": token,
            "enabled": enabled,
            "port": port.to_string(),
            "unit": if fahrenheit { "fahrenheit" } else { "celsius" },
        });
        tree.set_config(&payload).unwrap();
        let out = tree.get_config();
        prop_assert_eq!(&out["host"], &payload["host"]);
        prop_assert_eq!(&out["token"], &payload["token"]);
        prop_assert_eq!(&out["enabled"], &payload["enabled"]);
        prop_assert_eq!(&out["unit"], &payload["unit"]);
        prop_assert_eq!(&out["port"], &json!(i64::from(port)));
    }
}

// ── Repeated sections ────────────────────────────────────────────

#[test]
fn repeated_section_starts_at_min() {
    let tree = ConfigTree::from_structure(&device_schema(2)).unwrap();
    let entry = tree.entry("devices").unwrap();
    assert_eq!(entry.sections().len(), 2);
    assert!(!entry.can_remove_section());
    assert_eq!(
        tree.get_config(),
        json!({"devices": [{"name": "", "address": -1}, {"name": "", "address": -1}]})
    );
}

#[test]
fn repeated_section_shrinks_to_incoming_length() {
    let mut tree = ConfigTree::from_structure(&device_schema(1)).unwrap();
    tree.set_config(&json!({"devices": [
        {"name": "a", "address": 1},
        {"name": "b", "address": 2},
        {"name": "c", "address": 3}
    ]}))
    .unwrap();
    assert_eq!(tree.entry("devices").unwrap().sections().len(), 3);

    tree.set_config(&json!({"devices": [{"name": "z", "address": 9}]}))
        .unwrap();
    let entry = tree.entry("devices").unwrap();
    assert_eq!(entry.sections().len(), 1);
    assert!(!entry.can_remove_section());
    assert_eq!(tree.get_config(), json!({"devices": [{"name": "z", "address": 9}]}));
}

#[test]
fn repeated_section_grows_and_reuses_existing_sections() {
    let mut tree = ConfigTree::from_structure(&device_schema(1)).unwrap();
    tree.set_config(&json!({"devices": [
        {"name": "a", "address": 1},
        {"name": "b", "address": 2},
        {"name": "c", "address": 3}
    ]}))
    .unwrap();

    // Only addresses are sent: existing sections keep their names because they
    // are updated in place, new ones start from their defaults.
    tree.set_config(&json!({"devices": [
        {"address": 10}, {"address": 20}, {"address": 30}, {"address": 40}, {"address": 50}
    ]}))
    .unwrap();

    let entry = tree.entry("devices").unwrap();
    assert_eq!(entry.sections().len(), 5);
    assert!(entry.can_remove_section());
    assert_eq!(
        tree.get_config(),
        json!({"devices": [
            {"name": "a", "address": 10},
            {"name": "b", "address": 20},
            {"name": "c", "address": 30},
            {"name": "", "address": 40},
            {"name": "", "address": 50}
        ]})
    );
}

#[test]
fn truncation_does_not_enforce_min() {
    let mut tree = ConfigTree::from_structure(&device_schema(2)).unwrap();
    tree.set_config(&json!({"devices": []})).unwrap();
    let entry = tree.entry("devices").unwrap();
    assert!(entry.sections().is_empty());
    assert!(!entry.can_remove_section());
}

#[test]
fn add_and_remove_sections_respect_min() {
    let mut tree = ConfigTree::from_structure(&device_schema(1)).unwrap();
    assert!(!tree.can_remove_section("devices").unwrap());

    let added = tree.add_section("devices").unwrap();
    added
        .set_config(&json!({"name": "porch", "address": 7}))
        .unwrap();
    assert!(tree.can_remove_section("devices").unwrap());
    assert_eq!(tree.get_config()["devices"][1], json!({"name": "porch", "address": 7}));

    assert!(tree.remove_section("devices").unwrap());
    assert!(!tree.remove_section("devices").unwrap());
    assert_eq!(tree.entry("devices").unwrap().sections().len(), 1);
}

#[test]
fn repeat_group_operations_on_plain_field_fail() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    assert!(matches!(tree.add_section("host"), Err(ConfigError::NotRepeated(_))));
    assert!(matches!(tree.remove_section("host"), Err(ConfigError::NotRepeated(_))));
    assert!(matches!(tree.can_remove_section("host"), Err(ConfigError::NotRepeated(_))));
    assert!(matches!(tree.add_section("nope"), Err(ConfigError::UnknownField(_))));
}

#[test]
fn repeated_section_requires_array() {
    let mut tree = ConfigTree::from_structure(&device_schema(0)).unwrap();
    let err = tree.set_config(&json!({"devices": {"name": "x"}})).unwrap_err();
    assert!(matches!(err, ConfigError::ShapeMismatch { .. }));
}

// ── Nested enums ─────────────────────────────────────────────────

#[test]
fn nested_enum_defaults_to_first_choice() {
    let tree = ConfigTree::from_structure(&auth_schema()).unwrap();
    assert_eq!(tree.get_config(), json!({"auth": ["none", {}]}));
    assert_eq!(tree.entry("auth").unwrap().choices(), ["none", "basic"]);
}

#[test]
fn nested_enum_round_trip() {
    let mut tree = ConfigTree::from_structure(&auth_schema()).unwrap();
    let payload = json!({"auth": ["basic", {"user": "admin", "password": "pw"}]});
    tree.set_config(&payload).unwrap();
    assert_eq!(tree.get_config(), payload);

    let entry = tree.entry("auth").unwrap();
    assert_eq!(entry.as_text(), Some("basic"));
    assert_eq!(
        entry.section().unwrap().entry("user").unwrap().as_text(),
        Some("admin")
    );
}

#[test]
fn nested_enum_branches_keep_their_values_when_switching() {
    let mut tree = ConfigTree::from_structure(&auth_schema()).unwrap();
    tree.set_config(&json!({"auth": ["basic", {"user": "admin"}]}))
        .unwrap();
    tree.set_config(&json!({"auth": ["none", {}]})).unwrap();
    let entry = tree.entry("auth").unwrap();
    assert_eq!(
        entry.branch("basic").unwrap().get_config(),
        json!({"user": "admin", "password": ""})
    );
}

#[test]
fn nested_enum_unknown_choice() {
    let mut tree = ConfigTree::from_structure(&auth_schema()).unwrap();
    let err = tree.set_config(&json!({"auth": ["oauth", {}]})).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownChoice { .. }));
    assert_eq!(tree.entry("auth").unwrap().as_text(), Some("none"));
}

#[test]
fn nested_enum_requires_pair() {
    let mut tree = ConfigTree::from_structure(&auth_schema()).unwrap();
    let err = tree.set_config(&json!({"auth": "basic"})).unwrap_err();
    assert!(matches!(err, ConfigError::ShapeMismatch { .. }));
}

// ── Editing ──────────────────────────────────────────────────────

#[test]
fn select_checks_declared_choices() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    let unit = tree.entry_mut("unit").unwrap();
    unit.select("fahrenheit").unwrap();
    assert!(unit.select("kelvin").is_err());
    assert_eq!(tree.get_config()["unit"], json!("fahrenheit"));
}

#[test]
fn set_value_on_entry() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    tree.entry_mut("port").unwrap().set_value(&json!("1883")).unwrap();
    assert!(matches!(
        tree.entry("port").unwrap().value(),
        EntryValue::Int(1883)
    ));
}

// ── Shape errors ─────────────────────────────────────────────────

#[test]
fn unknown_field_is_an_error() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    let err = tree.set_config(&json!({"colour": "red"})).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownField(name) if name == "colour"));
}

#[test]
fn non_object_payload_is_an_error() {
    let mut tree = ConfigTree::from_structure(&flat_schema()).unwrap();
    let err = tree.set_config(&Value::from(3)).unwrap_err();
    assert!(matches!(err, ConfigError::ShapeMismatch { .. }));
}
