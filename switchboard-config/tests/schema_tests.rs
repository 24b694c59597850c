use pretty_assertions::assert_eq;
use serde_json::json;
use switchboard_config::{Choice, FieldDescription, FieldType};

// ── Constructors ─────────────────────────────────────────────────

#[test]
fn scalar_shorthands() {
    assert_eq!(FieldDescription::string("host").field_type, FieldType::Str);
    assert_eq!(FieldDescription::password("secret").field_type, FieldType::Password);
    assert_eq!(FieldDescription::boolean("enabled").field_type, FieldType::Bool);
    assert_eq!(FieldDescription::integer("port").field_type, FieldType::Int);
}

#[test]
fn enumeration_keeps_choice_order() {
    let f = FieldDescription::enumeration("mode", ["auto", "manual", "off"]);
    assert_eq!(f.field_type, FieldType::Enum);
    let values: Vec<_> = f.choices.iter().map(Choice::value).collect();
    assert_eq!(values, [json!("auto"), json!("manual"), json!("off")]);
}

#[test]
fn repeated_section_carries_min_and_content() {
    let f = FieldDescription::repeated("devices", 2, vec![FieldDescription::string("ip")]);
    assert_eq!(f.field_type, FieldType::Section);
    assert!(f.repeat);
    assert_eq!(f.min, 2);
    assert_eq!(f.content.len(), 1);
}

#[test]
fn builders_attach_metadata() {
    let f = FieldDescription::string("host")
        .with_description("Hostname of the bridge")
        .with_i18n("apps.hue.host");
    assert_eq!(f.description.as_deref(), Some("Hostname of the bridge"));
    assert_eq!(f.i18n.as_deref(), Some("apps.hue.host"));
}

// ── Deserialization ──────────────────────────────────────────────

#[test]
fn deserializes_gateway_description() {
    let raw = json!([
        {"name": "api_key", "type": "password", "description": "Key"},
        {"name": "interval", "type": "int"},
        {"name": "unit", "type": "enum", "choices": ["C", "F"]},
        {"name": "sensors", "type": "section", "repeat": true, "min": 1,
         "content": [{"name": "id", "type": "int"}]},
        {"name": "auth", "type": "nested_enum", "choices": [
            {"value": "none", "content": []},
            {"value": "basic", "content": [{"name": "user", "type": "str"}]}
        ]}
    ]);
    let schema: Vec<FieldDescription> = serde_json::from_value(raw).unwrap();

    assert_eq!(schema.len(), 5);
    assert_eq!(schema[0].field_type, FieldType::Password);
    assert_eq!(schema[0].description.as_deref(), Some("Key"));
    assert!(!schema[1].repeat);
    assert_eq!(schema[1].min, 0);
    assert_eq!(schema[2].choices, vec![Choice::Plain("C".into()), Choice::Plain("F".into())]);
    assert!(schema[3].repeat);
    assert_eq!(schema[3].min, 1);
    assert_eq!(schema[4].field_type, FieldType::NestedEnum);
    assert_eq!(
        schema[4].choices[1],
        Choice::nested("basic", vec![FieldDescription::string("user")])
    );
}

#[test]
fn enum_choices_may_be_numbers() {
    let schema: Vec<FieldDescription> = serde_json::from_value(json!([
        {"name": "speed", "type": "enum", "choices": [1, 2.5, "max"]}
    ]))
    .unwrap();
    assert_eq!(
        schema[0].choices,
        vec![Choice::Plain(json!(1)), Choice::Plain(json!(2.5)), Choice::Plain(json!("max"))]
    );
}

#[test]
fn field_type_uses_snake_case() {
    assert_eq!(serde_json::to_value(FieldType::NestedEnum).unwrap(), json!("nested_enum"));
    assert_eq!(serde_json::to_value(FieldType::Str).unwrap(), json!("str"));
}

#[test]
fn serialization_skips_defaults() {
    let value = serde_json::to_value(FieldDescription::integer("port")).unwrap();
    assert_eq!(value, json!({"name": "port", "type": "int"}));
}

#[test]
fn unknown_type_is_rejected() {
    let raw = json!([{"name": "x", "type": "float"}]);
    assert!(serde_json::from_value::<Vec<FieldDescription>>(raw).is_err());
}
