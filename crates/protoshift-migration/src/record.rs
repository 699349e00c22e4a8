//! Record data rewrites for the 1.0.0 boundary.
//!
//! From 1.0.0 on, numeric record values travel as strings so that no
//! precision is lost in transit. Going up is schema-free: every number
//! becomes its decimal text. Going down needs the stream schema to know which
//! strings were numbers to begin with.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use protoshift_core::schema::{JsonSchema, SchemaItems, SchemaNode};
use protoshift_core::well_known::WellKnownType;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::LazyLock;

static INTEGER_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(0|[1-9][0-9]*)$").unwrap());
static NUMBER_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$").unwrap()
});
static TIME_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(Z|[+-][0-9]{2}:?[0-9]{2})$").unwrap());

/// Replaces every number inside `data` with its decimal string.
pub fn upgrade_record_data(data: &Value) -> Value {
    match data {
        Value::Number(number) => Value::String(number.to_string()),
        Value::Array(items) => Value::Array(items.iter().map(upgrade_record_data).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), upgrade_record_data(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Turns Integer and Number strings back into JSON numbers, guided by the
/// stream's 1.0.0 schema.
///
/// Values that do not parse, and values the schema says nothing about, are
/// returned unchanged.
pub fn downgrade_record_data(schema: &JsonSchema, data: &Value) -> Value {
    let JsonSchema::Node(node) = schema else {
        return data.clone();
    };

    if let Some(ty) = node.reference.as_deref().and_then(WellKnownType::from_reference) {
        return restore_number(ty, data);
    }

    if let Some(options) = node.one_of.as_ref().or(node.any_of.as_ref()) {
        return match select_option(options, data) {
            Some(option) => downgrade_record_data(option, data),
            None => data.clone(),
        };
    }

    match data {
        Value::Object(fields) => Value::Object(downgrade_object(node, fields)),
        Value::Array(items) => Value::Array(downgrade_array(node, items)),
        other => other.clone(),
    }
}

fn restore_number(ty: WellKnownType, data: &Value) -> Value {
    let Value::String(text) = data else {
        return data.clone();
    };
    let parsed = match ty {
        WellKnownType::Integer => parse_integer(text),
        WellKnownType::Number => parse_integer(text).or_else(|| parse_float(text)),
        _ => None,
    };
    parsed.map(Value::Number).unwrap_or_else(|| data.clone())
}

fn parse_integer(text: &str) -> Option<Number> {
    if !INTEGER_TEXT.is_match(text) {
        return None;
    }
    text.parse::<i64>()
        .map(Number::from)
        .or_else(|_| text.parse::<u64>().map(Number::from))
        .ok()
}

fn parse_float(text: &str) -> Option<Number> {
    if !NUMBER_TEXT.is_match(text) {
        return None;
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// First option the value validates against, or the first option when none does.
fn select_option<'a>(options: &'a [JsonSchema], data: &Value) -> Option<&'a JsonSchema> {
    options
        .iter()
        .find(|option| matches(option, data))
        .or_else(|| options.first())
}

fn downgrade_object(node: &SchemaNode, fields: &Map<String, Value>) -> Map<String, Value> {
    let patterns = compile_patterns(node);

    fields
        .iter()
        .map(|(key, value)| {
            let schema = property_schema(node, &patterns, key);
            let value = match schema {
                Some(schema) => downgrade_record_data(schema, value),
                None => value.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

fn downgrade_array(node: &SchemaNode, items: &[Value]) -> Vec<Value> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item_schema(node, i) {
            Some(schema) => downgrade_record_data(schema, item),
            None => item.clone(),
        })
        .collect()
}

fn compile_patterns(node: &SchemaNode) -> Vec<(Regex, &JsonSchema)> {
    node.pattern_properties
        .iter()
        .flatten()
        .filter_map(|(pattern, schema)| match Regex::new(pattern) {
            Ok(re) => Some((re, schema)),
            Err(e) => {
                tracing::debug!("Ignoring patternProperties entry '{}': {}", pattern, e);
                None
            }
        })
        .collect()
}

/// The schema governing `key`: a declared property, else the first matching
/// pattern, else `additionalProperties`.
fn property_schema<'a>(
    node: &'a SchemaNode,
    patterns: &[(Regex, &'a JsonSchema)],
    key: &str,
) -> Option<&'a JsonSchema> {
    node.properties
        .as_ref()
        .and_then(|properties| properties.get(key))
        .or_else(|| {
            patterns
                .iter()
                .find(|(re, _)| re.is_match(key))
                .map(|(_, schema)| *schema)
        })
        .or(node.additional_properties.as_ref())
}

/// The schema governing the `index`-th array element.
fn item_schema(node: &SchemaNode, index: usize) -> Option<&JsonSchema> {
    match node.items.as_ref() {
        Some(SchemaItems::Single(schema)) => Some(schema),
        Some(SchemaItems::List(list)) => list.get(index).or(node.additional_items.as_ref()),
        None => None,
    }
}

/// Checks whether `data` validates against a 1.0.0 schema.
///
/// Only the keywords that matter for choosing between union options are
/// evaluated; unknown `$ref`s and unevaluated keywords accept anything.
pub fn matches(schema: &JsonSchema, data: &Value) -> bool {
    let node = match schema {
        JsonSchema::Bool(accept) => return *accept,
        JsonSchema::Node(node) => node,
    };

    if let Some(reference) = &node.reference {
        if let Some(ty) = WellKnownType::from_reference(reference) {
            if !matches_well_known(ty, data) {
                return false;
            }
        }
    }

    if let Some(schema_type) = &node.schema_type {
        if !schema_type.names().iter().any(|name| matches_type_name(name, data)) {
            return false;
        }
    }

    if let Some(expected) = node.literal("const") {
        if expected != data {
            return false;
        }
    }
    if let Some(Value::Array(allowed)) = node.literal("enum") {
        if !allowed.contains(data) {
            return false;
        }
    }

    let structure_ok = match data {
        Value::Object(fields) => matches_object(node, fields),
        Value::Array(items) => matches_array(node, items),
        _ => true,
    };
    if !structure_ok {
        return false;
    }

    if let Some(options) = &node.one_of {
        if options.iter().filter(|option| matches(option, data)).count() != 1 {
            return false;
        }
    }
    if let Some(options) = &node.any_of {
        if !options.iter().any(|option| matches(option, data)) {
            return false;
        }
    }
    if let Some(options) = &node.all_of {
        if !options.iter().all(|option| matches(option, data)) {
            return false;
        }
    }
    match &node.not {
        Some(SchemaItems::Single(negated)) => !matches(negated, data),
        Some(SchemaItems::List(negated)) => !negated.iter().any(|option| matches(option, data)),
        None => true,
    }
}

fn matches_object(node: &SchemaNode, fields: &Map<String, Value>) -> bool {
    let patterns = compile_patterns(node);
    fields.iter().all(|(key, value)| {
        property_schema(node, &patterns, key).is_none_or(|schema| matches(schema, value))
    })
}

fn matches_array(node: &SchemaNode, items: &[Value]) -> bool {
    let items_ok = items
        .iter()
        .enumerate()
        .all(|(i, item)| item_schema(node, i).is_none_or(|schema| matches(schema, item)));
    let contains_ok = node
        .contains
        .as_ref()
        .is_none_or(|schema| items.iter().any(|item| matches(schema, item)));
    items_ok && contains_ok
}

fn matches_type_name(name: &str, data: &Value) -> bool {
    match name {
        "null" => data.is_null(),
        "boolean" => data.is_boolean(),
        "string" => data.is_string(),
        "number" => data.is_number(),
        "integer" => data.is_i64() || data.is_u64(),
        "object" => data.is_object(),
        "array" => data.is_array(),
        _ => false,
    }
}

fn matches_well_known(ty: WellKnownType, data: &Value) -> bool {
    if ty == WellKnownType::Boolean {
        return data.is_boolean();
    }
    let Value::String(text) = data else {
        return false;
    };
    match ty {
        WellKnownType::String => true,
        WellKnownType::Boolean => false,
        WellKnownType::Integer => INTEGER_TEXT.is_match(text),
        WellKnownType::Number => NUMBER_TEXT.is_match(text),
        WellKnownType::BinaryData => BASE64.decode(text).is_ok(),
        WellKnownType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
        WellKnownType::TimestampWithTimezone => DateTime::parse_from_rfc3339(text).is_ok(),
        WellKnownType::TimestampWithoutTimezone => {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        }
        WellKnownType::TimeWithTimezone => matches_time_with_offset(text),
        WellKnownType::TimeWithoutTimezone => NaiveTime::parse_from_str(text, "%H:%M:%S%.f").is_ok(),
    }
}

fn matches_time_with_offset(text: &str) -> bool {
    match NaiveTime::parse_and_remainder(text, "%H:%M:%S%.f") {
        Ok((_, offset)) => TIME_OFFSET.is_match(offset),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wkt(name: &str) -> Value {
        json!({"$ref": format!("WellKnownTypes.json#/definitions/{}", name)})
    }

    fn downgrade(schema: Value, data: Value) -> Value {
        downgrade_record_data(&JsonSchema::from_value(&schema).unwrap(), &data)
    }

    #[test]
    fn test_upgrade_stringifies_numbers() {
        let data = json!({
            "int": 42,
            "float": 42.0,
            "float2": 42.2,
            "sub_object": {"sub_int": 42, "sub_float": 42.0, "sub_float2": 42.2},
            "sub_array": [42, 42.0, 42.2]
        });
        let expected = json!({
            "int": "42",
            "float": "42.0",
            "float2": "42.2",
            "sub_object": {"sub_int": "42", "sub_float": "42.0", "sub_float2": "42.2"},
            "sub_array": ["42", "42.0", "42.2"]
        });
        assert_eq!(upgrade_record_data(&data), expected);
        assert_eq!(upgrade_record_data(&json!(42)), json!("42"));
    }

    #[test]
    fn test_upgrade_leaves_non_numbers() {
        let data = json!({
            "boolean": true,
            "string": "arst",
            "sub_object": {"boolean": true, "string": "arst", "nothing": null},
            "sub_array": [true, "arst"]
        });
        assert_eq!(upgrade_record_data(&data), data);
    }

    #[test]
    fn test_basic_downgrade() {
        assert_eq!(downgrade(wkt("Integer"), json!("42")), json!(42));
        assert_eq!(downgrade(wkt("Number"), json!("43.2")), json!(43.2));
        assert_eq!(downgrade(wkt("String"), json!("42")), json!("42"));
    }

    #[test]
    fn test_nested_downgrade() {
        let schema = json!({
            "type": "object",
            "properties": {
                "int": wkt("Integer"),
                "num": wkt("Number"),
                "binary": wkt("BinaryData"),
                "bool": wkt("Boolean"),
                "object": {
                    "type": "object",
                    "properties": {
                        "int": wkt("Integer"),
                        "arr": {"type": "array", "items": wkt("Integer")}
                    }
                },
                "array": {"type": "array", "items": wkt("Integer")},
                "array_multitype": {"type": "array", "items": [wkt("Integer"), wkt("String")]},
                "oneof": {"type": "array", "items": {"oneOf": [wkt("Integer"), wkt("Boolean")]}}
            }
        });
        let data = json!({
            "int": "42",
            "num": "43.2",
            "string": "42",
            "bool": true,
            "object": {"int": "42"},
            "array": ["42"],
            "array_multitype": ["42", "42"],
            "oneof": ["42", true],
            "additionalProperty": "42"
        });
        let expected = json!({
            "int": 42,
            "num": 43.2,
            "string": "42",
            "bool": true,
            "object": {"int": 42},
            "array": [42],
            "array_multitype": [42, "42"],
            "oneof": [42, true],
            "additionalProperty": "42"
        });
        assert_eq!(downgrade(schema, data), expected);
    }

    #[test]
    fn test_weird_downgrade() {
        let union_schema = json!({
            "type": ["array", "object"],
            "items": {
                "type": "object",
                "properties": {"id": wkt("Integer"), "name": wkt("String")}
            },
            "properties": {"id": wkt("Integer"), "name": wkt("String")}
        });
        let schema = json!({
            "type": "object",
            "properties": {
                "raw_int": wkt("Integer"),
                "raw_num": wkt("Number"),
                "bad_int": wkt("Integer"),
                "typeless_object": {"properties": {"foo": wkt("Integer")}},
                "typeless_array": {"items": wkt("Integer")},
                "arr_obj_union1": union_schema.clone(),
                "arr_obj_union2": union_schema,
                "empty_oneof": {"oneOf": []}
            }
        });
        let data = json!({
            "raw_int": 42,
            "raw_num": 43.2,
            "bad_int": "foo",
            "typeless_object": {"foo": "42"},
            "typeless_array": ["42"],
            "arr_obj_union1": [{"id": "42", "name": "arst"}, {"id": "43", "name": "qwfp"}],
            "arr_obj_union2": {"id": "42", "name": "arst"},
            "empty_oneof": "42"
        });
        let expected = json!({
            "raw_int": 42,
            "raw_num": 43.2,
            "bad_int": "foo",
            "typeless_object": {"foo": 42},
            "typeless_array": [42],
            "arr_obj_union1": [{"id": 42, "name": "arst"}, {"id": 43, "name": "qwfp"}],
            "arr_obj_union2": {"id": 42, "name": "arst"},
            "empty_oneof": "42"
        });
        assert_eq!(downgrade(schema, data), expected);
    }

    #[test]
    fn test_empty_schemas_leave_data_alone() {
        let schema = json!({
            "type": "object",
            "properties": {
                "empty_schema_primitive": {},
                "empty_schema_array": {},
                "empty_schema_object": {},
                "implicit_array": {"items": wkt("Integer")},
                "implicit_object": {"properties": {"foo": wkt("Integer")}}
            }
        });
        let data = json!({
            "empty_schema_primitive": "42",
            "empty_schema_array": ["42", false],
            "empty_schema_object": {"foo": "42"},
            "implicit_array": ["42"],
            "implicit_object": {"foo": "42"}
        });
        let expected = json!({
            "empty_schema_primitive": "42",
            "empty_schema_array": ["42", false],
            "empty_schema_object": {"foo": "42"},
            "implicit_array": [42],
            "implicit_object": {"foo": 42}
        });
        assert_eq!(downgrade(schema, data), expected);
    }

    #[test]
    fn test_backtracking_picks_matching_option() {
        let schema = json!({
            "type": "object",
            "properties": {
                "valid_option": {"oneOf": [wkt("Boolean"), wkt("Integer"), wkt("String")]},
                "all_invalid": {
                    "oneOf": [
                        {"type": "array", "items": wkt("Integer")},
                        {"type": "array", "items": wkt("Boolean")}
                    ]
                },
                "nested_oneof": {
                    "oneOf": [
                        {"type": "array", "items": wkt("Integer")},
                        {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {"foo": {"oneOf": [wkt("Boolean"), wkt("Integer")]}}
                            }
                        }
                    ]
                },
                "mismatched_primitive": {
                    "oneOf": [
                        {"type": "object", "properties": {"foo": {"type": "object"}, "bar": wkt("String")}},
                        {"type": "object", "properties": {"foo": wkt("Boolean"), "bar": wkt("Integer")}}
                    ]
                },
                "mismatched_text": {
                    "oneOf": [
                        {"type": "object", "properties": {"foo": {"type": "object"}, "bar": wkt("String")}},
                        {"type": "object", "properties": {"foo": wkt("String"), "bar": wkt("Integer")}}
                    ]
                },
                "mismatch_array": {
                    "oneOf": [
                        {"type": "array", "items": wkt("Integer")},
                        {"type": "array", "items": [wkt("String"), wkt("String"), wkt("Integer")]}
                    ]
                }
            }
        });
        let data = json!({
            "valid_option": "42",
            "all_invalid": ["42", "arst"],
            "nested_oneof": [{"foo": "42"}],
            "mismatched_primitive": {"foo": true, "bar": "42"},
            "mismatched_text": {"foo": "bar", "bar": "42"},
            "mismatch_array": ["arst", "41", "42"]
        });
        let expected = json!({
            "valid_option": 42,
            "all_invalid": [42, "arst"],
            "nested_oneof": [{"foo": 42}],
            "mismatched_primitive": {"foo": true, "bar": 42},
            "mismatched_text": {"foo": "bar", "bar": 42},
            "mismatch_array": ["arst", "41", 42]
        });
        assert_eq!(downgrade(schema, data), expected);
    }

    #[test]
    fn test_unparseable_values_are_kept() {
        let schema = json!({
            "type": "object",
            "properties": {
                "bad_int": wkt("Integer"),
                "bad_int_array": {"type": "array", "items": wkt("Integer")},
                "bad_int_obj": {"type": "object", "properties": {"foo": wkt("Integer")}},
                "float_as_int": wkt("Integer")
            }
        });
        let data = json!({
            "bad_int": "arst",
            "bad_int_array": ["arst"],
            "bad_int_obj": {"foo": "arst"},
            "float_as_int": "4.5"
        });
        assert_eq!(downgrade(schema, data.clone()), data);
    }

    #[test]
    fn test_pattern_and_additional_properties() {
        let schema = json!({
            "type": "object",
            "properties": {"id": wkt("String")},
            "patternProperties": {"^int_": wkt("Integer")},
            "additionalProperties": wkt("Number")
        });
        let data = json!({"id": "1", "int_a": "2", "other": "3.5"});
        assert_eq!(downgrade(schema, data), json!({"id": "1", "int_a": 2, "other": 3.5}));
    }

    #[test]
    fn test_well_known_matching() {
        assert!(matches_well_known(WellKnownType::Date, &json!("2024-02-29")));
        assert!(!matches_well_known(WellKnownType::Date, &json!("2024-02-30")));
        assert!(matches_well_known(WellKnownType::TimestampWithTimezone, &json!("2024-01-01T10:00:00+02:00")));
        assert!(!matches_well_known(WellKnownType::TimestampWithTimezone, &json!("2024-01-01T10:00:00")));
        assert!(matches_well_known(WellKnownType::TimestampWithoutTimezone, &json!("2024-01-01T10:00:00.123")));
        assert!(matches_well_known(WellKnownType::TimeWithTimezone, &json!("10:00:00Z")));
        assert!(matches_well_known(WellKnownType::TimeWithTimezone, &json!("10:00:00.5-05:00")));
        assert!(!matches_well_known(WellKnownType::TimeWithTimezone, &json!("10:00:00")));
        assert!(matches_well_known(WellKnownType::TimeWithoutTimezone, &json!("23:59:59")));
        assert!(matches_well_known(WellKnownType::BinaryData, &json!("aGVsbG8=")));
        assert!(!matches_well_known(WellKnownType::BinaryData, &json!("not base64!")));
        assert!(matches_well_known(WellKnownType::Number, &json!("-1.5e3")));
        assert!(!matches_well_known(WellKnownType::Integer, &json!(42)));
        assert!(matches_well_known(WellKnownType::Boolean, &json!(false)));
    }

    #[test]
    fn test_numeric_text_patterns() {
        for text in ["0", "-7", "18446744073709551615"] {
            assert!(INTEGER_TEXT.is_match(text), "{}", text);
        }
        for text in ["01", "1.0", "", "+1"] {
            assert!(!INTEGER_TEXT.is_match(text), "{}", text);
        }
        for text in ["0", "-1.25", "6.02e23", "1E-3"] {
            assert!(NUMBER_TEXT.is_match(text), "{}", text);
        }
        for text in ["1.", ".5", "NaN", "inf"] {
            assert!(!NUMBER_TEXT.is_match(text), "{}", text);
        }
        assert!(TIME_OFFSET.is_match("+0530"));
        assert!(!TIME_OFFSET.is_match("+5"));
    }

    #[test]
    fn test_large_integers() {
        assert_eq!(downgrade(wkt("Integer"), json!("18446744073709551615")), json!(u64::MAX));
        let too_big = json!("123456789012345678901234567890");
        assert_eq!(downgrade(wkt("Integer"), too_big.clone()), too_big);
    }
}
