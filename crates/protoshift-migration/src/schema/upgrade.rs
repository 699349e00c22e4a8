//! Schema normalizer: inline type declarations to well-known type references.
//!
//! Rules, applied top-down:
//!
//! - booleans and `{}` are returned unchanged
//! - a node without `type` is only descended into
//! - `"null"` is dropped from type lists; a single survivor is treated as a
//!   plain `type` string, several survivors become a `oneOf`
//! - `object`/`array` nodes keep their keywords and have their subschemas
//!   normalized
//! - primitive leaves are replaced by `{"$ref": <token>}`
//!
//! An `airbyte_type` hint on a declaration that lists any primitive type wins
//! over the listed types. Some producers emit contradictory declarations such
//! as `{"type": ["boolean", "string"], "airbyte_type": "timestamp_with_timezone"}`
//! and these must keep resolving to the hinted type.

use crate::error::MigrationError;
use protoshift_core::schema::{JsonSchema, SchemaNode, SchemaType, join_pointer};
use protoshift_core::well_known::WellKnownType;

const PRIMITIVE_TYPES: [&str; 4] = ["string", "number", "integer", "boolean"];

/// Rewrites a schema into its normalized form.
///
/// # Errors
///
/// Returns `MigrationError::UnrecognizedLeaf` (with the JSON pointer of the
/// offending node) when a type declaration maps to no well-known type.
pub fn upgrade_schema(schema: &JsonSchema) -> Result<JsonSchema, MigrationError> {
    normalize(schema, "")
}

fn normalize(schema: &JsonSchema, path: &str) -> Result<JsonSchema, MigrationError> {
    let node = match schema {
        JsonSchema::Bool(_) => return Ok(schema.clone()),
        JsonSchema::Node(node) if node.is_empty() => return Ok(schema.clone()),
        JsonSchema::Node(node) => node,
    };

    let Some(schema_type) = &node.schema_type else {
        return descend(node, path).map(JsonSchema::node);
    };

    let names = schema_type.non_null_names();
    if names.is_empty() {
        return Err(MigrationError::unrecognized_leaf(
            path,
            "type list declares no type other than null",
        ));
    }

    if let Some(hint) = node.airbyte_type() {
        if names.iter().any(|name| PRIMITIVE_TYPES.contains(name)) {
            let resolved = WellKnownType::from_airbyte_type(hint).ok_or_else(|| {
                MigrationError::unrecognized_leaf(path, format!("unknown airbyte_type '{}'", hint))
            })?;
            return Ok(JsonSchema::reference(resolved.reference()));
        }
    }

    match names.as_slice() {
        [single] => normalize_single(node, single, path),
        many => normalize_union(node, many, path),
    }
}

fn descend(node: &SchemaNode, path: &str) -> Result<SchemaNode, MigrationError> {
    node.try_map_subschemas(|child, suffix| normalize(child, &join_pointer(path, suffix)))
}

fn normalize_single(node: &SchemaNode, name: &str, path: &str) -> Result<JsonSchema, MigrationError> {
    match name {
        "object" | "array" => {
            let mut normalized = descend(node, path)?;
            normalized.schema_type = Some(SchemaType::Single(name.to_string()));
            Ok(JsonSchema::node(normalized))
        }
        primitive => primitive_reference(node, primitive, path),
    }
}

/// Splits a multi-type declaration into one `oneOf` option per type.
///
/// Keywords are stored once at the parent level, so every option sees the
/// same `format` and structural keywords. Each container option keeps only
/// the keywords of its own type.
fn normalize_union(node: &SchemaNode, names: &[&str], path: &str) -> Result<JsonSchema, MigrationError> {
    let options = names
        .iter()
        .map(|name| match *name {
            "object" => normalize(&JsonSchema::node(object_branch(node)), path),
            "array" => normalize(&JsonSchema::node(array_branch(node)), path),
            primitive => primitive_reference(node, primitive, path),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(JsonSchema::node(SchemaNode {
        one_of: Some(options),
        ..SchemaNode::default()
    }))
}

fn object_branch(node: &SchemaNode) -> SchemaNode {
    SchemaNode {
        schema_type: Some(SchemaType::Single("object".to_string())),
        properties: node.properties.clone(),
        pattern_properties: node.pattern_properties.clone(),
        additional_properties: node.additional_properties.clone(),
        ..SchemaNode::default()
    }
}

fn array_branch(node: &SchemaNode) -> SchemaNode {
    SchemaNode {
        schema_type: Some(SchemaType::Single("array".to_string())),
        items: node.items.clone(),
        additional_items: node.additional_items.clone(),
        contains: node.contains.clone(),
        ..SchemaNode::default()
    }
}

fn primitive_reference(node: &SchemaNode, name: &str, path: &str) -> Result<JsonSchema, MigrationError> {
    let resolved = match name {
        "string" => match node.format() {
            Some("date") => WellKnownType::Date,
            Some("date-time") => WellKnownType::TimestampWithTimezone,
            Some("time") => WellKnownType::TimeWithTimezone,
            Some(_) => WellKnownType::String,
            None if node.content_encoding() == Some("base64") => WellKnownType::BinaryData,
            None => WellKnownType::String,
        },
        "number" => WellKnownType::Number,
        "integer" => WellKnownType::Integer,
        "boolean" => WellKnownType::Boolean,
        other => {
            return Err(MigrationError::unrecognized_leaf(
                path,
                format!("unknown type '{}'", other),
            ));
        }
    };
    Ok(JsonSchema::reference(resolved.reference()))
}
