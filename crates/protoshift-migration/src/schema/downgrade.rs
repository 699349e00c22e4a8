//! Schema denormalizer: well-known type references back to inline declarations.

use protoshift_core::schema::{
    JsonSchema, KEY_AIRBYTE_TYPE, KEY_CONTENT_ENCODING, KEY_FORMAT, SchemaNode, SchemaType,
};
use protoshift_core::well_known::WellKnownType;
use serde_json::{Map, Value};
use std::convert::Infallible;

/// Rewrites a normalized schema into the pre-1.0.0 encoding.
///
/// Well-known references become their legacy declaration. A node holding
/// nothing but a `oneOf` is folded back into a single multi-type declaration
/// when its options allow it; otherwise each option is rewritten on its own.
/// Anything that is not a well-known reference (foreign `$ref`s, old-style
/// declarations, booleans, `{}`) is kept as is.
pub fn downgrade_schema(schema: &JsonSchema) -> JsonSchema {
    let JsonSchema::Node(node) = schema else {
        return schema.clone();
    };

    if let Some(ty) = node.reference.as_deref().and_then(WellKnownType::from_reference) {
        return JsonSchema::node(legacy_declaration(ty));
    }

    if let Some(options) = node.one_of.as_ref().filter(|_| is_bare_one_of(node)) {
        if let Some(merged) = recombine(options) {
            return JsonSchema::node(merged);
        }
    }

    let rewritten = node
        .try_map_subschemas(|child, _| Ok::<_, Infallible>(downgrade_schema(child)))
        .unwrap_or_else(|never| match never {});
    JsonSchema::node(rewritten)
}

/// The declaration a well-known type was written as before 1.0.0.
pub fn legacy_declaration(ty: WellKnownType) -> SchemaNode {
    let mut literals = Map::new();
    if let Some(format) = ty.legacy_format() {
        literals.insert(KEY_FORMAT.to_string(), Value::from(format));
    }
    if let Some(hint) = ty.legacy_airbyte_type() {
        literals.insert(KEY_AIRBYTE_TYPE.to_string(), Value::from(hint));
    }
    if let Some(encoding) = ty.legacy_content_encoding() {
        literals.insert(KEY_CONTENT_ENCODING.to_string(), Value::from(encoding));
    }

    SchemaNode {
        schema_type: Some(SchemaType::Single(ty.legacy_base_type().to_string())),
        literals,
        ..SchemaNode::default()
    }
}

fn is_bare_one_of(node: &SchemaNode) -> bool {
    let bare = SchemaNode {
        one_of: node.one_of.clone(),
        ..SchemaNode::default()
    };
    *node == bare
}

/// Folds `oneOf` options back into one declaration with a type list.
///
/// Returns `None` unless there are at least two options, every option is a
/// well-known reference or an `object`/`array` node, no base type repeats,
/// and no keyword is declared with two different values.
fn recombine(options: &[JsonSchema]) -> Option<SchemaNode> {
    if options.len() < 2 {
        return None;
    }

    let mut merged = SchemaNode::default();
    let mut types: Vec<String> = Vec::with_capacity(options.len());

    for option in options {
        let declaration = recombinable_declaration(option)?;
        let Some(SchemaType::Single(base)) = &declaration.schema_type else {
            return None;
        };
        if types.contains(base) {
            return None;
        }
        types.push(base.clone());

        merge_slot(&mut merged.properties, declaration.properties)?;
        merge_slot(&mut merged.pattern_properties, declaration.pattern_properties)?;
        merge_slot(&mut merged.additional_properties, declaration.additional_properties)?;
        merge_slot(&mut merged.items, declaration.items)?;
        merge_slot(&mut merged.additional_items, declaration.additional_items)?;
        merge_slot(&mut merged.contains, declaration.contains)?;

        for (key, value) in declaration.literals {
            match merged.literals.get(&key) {
                Some(existing) if *existing != value => return None,
                Some(_) => {}
                None => {
                    merged.literals.insert(key, value);
                }
            }
        }
    }

    merged.schema_type = Some(SchemaType::Union(types));
    Some(merged)
}

/// The legacy form of a single `oneOf` option, if it can take part in a
/// recombination.
fn recombinable_declaration(option: &JsonSchema) -> Option<SchemaNode> {
    let node = option.as_node()?;

    if let Some(reference) = &node.reference {
        return WellKnownType::from_reference(reference).map(legacy_declaration);
    }

    let own_keywords_only = match node.schema_type.as_ref()? {
        SchemaType::Single(name) if name == "object" => {
            node.items.is_none() && node.additional_items.is_none() && node.contains.is_none()
        }
        SchemaType::Single(name) if name == "array" => {
            node.properties.is_none()
                && node.pattern_properties.is_none()
                && node.additional_properties.is_none()
        }
        _ => false,
    };
    let combinators = node.one_of.is_some()
        || node.any_of.is_some()
        || node.all_of.is_some()
        || node.not.is_some();
    if !own_keywords_only || combinators {
        return None;
    }

    downgrade_schema(option).as_node().cloned()
}

fn merge_slot<T>(slot: &mut Option<T>, value: Option<T>) -> Option<()> {
    match (slot.as_ref(), value) {
        (_, None) => Some(()),
        (None, Some(value)) => {
            *slot = Some(value);
            Some(())
        }
        (Some(_), Some(_)) => None,
    }
}
