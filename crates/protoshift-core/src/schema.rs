//! JSON Schema value tree.
//!
//! Stream schemas are read into a closed tree before any rewrite. Every
//! keyword whose value is itself a schema gets its own typed slot; everything
//! else (`default`, `enum`, `const`, `format`, `description`, ...) lands in
//! [`SchemaNode::literals`] as untyped JSON. The structural walkers below have
//! no case that descends into `literals`, so object-shaped literal payloads
//! are never mistaken for nested schemas.
//!
//! Boolean schemas and the empty object schema both mean "anything" and are
//! carried through every walk unchanged.

use crate::error::SchemaError;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

pub const KEY_TYPE: &str = "type";
pub const KEY_REF: &str = "$ref";
pub const KEY_PROPERTIES: &str = "properties";
pub const KEY_PATTERN_PROPERTIES: &str = "patternProperties";
pub const KEY_ADDITIONAL_PROPERTIES: &str = "additionalProperties";
pub const KEY_ITEMS: &str = "items";
pub const KEY_ADDITIONAL_ITEMS: &str = "additionalItems";
pub const KEY_CONTAINS: &str = "contains";
pub const KEY_ONE_OF: &str = "oneOf";
pub const KEY_ANY_OF: &str = "anyOf";
pub const KEY_ALL_OF: &str = "allOf";
pub const KEY_NOT: &str = "not";
pub const KEY_FORMAT: &str = "format";
pub const KEY_AIRBYTE_TYPE: &str = "airbyte_type";
pub const KEY_CONTENT_ENCODING: &str = "contentEncoding";

/// Ordered mapping from property name (or pattern) to schema.
pub type SchemaMap = IndexMap<String, JsonSchema>;

/// A schema value: either a boolean schema or an object schema.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonSchema {
    Bool(bool),
    Node(Box<SchemaNode>),
}

/// The `type` keyword: one name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaType {
    Single(String),
    Union(Vec<String>),
}

/// A keyword holding either one schema or an ordered list of schemas.
///
/// `items` uses the list form for tuple arrays. `not` is stored as a list by
/// some producers; both forms are kept exactly as found.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaItems {
    Single(JsonSchema),
    List(Vec<JsonSchema>),
}

/// An object schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaNode {
    pub schema_type: Option<SchemaType>,
    pub reference: Option<String>,
    pub properties: Option<SchemaMap>,
    pub pattern_properties: Option<SchemaMap>,
    pub additional_properties: Option<JsonSchema>,
    pub items: Option<SchemaItems>,
    pub additional_items: Option<JsonSchema>,
    pub contains: Option<JsonSchema>,
    pub one_of: Option<Vec<JsonSchema>>,
    pub any_of: Option<Vec<JsonSchema>>,
    pub all_of: Option<Vec<JsonSchema>>,
    pub not: Option<SchemaItems>,
    /// Every other keyword, kept as opaque JSON in source order.
    pub literals: Map<String, Value>,
    pub key_order: KeyOrder,
}

/// Keyword order of a node as read from JSON.
///
/// Written keywords follow it; keywords the source did not have come last,
/// in the fixed order of [`SchemaNode`]'s fields. Order never takes part in
/// equality, matching JSON object semantics.
#[derive(Debug, Clone, Default)]
pub struct KeyOrder(Vec<String>);

impl KeyOrder {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self(keys.into_iter().collect())
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|k| k == key)
    }
}

impl PartialEq for KeyOrder {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl SchemaType {
    /// All declared names, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Union(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Declared names with `"null"` removed, in declaration order.
    pub fn non_null_names(&self) -> Vec<&str> {
        self.names().into_iter().filter(|name| *name != "null").collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().contains(&name)
    }
}

impl JsonSchema {
    /// The empty object schema `{}`.
    pub fn empty() -> Self {
        Self::Node(Box::default())
    }

    /// A `{"$ref": reference}` schema.
    pub fn reference(reference: impl Into<String>) -> Self {
        Self::Node(Box::new(SchemaNode {
            reference: Some(reference.into()),
            ..SchemaNode::default()
        }))
    }

    pub fn node(node: SchemaNode) -> Self {
        Self::Node(Box::new(node))
    }

    pub fn as_node(&self) -> Option<&SchemaNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Bool(_) => None,
        }
    }

    /// True for boolean schemas and `{}`: schemas carrying no type information.
    pub fn is_trivial(&self) -> bool {
        match self {
            Self::Bool(_) => true,
            Self::Node(node) => node.is_empty(),
        }
    }

    /// Reads a schema from JSON.
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` carrying the JSON pointer of the first value
    /// that cannot be read as a schema or keyword.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        read_schema(value, "")
    }

    /// Writes the schema back to JSON.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Node(node) => Value::Object(node.to_map()),
        }
    }
}

impl SchemaNode {
    /// True when the node has no keywords at all.
    pub fn is_empty(&self) -> bool {
        self.schema_type.is_none()
            && self.reference.is_none()
            && !self.has_subschemas()
            && self.literals.is_empty()
    }

    /// True when any schema-valued keyword is present.
    pub fn has_subschemas(&self) -> bool {
        self.properties.is_some()
            || self.pattern_properties.is_some()
            || self.additional_properties.is_some()
            || self.items.is_some()
            || self.additional_items.is_some()
            || self.contains.is_some()
            || self.one_of.is_some()
            || self.any_of.is_some()
            || self.all_of.is_some()
            || self.not.is_some()
    }

    pub fn literal(&self, key: &str) -> Option<&Value> {
        self.literals.get(key)
    }

    /// A literal keyword's value when it is a string.
    pub fn literal_str(&self, key: &str) -> Option<&str> {
        self.literals.get(key).and_then(Value::as_str)
    }

    pub fn format(&self) -> Option<&str> {
        self.literal_str(KEY_FORMAT)
    }

    pub fn airbyte_type(&self) -> Option<&str> {
        self.literal_str(KEY_AIRBYTE_TYPE)
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.literal_str(KEY_CONTENT_ENCODING)
    }

    /// Rebuilds the node with every direct subschema passed through `f`.
    ///
    /// `f` receives each subschema together with its pointer relative to this
    /// node (`"properties/id"`, `"items/0"`, `"not"`, ...). The node's type,
    /// reference and literals are copied unchanged.
    pub fn try_map_subschemas<E, F>(&self, mut f: F) -> Result<SchemaNode, E>
    where
        F: FnMut(&JsonSchema, &str) -> Result<JsonSchema, E>,
    {
        Ok(SchemaNode {
            schema_type: self.schema_type.clone(),
            reference: self.reference.clone(),
            properties: map_schema_map(self.properties.as_ref(), KEY_PROPERTIES, &mut f)?,
            pattern_properties: map_schema_map(
                self.pattern_properties.as_ref(),
                KEY_PATTERN_PROPERTIES,
                &mut f,
            )?,
            additional_properties: map_schema(
                self.additional_properties.as_ref(),
                KEY_ADDITIONAL_PROPERTIES,
                &mut f,
            )?,
            items: map_items(self.items.as_ref(), KEY_ITEMS, &mut f)?,
            additional_items: map_schema(self.additional_items.as_ref(), KEY_ADDITIONAL_ITEMS, &mut f)?,
            contains: map_schema(self.contains.as_ref(), KEY_CONTAINS, &mut f)?,
            one_of: map_list(self.one_of.as_ref(), KEY_ONE_OF, &mut f)?,
            any_of: map_list(self.any_of.as_ref(), KEY_ANY_OF, &mut f)?,
            all_of: map_list(self.all_of.as_ref(), KEY_ALL_OF, &mut f)?,
            not: map_items(self.not.as_ref(), KEY_NOT, &mut f)?,
            literals: self.literals.clone(),
            key_order: self.key_order.clone(),
        })
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut entries: Vec<(String, Value)> = Vec::new();

        if let Some(schema_type) = &self.schema_type {
            let value = match schema_type {
                SchemaType::Single(name) => Value::String(name.clone()),
                SchemaType::Union(names) => {
                    Value::Array(names.iter().cloned().map(Value::String).collect())
                }
            };
            entries.push((KEY_TYPE.to_string(), value));
        }
        if let Some(reference) = &self.reference {
            entries.push((KEY_REF.to_string(), Value::String(reference.clone())));
        }
        for (key, value) in &self.literals {
            entries.push((key.clone(), value.clone()));
        }
        if let Some(properties) = &self.properties {
            entries.push((KEY_PROPERTIES.to_string(), schema_map_to_value(properties)));
        }
        if let Some(patterns) = &self.pattern_properties {
            entries.push((KEY_PATTERN_PROPERTIES.to_string(), schema_map_to_value(patterns)));
        }
        if let Some(schema) = &self.additional_properties {
            entries.push((KEY_ADDITIONAL_PROPERTIES.to_string(), schema.to_value()));
        }
        if let Some(items) = &self.items {
            entries.push((KEY_ITEMS.to_string(), items.to_value()));
        }
        if let Some(schema) = &self.additional_items {
            entries.push((KEY_ADDITIONAL_ITEMS.to_string(), schema.to_value()));
        }
        if let Some(schema) = &self.contains {
            entries.push((KEY_CONTAINS.to_string(), schema.to_value()));
        }
        for (key, list) in [
            (KEY_ONE_OF, &self.one_of),
            (KEY_ANY_OF, &self.any_of),
            (KEY_ALL_OF, &self.all_of),
        ] {
            if let Some(list) = list {
                entries.push((key.to_string(), schema_list_to_value(list)));
            }
        }
        if let Some(not) = &self.not {
            entries.push((KEY_NOT.to_string(), not.to_value()));
        }

        // Stable: keywords unknown to the source keep the fixed order above.
        entries.sort_by_key(|(key, _)| self.key_order.position(key).unwrap_or(usize::MAX));
        entries.into_iter().collect()
    }
}

impl SchemaItems {
    fn to_value(&self) -> Value {
        match self {
            Self::Single(schema) => schema.to_value(),
            Self::List(list) => schema_list_to_value(list),
        }
    }
}

impl TryFrom<&Value> for JsonSchema {
    type Error = SchemaError;

    fn try_from(value: &Value) -> Result<Self, SchemaError> {
        Self::from_value(value)
    }
}

impl From<&JsonSchema> for Value {
    fn from(schema: &JsonSchema) -> Self {
        schema.to_value()
    }
}

impl From<JsonSchema> for Value {
    fn from(schema: JsonSchema) -> Self {
        schema.to_value()
    }
}

impl Serialize for JsonSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JsonSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        JsonSchema::from_value(&value).map_err(serde::de::Error::custom)
    }
}

/// Escapes a name for use as a JSON pointer token (RFC 6901).
pub fn pointer_token(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

/// Appends `suffix` to a JSON pointer.
pub fn join_pointer(base: &str, suffix: &str) -> String {
    format!("{}/{}", base, suffix)
}

/// Short description of a JSON value's kind, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Reading
// ============================================================================

fn read_schema(value: &Value, path: &str) -> Result<JsonSchema, SchemaError> {
    match value {
        Value::Bool(b) => Ok(JsonSchema::Bool(*b)),
        Value::Object(map) => read_node(map, path).map(JsonSchema::node),
        other => Err(SchemaError::not_a_schema(path, json_kind(other))),
    }
}

fn read_node(map: &Map<String, Value>, path: &str) -> Result<SchemaNode, SchemaError> {
    let mut node = SchemaNode {
        key_order: KeyOrder::new(map.keys().cloned()),
        ..SchemaNode::default()
    };

    for (key, value) in map {
        let key_path = join_pointer(path, &pointer_token(key));
        match key.as_str() {
            KEY_TYPE => node.schema_type = Some(read_type(value, path)?),
            KEY_REF => match value {
                Value::String(reference) => node.reference = Some(reference.clone()),
                other => {
                    return Err(SchemaError::mismatch(path, "$ref", "a string", json_kind(other)));
                }
            },
            KEY_PROPERTIES => {
                node.properties = Some(read_schema_map(value, "properties", &key_path)?);
            }
            KEY_PATTERN_PROPERTIES => {
                node.pattern_properties =
                    Some(read_schema_map(value, "patternProperties", &key_path)?);
            }
            KEY_ADDITIONAL_PROPERTIES => {
                node.additional_properties = Some(read_schema(value, &key_path)?);
            }
            KEY_ITEMS => node.items = Some(read_items(value, "items", &key_path)?),
            KEY_ADDITIONAL_ITEMS => node.additional_items = Some(read_schema(value, &key_path)?),
            KEY_CONTAINS => node.contains = Some(read_schema(value, &key_path)?),
            KEY_ONE_OF => node.one_of = Some(read_list(value, "oneOf", &key_path)?),
            KEY_ANY_OF => node.any_of = Some(read_list(value, "anyOf", &key_path)?),
            KEY_ALL_OF => node.all_of = Some(read_list(value, "allOf", &key_path)?),
            KEY_NOT => node.not = Some(read_items(value, "not", &key_path)?),
            _ => {
                node.literals.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(node)
}

fn read_type(value: &Value, path: &str) -> Result<SchemaType, SchemaError> {
    const EXPECTED: &str = "a type name or a list of type names";
    match value {
        Value::String(name) => Ok(SchemaType::Single(name.clone())),
        Value::Array(entries) => entries
            .iter()
            .map(|entry| match entry {
                Value::String(name) => Ok(name.clone()),
                other => Err(SchemaError::mismatch(path, "type", EXPECTED, json_kind(other))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(SchemaType::Union),
        other => Err(SchemaError::mismatch(path, "type", EXPECTED, json_kind(other))),
    }
}

fn read_schema_map(
    value: &Value,
    keyword: &'static str,
    path: &str,
) -> Result<SchemaMap, SchemaError> {
    let Value::Object(entries) = value else {
        return Err(SchemaError::mismatch(
            path,
            keyword,
            "an object of schemas",
            json_kind(value),
        ));
    };

    entries
        .iter()
        .map(|(name, schema)| {
            let child = join_pointer(path, &pointer_token(name));
            Ok((name.clone(), read_schema(schema, &child)?))
        })
        .collect()
}

fn read_list(value: &Value, keyword: &'static str, path: &str) -> Result<Vec<JsonSchema>, SchemaError> {
    let Value::Array(entries) = value else {
        return Err(SchemaError::mismatch(
            path,
            keyword,
            "a list of schemas",
            json_kind(value),
        ));
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, schema)| read_schema(schema, &join_pointer(path, &i.to_string())))
        .collect()
}

fn read_items(value: &Value, keyword: &'static str, path: &str) -> Result<SchemaItems, SchemaError> {
    match value {
        Value::Array(_) => read_list(value, keyword, path).map(SchemaItems::List),
        Value::Bool(_) | Value::Object(_) => read_schema(value, path).map(SchemaItems::Single),
        other => Err(SchemaError::mismatch(
            path,
            keyword,
            "a schema or a list of schemas",
            json_kind(other),
        )),
    }
}

// ============================================================================
// Writing and mapping
// ============================================================================

fn schema_map_to_value(map: &SchemaMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(name, schema)| (name.clone(), schema.to_value()))
            .collect(),
    )
}

fn schema_list_to_value(list: &[JsonSchema]) -> Value {
    Value::Array(list.iter().map(JsonSchema::to_value).collect())
}

fn map_schema<E, F>(schema: Option<&JsonSchema>, keyword: &str, f: &mut F) -> Result<Option<JsonSchema>, E>
where
    F: FnMut(&JsonSchema, &str) -> Result<JsonSchema, E>,
{
    schema.map(|schema| f(schema, keyword)).transpose()
}

fn map_schema_map<E, F>(map: Option<&SchemaMap>, keyword: &str, f: &mut F) -> Result<Option<SchemaMap>, E>
where
    F: FnMut(&JsonSchema, &str) -> Result<JsonSchema, E>,
{
    map.map(|map| {
        map.iter()
            .map(|(name, schema)| {
                let suffix = join_pointer(keyword, &pointer_token(name));
                Ok((name.clone(), f(schema, &suffix)?))
            })
            .collect::<Result<SchemaMap, E>>()
    })
    .transpose()
}

fn map_list<E, F>(list: Option<&Vec<JsonSchema>>, keyword: &str, f: &mut F) -> Result<Option<Vec<JsonSchema>>, E>
where
    F: FnMut(&JsonSchema, &str) -> Result<JsonSchema, E>,
{
    list.map(|list| {
        list.iter()
            .enumerate()
            .map(|(i, schema)| f(schema, &join_pointer(keyword, &i.to_string())))
            .collect::<Result<Vec<_>, E>>()
    })
    .transpose()
}

fn map_items<E, F>(items: Option<&SchemaItems>, keyword: &str, f: &mut F) -> Result<Option<SchemaItems>, E>
where
    F: FnMut(&JsonSchema, &str) -> Result<JsonSchema, E>,
{
    items
        .map(|items| match items {
            SchemaItems::Single(schema) => f(schema, keyword).map(SchemaItems::Single),
            SchemaItems::List(list) => list
                .iter()
                .enumerate()
                .map(|(i, schema)| f(schema, &join_pointer(keyword, &i.to_string())))
                .collect::<Result<Vec<_>, E>>()
                .map(SchemaItems::List),
        })
        .transpose()
}
