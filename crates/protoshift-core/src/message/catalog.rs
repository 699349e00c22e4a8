//! Catalog payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The streams a source can emit, as reported by a CATALOG message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub streams: Vec<Stream>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// A single stream descriptor.
///
/// `json_schema` is kept as raw JSON so that a message carrying a malformed
/// schema still decodes; schema rewrites parse it on demand.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stream {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub json_schema: Value,
    /// `supported_sync_modes`, `source_defined_cursor`, and anything else.
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// The catalog the platform configured for a sync.
///
/// Not a message kind of its own, but it carries stream schemas and so moves
/// between protocol versions together with the messages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfiguredCatalog {
    #[serde(default)]
    pub streams: Vec<ConfiguredStream>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfiguredStream {
    pub stream: Stream,
    /// `sync_mode`, `destination_sync_mode`, `cursor_field`, `primary_key`, ...
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl Stream {
    pub fn new(name: impl Into<String>, json_schema: Value) -> Self {
        Self {
            name: name.into(),
            json_schema,
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// True when the stream is identified by `name` within `namespace`.
    pub fn is_identified_by(&self, name: &str, namespace: Option<&str>) -> bool {
        self.name == name && self.namespace.as_deref() == namespace
    }
}

impl Catalog {
    pub fn new(streams: Vec<Stream>) -> Self {
        Self {
            streams,
            extras: Map::new(),
        }
    }
}

impl ConfiguredCatalog {
    pub fn new(streams: Vec<ConfiguredStream>) -> Self {
        Self {
            streams,
            extras: Map::new(),
        }
    }

    /// Finds the configured stream a record belongs to.
    pub fn find_stream(&self, name: &str, namespace: Option<&str>) -> Option<&Stream> {
        self.streams
            .iter()
            .map(|configured| &configured.stream)
            .find(|stream| stream.is_identified_by(name, namespace))
    }
}

impl From<Stream> for ConfiguredStream {
    fn from(stream: Stream) -> Self {
        Self {
            stream,
            extras: Map::new(),
        }
    }
}
