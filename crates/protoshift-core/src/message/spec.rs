use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The document a connector advertises in answer to `spec`.
///
/// `protocol_version` is the only place a message states its own protocol
/// version; every other kind is versioned out-of-band by its producer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectorSpecification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<ProtocolVersion>,
    #[serde(
        rename = "documentationUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub documentation_url: Option<String>,
    #[serde(rename = "changelogUrl", default, skip_serializing_if = "Option::is_none")]
    pub changelog_url: Option<String>,
    #[serde(
        rename = "connectionSpecification",
        default,
        skip_serializing_if = "Value::is_null"
    )]
    pub connection_specification: Value,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl ConnectorSpecification {
    pub fn new(connection_specification: Value) -> Self {
        Self {
            connection_specification,
            ..Self::default()
        }
    }

    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = Some(version);
        self
    }

    /// The advertised version, or [`ProtocolVersion::DEFAULT`] when absent.
    pub fn protocol_version_or_default(&self) -> ProtocolVersion {
        self.protocol_version.clone().unwrap_or(ProtocolVersion::DEFAULT)
    }
}
