//! The protocol message envelope.
//!
//! Connectors and the platform exchange one JSON object per line. The object
//! is discriminated by `type`, and exactly the payload field matching that
//! type is expected to be set. Fields this model does not know about are kept
//! in `additional_properties` (and in the `extras` map of each payload) so
//! that a message survives a decode/encode cycle field-for-field.

mod catalog;
mod record;
mod spec;
mod state;
mod trace;

pub use catalog::{Catalog, ConfiguredCatalog, ConfiguredStream, Stream};
pub use record::RecordMessage;
pub use spec::ConnectorSpecification;
pub use state::{GlobalState, StateMessage, StateType, StreamDescriptor, StreamState};
pub use trace::{ErrorTraceMessage, LogLevel, LogMessage, TraceMessage, TraceType};

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::Display;

/// Message kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Record,
    State,
    Log,
    Spec,
    ConnectionStatus,
    Catalog,
    Trace,
    Control,
}

/// A single protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ConnectorSpecification>,
    #[serde(
        rename = "connectionStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub connection_status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Catalog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<Value>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl ProtocolMessage {
    /// A message of the given kind with no payload.
    pub fn empty(message_type: MessageType) -> Self {
        Self {
            message_type,
            log: None,
            spec: None,
            connection_status: None,
            catalog: None,
            record: None,
            state: None,
            trace: None,
            control: None,
            additional_properties: Map::new(),
        }
    }

    pub fn from_spec(spec: ConnectorSpecification) -> Self {
        Self {
            spec: Some(spec),
            ..Self::empty(MessageType::Spec)
        }
    }

    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: Some(catalog),
            ..Self::empty(MessageType::Catalog)
        }
    }

    pub fn from_record(record: RecordMessage) -> Self {
        Self {
            record: Some(record),
            ..Self::empty(MessageType::Record)
        }
    }

    pub fn from_state(state: StateMessage) -> Self {
        Self {
            state: Some(state),
            ..Self::empty(MessageType::State)
        }
    }

    pub fn from_trace(trace: TraceMessage) -> Self {
        Self {
            trace: Some(trace),
            ..Self::empty(MessageType::Trace)
        }
    }

    pub fn from_log(log: LogMessage) -> Self {
        Self {
            log: Some(log),
            ..Self::empty(MessageType::Log)
        }
    }

    /// Decodes one line of the wire format.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Serialization` when the line is not a valid
    /// message object.
    pub fn from_json_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim_end_matches(['\r', '\n']))?)
    }

    /// Encodes the message as a single line without a trailing newline.
    pub fn to_json_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ProtocolVersion;
    use serde_json::json;

    #[test]
    fn test_decode_spec_line() {
        let line = r#"{"type":"SPEC","spec":{"protocol_version":"0.2.0","connectionSpecification":{}}}"#;
        let message = ProtocolMessage::from_json_line(line).unwrap();

        assert_eq!(message.message_type, MessageType::Spec);
        let spec = message.spec.as_ref().unwrap();
        assert_eq!(spec.protocol_version, Some(ProtocolVersion::new(0, 2, 0)));
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let value = json!({
            "type": "RECORD",
            "record": {"stream": "s", "data": {"a": 1}, "emitted_at": 5},
            "future_field": {"nested": [1, 2]}
        });

        let message: ProtocolMessage = serde_json::from_value(value.clone()).unwrap();
        assert!(message.additional_properties.contains_key("future_field"));
        assert_eq!(serde_json::to_value(&message).unwrap(), value);
    }

    #[test]
    fn test_line_codec() {
        let message = ProtocolMessage::from_log(LogMessage::new(LogLevel::Info, "hello"));
        let line = message.to_json_line().unwrap();
        assert!(!line.contains('\n'));

        let decoded = ProtocolMessage::from_json_line(&format!("{}\n", line)).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_type_only_message() {
        let message = ProtocolMessage::from_json_line(r#"{"type":"RECORD"}"#).unwrap();
        assert_eq!(message, ProtocolMessage::empty(MessageType::Record));
        assert_eq!(MessageType::ConnectionStatus.to_string(), "CONNECTION_STATUS");
    }

    #[test]
    fn test_invalid_line_is_serialization_error() {
        let err = ProtocolMessage::from_json_line("{\"type\":\"NOPE\"}").unwrap_err();
        assert!(err.is_serialization());
        assert!(ProtocolMessage::from_json_line("not json").is_err());
    }
}
