use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::Display;

/// How a STATE message scopes its checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StateType {
    /// A single opaque blob in `data`.
    Legacy,
    Stream,
    Global,
}

/// A checkpoint emitted by a source.
///
/// Before 0.3.0 a state message only had `data`; the typed forms were
/// introduced together with `type`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateMessage {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub state_type: Option<StateType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamState {
    pub stream_descriptor: StreamDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_state: Option<Value>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_state: Option<Value>,
    #[serde(default)]
    pub stream_states: Vec<StreamState>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl StateMessage {
    /// A pre-0.3.0 state message carrying only `data`.
    pub fn legacy(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// True when only the untyped `data` form is present.
    pub fn is_untyped_legacy(&self) -> bool {
        self.state_type.is_none() && self.stream.is_none() && self.global.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_per_stream_state_shape() {
        let value = json!({
            "type": "STREAM",
            "stream": {
                "stream_descriptor": {"name": "users", "namespace": "public"},
                "stream_state": {"cursor": "2024-01-01"}
            },
            "sourceStats": {"recordCount": 10.0}
        });

        let state: StateMessage = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(state.state_type, Some(StateType::Stream));
        assert_eq!(state.stream.as_ref().unwrap().stream_descriptor.name, "users");
        assert!(!state.is_untyped_legacy());
        assert_eq!(serde_json::to_value(&state).unwrap(), value);
    }

    #[test]
    fn test_legacy_state() {
        let state: StateMessage = serde_json::from_value(json!({"data": {"cursor": 3}})).unwrap();
        assert!(state.is_untyped_legacy());
        assert_eq!(state, StateMessage::legacy(json!({"cursor": 3})));
        assert_eq!(StateType::Legacy.to_string(), "LEGACY");
    }
}
