use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of stream data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordMessage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emitted_at: Option<i64>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

impl RecordMessage {
    pub fn new(stream: impl Into<String>, data: Value) -> Self {
        Self {
            stream: stream.into(),
            data,
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_wire_shape() {
        let value = json!({
            "stream": "users",
            "namespace": "public",
            "data": {"id": 1},
            "emitted_at": 1_700_000_000_000i64,
            "meta": {"changes": []}
        });

        let record: RecordMessage = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.namespace.as_deref(), Some("public"));
        assert_eq!(record.emitted_at, Some(1_700_000_000_000));
        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }

    #[test]
    fn test_scalar_data_is_allowed() {
        let record: RecordMessage = serde_json::from_value(json!({"data": "42"})).unwrap();
        assert_eq!(record.data, json!("42"));
        assert_eq!(record.stream, "");
    }
}
