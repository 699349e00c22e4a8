//! Stream schema rewrites for the 1.0.0 boundary.

mod downgrade;
mod upgrade;

pub use downgrade::{downgrade_schema, legacy_declaration};
pub use upgrade::upgrade_schema;

use crate::error::MigrationError;
use protoshift_core::schema::JsonSchema;
use serde_json::Value;

/// Parses, normalizes and re-serializes a raw stream schema.
pub fn upgrade_schema_value(value: &Value) -> Result<Value, MigrationError> {
    let schema = JsonSchema::from_value(value)?;
    Ok(upgrade_schema(&schema)?.to_value())
}

/// Parses, denormalizes and re-serializes a raw stream schema.
pub fn downgrade_schema_value(value: &Value) -> Result<Value, MigrationError> {
    let schema = JsonSchema::from_value(value)?;
    Ok(downgrade_schema(&schema).to_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_through_both_directions() {
        let legacy = json!({
            "type": "object",
            "properties": {
                "id": {"type": "number", "airbyte_type": "integer"},
                "name": {"type": "string"},
                "created_at": {"type": "string", "format": "date-time", "airbyte_type": "timestamp_with_timezone"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "payload": {"type": ["string", "object"], "properties": {"k": {"type": "boolean"}}}
            }
        });

        let upgraded = upgrade_schema_value(&legacy).unwrap();
        assert_ne!(upgraded, legacy);
        assert_eq!(downgrade_schema_value(&upgraded).unwrap(), legacy);
    }

    #[test]
    fn test_structural_errors_surface() {
        let err = upgrade_schema_value(&json!({"properties": []})).unwrap_err();
        assert!(err.is_structural_mismatch());

        let err = downgrade_schema_value(&json!({"items": 1})).unwrap_err();
        assert!(err.is_structural_mismatch());
    }
}
