use super::stamp_spec_version;
use crate::context::MigrationContext;
use crate::error::MigrationError;
use crate::traits::{MessageMigration, Migration};
use protoshift_core::ProtocolVersion;
use protoshift_core::message::{ProtocolMessage, StateType};

/// Migration from 0.2.0 to 0.3.0.
///
/// Changes:
/// - STATE messages gain a `type` and the per-stream and global forms
/// - untyped state becomes `LEGACY`
#[derive(Debug)]
pub struct PerStreamStateMigration;

impl PerStreamStateMigration {
    const PREVIOUS: ProtocolVersion = ProtocolVersion::new(0, 2, 0);
    const CURRENT: ProtocolVersion = ProtocolVersion::new(0, 3, 0);
}

impl Migration for PerStreamStateMigration {
    fn previous_version(&self) -> ProtocolVersion {
        Self::PREVIOUS
    }

    fn current_version(&self) -> ProtocolVersion {
        Self::CURRENT
    }

    fn description(&self) -> &str {
        "Introduce typed per-stream and global state"
    }
}

impl MessageMigration for PerStreamStateMigration {
    fn upgrade(
        &self,
        mut message: ProtocolMessage,
        _context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        if let Some(state) = message.state.as_mut() {
            if state.is_untyped_legacy() && state.data.is_some() {
                state.state_type = Some(StateType::Legacy);
            }
        }
        Ok(stamp_spec_version(message, Self::CURRENT))
    }

    fn downgrade(
        &self,
        mut message: ProtocolMessage,
        _context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        if let Some(state) = message.state.as_mut() {
            if state.stream.is_some() || state.global.is_some() {
                tracing::warn!(
                    "Dropping {} state for protocol {}; only legacy data is kept",
                    state.state_type.map(|t| t.to_string()).unwrap_or_default(),
                    Self::PREVIOUS
                );
            }
            state.state_type = None;
            state.stream = None;
            state.global = None;
        }
        Ok(stamp_spec_version(message, Self::PREVIOUS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protoshift_core::message::{StateMessage, StreamDescriptor, StreamState};
    use serde_json::{Map, json};

    #[test]
    fn test_version_metadata() {
        assert_eq!(PerStreamStateMigration.previous_version().serialize(), "0.2.0");
        assert_eq!(PerStreamStateMigration.current_version().serialize(), "0.3.0");
    }

    #[test]
    fn test_legacy_state_round_trip() {
        let context = MigrationContext::default();
        let old = ProtocolMessage::from_state(StateMessage::legacy(json!({"cursor": "2024-01-01"})));

        let up = PerStreamStateMigration.upgrade(old.clone(), &context).unwrap();
        assert_eq!(up.state.as_ref().unwrap().state_type, Some(StateType::Legacy));

        let down = PerStreamStateMigration.downgrade(up.clone(), &context).unwrap();
        assert_eq!(down, old);
        assert_eq!(PerStreamStateMigration.upgrade(down, &context).unwrap(), up);
    }

    #[test]
    fn test_per_stream_state_is_dropped_on_downgrade() {
        let state = StateMessage {
            state_type: Some(StateType::Stream),
            stream: Some(StreamState {
                stream_descriptor: StreamDescriptor {
                    name: "users".to_string(),
                    namespace: None,
                },
                stream_state: Some(json!({"cursor": 5})),
                extras: Map::new(),
            }),
            global: None,
            data: Some(json!({"users": {"cursor": 5}})),
            extras: Map::new(),
        };

        let down = PerStreamStateMigration
            .downgrade(ProtocolMessage::from_state(state), &MigrationContext::default())
            .unwrap();

        assert_eq!(
            down.state.unwrap(),
            StateMessage::legacy(json!({"users": {"cursor": 5}}))
        );
    }

    #[test]
    fn test_typed_state_is_not_retagged() {
        let state = StateMessage {
            state_type: Some(StateType::Global),
            ..StateMessage::default()
        };
        let message = ProtocolMessage::from_state(state);
        let up = PerStreamStateMigration
            .upgrade(message.clone(), &MigrationContext::default())
            .unwrap();
        assert_eq!(up, message);
    }
}
