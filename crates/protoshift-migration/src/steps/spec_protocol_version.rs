use crate::context::MigrationContext;
use crate::error::MigrationError;
use crate::traits::{MessageMigration, Migration};
use protoshift_core::ProtocolVersion;
use protoshift_core::message::ProtocolMessage;

/// Migration from 0.0.0 to 0.1.0.
///
/// Changes:
/// - SPEC messages advertise the protocol version they speak
#[derive(Debug)]
pub struct SpecProtocolVersionMigration;

impl SpecProtocolVersionMigration {
    const PREVIOUS: ProtocolVersion = ProtocolVersion::new(0, 0, 0);
    const CURRENT: ProtocolVersion = ProtocolVersion::new(0, 1, 0);
}

impl Migration for SpecProtocolVersionMigration {
    fn previous_version(&self) -> ProtocolVersion {
        Self::PREVIOUS
    }

    fn current_version(&self) -> ProtocolVersion {
        Self::CURRENT
    }

    fn description(&self) -> &str {
        "Advertise protocol_version in connector specifications"
    }
}

impl MessageMigration for SpecProtocolVersionMigration {
    fn upgrade(
        &self,
        mut message: ProtocolMessage,
        _context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        if let Some(spec) = message.spec.as_mut() {
            spec.protocol_version = Some(Self::CURRENT);
        }
        Ok(message)
    }

    fn downgrade(
        &self,
        mut message: ProtocolMessage,
        _context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        if let Some(spec) = message.spec.as_mut() {
            spec.protocol_version = None;
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protoshift_core::message::{ConnectorSpecification, LogLevel, LogMessage};
    use serde_json::json;

    fn spec_message(version: Option<ProtocolVersion>) -> ProtocolMessage {
        let mut spec = ConnectorSpecification::new(json!({"type": "object"}));
        spec.documentation_url = Some("https://docs.example.com".to_string());
        spec.protocol_version = version;
        ProtocolMessage::from_spec(spec)
    }

    #[test]
    fn test_version_metadata() {
        let step = SpecProtocolVersionMigration;
        assert_eq!(step.previous_version().serialize(), "0.0.0");
        assert_eq!(step.current_version().serialize(), "0.1.0");
    }

    #[test]
    fn test_upgrade_adds_protocol_version() {
        let upgraded = SpecProtocolVersionMigration
            .upgrade(spec_message(None), &MigrationContext::default())
            .unwrap();
        assert_eq!(upgraded, spec_message(Some(ProtocolVersion::new(0, 1, 0))));
    }

    #[test]
    fn test_round_trip() {
        let context = MigrationContext::default();
        let old = spec_message(None);

        let up = SpecProtocolVersionMigration.upgrade(old.clone(), &context).unwrap();
        let down = SpecProtocolVersionMigration.downgrade(up.clone(), &context).unwrap();
        assert_eq!(down, old);
        assert_eq!(SpecProtocolVersionMigration.upgrade(down, &context).unwrap(), up);
    }

    #[test]
    fn test_other_kinds_pass_through() {
        let message = ProtocolMessage::from_log(LogMessage::new(LogLevel::Info, "hi"));
        let context = MigrationContext::default();
        assert_eq!(
            SpecProtocolVersionMigration.upgrade(message.clone(), &context).unwrap(),
            message
        );
        assert_eq!(
            SpecProtocolVersionMigration.downgrade(message.clone(), &context).unwrap(),
            message
        );
    }
}
