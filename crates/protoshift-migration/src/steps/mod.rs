//! Concrete protocol migration steps.
//!
//! | step | versions |
//! |---|---|
//! | [`SpecProtocolVersionMigration`] | 0.0.0 → 0.1.0 |
//! | [`TraceMessagesMigration`] | 0.1.0 → 0.2.0 |
//! | [`PerStreamStateMigration`] | 0.2.0 → 0.3.0 |
//! | [`WellKnownTypesMigration`] | 0.3.0 → 1.0.0 |

mod per_stream_state;
mod spec_protocol_version;
mod trace_messages;
mod well_known_types;

pub use per_stream_state::PerStreamStateMigration;
pub use spec_protocol_version::SpecProtocolVersionMigration;
pub use trace_messages::TraceMessagesMigration;
pub use well_known_types::WellKnownTypesMigration;

use crate::traits::MessageMigration;
use protoshift_core::ProtocolVersion;
use protoshift_core::message::ProtocolMessage;
use std::sync::Arc;

/// Every step, oldest first.
pub fn all_steps() -> Vec<Arc<dyn MessageMigration>> {
    vec![
        Arc::new(SpecProtocolVersionMigration),
        Arc::new(TraceMessagesMigration),
        Arc::new(PerStreamStateMigration),
        Arc::new(WellKnownTypesMigration),
    ]
}

/// Rewrites an advertised protocol version to the version a step produced.
///
/// SPEC messages without a `protocol_version` are left alone.
pub(crate) fn stamp_spec_version(mut message: ProtocolMessage, version: ProtocolVersion) -> ProtocolMessage {
    if let Some(spec) = message.spec.as_mut() {
        if spec.protocol_version.is_some() {
            spec.protocol_version = Some(version);
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Migration;
    use protoshift_core::message::ConnectorSpecification;
    use serde_json::json;

    #[test]
    fn test_steps_form_a_chain() {
        let steps = all_steps();
        for pair in steps.windows(2) {
            assert_eq!(pair[0].current_version(), pair[1].previous_version());
        }
        assert_eq!(steps[0].previous_version(), ProtocolVersion::new(0, 0, 0));
        assert_eq!(steps[3].current_version(), ProtocolVersion::new(1, 0, 0));
    }

    #[test]
    fn test_stamp_only_touches_present_versions() {
        let with_version = ProtocolMessage::from_spec(
            ConnectorSpecification::new(json!({})).with_protocol_version(ProtocolVersion::new(0, 1, 0)),
        );
        let stamped = stamp_spec_version(with_version, ProtocolVersion::new(0, 2, 0));
        assert_eq!(
            stamped.spec.unwrap().protocol_version,
            Some(ProtocolVersion::new(0, 2, 0))
        );

        let without = ProtocolMessage::from_spec(ConnectorSpecification::new(json!({})));
        let stamped = stamp_spec_version(without.clone(), ProtocolVersion::new(0, 2, 0));
        assert_eq!(stamped, without);
    }
}
