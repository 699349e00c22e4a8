use super::stamp_spec_version;
use crate::context::MigrationContext;
use crate::error::MigrationError;
use crate::traits::{MessageMigration, Migration};
use protoshift_core::ProtocolVersion;
use protoshift_core::message::{LogLevel, LogMessage, MessageType, ProtocolMessage, TraceMessage, TraceType};

/// Migration from 0.1.0 to 0.2.0.
///
/// Changes:
/// - TRACE messages are introduced
///
/// Older consumers do not understand TRACE, so downgrading turns each trace
/// into a LOG line: error traces keep their message at ERROR level, anything
/// else is serialized into a DEBUG line.
#[derive(Debug)]
pub struct TraceMessagesMigration;

impl TraceMessagesMigration {
    const PREVIOUS: ProtocolVersion = ProtocolVersion::new(0, 1, 0);
    const CURRENT: ProtocolVersion = ProtocolVersion::new(0, 2, 0);

    fn trace_to_log(trace: &TraceMessage) -> Result<LogMessage, MigrationError> {
        match (&trace.trace_type, &trace.error) {
            (TraceType::Error, Some(error)) => Ok(LogMessage {
                level: LogLevel::Error,
                message: error.message.clone(),
                stack_trace: error.stack_trace.clone(),
            }),
            _ => Ok(LogMessage::new(LogLevel::Debug, serde_json::to_string(trace)?)),
        }
    }
}

impl Migration for TraceMessagesMigration {
    fn previous_version(&self) -> ProtocolVersion {
        Self::PREVIOUS
    }

    fn current_version(&self) -> ProtocolVersion {
        Self::CURRENT
    }

    fn description(&self) -> &str {
        "Introduce TRACE messages"
    }
}

impl MessageMigration for TraceMessagesMigration {
    fn upgrade(
        &self,
        message: ProtocolMessage,
        _context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        Ok(stamp_spec_version(message, Self::CURRENT))
    }

    fn downgrade(
        &self,
        mut message: ProtocolMessage,
        _context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        if message.message_type == MessageType::Trace {
            if let Some(trace) = message.trace.take() {
                tracing::warn!(
                    "Downgrading {} trace to a log message for protocol {}",
                    trace.trace_type,
                    Self::PREVIOUS
                );
                message.message_type = MessageType::Log;
                message.log = Some(Self::trace_to_log(&trace)?);
            }
        }
        Ok(stamp_spec_version(message, Self::PREVIOUS))
    }
}
