//! Error types for the migration engine.

use protoshift_core::{ProtocolError, ProtocolVersion, ProtocolVersionRange, SchemaError};
use thiserror::Error;

/// Errors raised while planning or applying a migration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MigrationError {
    /// The version is not part of the registry's chain.
    #[error("Unknown protocol version: {version}")]
    UnknownVersion { version: ProtocolVersion },

    /// The version is outside the range the platform is configured to accept.
    #[error("Protocol version {version} is not supported (supported range: {range})")]
    UnsupportedVersion {
        version: ProtocolVersion,
        range: ProtocolVersionRange,
    },

    /// A SPEC message advertises a different version than the caller claimed.
    #[error("Message declares protocol version {declared} but was submitted as {expected}")]
    VersionMismatch {
        declared: ProtocolVersion,
        expected: ProtocolVersion,
    },

    /// A type declaration that maps to no well-known type.
    #[error("Unrecognized schema leaf at '{path}': {reason}")]
    UnrecognizedLeaf { path: String, reason: String },

    /// A schema keyword holds a value of the wrong shape.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A single step of a multi-step migration failed.
    #[error("Migration step {from} -> {to} failed: {source}")]
    StepFailed {
        from: ProtocolVersion,
        to: ProtocolVersion,
        #[source]
        source: Box<MigrationError>,
    },
}

impl MigrationError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an UnknownVersion error
    pub fn unknown_version(version: &ProtocolVersion) -> Self {
        Self::UnknownVersion {
            version: version.clone(),
        }
    }

    /// Creates an UnrecognizedLeaf error
    pub fn unrecognized_leaf(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnrecognizedLeaf {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wraps an error with the step boundary it occurred at
    pub fn step_failed(from: &ProtocolVersion, to: &ProtocolVersion, source: MigrationError) -> Self {
        Self::StepFailed {
            from: from.clone(),
            to: to.clone(),
            source: Box::new(source),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Returns the innermost error, looking through step boundaries.
    pub fn root_cause(&self) -> &MigrationError {
        match self {
            Self::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Check if this is (or wraps) an UnknownVersion error
    pub fn is_unknown_version(&self) -> bool {
        matches!(self.root_cause(), Self::UnknownVersion { .. })
    }

    /// Check if this is (or wraps) an UnsupportedVersion error
    pub fn is_unsupported_version(&self) -> bool {
        matches!(self.root_cause(), Self::UnsupportedVersion { .. })
    }

    /// Check if this is (or wraps) a VersionMismatch error
    pub fn is_version_mismatch(&self) -> bool {
        matches!(self.root_cause(), Self::VersionMismatch { .. })
    }

    /// Check if this is (or wraps) an UnrecognizedLeaf error
    pub fn is_unrecognized_leaf(&self) -> bool {
        matches!(self.root_cause(), Self::UnrecognizedLeaf { .. })
    }

    /// Check if this is (or wraps) a structural schema error
    pub fn is_structural_mismatch(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::Schema(_) | Self::Protocol(ProtocolError::Schema(_))
        )
    }
}

impl From<serde_json::Error> for MigrationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.into())
    }
}

/// Configuration errors detected while building a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Migration registry has no steps")]
    Empty,

    #[error("Duplicate migration step {from} -> {to}")]
    DuplicateStep {
        from: ProtocolVersion,
        to: ProtocolVersion,
    },

    #[error("Migration step {from} -> {to} does not move to a newer version")]
    NonIncreasingStep {
        from: ProtocolVersion,
        to: ProtocolVersion,
    },

    /// Two consecutive steps do not connect.
    #[error("Migration chain broken: expected a step from {expected}, but the next step starts at {found}")]
    Gap {
        expected: ProtocolVersion,
        found: ProtocolVersion,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_looks_through_steps() {
        let inner = MigrationError::unrecognized_leaf("/properties/a", "unknown type 'date'");
        let wrapped = MigrationError::step_failed(
            &ProtocolVersion::new(0, 3, 0),
            &ProtocolVersion::new(1, 0, 0),
            inner.clone(),
        );
        let twice = MigrationError::step_failed(
            &ProtocolVersion::new(0, 2, 0),
            &ProtocolVersion::new(0, 3, 0),
            wrapped.clone(),
        );

        assert_eq!(twice.root_cause(), &inner);
        assert!(twice.is_unrecognized_leaf());
        assert!(!twice.is_unknown_version());
        assert!(wrapped.to_string().contains("0.3.0 -> 1.0.0"));
    }

    #[test]
    fn test_schema_errors_are_structural() {
        let err: MigrationError = SchemaError::not_a_schema("/items", "a number").into();
        assert!(err.is_structural_mismatch());
        assert!(err.to_string().contains("/items"));
    }

    #[test]
    fn test_unknown_version_message() {
        let err = MigrationError::unknown_version(&ProtocolVersion::new(9, 9, 9));
        assert!(err.is_unknown_version());
        assert_eq!(err.to_string(), "Unknown protocol version: 9.9.9");
    }
}
