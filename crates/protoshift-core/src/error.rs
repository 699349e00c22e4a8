//! Error types for the protocol data model.

use thiserror::Error;

/// Errors raised while reading a JSON Schema value tree.
///
/// Paths are JSON pointers relative to the root of the schema being read
/// (`""` is the root itself).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A value in schema position is neither a boolean nor an object.
    #[error("Not a schema at '{path}': expected a boolean or an object, found {found}")]
    NotASchema { path: String, found: &'static str },

    /// A schema keyword holds a value of the wrong JSON shape.
    #[error("Structural mismatch at '{path}': '{keyword}' must be {expected}, found {found}")]
    StructuralMismatch {
        path: String,
        keyword: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

impl SchemaError {
    /// Creates a NotASchema error
    pub fn not_a_schema(path: impl Into<String>, found: &'static str) -> Self {
        Self::NotASchema {
            path: path.into(),
            found,
        }
    }

    /// Creates a StructuralMismatch error
    pub fn mismatch(
        path: impl Into<String>,
        keyword: &'static str,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::StructuralMismatch {
            path: path.into(),
            keyword,
            expected,
            found,
        }
    }

    /// Returns the JSON pointer of the offending node.
    pub fn path(&self) -> &str {
        match self {
            Self::NotASchema { path, .. } | Self::StructuralMismatch { path, .. } => path,
        }
    }
}

/// Errors raised by the protocol model (versions, wire codec, schemas).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A version string is not a plain `major.minor.patch` triple.
    #[error("Invalid protocol version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    /// A message line could not be decoded or encoded.
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// A schema tree is structurally invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ProtocolError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidVersion error
    pub fn invalid_version(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.into(),
            reason: reason.into(),
        }
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an InvalidVersion error
    pub fn is_invalid_version(&self) -> bool {
        matches!(self, Self::InvalidVersion { .. })
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ProtocolError>`.
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_path() {
        let err = SchemaError::mismatch("/properties/id", "items", "a schema or a list of schemas", "a string");
        assert_eq!(err.path(), "/properties/id");
        assert!(err.to_string().contains("'items'"));
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ProtocolError = json_err.into();
        assert!(err.is_serialization());
        assert!(!err.is_invalid_version());
    }
}
