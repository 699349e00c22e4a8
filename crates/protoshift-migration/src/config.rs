//! Migration engine configuration.
//!
//! The only knob today is the range of protocol versions the platform is
//! willing to talk to. Stored as TOML:
//!
//! ```toml
//! protocol_version_min = "0.0.0"
//! protocol_version_max = "1.0.0"
//! ```

use anyhow::{Context, Result, bail};
use protoshift_core::{ProtocolVersion, ProtocolVersionRange};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_min() -> ProtocolVersion {
    ProtocolVersion::new(0, 0, 0)
}

fn default_max() -> ProtocolVersion {
    ProtocolVersion::new(1, 0, 0)
}

/// Supported protocol version bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    #[serde(default = "default_min")]
    pub protocol_version_min: ProtocolVersion,
    #[serde(default = "default_max")]
    pub protocol_version_max: ProtocolVersion,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            protocol_version_min: default_min(),
            protocol_version_max: default_max(),
        }
    }
}

impl MigrationConfig {
    /// Parses and validates a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).context("Failed to parse migration config")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read migration config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid migration config: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.protocol_version_min > self.protocol_version_max {
            bail!(
                "protocol_version_min ({}) is greater than protocol_version_max ({})",
                self.protocol_version_min,
                self.protocol_version_max
            );
        }
        Ok(())
    }

    pub fn supported_range(&self) -> ProtocolVersionRange {
        ProtocolVersionRange::new(
            self.protocol_version_min.clone(),
            self.protocol_version_max.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::from_toml_str("").unwrap();
        assert_eq!(config, MigrationConfig::default());
        assert_eq!(
            config.supported_range(),
            ProtocolVersionRange::new(ProtocolVersion::new(0, 0, 0), ProtocolVersion::new(1, 0, 0))
        );
    }

    #[test]
    fn test_partial_override() {
        let config = MigrationConfig::from_toml_str(r#"protocol_version_min = "0.2.0""#).unwrap();
        assert_eq!(config.protocol_version_min, ProtocolVersion::new(0, 2, 0));
        assert_eq!(config.protocol_version_max, ProtocolVersion::new(1, 0, 0));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = MigrationConfig::from_toml_str(
            "protocol_version_min = \"2.0.0\"\nprotocol_version_max = \"1.0.0\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("greater than"));
    }

    #[test]
    fn test_rejects_invalid_version() {
        assert!(MigrationConfig::from_toml_str(r#"protocol_version_max = "1.0""#).is_err());
        assert!(MigrationConfig::from_toml_str(r#"protocol_version_max = "1.0.0-rc.1""#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "protocol_version_min = \"0.1.0\"").unwrap();
        writeln!(file, "protocol_version_max = \"0.3.0\"").unwrap();

        let config = MigrationConfig::load(file.path()).unwrap();
        assert_eq!(config.protocol_version_min, ProtocolVersion::new(0, 1, 0));
        assert_eq!(config.protocol_version_max, ProtocolVersion::new(0, 3, 0));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let err = MigrationConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
    }
}
