//! Per-connector migrators.
//!
//! The platform always works with messages at the registry's latest version.
//! A [`VersionedMigrator`] is bound to the version a connector speaks and
//! converts in both directions: `upgrade` for messages the connector emits,
//! `downgrade` for messages sent to it.

use crate::config::MigrationConfig;
use crate::context::MigrationContext;
use crate::error::MigrationError;
use crate::registry::MigrationRegistry;
use protoshift_core::message::{ConfiguredCatalog, ProtocolMessage};
use protoshift_core::{ProtocolVersion, ProtocolVersionRange};
use std::sync::Arc;

/// Hands out migrators for connector versions the platform supports.
#[derive(Debug, Clone)]
pub struct MigratorFactory {
    registry: Arc<MigrationRegistry>,
    supported: ProtocolVersionRange,
}

impl MigratorFactory {
    pub fn new(registry: Arc<MigrationRegistry>, config: &MigrationConfig) -> Self {
        Self {
            registry,
            supported: config.supported_range(),
        }
    }

    pub fn supported_range(&self) -> &ProtocolVersionRange {
        &self.supported
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Returns a migrator bound to `version`.
    ///
    /// # Errors
    ///
    /// - `UnsupportedVersion` when the major version is outside the configured range
    /// - `UnknownVersion` when the registry has no such version
    pub fn migrator_for(&self, version: &ProtocolVersion) -> Result<VersionedMigrator, MigrationError> {
        if !self.supported.is_supported(version) {
            return Err(MigrationError::UnsupportedVersion {
                version: version.clone(),
                range: self.supported.clone(),
            });
        }
        if !self.registry.is_known(version) {
            return Err(MigrationError::unknown_version(version));
        }

        Ok(VersionedMigrator {
            registry: Arc::clone(&self.registry),
            version: version.clone(),
        })
    }
}

/// Converts between one connector version and the latest version.
#[derive(Debug, Clone)]
pub struct VersionedMigrator {
    registry: Arc<MigrationRegistry>,
    version: ProtocolVersion,
}

impl VersionedMigrator {
    /// The connector's protocol version.
    pub fn version(&self) -> &ProtocolVersion {
        &self.version
    }

    pub fn latest_version(&self) -> &ProtocolVersion {
        self.registry.latest_version()
    }

    /// Connector version → latest.
    pub fn upgrade(
        &self,
        message: ProtocolMessage,
        context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        self.registry
            .transform_with_context(message, &self.version, self.latest_version(), context)
    }

    /// Latest → connector version.
    pub fn downgrade(
        &self,
        message: ProtocolMessage,
        context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        self.registry
            .transform_with_context(message, self.latest_version(), &self.version, context)
    }

    pub fn upgrade_configured_catalog(
        &self,
        catalog: ConfiguredCatalog,
    ) -> Result<ConfiguredCatalog, MigrationError> {
        self.registry
            .transform_configured_catalog(catalog, &self.version, self.latest_version())
    }

    pub fn downgrade_configured_catalog(
        &self,
        catalog: ConfiguredCatalog,
    ) -> Result<ConfiguredCatalog, MigrationError> {
        self.registry
            .transform_configured_catalog(catalog, self.latest_version(), &self.version)
    }
}
