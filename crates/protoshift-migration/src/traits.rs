//! Core traits for the migration framework.
//!
//! A migration step sits between two adjacent protocol versions and knows how
//! to move a message across that boundary in both directions.

use crate::context::MigrationContext;
use crate::error::MigrationError;
use protoshift_core::ProtocolVersion;
use protoshift_core::message::{ConfiguredCatalog, ProtocolMessage};

/// Base trait for all migration steps.
///
/// Provides version information and metadata about a step.
pub trait Migration: Send + Sync + std::fmt::Debug {
    /// Returns the older of the two versions this step connects.
    fn previous_version(&self) -> ProtocolVersion;

    /// Returns the newer of the two versions this step connects.
    fn current_version(&self) -> ProtocolVersion;

    /// Returns a human-readable description of this step.
    ///
    /// Used for logging and debugging purposes.
    fn description(&self) -> &str;

    /// Checks if `upgrade` applies to data at the given version.
    fn can_upgrade(&self, version: &ProtocolVersion) -> bool {
        version == &self.previous_version()
    }

    /// Checks if `downgrade` applies to data at the given version.
    fn can_downgrade(&self, version: &ProtocolVersion) -> bool {
        version == &self.current_version()
    }
}

/// A step that rewrites protocol messages.
///
/// Messages are taken by value and a new message is returned; kinds a step
/// does not care about must come back unchanged.
pub trait MessageMigration: Migration {
    /// Moves a message from `previous_version()` to `current_version()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be represented at the newer
    /// version (e.g. a stream schema with an unrecognized type).
    fn upgrade(
        &self,
        message: ProtocolMessage,
        context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError>;

    /// Moves a message from `current_version()` to `previous_version()`.
    ///
    /// Fields unknown to the older version are dropped.
    fn downgrade(
        &self,
        message: ProtocolMessage,
        context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError>;

    /// Moves a configured catalog to the newer version. Identity by default.
    fn upgrade_configured_catalog(
        &self,
        catalog: ConfiguredCatalog,
    ) -> Result<ConfiguredCatalog, MigrationError> {
        Ok(catalog)
    }

    /// Moves a configured catalog to the older version. Identity by default.
    fn downgrade_configured_catalog(
        &self,
        catalog: ConfiguredCatalog,
    ) -> Result<ConfiguredCatalog, MigrationError> {
        Ok(catalog)
    }
}
