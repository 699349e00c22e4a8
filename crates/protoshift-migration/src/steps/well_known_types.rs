//! The 1.0.0 migration: well-known types.
//!
//! Stream schemas switch from inline `type`/`format`/`airbyte_type`
//! declarations to references into the well-known type catalog, and numeric
//! record values switch to their string form.

use super::stamp_spec_version;
use crate::context::MigrationContext;
use crate::error::MigrationError;
use crate::record::{downgrade_record_data, upgrade_record_data};
use crate::schema::{downgrade_schema_value, upgrade_schema_value};
use crate::traits::{MessageMigration, Migration};
use protoshift_core::ProtocolVersion;
use protoshift_core::message::{ConfiguredCatalog, ProtocolMessage, RecordMessage, Stream};
use protoshift_core::schema::JsonSchema;
use serde_json::Value;

/// Migration from 0.3.0 to 1.0.0.
///
/// Changes:
/// - catalog stream schemas reference well-known types
/// - record numbers are transmitted as strings
///
/// Downgrading a RECORD needs the stream schema, which is taken from the
/// configured catalog in the [`MigrationContext`].
#[derive(Debug)]
pub struct WellKnownTypesMigration;

impl WellKnownTypesMigration {
    const PREVIOUS: ProtocolVersion = ProtocolVersion::new(0, 3, 0);
    const CURRENT: ProtocolVersion = ProtocolVersion::new(1, 0, 0);

    fn rewrite_schemas<'a>(
        streams: impl Iterator<Item = &'a mut Stream>,
        rewrite: fn(&Value) -> Result<Value, MigrationError>,
    ) -> Result<(), MigrationError> {
        for stream in streams {
            if !stream.json_schema.is_null() {
                stream.json_schema = rewrite(&stream.json_schema)?;
            }
        }
        Ok(())
    }

    fn downgrade_record(
        record: &mut RecordMessage,
        context: &MigrationContext,
    ) -> Result<(), MigrationError> {
        if record.data.is_null() {
            return Ok(());
        }

        let Some(catalog) = context.configured_catalog() else {
            tracing::warn!(
                "No configured catalog available; record for stream '{}' is passed through unchanged",
                record.stream
            );
            return Ok(());
        };

        let Some(stream) = catalog.find_stream(&record.stream, record.namespace.as_deref()) else {
            tracing::warn!(
                "Stream '{}' (namespace {:?}) is not in the configured catalog; record is passed through unchanged",
                record.stream,
                record.namespace
            );
            return Ok(());
        };

        let schema = JsonSchema::from_value(&stream.json_schema)?;
        record.data = downgrade_record_data(&schema, &record.data);
        Ok(())
    }
}

impl Migration for WellKnownTypesMigration {
    fn previous_version(&self) -> ProtocolVersion {
        Self::PREVIOUS
    }

    fn current_version(&self) -> ProtocolVersion {
        Self::CURRENT
    }

    fn description(&self) -> &str {
        "Reference well-known types in schemas and stringify record numbers"
    }
}

impl MessageMigration for WellKnownTypesMigration {
    fn upgrade(
        &self,
        mut message: ProtocolMessage,
        _context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        if let Some(catalog) = message.catalog.as_mut() {
            Self::rewrite_schemas(catalog.streams.iter_mut(), upgrade_schema_value)?;
        }
        if let Some(record) = message.record.as_mut() {
            record.data = upgrade_record_data(&record.data);
        }
        Ok(stamp_spec_version(message, Self::CURRENT))
    }

    fn downgrade(
        &self,
        mut message: ProtocolMessage,
        context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        if let Some(catalog) = message.catalog.as_mut() {
            Self::rewrite_schemas(catalog.streams.iter_mut(), downgrade_schema_value)?;
        }
        if let Some(record) = message.record.as_mut() {
            Self::downgrade_record(record, context)?;
        }
        Ok(stamp_spec_version(message, Self::PREVIOUS))
    }

    fn upgrade_configured_catalog(
        &self,
        mut catalog: ConfiguredCatalog,
    ) -> Result<ConfiguredCatalog, MigrationError> {
        Self::rewrite_schemas(
            catalog.streams.iter_mut().map(|configured| &mut configured.stream),
            upgrade_schema_value,
        )?;
        Ok(catalog)
    }

    fn downgrade_configured_catalog(
        &self,
        mut catalog: ConfiguredCatalog,
    ) -> Result<ConfiguredCatalog, MigrationError> {
        Self::rewrite_schemas(
            catalog.streams.iter_mut().map(|configured| &mut configured.stream),
            downgrade_schema_value,
        )?;
        Ok(catalog)
    }
}
