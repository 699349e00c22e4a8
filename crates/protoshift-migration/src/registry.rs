//! Migration registry holding the linear chain of protocol steps.
//!
//! The chain is built once, validated, and never mutated afterwards, so a
//! registry can be shared freely between threads (usually behind an `Arc`).
//! Paths between two versions are slices of the chain: there is exactly one
//! way to get from any known version to any other.

use crate::context::MigrationContext;
use crate::error::{MigrationError, RegistryError};
use crate::plan::{Direction, MigrationPlan};
use crate::traits::{MessageMigration, Migration};
use protoshift_core::ProtocolVersion;
use protoshift_core::message::{ConfiguredCatalog, ProtocolMessage};
use std::sync::Arc;

/// Collects steps before the chain is validated.
///
/// # Example
///
/// ```ignore
/// let registry = MigrationRegistry::builder()
///     .register_step(Arc::new(SpecProtocolVersionMigration))  // 0.0.0 → 0.1.0
///     .register_step(Arc::new(TraceMessagesMigration))        // 0.1.0 → 0.2.0
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct MigrationRegistryBuilder {
    steps: Vec<Arc<dyn MessageMigration>>,
}

impl MigrationRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single step. Registration order does not matter.
    pub fn register_step(mut self, step: Arc<dyn MessageMigration>) -> Self {
        self.steps.push(step);
        self
    }

    /// Adds several steps at once.
    pub fn register_all(mut self, steps: Vec<Arc<dyn MessageMigration>>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Sorts the steps by their previous version and validates the chain.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no step was registered
    /// - a step does not move to a strictly newer version
    /// - two steps declare the same version pair
    /// - consecutive steps do not connect
    pub fn build(mut self) -> Result<MigrationRegistry, RegistryError> {
        if self.steps.is_empty() {
            return Err(RegistryError::Empty);
        }

        for step in &self.steps {
            if step.previous_version() >= step.current_version() {
                return Err(RegistryError::NonIncreasingStep {
                    from: step.previous_version(),
                    to: step.current_version(),
                });
            }
        }

        self.steps.sort_by_key(|step| (step.previous_version(), step.current_version()));

        for pair in self.steps.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);

            if prev.previous_version() == next.previous_version()
                && prev.current_version() == next.current_version()
            {
                return Err(RegistryError::DuplicateStep {
                    from: next.previous_version(),
                    to: next.current_version(),
                });
            }

            if prev.current_version() != next.previous_version() {
                return Err(RegistryError::Gap {
                    expected: prev.current_version(),
                    found: next.previous_version(),
                });
            }
        }

        let mut versions = Vec::with_capacity(self.steps.len() + 1);
        versions.push(self.steps[0].previous_version());
        versions.extend(self.steps.iter().map(|step| step.current_version()));

        Ok(MigrationRegistry {
            steps: self.steps,
            versions,
        })
    }
}

/// A validated, immutable chain of migration steps.
#[derive(Debug)]
pub struct MigrationRegistry {
    /// Steps in ascending order; `steps[i]` connects `versions[i]` and `versions[i + 1]`.
    steps: Vec<Arc<dyn MessageMigration>>,
    versions: Vec<ProtocolVersion>,
}

impl MigrationRegistry {
    pub fn builder() -> MigrationRegistryBuilder {
        MigrationRegistryBuilder::new()
    }

    /// All versions in the chain, oldest first.
    pub fn known_versions(&self) -> &[ProtocolVersion] {
        &self.versions
    }

    pub fn is_known(&self, version: &ProtocolVersion) -> bool {
        self.versions.contains(version)
    }

    pub fn earliest_version(&self) -> &ProtocolVersion {
        // Non-empty by construction.
        &self.versions[0]
    }

    pub fn latest_version(&self) -> &ProtocolVersion {
        &self.versions[self.versions.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn index_of(&self, version: &ProtocolVersion) -> Result<usize, MigrationError> {
        self.versions
            .iter()
            .position(|v| v == version)
            .ok_or_else(|| MigrationError::unknown_version(version))
    }

    /// Resolves the ordered steps between two versions.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::UnknownVersion` if either version is not part
    /// of the chain. Versions are never rounded to a neighbour.
    pub fn plan_path(
        &self,
        from: &ProtocolVersion,
        to: &ProtocolVersion,
    ) -> Result<MigrationPlan<'_>, MigrationError> {
        let start = self.index_of(from)?;
        let end = self.index_of(to)?;

        let (direction, steps): (Direction, Vec<&dyn MessageMigration>) = if start == end {
            (Direction::Identity, Vec::new())
        } else if start < end {
            (
                Direction::Upgrade,
                self.steps[start..end].iter().map(|s| s.as_ref()).collect(),
            )
        } else {
            (
                Direction::Downgrade,
                self.steps[end..start].iter().rev().map(|s| s.as_ref()).collect(),
            )
        };

        Ok(MigrationPlan::new(from.clone(), to.clone(), direction, steps))
    }

    /// Versions traversed when migrating between `from` and `to`.
    pub fn available_path(
        &self,
        from: &ProtocolVersion,
        to: &ProtocolVersion,
    ) -> Result<Vec<ProtocolVersion>, MigrationError> {
        Ok(self.plan_path(from, to)?.versions())
    }

    /// Migrates a message between two versions with an empty context.
    pub fn transform(
        &self,
        message: ProtocolMessage,
        from: &ProtocolVersion,
        to: &ProtocolVersion,
    ) -> Result<ProtocolMessage, MigrationError> {
        self.transform_with_context(message, from, to, &MigrationContext::default())
    }

    /// Migrates a message between two versions.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - either version is unknown
    /// - a SPEC message advertises a version other than `from`
    /// - any step fails (wrapped in `StepFailed`)
    pub fn transform_with_context(
        &self,
        message: ProtocolMessage,
        from: &ProtocolVersion,
        to: &ProtocolVersion,
        context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        let plan = self.plan_path(from, to)?;

        if let Some(declared) = message
            .spec
            .as_ref()
            .and_then(|spec| spec.protocol_version.as_ref())
        {
            if declared != from {
                return Err(MigrationError::VersionMismatch {
                    declared: declared.clone(),
                    expected: from.clone(),
                });
            }
        }

        if plan.is_identity() {
            tracing::debug!(
                "{} message is already at version {}, no migration needed",
                message.message_type,
                from
            );
            return Ok(message);
        }

        tracing::info!(
            "Starting {} of {} message from {} to {} ({} steps)",
            plan.direction(),
            message.message_type,
            from,
            to,
            plan.len()
        );

        let migrated = plan.apply(message, context)?;

        tracing::info!("Migration completed successfully: {} -> {}", from, to);
        Ok(migrated)
    }

    /// Migrates a configured catalog between two versions.
    pub fn transform_configured_catalog(
        &self,
        catalog: ConfiguredCatalog,
        from: &ProtocolVersion,
        to: &ProtocolVersion,
    ) -> Result<ConfiguredCatalog, MigrationError> {
        let plan = self.plan_path(from, to)?;
        if plan.is_identity() {
            return Ok(catalog);
        }

        tracing::info!(
            "Starting {} of configured catalog from {} to {} ({} steps)",
            plan.direction(),
            from,
            to,
            plan.len()
        );
        plan.apply_configured_catalog(catalog)
    }
}
