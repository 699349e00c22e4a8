//! Resolved migration paths.

use crate::context::MigrationContext;
use crate::error::MigrationError;
use crate::traits::{MessageMigration, Migration};
use protoshift_core::ProtocolVersion;
use protoshift_core::message::{ConfiguredCatalog, ProtocolMessage};
use std::fmt;

/// Which way a plan moves through the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upgrade,
    Downgrade,
    Identity,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Upgrade => "upgrade",
            Self::Downgrade => "downgrade",
            Self::Identity => "identity",
        };
        f.write_str(name)
    }
}

/// An ordered list of steps between two versions, borrowed from a registry.
///
/// Steps are stored in application order: ascending for an upgrade,
/// descending for a downgrade.
#[derive(Debug, Clone)]
pub struct MigrationPlan<'a> {
    from: ProtocolVersion,
    to: ProtocolVersion,
    direction: Direction,
    steps: Vec<&'a dyn MessageMigration>,
}

impl<'a> MigrationPlan<'a> {
    pub(crate) fn new(
        from: ProtocolVersion,
        to: ProtocolVersion,
        direction: Direction,
        steps: Vec<&'a dyn MessageMigration>,
    ) -> Self {
        Self {
            from,
            to,
            direction,
            steps,
        }
    }

    pub fn from(&self) -> &ProtocolVersion {
        &self.from
    }

    pub fn to(&self) -> &ProtocolVersion {
        &self.to
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn steps(&self) -> &[&'a dyn MessageMigration] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_identity(&self) -> bool {
        self.direction == Direction::Identity
    }

    /// Every version the plan passes through, `from` and `to` included.
    pub fn versions(&self) -> Vec<ProtocolVersion> {
        let mut versions = vec![self.from.clone()];
        versions.extend(self.steps.iter().map(|step| self.step_target(*step)));
        versions
    }

    /// Folds a message through every step of the plan.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns its error wrapped in
    /// `MigrationError::StepFailed`.
    pub fn apply(
        &self,
        message: ProtocolMessage,
        context: &MigrationContext,
    ) -> Result<ProtocolMessage, MigrationError> {
        self.fold(message, |step, message| match self.direction {
            Direction::Downgrade => step.downgrade(message, context),
            _ => step.upgrade(message, context),
        })
    }

    /// Folds a configured catalog through every step of the plan.
    pub fn apply_configured_catalog(
        &self,
        catalog: ConfiguredCatalog,
    ) -> Result<ConfiguredCatalog, MigrationError> {
        self.fold(catalog, |step, catalog| match self.direction {
            Direction::Downgrade => step.downgrade_configured_catalog(catalog),
            _ => step.upgrade_configured_catalog(catalog),
        })
    }

    fn fold<T, F>(&self, mut data: T, mut apply: F) -> Result<T, MigrationError>
    where
        F: FnMut(&dyn MessageMigration, T) -> Result<T, MigrationError>,
    {
        for (i, step) in self.steps.iter().enumerate() {
            let source = self.step_source(*step);
            let target = self.step_target(*step);
            tracing::debug!(
                "Migration step {}/{}: {} -> {} ({}, {})",
                i + 1,
                self.steps.len(),
                source,
                target,
                self.direction,
                step.description()
            );

            data = apply(*step, data)
                .map_err(|e| MigrationError::step_failed(&source, &target, e))?;
        }
        Ok(data)
    }

    fn step_source(&self, step: &dyn MessageMigration) -> ProtocolVersion {
        match self.direction {
            Direction::Downgrade => step.current_version(),
            _ => step.previous_version(),
        }
    }

    fn step_target(&self, step: &dyn MessageMigration) -> ProtocolVersion {
        match self.direction {
            Direction::Downgrade => step.previous_version(),
            _ => step.current_version(),
        }
    }
}
