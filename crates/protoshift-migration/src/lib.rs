//! Protocol message migration engine.
//!
//! Connectors and the platform may speak different protocol versions. This
//! crate rewrites messages between any two versions of a single linear chain
//! of migration steps. The engine guarantees that:
//!
//! - Steps are applied in order, one version at a time (no skipping)
//! - Unknown versions are rejected, never rounded to a neighbour
//! - A failing step reports the boundary it failed at
//! - Messages are values: every step takes a message and returns a new one
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      MigratorFactory                          │
//! │  (Supported range from MigrationConfig)                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  migrator_for(0.2.0) → VersionedMigrator (0.2.0 ⇄ latest)     │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              V
//!                     MigrationRegistry
//!                      (Linear chain)
//!                              │
//!      ┌───────────────┬───────┴───────┬────────────────┐
//!      V               V               V                V
//!   0.0.0→0.1.0    0.1.0→0.2.0     0.2.0→0.3.0      0.3.0→1.0.0
//!   SpecProtocol   TraceMessages   PerStreamState   WellKnownTypes
//!   Version
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use protoshift_migration::{build_migration_registry, MigrationContext};
//!
//! let registry = build_migration_registry()?;
//! let message = ProtocolMessage::from_json_line(line)?;
//! let latest = registry.transform(message, &connector_version, registry.latest_version())?;
//! ```
//!
//! # Adding a New Protocol Version
//!
//! 1. **Create the step** (`steps/<name>.rs`)
//!    - Implement `Migration` and `MessageMigration`
//!    - Stamp SPEC messages with `stamp_spec_version`
//!
//! 2. **Register it** in `steps::all_steps()`
//!
//! 3. **Raise the default** `protocol_version_max` in `config.rs` if the
//!    major version changed
//!
//! The registry validates the chain on build, so a missing or duplicated link
//! fails at startup.

mod config;
mod context;
mod error;
mod migrator;
mod plan;
mod record;
mod registry;
mod traits;

pub mod schema;
pub mod steps;

pub use config::MigrationConfig;
pub use context::MigrationContext;
pub use error::{MigrationError, RegistryError};
pub use migrator::{MigratorFactory, VersionedMigrator};
pub use plan::{Direction, MigrationPlan};
pub use record::{downgrade_record_data, matches, upgrade_record_data};
pub use registry::{MigrationRegistry, MigrationRegistryBuilder};
pub use traits::{MessageMigration, Migration};

/// Builds the registry with every protocol step.
///
/// # Errors
///
/// Returns an error if the registered steps do not form a valid chain.
pub fn build_migration_registry() -> Result<MigrationRegistry, RegistryError> {
    let registry = MigrationRegistry::builder()
        .register_all(steps::all_steps())
        .build()?;

    tracing::debug!(
        "Protocol migration registry built: {} steps, {} -> {}",
        registry.len(),
        registry.earliest_version(),
        registry.latest_version()
    );
    Ok(registry)
}
