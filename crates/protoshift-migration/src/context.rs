use protoshift_core::message::ConfiguredCatalog;

/// Side information a step may need beyond the message itself.
///
/// Built by the caller for each transform and passed down explicitly; steps
/// never reach for process-wide state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationContext {
    configured_catalog: Option<ConfiguredCatalog>,
}

impl MigrationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the configured catalog of the sync, in the shape of the
    /// newest version being migrated from or to.
    pub fn with_configured_catalog(mut self, catalog: ConfiguredCatalog) -> Self {
        self.configured_catalog = Some(catalog);
        self
    }

    pub fn configured_catalog(&self) -> Option<&ConfiguredCatalog> {
        self.configured_catalog.as_ref()
    }
}
