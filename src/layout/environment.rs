use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::LayoutError;
use crate::event::Outbox;
use crate::reporting::{AttributeSink, ReportingSink, TracingSink};

/// Collaborators and settings shared by every node of one layout.
pub struct Environment {
    reporter: Arc<dyn ReportingSink>,
    attributes: Arc<dyn AttributeSink>,
    config: EngineConfig,
    outbox: Outbox,
}

impl Environment {
    pub fn new(reporter: Arc<dyn ReportingSink>, attributes: Arc<dyn AttributeSink>) -> Self {
        Self {
            reporter,
            attributes,
            config: EngineConfig::default(),
            outbox: Outbox::new(),
        }
    }

    /// Log-only sinks and the configuration file of the current user.
    pub fn load() -> Result<Self, LayoutError> {
        Ok(Self::default().with_config(EngineConfig::load()?))
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reporter(&self) -> &Arc<dyn ReportingSink> {
        &self.reporter
    }

    pub fn attributes(&self) -> &Arc<dyn AttributeSink> {
        &self.attributes
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink), Arc::new(TracingSink))
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("config", &self.config)
            .field("pending", &self.outbox.len())
            .finish()
    }
}
