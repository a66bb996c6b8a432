//! Builds the runtime and the in-memory collaborators used by hosts.
use std::sync::Arc;

use waystone_runtime::{InMemoryDirectory, Notifier, Runtime, ToggleablePolicy};

use crate::config::HostConfig;
use crate::error::Result;

/// Builder that assembles a runtime around an in-memory session layer.
pub struct HostBuilder {
    config: HostConfig,
    directory: Arc<InMemoryDirectory>,
    policy: Arc<ToggleablePolicy>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl HostBuilder {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            directory: Arc::new(InMemoryDirectory::new()),
            policy: Arc::new(ToggleablePolicy::new()),
            notifier: None,
        }
    }

    /// Share an existing directory, e.g. one already populated by a test.
    pub fn directory(mut self, directory: Arc<InMemoryDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// Deliver notices through `notifier` instead of the event bus.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn build(self) -> Result<HostSetup> {
        let mut builder = Runtime::builder()
            .config(self.config.coord.clone())
            .directory(self.directory.clone())
            .policy(self.policy.clone());

        if let Some(notifier) = self.notifier {
            builder = builder.notifier(notifier);
        }

        let runtime = builder.build().await?;
        tracing::info!(
            tick_rate = self.config.coord.tick_rate,
            source = ?self.config.source,
            "host runtime ready"
        );

        Ok(HostSetup {
            config: self.config,
            directory: self.directory,
            policy: self.policy,
            runtime,
        })
    }
}

pub struct HostSetup {
    pub config: HostConfig,
    pub directory: Arc<InMemoryDirectory>,
    pub policy: Arc<ToggleablePolicy>,
    pub runtime: Runtime,
}
