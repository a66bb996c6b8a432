//! High-level runtime orchestrator.
//!
//! The runtime owns the coordinator worker, wires up command/event channels,
//! and exposes a builder-based API for hosts to drive both engines.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use waystone_core::CoordConfig;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::broker::{BrokerSettings, RequestBroker};
use crate::events::{BusNotifier, EventBus};
use crate::scheduler::ActionScheduler;
use crate::session::{ActorDirectory, AllowAll, InteractionPolicy, Notifier};
use crate::workers::{Collaborators, Command, CoordinatorMetrics, CoordinatorWorker};

/// Main runtime that owns the coordinator worker.
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    config: CoordConfig,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Configuration the worker was built with.
    pub fn config(&self) -> &CoordConfig {
        &self.config
    }

    /// Shutdown the runtime gracefully
    ///
    /// Pending actions and requests are dropped; outstanding tickets observe
    /// the drop. Handles cloned earlier start failing with
    /// [`RuntimeError::CommandChannelClosed`].
    pub async fn shutdown(self) -> Result<()> {
        self.handle.request_shutdown().await;
        drop(self.handle);

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: CoordConfig,
    directory: Option<Arc<dyn ActorDirectory>>,
    policy: Option<Arc<dyn InteractionPolicy>>,
    notifier: Option<Arc<dyn Notifier>>,
    event_bus: Option<EventBus>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: CoordConfig::default(),
            directory: None,
            policy: None,
            notifier: None,
            event_bus: None,
        }
    }

    /// Override coordinator configuration
    pub fn config(mut self, config: CoordConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required actor directory
    pub fn directory(mut self, directory: Arc<dyn ActorDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Set the interaction policy consulted on send (default: allow all)
    pub fn policy(mut self, policy: Arc<dyn InteractionPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Set a custom notifier.
    ///
    /// Without one, notices are published on the event bus under
    /// [`crate::Topic::Notice`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Share an existing event bus instead of creating one
    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Build the runtime and spawn the coordinator worker
    ///
    /// Must be called inside a tokio runtime.
    pub async fn build(self) -> Result<Runtime> {
        self.config.validate()?;
        let directory = self.directory.ok_or(RuntimeError::MissingDirectory)?;

        let event_bus = self
            .event_bus
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(BusNotifier::new(event_bus.clone())));
        let policy = self.policy.unwrap_or_else(|| Arc::new(AllowAll));

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let metrics = Arc::new(CoordinatorMetrics::new());

        let handle = RuntimeHandle::new(command_tx, event_bus.clone(), Arc::clone(&metrics));

        let worker = CoordinatorWorker::new(
            ActionScheduler::from_config(&self.config),
            RequestBroker::new(BrokerSettings::from_config(&self.config), policy),
            Collaborators {
                directory,
                notifier,
            },
            self.config.tick_interval(),
            command_rx,
            event_bus,
            metrics,
        );

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            config: self.config,
            worker_handle,
        })
    }
}
