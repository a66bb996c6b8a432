//! Actor coordination runtime.
//!
//! This crate holds the two coordination engines and the worker that drives
//! them. The [`scheduler`] gives each actor at most one countdown-driven,
//! cancellable action; the [`broker`] gives each actor at most one inbound
//! request with sender cooldowns and automatic expiry. Hosts embed [`Runtime`]
//! and talk to it through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`scheduler`] and [`broker`] are the engines, usable without the worker
//! - [`session`] defines the collaborator boundary (directory, notifier, policy)
//! - [`timer`] is the cancellable timer queue both engines share
//! - [`workers`] keeps the background task internal to the crate
pub mod api;
pub mod broker;
pub mod events;
pub mod outcome;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod timer;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use broker::{
    AcceptEffect, AcceptOutcome, BrokerSettings, DenyOutcome, Request, RequestBroker, SendOutcome,
};
pub use events::{BusNotifier, Event, EventBus, RequestEvent, Topic, WarmupEvent};
pub use outcome::{CancelOutcome, DisconnectReport};
pub use runtime::{Runtime, RuntimeBuilder};
pub use scheduler::{
    ActionScheduler, Effect, Resolution, ScheduleOutcome, Ticket, TicketStatus, WarmupEnd,
    WarmupReport, WarmupRequest,
};
pub use session::{
    ActorDirectory, ActorSession, AllowAll, InMemoryDirectory, InteractionPolicy, Notice, Notifier,
    PolicyDenial, SessionEnv, SilentNotifier, ToggleablePolicy,
};
pub use timer::{Fired, TimerHandle, TimerQueue};
pub use workers::{CoordinatorMetrics, MetricsSnapshot};

pub use waystone_core::{
    ActorId, ConfigError, CoordConfig, EffectError, Position, RequestConfig, RequestKind, Tick,
    WorldId,
};
