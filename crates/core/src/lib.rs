//! Shared domain types for the actor coordination engines.
//!
//! `waystone-core` defines the identifiers, positions, logical clock and
//! tunable configuration consumed by the runtime crate. It carries no
//! scheduling logic of its own; everything here is plain data that can be
//! copied across the worker boundary.
pub mod config;
pub mod error;
pub mod types;

pub use config::{CoordConfig, RequestConfig};
pub use error::{ConfigError, EffectError};
pub use types::{ActorId, Position, RequestKind, Tick, WorldId};
