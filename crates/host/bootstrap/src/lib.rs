//! Shared bootstrap utilities for waystone hosts.
//!
//! Provides configuration loading and runtime setup that can be reused by
//! the console host or an embedding server.
pub mod builder;
pub mod config;
pub mod error;

pub use builder::{HostBuilder, HostSetup};
pub use config::{ConfigLoader, HostConfig};
pub use error::{BootstrapError, Result};
