//! Error types surfaced by the runtime API.
//!
//! Expected rejections (cooldowns, busy targets, missing requests) are outcome
//! values, not errors. What remains here is plumbing: the worker went away or
//! the runtime could not be built.
use thiserror::Error;
use tokio::sync::oneshot;

use waystone_core::ConfigError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("coordinator worker command channel closed")]
    CommandChannelClosed,

    #[error("coordinator worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("coordinator worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("invalid coordinator configuration")]
    InvalidConfig(#[from] ConfigError),

    #[error("runtime requires an actor directory to be configured before building")]
    MissingDirectory,
}
