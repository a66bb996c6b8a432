use std::path::PathBuf;

use thiserror::Error;
use waystone_core::ConfigError;
use waystone_runtime::RuntimeError;

pub type Result<T> = std::result::Result<T, BootstrapError>;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("environment variable {key} has invalid value {value:?}")]
    Env { key: &'static str, value: String },

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
