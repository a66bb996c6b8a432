//! Host configuration structures and loaders.
//!
//! Configuration is layered: built-in defaults, then an optional RON file
//! named by `WAYSTONE_CONFIG`, then individual environment overrides. The
//! result is validated before anything is built from it.
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;
use waystone_core::CoordConfig;

use crate::error::{BootstrapError, Result};

pub const CONFIG_PATH_VAR: &str = "WAYSTONE_CONFIG";
pub const LOG_DIR_VAR: &str = "WAYSTONE_LOG_DIR";

/// Configuration required to bootstrap a host runtime.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HostConfig {
    pub coord: CoordConfig,
    /// File the coordinator settings were read from, if any.
    pub source: Option<PathBuf>,
    /// Write logs to this directory instead of stderr.
    pub log_dir: Option<PathBuf>,
}

impl HostConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `WAYSTONE_CONFIG` - RON file with coordinator settings (optional)
    /// - `WAYSTONE_TICK_RATE` - Driver ticks per second (default: 20)
    /// - `WAYSTONE_WARMUP_SECS` - Default warmup before teleports (default: 3)
    /// - `WAYSTONE_REQUEST_COOLDOWN_SECS` - Spacing between requests (default: 10)
    /// - `WAYSTONE_REQUEST_TIMEOUT_SECS` - Request lifetime (default: 30)
    /// - `WAYSTONE_MOVE_TOLERANCE` - Allowed drift in blocks (default: 0.5)
    /// - `WAYSTONE_REQUESTS_ENABLED` - Toggle the request broker (default: true)
    /// - `WAYSTONE_LOG_DIR` - Log to a file in this directory
    pub fn from_env() -> Result<Self> {
        ConfigLoader::new(|key: &str| env::var(key).ok()).load()
    }
}

/// Loads a [`HostConfig`] through a pluggable variable lookup.
pub struct ConfigLoader<L> {
    lookup: L,
}

impl<L> ConfigLoader<L>
where
    L: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn load(&self) -> Result<HostConfig> {
        let source = (self.lookup)(CONFIG_PATH_VAR).map(PathBuf::from);
        let mut coord = match &source {
            Some(path) => load_file(path)?,
            None => CoordConfig::default(),
        };

        self.apply_overrides(&mut coord)?;
        coord.validate()?;

        Ok(HostConfig {
            coord,
            source,
            log_dir: (self.lookup)(LOG_DIR_VAR).map(PathBuf::from),
        })
    }

    /// Applies every `WAYSTONE_*` override that is set.
    pub fn apply_overrides(&self, config: &mut CoordConfig) -> Result<()> {
        if let Some(rate) = self.read::<u32>("WAYSTONE_TICK_RATE")? {
            // The countdown stays at one step per second unless the file
            // said otherwise.
            if config.countdown_period_ticks == config.tick_rate {
                config.countdown_period_ticks = rate;
            }
            config.tick_rate = rate;
        }
        if let Some(secs) = self.read::<u32>("WAYSTONE_WARMUP_SECS")? {
            config.warmup_secs = secs;
        }
        if let Some(secs) = self.read::<u32>("WAYSTONE_REQUEST_COOLDOWN_SECS")? {
            config.requests.cooldown_secs = secs;
        }
        if let Some(secs) = self.read::<u32>("WAYSTONE_REQUEST_TIMEOUT_SECS")? {
            config.requests.timeout_secs = secs;
        }
        if let Some(tolerance) = self.read::<f64>("WAYSTONE_MOVE_TOLERANCE")? {
            config.move_tolerance = tolerance;
        }
        if let Some(raw) = (self.lookup)("WAYSTONE_REQUESTS_ENABLED") {
            config.requests.enabled = parse_flag(&raw).ok_or(BootstrapError::Env {
                key: "WAYSTONE_REQUESTS_ENABLED",
                value: raw,
            })?;
        }
        Ok(())
    }

    fn read<T: FromStr>(&self, key: &'static str) -> Result<Option<T>> {
        let Some(raw) = (self.lookup)(key) else {
            return Ok(None);
        };
        match raw.trim().parse() {
            Ok(value) => {
                debug!(key, value = %raw, "config override applied");
                Ok(Some(value))
            }
            Err(_) => Err(BootstrapError::Env { key, value: raw }),
        }
    }
}

/// Reads coordinator settings from a RON file. Missing fields keep their
/// defaults.
pub fn load_file(path: &Path) -> Result<CoordConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| BootstrapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&text).map_err(|source| BootstrapError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
