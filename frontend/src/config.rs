//! Run configuration: optional TOML file overriding a preset's bridge and
//! the memory timing used for a run.
//!
//! ```toml
//! step_limit = 5000
//!
//! [bridge]
//! host_data_width = 64
//! native_address_width = 30
//! native_data_width = 16
//! base_address = 0x1000_0000
//!
//! [timing]
//! read_latency = 3
//! ready_period = 2
//! ```

use std::path::{Path, PathBuf};

use beatbridge_core::bridge::BridgeConfig;
use beatbridge_core::device::MemoryTiming;
use beatbridge_systems::testbench::DEFAULT_STEP_LIMIT;
use serde::{Deserialize, Serialize};

use crate::runner::RunError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Replaces the preset's bridge configuration when present.
    pub bridge: Option<BridgeConfig>,
    pub timing: MemoryTiming,
    /// Steps without an ack before a transaction counts as stalled.
    pub step_limit: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            bridge: None,
            timing: MemoryTiming::default(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }
}

impl RunConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, RunError> {
        toml::from_str(text).map_err(|source| RunError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, RunError> {
        let text = std::fs::read_to_string(path).map_err(|source| RunError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Load `explicit` if given, else the per-user default file if it
    /// exists, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, RunError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// `<config dir>/beatbridge/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("beatbridge").join("config.toml"))
}
