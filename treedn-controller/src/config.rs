//! Controller configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use treedn_common::types::HostId;
use treedn_common::{Error, Result};

/// Environment variable prefix, e.g. `TREEDN_SOURCE_HOST=h2`.
pub const ENV_PREFIX: &str = "TREEDN";

pub const DEFAULT_SOURCE_HOST: &str = "h1";
pub const DEFAULT_NOTIFICATION_BUFFER: usize = 100;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Topology description (JSON).
    pub topology: Option<PathBuf>,
    /// Host the content source runs on.
    pub source_host: String,
    /// Packet-in queue capacity of each simulated switch.
    pub notification_buffer: usize,
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            topology: None,
            source_host: DEFAULT_SOURCE_HOST.to_string(),
            notification_buffer: DEFAULT_NOTIFICATION_BUFFER,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load defaults, then `file` if given, then `TREEDN_*` variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize::<ControllerConfig>())
            .map_err(|e| Error::Config(e.to_string()))?
            .validated()
    }

    fn validated(self) -> Result<Self> {
        if self.source_host.is_empty() {
            return Err(Error::Config("source_host must not be empty".to_string()));
        }
        if self.notification_buffer == 0 {
            return Err(Error::Config("notification_buffer must be at least 1".to_string()));
        }
        Ok(self)
    }

    pub fn source_host(&self) -> HostId {
        HostId::new(self.source_host.clone())
    }
}
