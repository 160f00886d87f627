//! Server configuration.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for the admin server binary.
///
/// ```toml
/// listen_addr = "0.0.0.0:5150"
/// stream_buffer = 64
/// compaction_fail_fast = false
/// log_filter = "info,netcfg_admin=debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Address the gRPC server binds.
    pub listen_addr: SocketAddr,
    /// Snapshots buffered per listing stream before sends wait on the client.
    pub stream_buffer: usize,
    /// End a compaction wait as soon as the snapshot reports `FAILED`.
    pub compaction_fail_fast: bool,
    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5150)),
            stream_buffer: 64,
            compaction_fail_fast: false,
            log_filter: "info".to_string(),
        }
    }
}

impl AdminConfig {
    /// Load from a TOML file; missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream_buffer == 0 {
            return Err(ConfigError::Invalid("stream_buffer must be at least 1".into()));
        }
        Ok(())
    }
}
