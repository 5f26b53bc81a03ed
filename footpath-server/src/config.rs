//! Server configuration, read from a TOML file and overridden by flags

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use footpath_core::FootpathConfig;
use serde::Deserialize;

use crate::error::ServerError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// GeoJSON file with the footpath network
    pub footpaths: Option<PathBuf>,
    pub bind: SocketAddr,
    pub request_timeout_secs: u64,
    /// Requests processed at the same time; the rest wait
    pub concurrency_limit: usize,
    pub engine: FootpathConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            footpaths: None,
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout_secs: 30,
            concurrency_limit: 64,
            engine: FootpathConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ServerError> {
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ServerError> {
        let config: Self = toml::from_str(text)?;
        config.validated()
    }

    /// Validates the engine section and the server limits
    pub fn validated(mut self) -> Result<Self, ServerError> {
        self.engine = self.engine.validated()?;
        if self.concurrency_limit == 0 {
            return Err(ServerError::InvalidConfig(
                "concurrency_limit must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ServerError::InvalidConfig(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}
