use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory for store blobs written after each push. `None` keeps
    /// hosted stores in memory only.
    pub persist_root: Option<PathBuf>,
    /// Request body cap enforced by the router.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7423".parse().unwrap(),
            persist_root: None,
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file. Missing keys fall back to defaults via serde.
    pub fn from_toml_file(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| ServerError::Config(e.to_string()))
    }
}
