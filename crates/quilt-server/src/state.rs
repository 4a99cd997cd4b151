use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use quilt_graph::ChangeSetGraph;
use quilt_log::ChangeLog;
use quilt_store::SnapshotStore;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Version tag written at the front of every persisted blob.
pub const BLOB_FORMAT_VERSION: u32 = 1;

/// One hosted store: the replicated tables for a single repository name.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HostedStore {
    pub store: SnapshotStore,
    pub log: ChangeLog,
    pub graph: ChangeSetGraph,
}

impl HostedStore {
    /// Serialize to a versioned binary blob.
    pub fn to_blob(&self) -> ServerResult<Vec<u8>> {
        bincode::serialize(&(BLOB_FORMAT_VERSION, self))
            .map_err(|e| ServerError::Serialization(e.to_string()))
    }

    /// Deserialize from a versioned binary blob.
    pub fn from_blob(bytes: &[u8]) -> ServerResult<Self> {
        let (version, hosted): (u32, HostedStore) = bincode::deserialize(bytes)
            .map_err(|e| ServerError::Serialization(e.to_string()))?;
        if version != BLOB_FORMAT_VERSION {
            return Err(ServerError::Serialization(format!(
                "unsupported blob format version {version}"
            )));
        }
        Ok(hosted)
    }
}

/// Shared handler state.
pub struct ServerState {
    pub config: ServerConfig,
    pub stores: RwLock<HashMap<String, HostedStore>>,
}

pub type AppState = Arc<ServerState>;

impl ServerState {
    pub fn new(config: ServerConfig) -> AppState {
        Arc::new(Self {
            config,
            stores: RwLock::new(HashMap::new()),
        })
    }

    /// Write a hosted store's blob under the persist root, if configured.
    pub fn persist(&self, name: &str, hosted: &HostedStore) -> ServerResult<()> {
        let Some(root) = &self.config.persist_root else {
            return Ok(());
        };
        std::fs::create_dir_all(root)?;
        let path = blob_path(root, name);
        std::fs::write(&path, hosted.to_blob()?)?;
        debug!(store = name, path = %path.display(), "persisted store blob");
        Ok(())
    }

    /// Load every blob under the persist root into memory.
    pub async fn load_persisted(&self) -> ServerResult<usize> {
        let Some(root) = &self.config.persist_root else {
            return Ok(0);
        };
        if !root.exists() {
            return Ok(0);
        }
        let mut loaded = 0;
        let mut stores = self.stores.write().await;
        for entry in std::fs::read_dir(root)? {
            let path = entry?.path();
            if path.extension().map_or(true, |ext| ext != "quilt") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = std::fs::read(&path)?;
            stores.insert(name.to_string(), HostedStore::from_blob(&bytes)?);
            loaded += 1;
        }
        Ok(loaded)
    }
}

fn blob_path(root: &Path, name: &str) -> std::path::PathBuf {
    root.join(format!("{name}.quilt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_roundtrip() {
        let mut hosted = HostedStore::default();
        hosted
            .store
            .write(Some(&serde_json::json!({"k": "v"})))
            .unwrap();

        let blob = hosted.to_blob().unwrap();
        let restored = HostedStore::from_blob(&blob).unwrap();
        assert_eq!(restored.store.len(), 1);
    }

    #[test]
    fn wrong_format_version_is_rejected() {
        let hosted = HostedStore::default();
        let blob = bincode::serialize(&(99u32, &hosted)).unwrap();
        assert!(matches!(
            HostedStore::from_blob(&blob),
            Err(ServerError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            persist_root: Some(dir.path().to_path_buf()),
            ..ServerConfig::default()
        };
        let state = ServerState::new(config.clone());
        let mut hosted = HostedStore::default();
        hosted
            .store
            .write(Some(&serde_json::json!({"k": "v"})))
            .unwrap();
        state.persist("demo", &hosted).unwrap();

        let fresh = ServerState::new(config);
        assert_eq!(fresh.load_persisted().await.unwrap(), 1);
        let stores = fresh.stores.read().await;
        assert_eq!(stores.get("demo").unwrap().store.len(), 1);
    }
}
