use serde::{Deserialize, Serialize};
use serde_json::Value;

use quilt_types::{ChangeId, VersionId};

/// Cache row identity: one live entity as seen from one version.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub version_id: VersionId,
    pub schema_key: String,
    pub file_id: String,
    pub entity_id: String,
}

/// The materialized state of one entity under one version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRow {
    pub version_id: VersionId,
    pub schema_key: String,
    pub file_id: String,
    pub entity_id: String,
    /// The change whose content won materialization.
    pub change_id: ChangeId,
    pub content: Value,
}
