/// HTTP endpoint paths.
pub mod endpoints {
    pub const HEALTH: &str = "/v1/health";
    pub const INFO: &str = "/v1/info";
    /// Axum route patterns; concrete paths come from [`pull_path`] and
    /// [`push_path`].
    ///
    /// [`pull_path`]: super::endpoints::pull_path
    /// [`push_path`]: super::endpoints::push_path
    pub const PULL: &str = "/v1/stores/:store/pull";
    pub const PUSH: &str = "/v1/stores/:store/push";

    pub fn pull_path(store: &str) -> String {
        format!("/v1/stores/{store}/pull")
    }

    pub fn push_path(store: &str) -> String {
        format!("/v1/stores/{store}/push")
    }
}

/// Health check response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub protocol_version: u32,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: super::message::PROTOCOL_VERSION,
        }
    }
}
