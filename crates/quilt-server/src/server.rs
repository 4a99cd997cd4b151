use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::{AppState, ServerState};

/// Quilt store server.
pub struct QuiltServer {
    state: AppState,
}

impl QuiltServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: ServerState::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Load persisted store blobs, then serve requests.
    pub async fn serve(self) -> ServerResult<()> {
        let loaded = self.state.load_persisted().await?;
        if loaded > 0 {
            info!(stores = loaded, "loaded persisted stores");
        }
        let bind_addr = self.state.config.bind_addr;
        let app = build_router(self.state);
        let listener = TcpListener::bind(bind_addr).await?;
        info!("quilt server listening on {bind_addr}");
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = QuiltServer::new(ServerConfig::default());
        assert_eq!(
            server.config().bind_addr,
            "127.0.0.1:7423".parse().unwrap()
        );
    }

    #[test]
    fn router_builds() {
        let server = QuiltServer::new(ServerConfig::default());
        let _router = server.router();
    }
}
