//! HTTP server for Quilt.
//!
//! Hosts named stores and speaks the pull/push protocol from
//! `quilt-protocol`: clients pull the rows past their clock and push the
//! rows the server lacks. Hosted stores can optionally be persisted as
//! versioned binary blobs after every push.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::QuiltServer;
pub use state::{HostedStore, ServerState};
