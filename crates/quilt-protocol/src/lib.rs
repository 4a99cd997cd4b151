//! Wire protocol between Quilt peers.
//!
//! The protocol is two JSON-over-HTTP operations per hosted store: `pull`
//! (send a clock, receive the rows past it) and `push` (send rows, the
//! server keeps what it lacks). Messages live here so client and server
//! agree on shape without depending on each other.

pub mod endpoint;
pub mod error;
pub mod message;

pub use endpoint::{endpoints, HealthResponse};
pub use error::{codes, ErrorBody};
pub use message::{PullRequest, PullResponse, PushRequest, PushResponse, PROTOCOL_VERSION};
