//! Format plugins for Quilt.
//!
//! The engine never interprets file bytes itself. A [`ChangePlugin`] owns a
//! file format: it splits a file into entities, detects entity-level changes
//! between two byte states, and writes resolved entity states back into file
//! bytes. Plugins may also veto the generic conflict heuristic with
//! format-aware conflict detection.
//!
//! Plugin failures are isolated per plugin: one misbehaving plugin must not
//! take down detection for the others.

pub mod error;
pub mod json;
pub mod registry;
pub mod traits;
pub mod types;

pub use error::{PluginError, PluginResult};
pub use json::JsonPropertyPlugin;
pub use registry::{DetectionReport, PluginRegistry};
pub use traits::ChangePlugin;
pub use types::{ConflictCandidate, DetectedChange, EntityPatch, PluginConflict, PluginDetection};
