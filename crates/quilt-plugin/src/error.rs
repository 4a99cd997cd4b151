use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("no plugin registered for key: {0}")]
    UnknownPlugin(String),

    #[error("plugin key already registered: {0}")]
    DuplicatePlugin(String),

    #[error("plugin `{plugin}` failed to detect changes: {reason}")]
    Detect { plugin: String, reason: String },

    #[error("plugin `{plugin}` failed to apply changes: {reason}")]
    Apply { plugin: String, reason: String },
}

pub type PluginResult<T> = Result<T, PluginError>;
