use std::sync::Arc;

use tracing::{debug, warn};

use quilt_log::FileRow;

use crate::error::{PluginError, PluginResult};
use crate::traits::ChangePlugin;
use crate::types::PluginDetection;

/// Everything one detection pass produced: successful detections plus the
/// errors of plugins that failed. Failures never suppress other plugins'
/// results.
#[derive(Debug, Default)]
pub struct DetectionReport {
    pub detections: Vec<PluginDetection>,
    pub failures: Vec<PluginError>,
}

/// Registry of format plugins, keyed by plugin key.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn ChangePlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn register(&mut self, plugin: Arc<dyn ChangePlugin>) -> PluginResult<()> {
        if self.plugins.iter().any(|p| p.key() == plugin.key()) {
            return Err(PluginError::DuplicatePlugin(plugin.key().to_string()));
        }
        debug!(plugin = plugin.key(), "registered plugin");
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn get(&self, key: &str) -> PluginResult<&Arc<dyn ChangePlugin>> {
        self.plugins
            .iter()
            .find(|p| p.key() == key)
            .ok_or_else(|| PluginError::UnknownPlugin(key.to_string()))
    }

    /// Run change detection across every plugin that handles the file.
    ///
    /// A plugin that returns an error is recorded in the report and skipped;
    /// the remaining plugins still run.
    pub fn detect_changes(&self, before: Option<&FileRow>, after: &FileRow) -> DetectionReport {
        let mut report = DetectionReport::default();
        for plugin in &self.plugins {
            if !plugin.handles(after) {
                continue;
            }
            match plugin.detect_changes(before, after) {
                Ok(changes) => {
                    report
                        .detections
                        .extend(changes.into_iter().map(|change| PluginDetection {
                            plugin_key: plugin.key().to_string(),
                            change,
                        }));
                }
                Err(err) => {
                    warn!(plugin = plugin.key(), error = %err, "plugin detection failed");
                    report.failures.push(err);
                }
            }
        }
        report
    }
}
