use std::fmt;

use reflector_model::ReflectorConfig;

use crate::metrics::MetricsHandle;

/// Shared context passed to the reconciler and the background rescan.
#[derive(Clone)]
pub struct ReflectContext {
    config: ReflectorConfig,
    metrics: MetricsHandle,
}

impl ReflectContext {
    /// Create a new context with the given params.
    pub fn new(config: ReflectorConfig, metrics: MetricsHandle) -> Self {
        Self { config, metrics }
    }

    pub fn config(&self) -> &ReflectorConfig {
        &self.config
    }

    /// Get a clonable handle to the metrics backend.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    /// Replace the config and return updated context.
    pub fn with_config(mut self, config: ReflectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the metrics backend and return updated context.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }
}

impl Default for ReflectContext {
    fn default() -> Self {
        Self {
            config: ReflectorConfig::default(),
            metrics: crate::metrics::noop_metrics(),
        }
    }
}

impl fmt::Debug for ReflectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectContext")
            .field("config", &self.config)
            .field("metrics", &"<handle>")
            .finish()
    }
}

impl fmt::Display for ReflectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReflectContext(selector={:?}, interval_ms={})",
            self.config.parent_selector,
            self.config.background_interval.as_millis()
        )
    }
}
