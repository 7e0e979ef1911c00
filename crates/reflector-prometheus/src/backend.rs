use std::sync::Arc;

use prometheus::{
    Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder, proto::MetricFamily,
};

use reflector_core::metrics::{MetricsBackend, ReconcileOutcome};

const NAMESPACE: &str = "metadata_reflector";

/// Prometheus metrics backend for the reflector.
///
/// Implements [`MetricsBackend`] and exposes prometheus metrics that can be scraped via HTTP endpoint.
///
/// ## Metrics
/// - `metadata_reflector_parents_matching_selector{selector}` - Gauge of parents matched by the last rescan
/// - `metadata_reflector_reconciles_total{outcome}` - Counter of finished reconciles
///
/// ## Label cardinality
/// - `selector`: one value per configured global selector
/// - `outcome`: "success", "requeued", "failed", "skipped"
#[derive(Clone)]
pub struct PrometheusMetrics {
    parents_matching: IntGaugeVec,
    reconciles: IntCounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create a new prometheus metrics backend with custom registry.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let parents_matching = IntGaugeVec::new(
            Opts::new(
                "parents_matching_selector",
                "Number of parents matching the global selector in the last background pass",
            )
            .namespace(NAMESPACE),
            &["selector"],
        )?;
        registry.register(Box::new(parents_matching.clone()))?;

        let reconciles = IntCounterVec::new(
            Opts::new("reconciles_total", "Total number of finished reconciles")
                .namespace(NAMESPACE),
            &["outcome"],
        )?;
        registry.register(Box::new(reconciles.clone()))?;

        Ok(Self {
            parents_matching,
            reconciles,
            registry,
        })
    }

    /// Create a new prometheus metrics backend with default registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metrics for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render all metrics in the text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Get reference to underlying prometheus registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_match_count(&self, selector: &str, count: usize) {
        self.parents_matching
            .with_label_values(&[selector])
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    fn record_reconcile(&self, outcome: ReconcileOutcome) {
        self.reconciles
            .with_label_values(&[outcome.as_label()])
            .inc();
    }
}
