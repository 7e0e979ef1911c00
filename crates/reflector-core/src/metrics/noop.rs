use crate::metrics::backend::{MetricsBackend, ReconcileOutcome};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_match_count(&self, _: &str, _: usize) {}

    #[inline(always)]
    fn record_reconcile(&self, _: ReconcileOutcome) {}
}
