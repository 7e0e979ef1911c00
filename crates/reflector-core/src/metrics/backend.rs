use std::sync::Arc;

/// Reconciliation outcome for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Every domain applied cleanly.
    Success,
    /// Some child writes failed; an immediate retry was requested.
    Requeued,
    /// Retryable error; requeued after the error backoff.
    Failed,
    /// Non-retryable error; waits for the next parent change.
    Skipped,
}

impl ReconcileOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Success => "success",
            ReconcileOutcome::Requeued => "requeued",
            ReconcileOutcome::Failed => "failed",
            ReconcileOutcome::Skipped => "skipped",
        }
    }
}

/// Backend metrics collection interface.
///
/// Implementations are injected via [`crate::ReflectContext`] and shared by the
/// reconciler and the background rescan.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record how many parents the global selector matched in a rescan pass.
    ///
    /// # Arguments
    /// - `selector`: Canonical form of the global parent selector
    /// - `count`: Number of matched parents
    fn record_match_count(&self, selector: &str, count: usize);
    /// Record the outcome of one parent reconciliation.
    fn record_reconcile(&self, outcome: ReconcileOutcome);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
