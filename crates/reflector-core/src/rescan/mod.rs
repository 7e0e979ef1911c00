//! Periodic reconcile of every parent matched by the global selector.
mod task;
pub use task::{RESCAN_TASK_NAME, rescan_controller, rescan_spec};

use std::sync::Arc;

use reflector_model::ReflectorConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::{cluster::guarded, error::ReflectError, reconcile::Reconciler};

/// Summary of one rescan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescanReport {
    /// Canonical form of the selector that was used.
    pub selector: String,
    pub matched: usize,
    pub reconciled: usize,
    pub failed: usize,
}

/// One pass over every parent matched by the configured global selector.
pub struct Rescan {
    reconciler: Arc<Reconciler>,
}

impl Rescan {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self { reconciler }
    }

    pub fn config(&self) -> &ReflectorConfig {
        self.reconciler.context().config()
    }

    /// Run one pass.
    ///
    /// A malformed global selector fails the pass with
    /// [`ReflectError::InvalidSelector`]. Failures of individual parents are
    /// logged and counted in the report.
    #[instrument(level = "info", skip_all)]
    pub async fn run_pass(&self, cancel: &CancellationToken) -> Result<RescanReport, ReflectError> {
        let ctx = self.reconciler.context();
        let selector = ctx.config().parent_selector().inspect_err(|e| {
            error!(error = %e, "invalid global parent selector");
        })?;
        let key = selector.to_string();
        info!(selector = %key, "starting background reflection pass");

        let parents = guarded(cancel, self.reconciler.cluster().list_parents(&selector))
            .await
            .inspect_err(|e| {
                if !matches!(e, ReflectError::Canceled) {
                    error!(error = %e, selector = %key, "failed to list parents");
                }
            })?;

        info!(count = parents.len(), selector = %key, "matched parents");
        ctx.metrics().record_match_count(&key, parents.len());

        let mut report = RescanReport {
            selector: key,
            matched: parents.len(),
            reconciled: 0,
            failed: 0,
        };
        for parent in &parents {
            match self.reconciler.reconcile(&parent.id, cancel).await {
                Ok(_) => report.reconciled += 1,
                Err(ReflectError::Canceled) => return Err(ReflectError::Canceled),
                Err(e) => {
                    error!(parent = %parent.id, error = %e, error_kind = e.as_label(), "background reflection failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            reconciled = report.reconciled,
            failed = report.failed,
            "finished background reflection pass"
        );
        Ok(report)
    }
}
