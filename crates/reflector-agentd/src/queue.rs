//! Inline requeue loop for the event path.

use std::time::Duration;

use reflector_core::prelude::*;
use reflector_model::ObjectId;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Upper bound on reconciles per event.
pub const MAX_ATTEMPTS: usize = 5;

/// Longer requeue delays are left to the background rescan.
pub const MAX_INLINE_DELAY: Duration = Duration::from_secs(1);

/// Reconcile `id` and follow short requeue requests.
///
/// Returns the last action and how many reconciles ran.
pub async fn drive(
    reconciler: &Reconciler,
    id: &ObjectId,
    cancel: &CancellationToken,
) -> (ReconcileAction, usize) {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let result = reconciler.reconcile(id, cancel).await;
        let action = reconciler.settle(&result);
        match &result {
            Ok(_) => info!(parent = %id, ?action, attempts, "reconciled"),
            Err(e) => warn!(parent = %id, error = %e, ?action, attempts, "reconcile failed"),
        }

        let Some(delay) = action.delay() else {
            return (action, attempts);
        };
        if attempts >= MAX_ATTEMPTS || delay > MAX_INLINE_DELAY || cancel.is_cancelled() {
            info!(parent = %id, ?delay, "requeue deferred to the background rescan");
            return (action, attempts);
        }
        tokio::time::sleep(delay).await;
    }
}
