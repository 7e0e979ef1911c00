//! Per-parent reconcile: both domains against one parent snapshot.
mod action;
pub use action::ReconcileAction;

mod context;
pub use context::ReflectContext;

use reflector_model::{ObjectId, Parent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    cluster::{ClusterHandle, guarded},
    domain::Domain,
    error::ReflectError,
    metrics::ReconcileOutcome,
    reflector::{DomainOutcome, DomainReflector},
};

/// Runs the labels and annotations domains for one parent.
///
/// Reconciles of different parents may run concurrently; the caller must
/// serialize reconciles of the same parent.
pub struct Reconciler {
    cluster: ClusterHandle,
    ctx: ReflectContext,
    domains: Vec<DomainReflector>,
}

impl Reconciler {
    pub fn new(cluster: ClusterHandle, ctx: ReflectContext) -> Self {
        let domains = Domain::ALL
            .into_iter()
            .map(|d| DomainReflector::new(d, cluster.clone()))
            .collect();
        Self {
            cluster,
            ctx,
            domains,
        }
    }

    pub fn cluster(&self) -> &ClusterHandle {
        &self.cluster
    }

    pub fn context(&self) -> &ReflectContext {
        &self.ctx
    }

    /// Fetch the parent and reconcile it.
    ///
    /// The outcome is recorded in metrics. Use [`Reconciler::settle`] to turn the
    /// result into a queue action.
    #[instrument(level = "info", skip(self, cancel), fields(parent = %id))]
    pub async fn reconcile(
        &self,
        id: &ObjectId,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction, ReflectError> {
        info!("starting reconciliation");

        let result = match guarded(cancel, self.cluster.get_parent(id)).await {
            Ok(parent) => self.reconcile_parent(&parent, cancel).await,
            Err(e) => {
                if !matches!(e, ReflectError::Canceled) {
                    error!(error = %e, error_kind = e.as_label(), "failed to get parent");
                }
                Err(e)
            }
        };

        if let Some(outcome) = classify(&result) {
            self.ctx.metrics().record_reconcile(outcome);
        }
        match &result {
            Ok(action) => info!(?action, "finished reconciliation"),
            Err(ReflectError::Canceled) => debug!("reconciliation canceled"),
            Err(e) => error!(
                error = %e,
                error_kind = e.as_label(),
                retryable = e.is_retryable(),
                "reconciliation failed"
            ),
        }
        result
    }

    /// Reconcile an already fetched parent snapshot.
    ///
    /// Both domains always run. A retry request from either domain wins over
    /// errors from the other; otherwise errors from both are combined.
    pub async fn reconcile_parent(
        &self,
        parent: &Parent,
        cancel: &CancellationToken,
    ) -> Result<ReconcileAction, ReflectError> {
        let mut retry_soon = false;
        let mut errors = Vec::new();

        for reflector in &self.domains {
            match reflector.reflect(parent, cancel).await {
                Ok(DomainOutcome::Applied { updated }) => {
                    debug!(domain = %reflector.domain(), updated, "domain reflected");
                }
                Ok(DomainOutcome::RetrySoon { failures }) => {
                    warn!(
                        domain = %reflector.domain(),
                        error = %ReflectError::ChildUpdates(failures),
                        "domain incomplete"
                    );
                    retry_soon = true;
                }
                Err(ReflectError::Canceled) => return Err(ReflectError::Canceled),
                Err(e) => errors.push(e),
            }
        }

        if retry_soon {
            return Ok(ReconcileAction::RequeueNow);
        }
        match ReflectError::combine(errors) {
            Some(err) => Err(err),
            None => Ok(ReconcileAction::after(self.ctx.config().recheck_after())),
        }
    }

    /// Map a reconcile result to the action the work queue should take.
    ///
    /// Retryable errors back off by the configured delay. Non-retryable ones
    /// wait for a parent edit so a broken marker cannot cause a requeue storm.
    pub fn settle(&self, result: &Result<ReconcileAction, ReflectError>) -> ReconcileAction {
        match result {
            Ok(action) => *action,
            Err(e) if e.is_retryable() => ReconcileAction::RequeueAfter(self.ctx.config().error_backoff),
            Err(_) => ReconcileAction::AwaitChange,
        }
    }
}

fn classify(result: &Result<ReconcileAction, ReflectError>) -> Option<ReconcileOutcome> {
    match result {
        Ok(ReconcileAction::RequeueNow) => Some(ReconcileOutcome::Requeued),
        Ok(_) => Some(ReconcileOutcome::Success),
        Err(ReflectError::Canceled) => None,
        Err(e) if e.is_retryable() => Some(ReconcileOutcome::Failed),
        Err(_) => Some(ReconcileOutcome::Skipped),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use reflector_model::{
        ANNOTATIONS_TRACKING_KEY, Child, LABELS_TRACKING_KEY, ReflectorConfig, Selector,
    };

    use super::*;
    use crate::{cluster::MemoryCluster, metrics::MetricsBackend};

    const LABELS_LIST: &str = "labels.metadata-reflector.spaceship.com/list";
    const ANN_LIST: &str = "annotations.metadata-reflector.spaceship.com/list";

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ReconcileOutcome>>);

    impl MetricsBackend for Recorder {
        fn record_match_count(&self, _: &str, _: usize) {}
        fn record_reconcile(&self, outcome: ReconcileOutcome) {
            self.0.lock().unwrap().push(outcome);
        }
    }

    fn parent_id() -> ObjectId {
        ObjectId::new("default", "web")
    }

    fn parent() -> Parent {
        Parent::new(parent_id(), Selector::parse("app=web").unwrap())
            .with_label("tier", "backend")
            .with_annotation("owner", "team-a")
    }

    fn pod(name: &str) -> Child {
        Child::new(ObjectId::new("default", name)).with_label("app", "web")
    }

    fn setup(parent: Parent) -> (Arc<MemoryCluster>, Reconciler, Arc<Recorder>) {
        let cluster = Arc::new(MemoryCluster::new().with_parent(parent).with_child(pod("web-0")));
        let recorder = Arc::new(Recorder::default());
        let ctx = ReflectContext::default().with_metrics(recorder.clone());
        let reconciler = Reconciler::new(cluster.clone(), ctx);
        (cluster, reconciler, recorder)
    }

    #[tokio::test]
    async fn reflects_both_domains() {
        let (cluster, reconciler, recorder) = setup(
            parent()
                .with_annotation(LABELS_LIST, "tier")
                .with_annotation(ANN_LIST, "owner"),
        );

        let action = reconciler
            .reconcile(&parent_id(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(action, ReconcileAction::AwaitChange);

        let pod = cluster.child(&ObjectId::new("default", "web-0")).unwrap();
        assert_eq!(pod.label("tier"), Some("backend"));
        assert_eq!(pod.annotation("owner"), Some("team-a"));
        assert_eq!(pod.annotation(LABELS_TRACKING_KEY), Some("tier"));
        assert_eq!(pod.annotation(ANNOTATIONS_TRACKING_KEY), Some("owner"));
        assert_eq!(*recorder.0.lock().unwrap(), vec![ReconcileOutcome::Success]);
    }

    #[tokio::test]
    async fn retry_request_beats_non_retryable_error() {
        let (cluster, reconciler, recorder) = setup(
            parent()
                .with_annotation(LABELS_LIST, "tier")
                .with_annotation("annotations.metadata-reflector.spaceship.com/copy", "owner"),
        );
        cluster.fail_updates_for(ObjectId::new("default", "web-0"));

        let action = reconciler
            .reconcile(&parent_id(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(action, ReconcileAction::RequeueNow);
        assert_eq!(*recorder.0.lock().unwrap(), vec![ReconcileOutcome::Requeued]);
    }

    #[tokio::test]
    async fn errors_from_both_domains_are_combined() {
        let (_, reconciler, recorder) = setup(
            parent()
                .with_annotation("labels.metadata-reflector.spaceship.com/copy", "tier")
                .with_annotation("annotations.metadata-reflector.spaceship.com/regex", "("),
        );

        let result = reconciler
            .reconcile(&parent_id(), &CancellationToken::new())
            .await;
        let err = result.as_ref().unwrap_err();
        assert_eq!(err.leaves().len(), 2);
        assert!(!err.is_retryable());
        assert_eq!(reconciler.settle(&result), ReconcileAction::AwaitChange);
        assert_eq!(*recorder.0.lock().unwrap(), vec![ReconcileOutcome::Skipped]);
    }

    #[tokio::test]
    async fn missing_parent_is_retryable() {
        let cluster = Arc::new(MemoryCluster::new());
        let ctx = ReflectContext::default().with_config(ReflectorConfig {
            error_backoff: Duration::from_millis(1_500),
            ..ReflectorConfig::default()
        });
        let reconciler = Reconciler::new(cluster, ctx);

        let result = reconciler
            .reconcile(&parent_id(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ReflectError::Cluster(_))));
        assert_eq!(
            reconciler.settle(&result),
            ReconcileAction::RequeueAfter(Duration::from_millis(1_500))
        );
    }

    #[tokio::test]
    async fn success_requests_configured_recheck() {
        let cluster = Arc::new(
            MemoryCluster::new()
                .with_parent(parent().with_annotation(LABELS_LIST, "tier"))
                .with_child(pod("web-0")),
        );
        let ctx = ReflectContext::default().with_config(ReflectorConfig {
            recheck_interval: Duration::from_secs(60),
            ..ReflectorConfig::default()
        });
        let reconciler = Reconciler::new(cluster, ctx);

        let action = reconciler
            .reconcile(&parent_id(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(action, ReconcileAction::RequeueAfter(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn canceled_reconcile_is_not_counted() {
        let (cluster, reconciler, recorder) = setup(parent().with_annotation(LABELS_LIST, "tier"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = reconciler.reconcile(&parent_id(), &cancel).await;
        assert!(matches!(result, Err(ReflectError::Canceled)));
        assert_eq!(cluster.update_count(), 0);
        assert!(recorder.0.lock().unwrap().is_empty());
    }
}
