mod queue;
mod snapshot;

use std::{sync::Arc, time::Duration};

use reflector_core::prelude::*;
use reflector_model::{ReflectorConfig, Selector};
use reflector_observe::{EventLogger, LoggerConfig, init_logger};
use reflector_prometheus::PrometheusMetrics;
use taskvisor::{Config as SupervisorConfig, ControllerConfig, Subscribe};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::snapshot::Snapshot;

/// How long the daemon lets the background rescan run before reporting.
const RUN_FOR: Duration = Duration::from_secs(3);

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_logger(&LoggerConfig::from_env()?)?;

    let config = ReflectorConfig::from_env()?;
    info!(
        selector = %config.parent_selector,
        interval = ?config.background_interval,
        "reflector configuration loaded"
    );

    let cluster = Arc::new(Snapshot::load()?.into_cluster());
    let metrics = Arc::new(PrometheusMetrics::new()?);
    let ctx = ReflectContext::new(config, metrics.clone());
    let reconciler = Arc::new(Reconciler::new(cluster.clone(), ctx));
    let cancel = CancellationToken::new();

    // Event path: one `Created` per known parent, gated by the filter.
    let parents = cluster.list_parents(&Selector::empty()).await?;
    for parent in parents {
        let event = ParentEvent::Created(parent);
        if !event.should_reconcile() {
            info!(parent = %event.parent_id(), "parent carries no markers, skipped");
            continue;
        }
        queue::drive(&reconciler, event.parent_id(), &cancel).await;
    }

    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(EventLogger)];
    let api = SupervisorApi::new(
        SupervisorConfig::default(),
        ControllerConfig::default(),
        subscribers,
    )
    .await?;

    if !api.start_rescan(Arc::new(Rescan::new(reconciler))).await? {
        info!("background rescan disabled");
    }

    tokio::time::sleep(RUN_FOR).await;
    cancel.cancel();

    for child in cluster.children() {
        info!(child = %child.id, labels = ?child.labels, annotations = ?child.annotations, "child state");
    }
    info!(metrics = %metrics.render()?, "metrics snapshot");
    Ok(())
}
