//! Access to parents and children stored in the cluster.
//!
//! The engine never talks to a platform API directly. It goes through
//! [`ClusterClient`], which an embedding process implements on top of its
//! platform client. [`MemoryCluster`] is the in-process implementation used
//! by tests and the demo daemon.
mod error;
pub use error::ClusterError;

mod memory;
pub use memory::MemoryCluster;

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use reflector_model::{Child, ObjectId, Parent, Selector};
use tokio_util::sync::CancellationToken;

use crate::error::ReflectError;

/// Read/write operations the engine needs from the cluster.
#[async_trait]
pub trait ClusterClient: Send + Sync + 'static {
    /// Fetch a single parent by identity.
    async fn get_parent(&self, id: &ObjectId) -> Result<Parent, ClusterError>;

    /// List parents in every namespace whose labels match `selector`.
    async fn list_parents(&self, selector: &Selector) -> Result<Vec<Parent>, ClusterError>;

    /// List children in `namespace` whose labels match `selector`.
    async fn list_children(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<Child>, ClusterError>;

    /// Persist the full tag state of a child.
    async fn update_child(&self, child: &Child) -> Result<(), ClusterError>;
}

/// Shared handle to a cluster client.
pub type ClusterHandle = Arc<dyn ClusterClient>;

/// Run a cluster call unless `cancel` fires first.
pub(crate) async fn guarded<T, F>(cancel: &CancellationToken, call: F) -> Result<T, ReflectError>
where
    F: Future<Output = Result<T, ClusterError>>,
{
    if cancel.is_cancelled() {
        return Err(ReflectError::Canceled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ReflectError::Canceled),
        res = call => res.map_err(ReflectError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guarded_passes_result_through() {
        let cancel = CancellationToken::new();
        let out = guarded(&cancel, async { Ok::<_, ClusterError>(7) }).await;
        assert_eq!(out.unwrap(), 7);
    }

    #[tokio::test]
    async fn guarded_maps_cluster_errors() {
        let cancel = CancellationToken::new();
        let out = guarded(&cancel, async {
            Err::<(), _>(ClusterError::Transport("boom".into()))
        })
        .await;
        assert!(matches!(out, Err(ReflectError::Cluster(ClusterError::Transport(_)))));
    }

    #[tokio::test]
    async fn guarded_refuses_when_already_canceled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let out = guarded(&cancel, async { Ok::<_, ClusterError>(()) }).await;
        assert!(matches!(out, Err(ReflectError::Canceled)));
    }

    #[tokio::test]
    async fn guarded_aborts_pending_call_on_cancel() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move { trigger.cancel() });

        let out = guarded(&cancel, std::future::pending::<Result<(), ClusterError>>()).await;
        assert!(matches!(out, Err(ReflectError::Canceled)));
    }
}
