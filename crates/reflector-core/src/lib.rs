pub mod cluster;
pub mod domain;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod mutate;
pub mod reconcile;
pub mod reflector;
pub mod rescan;
pub mod resolve;
pub mod rule;
pub mod supervisor;
pub mod tracking;

pub use reconcile::ReflectContext;

pub mod prelude {
    pub use crate::cluster::{ClusterClient, ClusterError, ClusterHandle, MemoryCluster};
    pub use crate::domain::Domain;
    pub use crate::error::{CoreError, ReflectError};
    pub use crate::filter::ParentEvent;
    pub use crate::metrics::{MetricsBackend, MetricsHandle, ReconcileOutcome};
    pub use crate::reconcile::{ReconcileAction, Reconciler, ReflectContext};
    pub use crate::rescan::{Rescan, RescanReport};
    pub use crate::supervisor::SupervisorApi;
}
