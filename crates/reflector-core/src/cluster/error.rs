use reflector_model::ObjectId;
use thiserror::Error;

/// Failure reported by a [`super::ClusterClient`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: ObjectId },

    #[error("conflict writing {0}: object was modified concurrently")]
    Conflict(ObjectId),

    #[error("cluster request failed: {0}")]
    Transport(String),
}

impl ClusterError {
    /// Short label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ClusterError::NotFound { .. } => "not_found",
            ClusterError::Conflict(_) => "conflict",
            ClusterError::Transport(_) => "transport",
        }
    }
}
