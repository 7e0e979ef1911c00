use reflector_model::{ModelError, ObjectId};
use thiserror::Error;

use crate::cluster::ClusterError;

/// A single child write that did not go through.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{child}: {source}")]
pub struct ChildUpdateError {
    pub child: ObjectId,
    #[source]
    pub source: ClusterError,
}

/// Failure of a reflection pass.
#[derive(Debug, Error)]
pub enum ReflectError {
    #[error("cannot parse reflection marker {key:?}: {reason}")]
    UnparsableAnnotation { key: String, reason: &'static str },

    #[error("reflection marker {key:?} has unsupported operation {operation:?} (expected list or regex)")]
    UnparsableOperation { key: String, operation: String },

    #[error("reflection marker {key:?} has invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        key: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("parent {parent} has an empty child selector, refusing to match everything")]
    EmptySelector { parent: ObjectId },

    #[error("no children of {parent} match selector {selector:?}")]
    ChildrenNotFound { parent: ObjectId, selector: String },

    #[error("failed to write {} child(ren): {}", .0.len(), join(.0))]
    ChildUpdates(Vec<ChildUpdateError>),

    #[error("invalid selector: {0}")]
    InvalidSelector(#[from] ModelError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("reflection canceled")]
    Canceled,

    #[error("{} reflection errors: {}", .0.len(), join(.0))]
    Multiple(Vec<ReflectError>),
}

impl ReflectError {
    /// Whether requeueing the same parent can succeed without a parent change.
    ///
    /// Malformed markers and selectors stay broken until someone edits the
    /// parent. Missing children, write failures and transport errors are
    /// transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReflectError::UnparsableAnnotation { .. }
            | ReflectError::UnparsableOperation { .. }
            | ReflectError::InvalidPattern { .. }
            | ReflectError::EmptySelector { .. }
            | ReflectError::InvalidSelector(_) => false,
            ReflectError::ChildrenNotFound { .. }
            | ReflectError::ChildUpdates(_)
            | ReflectError::Cluster(_)
            | ReflectError::Canceled => true,
            ReflectError::Multiple(errs) => errs.iter().any(ReflectError::is_retryable),
        }
    }

    /// Short label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ReflectError::UnparsableAnnotation { .. } => "unparsable_annotation",
            ReflectError::UnparsableOperation { .. } => "unparsable_operation",
            ReflectError::InvalidPattern { .. } => "invalid_pattern",
            ReflectError::EmptySelector { .. } => "empty_selector",
            ReflectError::ChildrenNotFound { .. } => "children_not_found",
            ReflectError::ChildUpdates(_) => "child_updates",
            ReflectError::InvalidSelector(_) => "invalid_selector",
            ReflectError::Cluster(e) => e.as_label(),
            ReflectError::Canceled => "canceled",
            ReflectError::Multiple(_) => "multiple",
        }
    }

    /// Fold collected errors: none, the single one, or [`ReflectError::Multiple`].
    pub fn combine(mut errs: Vec<ReflectError>) -> Option<ReflectError> {
        match errs.len() {
            0 => None,
            1 => errs.pop(),
            _ => Some(ReflectError::Multiple(errs)),
        }
    }

    /// Flatten nested [`ReflectError::Multiple`] into leaf errors.
    pub fn leaves(&self) -> Vec<&ReflectError> {
        match self {
            ReflectError::Multiple(errs) => errs.iter().flat_map(ReflectError::leaves).collect(),
            other => vec![other],
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while wiring the engine into the supervisor.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("supervisor error: {0}")]
    Supervisor(String),

    #[error("configuration error: {0}")]
    Config(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed() -> ReflectError {
        ReflectError::UnparsableOperation {
            key: "labels.metadata-reflector.spaceship.com/copy".into(),
            operation: "copy".into(),
        }
    }

    fn transient() -> ReflectError {
        ReflectError::Cluster(ClusterError::Transport("timeout".into()))
    }

    #[test]
    fn retryability_follows_error_kind() {
        assert!(!malformed().is_retryable());
        assert!(
            !ReflectError::EmptySelector {
                parent: ObjectId::new("default", "web")
            }
            .is_retryable()
        );
        assert!(transient().is_retryable());
        assert!(
            ReflectError::ChildrenNotFound {
                parent: ObjectId::new("default", "web"),
                selector: "app=web".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn multiple_is_retryable_if_any_leaf_is() {
        assert!(ReflectError::Multiple(vec![malformed(), transient()]).is_retryable());
        assert!(!ReflectError::Multiple(vec![malformed(), malformed()]).is_retryable());
    }

    #[test]
    fn labels_name_the_failure_kind() {
        assert_eq!(malformed().as_label(), "unparsable_operation");
        assert_eq!(transient().as_label(), "transport");
        assert_eq!(
            ReflectError::Multiple(vec![malformed(), transient()]).as_label(),
            "multiple"
        );
    }

    #[test]
    fn combine_collapses_small_lists() {
        assert!(ReflectError::combine(vec![]).is_none());
        assert!(matches!(
            ReflectError::combine(vec![transient()]),
            Some(ReflectError::Cluster(_))
        ));
        let combined = ReflectError::combine(vec![malformed(), transient()]).unwrap();
        assert_eq!(combined.leaves().len(), 2);
        assert!(combined.to_string().starts_with("2 reflection errors: "));
    }

    #[test]
    fn child_update_errors_list_every_child() {
        let err = ReflectError::ChildUpdates(vec![
            ChildUpdateError {
                child: ObjectId::new("default", "a"),
                source: ClusterError::Conflict(ObjectId::new("default", "a")),
            },
            ChildUpdateError {
                child: ObjectId::new("default", "b"),
                source: ClusterError::Transport("reset".into()),
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("default/a"));
        assert!(msg.contains("default/b"));
    }
}
