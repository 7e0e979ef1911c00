use reflector_model::{Child, Parent, Tags};
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, error, info, instrument, warn};

use crate::{
    cluster::{ClusterHandle, guarded},
    domain::Domain,
    error::{ChildUpdateError, ReflectError},
    mutate::{set_tags, unset_tags},
    resolve::desired_set,
    tracking::{is_tracked, tracked_keys, tracking_tag_for},
};

/// Result of one successful domain pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainOutcome {
    /// Every changed child was written.
    Applied { updated: usize },
    /// Reads succeeded but some writes failed; the parent should be reconciled again right away.
    RetrySoon { failures: Vec<ChildUpdateError> },
}

/// Reflects one [`Domain`] of a parent onto its children.
pub struct DomainReflector {
    domain: Domain,
    cluster: ClusterHandle,
}

impl DomainReflector {
    pub fn new(domain: Domain, cluster: ClusterHandle) -> Self {
        Self { domain, cluster }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Run the domain pass for `parent`.
    ///
    /// Resolves the desired set from the parent's markers. A non-empty set is
    /// applied to every child; an empty one retracts whatever the engine
    /// previously wrote.
    #[instrument(level = "debug", skip_all, fields(parent = %parent.id, domain = %self.domain))]
    pub async fn reflect(
        &self,
        parent: &Parent,
        cancel: &CancellationToken,
    ) -> Result<DomainOutcome, ReflectError> {
        let markers = self.domain.markers(parent);
        let desired = desired_set(&markers, self.domain.source(parent)).inspect_err(|e| {
            error!(error = %e, "invalid reflection markers");
        })?;

        let mut children = self.managed_children(parent, cancel).await?;

        if desired.is_empty() {
            debug!("nothing to reflect, retracting tracked keys");
            let changed = self.retract_all(&mut children);
            return self.write_back(children, changed, cancel).await;
        }

        let tracking = tracking_tag_for(&self.domain, &desired);
        debug!(keys = %desired.joined_keys(), "reflecting keys");
        let changed = children
            .iter_mut()
            .map(|child| self.plan_apply(child, &desired, &tracking))
            .collect();
        self.write_back(children, changed, cancel).await
    }

    /// Bring one child in line with `desired`.
    ///
    /// Sets desired values and the tracking tag, then removes keys that were
    /// tracked before but are no longer desired. Returns whether the child changed.
    pub fn plan_apply(&self, child: &mut Child, desired: &Tags, tracking: &Tags) -> bool {
        let _span = debug_span!("child", child = %child.id).entered();

        let excess: Vec<String> = tracked_keys(child, &self.domain)
            .into_iter()
            .filter(|k| !desired.contains_key(k) && k != self.domain.tracking_key())
            .collect();

        let mut changed = set_tags(desired, self.domain.target(child));
        changed |= set_tags(tracking, &mut child.annotations);
        changed |= unset_tags(excess.iter().map(String::as_str), self.domain.target(child));
        changed
    }

    /// Remove every tracked key and the tracking tag from one child.
    ///
    /// Children without the tracking tag are left alone. Returns whether the child changed.
    pub fn plan_retract(&self, child: &mut Child) -> bool {
        if !is_tracked(child, &self.domain) {
            return false;
        }
        let _span = debug_span!("child", child = %child.id).entered();

        let tracked = tracked_keys(child, &self.domain);
        let mut changed = unset_tags(tracked.iter().map(String::as_str), self.domain.target(child));
        changed |= unset_tags([self.domain.tracking_key()], &mut child.annotations);
        changed
    }

    fn retract_all(&self, children: &mut [Child]) -> Vec<bool> {
        children
            .iter_mut()
            .map(|child| self.plan_retract(child))
            .collect()
    }

    async fn managed_children(
        &self,
        parent: &Parent,
        cancel: &CancellationToken,
    ) -> Result<Vec<Child>, ReflectError> {
        if parent.selector.is_empty() {
            let err = ReflectError::EmptySelector {
                parent: parent.id.clone(),
            };
            error!(error = %err, "refusing to list children");
            return Err(err);
        }

        let children = guarded(
            cancel,
            self.cluster
                .list_children(&parent.id.namespace, &parent.selector),
        )
        .await
        .inspect_err(|e| {
            if !matches!(e, ReflectError::Canceled) {
                error!(error = %e, selector = %parent.selector, "failed to list children");
            }
        })?;

        if children.is_empty() {
            let err = ReflectError::ChildrenNotFound {
                parent: parent.id.clone(),
                selector: parent.selector.to_string(),
            };
            error!(error = %err, "could not find children");
            return Err(err);
        }

        info!(count = children.len(), selector = %parent.selector, "found managed children");
        Ok(children)
    }

    async fn write_back(
        &self,
        children: Vec<Child>,
        changed: Vec<bool>,
        cancel: &CancellationToken,
    ) -> Result<DomainOutcome, ReflectError> {
        let mut updated = 0;
        let mut failures = Vec::new();

        for (child, _) in children.iter().zip(changed).filter(|(_, changed)| *changed) {
            match guarded(cancel, self.cluster.update_child(child)).await {
                Ok(()) => {
                    debug!(child = %child.id, "child updated");
                    updated += 1;
                }
                Err(ReflectError::Cluster(source)) => {
                    error!(child = %child.id, error = %source, "failed to update child");
                    failures.push(ChildUpdateError {
                        child: child.id.clone(),
                        source,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if failures.is_empty() {
            return Ok(DomainOutcome::Applied { updated });
        }
        warn!(
            updated,
            failed = failures.len(),
            "could not update all managed children, requesting retry"
        );
        Ok(DomainOutcome::RetrySoon { failures })
    }
}
