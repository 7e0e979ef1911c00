use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use reflector_model::{Child, ObjectId, Parent, Selector, Tags};

use super::{ClusterClient, ClusterError};

#[derive(Default)]
struct State {
    parents: BTreeMap<ObjectId, Parent>,
    children: BTreeMap<ObjectId, Child>,
    failing_updates: BTreeSet<ObjectId>,
    failing_lists: bool,
    updates: usize,
}

/// In-memory cluster.
///
/// Objects are kept in identity order, so listings are deterministic.
/// Write failures and listing failures can be injected for tests.
#[derive(Default)]
pub struct MemoryCluster {
    state: Mutex<State>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style parent insertion.
    pub fn with_parent(self, parent: Parent) -> Self {
        self.insert_parent(parent);
        self
    }

    /// Builder-style child insertion.
    pub fn with_child(self, child: Child) -> Self {
        self.insert_child(child);
        self
    }

    /// Insert or replace a parent.
    pub fn insert_parent(&self, parent: Parent) {
        self.lock().parents.insert(parent.id.clone(), parent);
    }

    /// Insert or replace a child.
    pub fn insert_child(&self, child: Child) {
        self.lock().children.insert(child.id.clone(), child);
    }

    pub fn child(&self, id: &ObjectId) -> Option<Child> {
        self.lock().children.get(id).cloned()
    }

    /// Snapshot of every stored child.
    pub fn children(&self) -> Vec<Child> {
        self.lock().children.values().cloned().collect()
    }

    /// Make every update of `id` fail with a transport error.
    pub fn fail_updates_for(&self, id: ObjectId) {
        self.lock().failing_updates.insert(id);
    }

    /// Make every list call fail with a transport error.
    pub fn fail_listing(&self, fail: bool) {
        self.lock().failing_lists = fail;
    }

    /// Drop all injected failures.
    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing_updates.clear();
        state.failing_lists = false;
    }

    /// Number of successful child writes so far.
    pub fn update_count(&self) -> usize {
        self.lock().updates
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn labels_match(selector: &Selector, labels: Option<&Tags>) -> bool {
    match labels {
        Some(tags) => selector.matches(tags),
        None => selector.matches(&Tags::new()),
    }
}

#[async_trait]
impl ClusterClient for MemoryCluster {
    async fn get_parent(&self, id: &ObjectId) -> Result<Parent, ClusterError> {
        self.lock()
            .parents
            .get(id)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound {
                kind: "parent",
                id: id.clone(),
            })
    }

    async fn list_parents(&self, selector: &Selector) -> Result<Vec<Parent>, ClusterError> {
        let state = self.lock();
        if state.failing_lists {
            return Err(ClusterError::Transport("listing parents is unavailable".into()));
        }
        Ok(state
            .parents
            .values()
            .filter(|p| selector.matches(&p.labels))
            .cloned()
            .collect())
    }

    async fn list_children(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<Child>, ClusterError> {
        let state = self.lock();
        if state.failing_lists {
            return Err(ClusterError::Transport("listing children is unavailable".into()));
        }
        Ok(state
            .children
            .values()
            .filter(|c| c.id.namespace == namespace)
            .filter(|c| labels_match(selector, c.labels.as_ref()))
            .cloned()
            .collect())
    }

    async fn update_child(&self, child: &Child) -> Result<(), ClusterError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.failing_updates.contains(&child.id) {
            return Err(ClusterError::Transport(format!("write to {} rejected", child.id)));
        }
        match state.children.get_mut(&child.id) {
            Some(stored) => {
                *stored = child.clone();
                state.updates += 1;
                Ok(())
            }
            None => Err(ClusterError::NotFound {
                kind: "child",
                id: child.id.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[tokio::test]
    async fn list_children_is_namespace_scoped() {
        let cluster = MemoryCluster::new()
            .with_child(Child::new(ObjectId::new("default", "a")).with_label("app", "web"))
            .with_child(Child::new(ObjectId::new("other", "b")).with_label("app", "web"))
            .with_child(Child::new(ObjectId::new("default", "c")).with_label("app", "db"));

        let found = cluster.list_children("default", &sel("app=web")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.name, "a");
    }

    #[tokio::test]
    async fn list_parents_spans_namespaces() {
        let web = Selector::parse("app=web").unwrap();
        let cluster = MemoryCluster::new()
            .with_parent(Parent::new(ObjectId::new("a", "one"), web.clone()).with_label("team", "x"))
            .with_parent(Parent::new(ObjectId::new("b", "two"), web.clone()).with_label("team", "x"))
            .with_parent(Parent::new(ObjectId::new("c", "three"), web));

        assert_eq!(cluster.list_parents(&sel("team=x")).await.unwrap().len(), 2);
        assert_eq!(cluster.list_parents(&Selector::unlabeled()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_stored_child_and_counts() {
        let id = ObjectId::new("default", "a");
        let cluster = MemoryCluster::new().with_child(Child::new(id.clone()));

        let updated = Child::new(id.clone()).with_label("tier", "backend");
        cluster.update_child(&updated).await.unwrap();

        assert_eq!(cluster.child(&id), Some(updated));
        assert_eq!(cluster.update_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_transport_errors() {
        let id = ObjectId::new("default", "a");
        let cluster = MemoryCluster::new().with_child(Child::new(id.clone()));
        cluster.fail_updates_for(id.clone());
        cluster.fail_listing(true);

        let err = cluster.update_child(&Child::new(id.clone())).await.unwrap_err();
        assert_eq!(err.as_label(), "transport");
        assert!(cluster.list_children("default", &sel("a=b")).await.is_err());

        cluster.clear_failures();
        cluster.update_child(&Child::new(id)).await.unwrap();
    }

    #[tokio::test]
    async fn missing_objects_are_not_found() {
        let cluster = MemoryCluster::new();
        let err = cluster
            .get_parent(&ObjectId::new("default", "ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::NotFound { kind: "parent", .. }));

        let err = cluster
            .update_child(&Child::new(ObjectId::new("default", "ghost")))
            .await
            .unwrap_err();
        assert!(matches!(err, ClusterError::NotFound { kind: "child", .. }));
    }
}
