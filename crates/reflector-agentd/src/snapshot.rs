//! Seed data for the in-memory cluster.

use std::path::Path;

use anyhow::Context;
use reflector_core::cluster::MemoryCluster;
use reflector_model::{Child, ObjectId, Parent, Selector};
use serde::Deserialize;

/// Env var pointing at a JSON snapshot to load instead of the built-in demo.
pub const ENV_SNAPSHOT: &str = "REFLECTOR_SNAPSHOT";

/// Parents and children to seed the cluster with.
#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub parents: Vec<Parent>,
    #[serde(default)]
    pub children: Vec<Child>,
}

impl Snapshot {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("malformed snapshot")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read snapshot {}", path.display()))?;
        Self::from_json(&raw)
    }

    /// `default/web` reflecting `tier` and the `team` annotation onto two pods.
    pub fn demo() -> anyhow::Result<Self> {
        let parent = Parent::new(ObjectId::new("default", "web"), Selector::parse("app=web")?)
            .with_label("app", "web")
            .with_label("tier", "backend")
            .with_label("env", "prod")
            .with_annotation("team", "core")
            .with_annotation("labels.metadata-reflector.spaceship.com/list", "tier,env")
            .with_annotation("annotations.metadata-reflector.spaceship.com/regex", "te.*");

        let children = ["web-0", "web-1"]
            .into_iter()
            .map(|name| Child::new(ObjectId::new("default", name)).with_label("app", "web"))
            .collect();

        Ok(Self {
            parents: vec![parent],
            children,
        })
    }

    /// Load from [`ENV_SNAPSHOT`] when set, else fall back to [`Snapshot::demo`].
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var_os(ENV_SNAPSHOT) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Self::demo(),
        }
    }

    pub fn into_cluster(self) -> MemoryCluster {
        let cluster = MemoryCluster::new();
        for parent in self.parents {
            cluster.insert_parent(parent);
        }
        for child in self.children {
            cluster.insert_child(child);
        }
        cluster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflector_core::cluster::ClusterClient;

    #[tokio::test]
    async fn demo_seeds_one_parent_and_two_children() {
        let cluster = Snapshot::demo().unwrap().into_cluster();
        let web = cluster.get_parent(&ObjectId::new("default", "web")).await.unwrap();
        assert_eq!(web.labels.get("tier"), Some("backend"));
        assert_eq!(cluster.children().len(), 2);
    }

    #[test]
    fn parses_json_snapshot() {
        let snapshot = Snapshot::from_json(
            r#"{
                "parents": [{"namespace": "ops", "name": "api", "selector": "app=api"}],
                "children": [{"namespace": "ops", "name": "api-0", "labels": {"app": "api"}}]
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.parents[0].id, ObjectId::new("ops", "api"));
        assert_eq!(snapshot.children[0].label("app"), Some("api"));
    }

    #[test]
    fn rejects_malformed_snapshot() {
        assert!(Snapshot::from_json(r#"{"parents": [{"name": 1}]}"#).is_err());
    }
}
