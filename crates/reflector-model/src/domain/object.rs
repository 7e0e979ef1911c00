use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Selector, Tags};

/// Namespace-scoped identity of a parent or child resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    pub namespace: String,
    pub name: String,
}

impl ObjectId {
    /// Create a new identifier.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Resource whose tags are the source of truth for reflection.
///
/// Reflection rules (marker tags) live in `annotations`.
/// `selector` picks the children the parent manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    #[serde(flatten)]
    pub id: ObjectId,
    /// Child selector. An empty selector is refused by the engine.
    pub selector: Selector,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub labels: Tags,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub annotations: Tags,
    /// Number of ready children as reported by the platform.
    #[serde(default)]
    pub ready_replicas: u32,
}

impl Parent {
    /// Create a parent without tags.
    pub fn new(id: ObjectId, selector: Selector) -> Self {
        Self {
            id,
            selector,
            labels: Tags::new(),
            annotations: Tags::new(),
            ready_replicas: 0,
        }
    }

    /// Builder-style label setter.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key, value);
        self
    }

    /// Builder-style annotation setter.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key, value);
        self
    }
}

/// Resource receiving reflected tags.
///
/// Tag maps are optional: `None` means the map was never initialized, which the
/// engine preserves until it actually has something to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    #[serde(flatten)]
    pub id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Tags>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Tags>,
}

impl Child {
    /// Create a child with uninitialized tag maps.
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            labels: None,
            annotations: None,
        }
    }

    /// Builder-style label setter.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.get_or_insert_with(Tags::new).insert(key, value);
        self
    }

    /// Builder-style annotation setter.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(Tags::new)
            .insert(key, value);
        self
    }

    /// Read a label, treating an absent map as empty.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.as_ref().and_then(|t| t.get(key))
    }

    /// Read an annotation, treating an absent map as empty.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.as_ref().and_then(|t| t.get(key))
    }
}
