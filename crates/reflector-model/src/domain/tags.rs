use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key–value metadata of a resource (labels or annotations) based on [`BTreeMap`].
///
/// Keys iterate in ascending order, which keeps every derived value (joined key lists, marker application order) deterministic.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(pub BTreeMap<String, String>);

impl Tags {
    /// Create an empty set of tags.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns `true` if no tags are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Insert or overwrite a tag.
    ///
    /// Returns `self` for chaining.
    pub fn insert<K, V>(&mut self, key: K, val: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.insert(key.into(), val.into());
        self
    }

    /// Remove a tag, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Get the value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate through all tags as `(&str, &str)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate through all keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Returns `true` if any key contains `needle` as a substring.
    pub fn any_key_contains(&self, needle: &str) -> bool {
        self.0.keys().any(|k| k.contains(needle))
    }

    /// Returns the subset of tags whose key contains `needle` as a substring.
    pub fn with_keys_containing(&self, needle: &str) -> Tags {
        self.0
            .iter()
            .filter(|(k, _)| k.contains(needle))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Join all keys with `,` in ascending order.
    pub fn joined_keys(&self) -> String {
        self.keys().collect::<Vec<_>>().join(",")
    }
}

impl<K, V> FromIterator<(K, V)> for Tags
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K, V> Extend<(K, V)> for Tags
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.0.insert(k.into(), v.into());
        }
    }
}
