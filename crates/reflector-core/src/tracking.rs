//! Tracking tags: the record, kept on each child, of keys the engine wrote.
use reflector_model::{Child, Tags};

use crate::domain::Domain;

/// Keys the engine previously wrote to `child` for `domain`.
///
/// Read from the domain's tracking annotation. Empty segments are skipped,
/// so an empty value yields no keys.
pub fn tracked_keys(child: &Child, domain: &Domain) -> Vec<String> {
    child
        .annotation(domain.tracking_key())
        .map(split_keys)
        .unwrap_or_default()
}

/// Whether `child` carries the tracking tag of `domain` at all.
pub fn is_tracked(child: &Child, domain: &Domain) -> bool {
    child.annotation(domain.tracking_key()).is_some()
}

/// Tracking tag describing `desired`: a single entry keyed by the domain's
/// tracking key, valued with the desired keys joined in ascending order.
pub fn tracking_tag_for(domain: &Domain, desired: &Tags) -> Tags {
    let mut tag = Tags::new();
    tag.insert(domain.tracking_key(), desired.joined_keys());
    tag
}

fn split_keys(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflector_model::{LABELS_TRACKING_KEY, ObjectId};

    fn child() -> Child {
        Child::new(ObjectId::new("default", "web-0"))
    }

    #[test]
    fn untracked_child_has_no_keys() {
        let c = child();
        assert!(tracked_keys(&c, &Domain::LABELS).is_empty());
        assert!(!is_tracked(&c, &Domain::LABELS));
    }

    #[test]
    fn reads_keys_and_skips_empty_segments() {
        let c = child().with_annotation(LABELS_TRACKING_KEY, "env,,tier");
        assert_eq!(tracked_keys(&c, &Domain::LABELS), vec!["env", "tier"]);
        assert!(tracked_keys(&c, &Domain::ANNOTATIONS).is_empty());

        let c = child().with_annotation(LABELS_TRACKING_KEY, "");
        assert!(tracked_keys(&c, &Domain::LABELS).is_empty());
        assert!(is_tracked(&c, &Domain::LABELS));
    }

    #[test]
    fn tag_value_is_sorted_and_empty_for_empty_set() {
        let desired: Tags = [("tier", "backend"), ("env", "prod")].into_iter().collect();
        let tag = tracking_tag_for(&Domain::LABELS, &desired);
        assert_eq!(tag.get(LABELS_TRACKING_KEY), Some("env,tier"));

        let tag = tracking_tag_for(&Domain::LABELS, &Tags::new());
        assert_eq!(tag.get(LABELS_TRACKING_KEY), Some(""));
    }
}
