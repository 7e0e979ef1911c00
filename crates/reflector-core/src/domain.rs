use std::fmt;

use reflector_model::{
    ANNOTATIONS_MARKER_DOMAIN, ANNOTATIONS_TRACKING_KEY, Child, LABELS_MARKER_DOMAIN,
    LABELS_TRACKING_KEY, Parent, Tags,
};

/// Describes one reflected tag domain.
///
/// The labels and annotations domains run the same algorithm; they differ
/// only in the marker prefix, the tracking key, and which maps are read and written.
#[derive(Clone, Copy)]
pub struct Domain {
    name: &'static str,
    marker_domain: &'static str,
    tracking_key: &'static str,
    source: fn(&Parent) -> &Tags,
    target: fn(&mut Child) -> &mut Option<Tags>,
}

impl Domain {
    /// Parent labels reflected into child labels.
    pub const LABELS: Domain = Domain {
        name: "labels",
        marker_domain: LABELS_MARKER_DOMAIN,
        tracking_key: LABELS_TRACKING_KEY,
        source: parent_labels,
        target: child_labels,
    };

    /// Parent annotations reflected into child annotations.
    pub const ANNOTATIONS: Domain = Domain {
        name: "annotations",
        marker_domain: ANNOTATIONS_MARKER_DOMAIN,
        tracking_key: ANNOTATIONS_TRACKING_KEY,
        source: parent_annotations,
        target: child_annotations,
    };

    /// Domains in the order a reconcile processes them.
    pub const ALL: [Domain; 2] = [Domain::LABELS, Domain::ANNOTATIONS];

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Marker domain, e.g. `labels.metadata-reflector.spaceship.com`.
    pub fn marker_domain(&self) -> &'static str {
        self.marker_domain
    }

    /// Child annotation key recording which keys this domain wrote.
    pub fn tracking_key(&self) -> &'static str {
        self.tracking_key
    }

    /// Parent map that reflected values are read from.
    pub fn source<'p>(&self, parent: &'p Parent) -> &'p Tags {
        (self.source)(parent)
    }

    /// Child map reflected values are written to.
    pub fn target<'c>(&self, child: &'c mut Child) -> &'c mut Option<Tags> {
        (self.target)(child)
    }

    /// Marker tags of this domain present on the parent.
    ///
    /// Markers always live in the parent's annotations, whatever the domain.
    pub fn markers(&self, parent: &Parent) -> Tags {
        parent.annotations.with_keys_containing(self.marker_domain)
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("name", &self.name)
            .field("marker_domain", &self.marker_domain)
            .finish()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Domain {}

fn parent_labels(p: &Parent) -> &Tags {
    &p.labels
}

fn parent_annotations(p: &Parent) -> &Tags {
    &p.annotations
}

fn child_labels(c: &mut Child) -> &mut Option<Tags> {
    &mut c.labels
}

fn child_annotations(c: &mut Child) -> &mut Option<Tags> {
    &mut c.annotations
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflector_model::{ObjectId, Selector};

    fn parent() -> Parent {
        Parent::new(ObjectId::new("default", "web"), Selector::parse("app=web").unwrap())
            .with_label("tier", "backend")
            .with_annotation("owner", "team-a")
            .with_annotation("labels.metadata-reflector.spaceship.com/list", "tier")
            .with_annotation("annotations.metadata-reflector.spaceship.com/regex", "own.*")
    }

    #[test]
    fn domains_read_their_own_source_map() {
        let p = parent();
        assert_eq!(Domain::LABELS.source(&p).get("tier"), Some("backend"));
        assert_eq!(Domain::ANNOTATIONS.source(&p).get("owner"), Some("team-a"));
    }

    #[test]
    fn markers_come_from_annotations_of_matching_domain() {
        let p = parent();
        let labels = Domain::LABELS.markers(&p);
        assert_eq!(labels.len(), 1);
        assert!(labels.contains_key("labels.metadata-reflector.spaceship.com/list"));

        let annotations = Domain::ANNOTATIONS.markers(&p);
        assert_eq!(annotations.len(), 1);
        assert!(annotations.contains_key("annotations.metadata-reflector.spaceship.com/regex"));
    }

    #[test]
    fn target_accessors_address_distinct_maps() {
        let mut child = Child::new(ObjectId::new("default", "web-0"));
        Domain::LABELS
            .target(&mut child)
            .get_or_insert_with(Tags::new)
            .insert("tier", "backend");

        assert_eq!(child.label("tier"), Some("backend"));
        assert!(child.annotations.is_none());
    }

    #[test]
    fn tracking_keys_differ_per_domain() {
        assert_ne!(Domain::LABELS.tracking_key(), Domain::ANNOTATIONS.tracking_key());
        assert_eq!(Domain::LABELS.to_string(), "labels");
        assert_eq!(Domain::ALL[1], Domain::ANNOTATIONS);
    }
}
