//! Wire-level tag keys shared by the engine and its collaborators.
//!
//! These strings are part of the external contract: parents are annotated with
//! them by users, and children carry the tracking keys written by the engine.
//! They must stay byte-for-byte stable across releases.

/// Shared root of every reflector tag key.
///
/// The event filter uses plain substring membership on this value to decide whether a parent is worth reconciling at all.
pub const ROOT_DOMAIN: &str = "metadata-reflector.spaceship.com";

/// Marker prefix for rules that copy parent labels onto children.
pub const LABELS_MARKER_DOMAIN: &str = "labels.metadata-reflector.spaceship.com";

/// Marker prefix for rules that copy parent annotations onto children.
pub const ANNOTATIONS_MARKER_DOMAIN: &str = "annotations.metadata-reflector.spaceship.com";

/// Operation segment selecting keys from a comma-separated list.
pub const OPERATION_LIST: &str = "list";

/// Operation segment selecting keys by an anchored regular expression.
pub const OPERATION_REGEX: &str = "regex";

/// Final segment of every tracking key.
pub const TRACKING_SUFFIX: &str = "reflected-list";

/// Child annotation recording which labels the engine placed on that child.
pub const LABELS_TRACKING_KEY: &str = "labels.metadata-reflector.spaceship.com/reflected-list";

/// Child annotation recording which annotations the engine placed on that child.
pub const ANNOTATIONS_TRACKING_KEY: &str =
    "annotations.metadata-reflector.spaceship.com/reflected-list";
