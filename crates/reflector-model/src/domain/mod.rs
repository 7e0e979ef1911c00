mod tags;
pub use tags::Tags;

mod object;
pub use object::{Child, ObjectId, Parent};

mod constants;
pub use constants::{
    ANNOTATIONS_MARKER_DOMAIN, ANNOTATIONS_TRACKING_KEY, LABELS_MARKER_DOMAIN,
    LABELS_TRACKING_KEY, OPERATION_LIST, OPERATION_REGEX, ROOT_DOMAIN, TRACKING_SUFFIX,
};
