mod domain;
pub use domain::{Child, ObjectId, Parent, Tags};
pub use domain::{
    ANNOTATIONS_MARKER_DOMAIN, ANNOTATIONS_TRACKING_KEY, LABELS_MARKER_DOMAIN,
    LABELS_TRACKING_KEY, OPERATION_LIST, OPERATION_REGEX, ROOT_DOMAIN, TRACKING_SUFFIX,
};

mod error;
pub use error::{ModelError, ModelResult};

mod selector;
pub use selector::{Operator, Requirement, Selector};

mod config;
pub use config::{
    ENV_BACKGROUND_INTERVAL, ENV_ERROR_BACKOFF, ENV_PARENT_SELECTOR, ENV_RECHECK_INTERVAL,
    ReflectorConfig, parse_duration,
};
