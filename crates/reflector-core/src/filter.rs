//! Decides which parent events are worth a reconcile.
use reflector_model::{ObjectId, Parent, ROOT_DOMAIN};

/// Change notification for a parent, as delivered by the platform watch.
#[derive(Debug, Clone)]
pub enum ParentEvent {
    Created(Parent),
    Updated { old: Parent, new: Parent },
    Deleted(Parent),
    Generic(Parent),
}

impl ParentEvent {
    /// Identity of the parent the event is about.
    pub fn parent_id(&self) -> &ObjectId {
        match self {
            ParentEvent::Created(p) | ParentEvent::Deleted(p) | ParentEvent::Generic(p) => &p.id,
            ParentEvent::Updated { new, .. } => &new.id,
        }
    }

    pub fn should_reconcile(&self) -> bool {
        match self {
            ParentEvent::Created(p) => should_trigger_on_create(p),
            ParentEvent::Updated { old, new } => should_trigger_on_update(old, new),
            ParentEvent::Deleted(_) | ParentEvent::Generic(_) => false,
        }
    }
}

/// Whether the parent carries any reflector tag.
///
/// A plain substring check on annotation keys; marker validity is left to the
/// reconcile so that broken markers fail visibly there.
pub fn is_reflector_managed(parent: &Parent) -> bool {
    parent.annotations.any_key_contains(ROOT_DOMAIN)
}

pub fn should_trigger_on_create(parent: &Parent) -> bool {
    is_reflector_managed(parent)
}

/// Updates trigger when either side is managed and tags changed or the
/// parent scaled up; new children need the reflected tags too.
pub fn should_trigger_on_update(old: &Parent, new: &Parent) -> bool {
    if !is_reflector_managed(old) && !is_reflector_managed(new) {
        return false;
    }
    old.annotations != new.annotations
        || old.labels != new.labels
        || new.ready_replicas > old.ready_replicas
}
