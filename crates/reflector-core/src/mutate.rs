//! In-place edits of a child's tag map.
//!
//! Maps are `Option<Tags>` so an uninitialized map stays `None` unless
//! something is actually written to it.
use reflector_model::Tags;
use tracing::debug;

/// Write every entry of `tags` into `target`.
///
/// Returns `true` if any value was added or changed.
pub fn set_tags(tags: &Tags, target: &mut Option<Tags>) -> bool {
    let mut changed = false;
    for (key, value) in tags.iter() {
        if target.as_ref().and_then(|t| t.get(key)) == Some(value) {
            continue;
        }
        debug!(key, value, "setting tag");
        target.get_or_insert_with(Tags::new).insert(key, value);
        changed = true;
    }
    changed
}

/// Remove `keys` from `target`.
///
/// Returns `true` if any key was present. A `None` map is left untouched.
pub fn unset_tags<'a, I>(keys: I, target: &mut Option<Tags>) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let Some(map) = target.as_mut() else {
        return false;
    };
    let mut changed = false;
    for key in keys {
        if map.remove(key).is_some() {
            debug!(key, "removing tag");
            changed = true;
        }
    }
    changed
}
